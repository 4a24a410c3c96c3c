/// Escapes run text for element content. Newlines become `<br/>`.
pub fn escape_text(text: &str) -> String {
    html_escape::encode_text(text).replace('\n', "<br/>")
}

/// Reverses [`escape_text`].
pub fn unescape_text(html: &str) -> String {
    html.replace("<br/>", "\n")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Escapes a value for use inside a double-quoted attribute.
pub fn escape_attr(value: &str) -> String {
    html_escape::encode_double_quoted_attribute(value).into_owned()
}
