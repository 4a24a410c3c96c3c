use crate::escape::{escape_attr, escape_text};
use std::io::Write;
use textpdf_render_core::{BlockSink, SinkError, SinkState};
use textpdf_style::{DocumentConfig, FontStyles, PageMargins, PageSize, TextAlign};
use textpdf_types::{Attributes, BlockKind, TableCell, TableModel, TextChunk};

pub const GENERATOR: &str = "textpdf";

/// Writes blocks as an HTML5 document.
///
/// Placeholder runs become text inputs, so the output doubles as a fillable
/// form.
pub struct HtmlSink<W: Write> {
    writer: W,
    state: SinkState,
    page_size: PageSize,
    margins: PageMargins,
}

impl<W: Write> HtmlSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            state: SinkState::default(),
            page_size: PageSize::default(),
            margins: PageMargins::default(),
        }
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn page_margins(&self) -> PageMargins {
        self.margins
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_header(&mut self, config: &DocumentConfig) -> Result<(), SinkError> {
        let w = &mut self.writer;
        writeln!(w, "<!DOCTYPE html>")?;
        writeln!(w, "<html>")?;
        writeln!(w, "<head>")?;
        writeln!(w, "<meta charset=\"utf-8\"/>")?;
        writeln!(w, "<title>{}</title>", escape_text(config.title.as_deref().unwrap_or("")))?;
        let metas = [
            ("author", config.author.as_deref()),
            ("generator", Some(GENERATOR)),
            ("description", config.description.as_deref()),
            ("keywords", config.keywords.as_deref()),
        ];
        for (name, content) in metas {
            if let Some(content) = content {
                writeln!(w, "<meta name=\"{}\" content=\"{}\"/>", name, escape_attr(content))?;
            }
        }
        for href in &config.stylesheets {
            writeln!(w, "<link rel=\"stylesheet\" type=\"text/css\" href=\"{}\"/>", escape_attr(href))?;
        }
        for src in &config.scripts {
            writeln!(w, "<script type=\"text/javascript\" src=\"{}\"></script>", escape_attr(src))?;
        }
        writeln!(w, "</head>")?;
        writeln!(w, "<body>")?;
        Ok(())
    }

    fn write_runs(&mut self, chunks: &[TextChunk], first_opens_block: bool) -> Result<(), SinkError> {
        for (i, chunk) in chunks.iter().enumerate() {
            if chunk.is_value {
                self.writer.write_all(value_input(chunk).as_bytes())?;
            } else if i == 0 && first_opens_block {
                self.writer.write_all(escape_text(&chunk.contents).as_bytes())?;
            } else {
                let style = run_style(&chunk.attrs);
                if style.is_empty() {
                    write!(self.writer, "<span>{}</span>", escape_text(&chunk.contents))?;
                } else {
                    write!(self.writer, "<span style=\"{}\">{}</span>", style, escape_text(&chunk.contents))?;
                }
            }
        }
        Ok(())
    }

    fn write_cell(&mut self, cell: &TableCell) -> Result<(), SinkError> {
        let mut open = String::from("<td");
        if cell.colspan() > 1 {
            open.push_str(&format!(" colspan=\"{}\"", cell.colspan()));
        }
        if let Some(align) = cell.attrs.get("align").and_then(|a| a.parse::<TextAlign>().ok()) {
            open.push_str(&format!(" style=\"text-align:{};\"", align.css_value()));
        }
        open.push('>');
        self.writer.write_all(open.as_bytes())?;
        self.write_runs(&cell.chunks, false)?;
        self.writer.write_all(b"</td>")?;
        Ok(())
    }
}

/// Maps a block kind to its heading or paragraph element.
pub fn block_tag(kind: BlockKind) -> Option<&'static str> {
    match kind {
        BlockKind::Title => Some("h1"),
        BlockKind::Chapter => Some("h2"),
        BlockKind::Section => Some("h3"),
        BlockKind::Para => Some("p"),
        _ => None,
    }
}

/// Inline CSS for a run's synthesized styles.
pub fn run_style(attrs: &Attributes) -> String {
    let (styles, _) = FontStyles::from_tokens(attrs.font_style_tokens());
    let mut css = String::new();
    if styles.bold {
        css.push_str("font-weight:bold;");
    }
    if styles.italic {
        css.push_str("font-style:italic;");
    }
    if styles.underline {
        css.push_str("text-decoration:underline;");
    }
    if attrs.contains_key("super") {
        css.push_str("vertical-align:super;");
    } else if attrs.contains_key("sub") {
        css.push_str("vertical-align:sub;");
    }
    css
}

/// Inline CSS for a block element, taken from its first run.
fn block_style(attrs: &Attributes) -> String {
    let mut css = run_style(attrs);
    if let Some(indent) = attrs.get("indent") {
        match indent.trim().parse::<f32>() {
            Ok(px) => css.push_str(&format!("text-indent:{}px;", px)),
            Err(_) => log::warn!("Ignoring non-numeric indent '{}'", indent),
        }
    }
    if let Some(align) = attrs.get("align") {
        match align.parse::<TextAlign>() {
            Ok(align) => css.push_str(&format!("text-align:{};", align.css_value())),
            Err(e) => log::warn!("{}", e),
        }
    }
    css
}

fn value_input(chunk: &TextChunk) -> String {
    let id = escape_attr(chunk.attrs.get("id").unwrap_or(""));
    let mut input = format!("<input type=\"text\" id=\"{}\" name=\"{}\"", id, id);
    if let Some(minlen) = chunk.attrs.get("minlen") {
        match minlen.trim().parse::<u32>() {
            Ok(size) => input.push_str(&format!(" size=\"{}\"", size)),
            Err(_) => log::warn!("Ignoring non-numeric minlen '{}'", minlen),
        }
    }
    input.push_str("/>");
    input
}

impl<W: Write> BlockSink for HtmlSink<W> {
    fn set_page_size(&mut self, size: PageSize) -> Result<(), SinkError> {
        self.state.ensure_mutable("page size")?;
        self.page_size = size;
        Ok(())
    }

    fn set_page_margin(&mut self, margins: PageMargins) -> Result<(), SinkError> {
        self.state.ensure_mutable("page margins")?;
        self.margins = margins;
        Ok(())
    }

    fn open(&mut self, config: &DocumentConfig) -> Result<(), SinkError> {
        self.state.begin()?;
        self.page_size = config.page_size;
        self.margins = config.margins;
        self.write_header(config)
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.state.end()?;
        writeln!(self.writer, "</body>")?;
        writeln!(self.writer, "</html>")?;
        self.writer.flush()?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state == SinkState::Open
    }

    fn write_block(&mut self, kind: BlockKind, chunks: &[TextChunk]) -> Result<(), SinkError> {
        self.state.ensure_open()?;
        let Some(tag) = block_tag(kind) else {
            log::warn!("HTML output has no rendering for <{}> blocks; skipped", kind);
            return Ok(());
        };

        let style = chunks.first().map(|c| block_style(&c.attrs)).unwrap_or_default();
        if style.is_empty() {
            write!(self.writer, "<{} class=\"{}\">", tag, kind)?;
        } else {
            write!(self.writer, "<{} class=\"{}\" style=\"{}\">", tag, kind, style)?;
        }
        self.write_runs(chunks, true)?;
        writeln!(self.writer, "</{}>", tag)?;
        Ok(())
    }

    fn new_page(&mut self) -> Result<(), SinkError> {
        self.state.ensure_open()?;
        writeln!(self.writer, "<hr/>")?;
        Ok(())
    }

    fn add_hrule(&mut self, attrs: &Attributes) -> Result<(), SinkError> {
        self.state.ensure_open()?;
        let mut css = String::new();
        if let Some(width) = attrs.get("width").and_then(|w| w.trim().parse::<f32>().ok()) {
            css.push_str(&format!("border-top-width:{}px;", width));
        }
        if let Some(percent) = attrs.get("percent").and_then(|p| p.trim().parse::<f32>().ok()) {
            css.push_str(&format!("width:{}%;", percent));
        }
        if css.is_empty() {
            writeln!(self.writer, "<hr class=\"hrule\"/>")?;
        } else {
            writeln!(self.writer, "<hr class=\"hrule\" style=\"{}\"/>", css)?;
        }
        Ok(())
    }

    fn add_image(&mut self, attrs: &Attributes) -> Result<(), SinkError> {
        self.state.ensure_open()?;
        let Some(src) = attrs.get("src") else {
            log::warn!("Image without src skipped");
            return Ok(());
        };
        let mut img = format!("<img src=\"{}\"", escape_attr(src));
        for key in ["width", "height"] {
            if let Some(v) = attrs.get(key) {
                img.push_str(&format!(" {}=\"{}\"", key, escape_attr(v)));
            }
        }
        writeln!(self.writer, "<p class=\"image\">{}/></p>", img)?;
        Ok(())
    }

    fn write_table(&mut self, table: &TableModel) -> Result<(), SinkError> {
        self.state.ensure_open()?;
        let percent = table.width_fraction() * 100.0;
        writeln!(self.writer, "<table class=\"table\" style=\"width:{}%;\">", percent)?;
        for row in &table.rows {
            self.writer.write_all(b"<tr>")?;
            for cell in &row.cells {
                self.write_cell(cell)?;
            }
            writeln!(self.writer, "</tr>")?;
        }
        writeln!(self.writer, "</table>")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use textpdf_types::TableRow;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs.iter().copied().collect()
    }

    fn render(f: impl FnOnce(&mut HtmlSink<Vec<u8>>)) -> String {
        let mut sink = HtmlSink::new(Vec::new());
        sink.open(&DocumentConfig::default()).unwrap();
        f(&mut sink);
        sink.close().unwrap();
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn header_carries_metadata_and_links() {
        let config = DocumentConfig {
            title: Some("Report & Co".into()),
            author: Some("Ada".into()),
            stylesheets: vec!["style.css".into()],
            scripts: vec!["app.js".into()],
            ..Default::default()
        };
        let mut sink = HtmlSink::new(Vec::new());
        sink.open(&config).unwrap();
        sink.close().unwrap();
        let html = String::from_utf8(sink.into_inner()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Report &amp; Co</title>"));
        assert!(html.contains(r#"<meta name="author" content="Ada"/>"#));
        assert!(html.contains(r#"<meta name="generator" content="textpdf"/>"#));
        assert!(!html.contains(r#"name="keywords""#));
        assert!(html.contains(r#"<link rel="stylesheet" type="text/css" href="style.css"/>"#));
        assert!(html.contains(r#"<script type="text/javascript" src="app.js"></script>"#));
        assert!(html.trim_end().ends_with("</body>\n</html>"));
    }

    #[test]
    fn title_block() {
        let html = render(|s| {
            s.write_block(BlockKind::Title, &[TextChunk::new("Hello", Attributes::new())]).unwrap();
        });
        assert!(html.contains(r#"<h1 class="title">Hello</h1>"#));
    }

    #[test]
    fn first_run_styles_the_block_and_later_runs_are_spans() {
        let html = render(|s| {
            let chunks = [
                TextChunk::new("Lead", attrs(&[("font-style", "bold"), ("indent", "22"), ("align", "center")])),
                TextChunk::new("tail", attrs(&[("font-style", "italic,underline")])),
                TextChunk::new("<x>", Attributes::new()),
            ];
            s.write_block(BlockKind::Para, &chunks).unwrap();
        });
        assert!(html.contains(
            r#"<p class="para" style="font-weight:bold;text-indent:22px;text-align:center;">Lead<span style="font-style:italic;text-decoration:underline;">tail</span><span>&lt;x&gt;</span></p>"#
        ));
    }

    #[test]
    fn placeholders_become_inputs() {
        let html = render(|s| {
            let chunks = [
                TextChunk::new("Name: ", Attributes::new()),
                TextChunk::value("Ada", attrs(&[("id", "name"), ("font-style", "bold,underline")])),
                TextChunk::value("", attrs(&[("id", "zip"), ("minlen", "6")])),
            ];
            s.write_block(BlockKind::Para, &chunks).unwrap();
        });
        assert!(html.contains(r#"<input type="text" id="name" name="name"/>"#));
        assert!(html.contains(r#"<input type="text" id="zip" name="zip" size="6"/>"#));
    }

    #[test]
    fn page_breaks_are_rules_and_other_kinds_are_skipped() {
        let html = render(|s| {
            s.new_page().unwrap();
            s.write_block(BlockKind::Image, &[TextChunk::new("x", Attributes::new())]).unwrap();
        });
        assert!(html.contains("<hr/>"));
        assert!(!html.contains(">x<"));
    }

    #[test]
    fn tables_render_rows_and_spans() {
        let cell = |text: &str, a: &[(&str, &str)]| TableCell {
            attrs: attrs(a),
            chunks: vec![TextChunk::new(text, Attributes::new())],
        };
        let table = TableModel {
            attrs: attrs(&[("width", "50")]),
            rows: vec![TableRow {
                attrs: Attributes::new(),
                cells: vec![cell("a", &[("colspan", "2")]), cell("b", &[("align", "right")])],
            }],
        };
        let html = render(|s| s.write_table(&table).unwrap());
        assert!(html.contains(r#"<table class="table" style="width:50%;">"#));
        assert!(html.contains(
            r#"<tr><td colspan="2"><span>a</span></td><td style="text-align:right;"><span>b</span></td></tr>"#
        ));
    }

    #[test]
    fn lifecycle_is_enforced() {
        let mut sink = HtmlSink::new(Vec::new());
        assert!(sink.write_block(BlockKind::Para, &[]).is_err());
        sink.set_page_size("a5".parse().unwrap()).unwrap();
        sink.open(&DocumentConfig::default()).unwrap();
        assert!(sink.is_open());
        assert!(sink.open(&DocumentConfig::default()).is_err());
        assert!(matches!(sink.set_page_size(PageSize::A4), Err(SinkError::Frozen(_))));
        sink.close().unwrap();
        assert!(!sink.is_open());
        assert!(sink.new_page().is_err());
    }
}
