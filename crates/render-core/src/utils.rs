use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Horizontal advance of `c` in ems. Wide (CJK) glyphs take a full em,
/// everything else printable half an em.
pub fn char_advance_em(c: char) -> f32 {
    match c.width() {
        Some(2) => 1.0,
        Some(1) => 0.5,
        _ => 0.0,
    }
}

pub fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_advance_em).sum::<f32>() * font_size
}

/// Width in character cells, counting wide glyphs as two.
pub fn logical_len(text: &str) -> usize {
    text.width()
}

pub fn is_wide(c: char) -> bool {
    c.width() == Some(2)
}

/// Encodes `text` as big-endian UCS-2 for the `UniGB-UCS2-H` CMap.
/// Characters outside the Basic Multilingual Plane become `?`.
pub fn encode_ucs2(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for c in text.chars() {
        let code = u16::try_from(c as u32).unwrap_or(b'?' as u16);
        out.extend_from_slice(&code.to_be_bytes());
    }
    out
}

/// Inverse of [`encode_ucs2`]; an odd trailing byte is ignored.
pub fn decode_ucs2(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes.chunks_exact(2).map(|p| u16::from_be_bytes([p[0], p[1]])).collect();
    String::from_utf16_lossy(&units)
}

/// Convert a top-down Y coordinate to PDF's bottom-up space.
pub fn flip_y(y: f32, page_height: f32) -> f32 {
    page_height - y
}
