//! Non-embedded CJK fonts shared by the PDF writer and the post-processor.
//!
//! Both families are Adobe-GB1 CID fonts addressed through the `UniGB-UCS2-H`
//! CMap, so text is written as big-endian UCS-2 and every reader that ships
//! the Adobe CJK fallbacks can display it. A ToUnicode map is attached so the
//! text stays extractable.

use lopdf::{Dictionary, Object, ObjectId, Stream, dictionary};
use textpdf_style::FontFamily;

pub const ENCODING: &str = "UniGB-UCS2-H";

/// Names under which the fonts are registered in a page's `/Font` resources.
pub fn resource_name(family: FontFamily) -> &'static str {
    match family {
        FontFamily::Sans => "F1",
        FontFamily::Serif => "F2",
    }
}

pub fn base_font(family: FontFamily) -> &'static str {
    match family {
        FontFamily::Sans => "STHeiti-Regular",
        FontFamily::Serif => "STSong-Light",
    }
}

/// Adds the Type0 font for `family` and everything it references through
/// `add`, returning the id of the top-level font dictionary.
pub fn build_cjk_font(family: FontFamily, mut add: impl FnMut(Object) -> ObjectId) -> ObjectId {
    let name = base_font(family);
    let flags = match family {
        FontFamily::Sans => 4,
        FontFamily::Serif => 6,
    };

    let descriptor_id = add(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => name,
        "Flags" => flags,
        "FontBBox" => vec![(-25).into(), (-254).into(), 1000.into(), 880.into()],
        "ItalicAngle" => 0,
        "Ascent" => 880,
        "Descent" => -120,
        "CapHeight" => 880,
        "StemV" => 93,
    }
    .into());

    let cid_font_id = add(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType0",
        "BaseFont" => name,
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("GB1"),
            "Supplement" => 4,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => 1000,
        "W" => vec![1.into(), 95.into(), 500.into()],
    }
    .into());

    let to_unicode_id = add(Object::Stream(Stream::new(Dictionary::new(), to_unicode_cmap().into_bytes())));

    add(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => format!("{}-{}", name, ENCODING),
        "Encoding" => ENCODING,
        "DescendantFonts" => vec![Object::Reference(cid_font_id)],
        "ToUnicode" => to_unicode_id,
    }
    .into())
}

/// Identity code-to-Unicode map for the whole Basic Multilingual Plane,
/// skipping the surrogate block.
pub fn to_unicode_cmap() -> String {
    let ranges: Vec<String> = (0x00u32..=0xFF)
        .filter(|hi| !(0xD8..=0xDF).contains(hi))
        .map(|hi| format!("<{hi:02X}00> <{hi:02X}FF> <{hi:02X}00>"))
        .collect();

    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    // A bfrange section may hold at most 100 entries.
    for chunk in ranges.chunks(100) {
        cmap.push_str(&format!("{} beginbfrange\n", chunk.len()));
        for line in chunk {
            cmap.push_str(line);
            cmap.push('\n');
        }
        cmap.push_str("endbfrange\n");
    }
    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap
}
