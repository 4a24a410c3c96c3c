//! Helpers for inspecting generated PDFs.
#![allow(dead_code)]

use lopdf::Document as LopdfDocument;
use lopdf::content::{Content, Operation};
use textpdf_render_core::utils::decode_ucs2;

/// Decoded content stream operations of each page, in page order.
pub fn page_operations(doc: &LopdfDocument) -> Vec<Vec<Operation>> {
    doc.get_pages()
        .values()
        .map(|id| {
            let bytes = doc.get_page_content(*id).unwrap_or_default();
            Content::decode(&bytes).map(|c| c.operations).unwrap_or_default()
        })
        .collect()
}

/// The text shown on each page, decoded from the UCS-2 `Tj` operands.
pub fn page_texts(doc: &LopdfDocument) -> Vec<String> {
    page_operations(doc)
        .iter()
        .map(|ops| {
            ops.iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| op.operands.first()?.as_str().ok())
                .map(decode_ucs2)
                .collect()
        })
        .collect()
}

pub fn all_text(doc: &LopdfDocument) -> String {
    page_texts(doc).concat()
}

/// Font resource name and size of every `Tf` on `page` (zero-based).
pub fn fonts_on_page(doc: &LopdfDocument, page: usize) -> Vec<(String, f32)> {
    page_operations(doc)
        .get(page)
        .map(|ops| {
            ops.iter()
                .filter(|op| op.operator == "Tf")
                .filter_map(|op| {
                    let name = op.operands.first()?.as_name().ok()?;
                    let size = op.operands.get(1)?.as_float().ok()?;
                    Some((String::from_utf8_lossy(name).into_owned(), size))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// The `[llx lly urx ury]` MediaBox of `page`, inherited from the page tree if needed.
pub fn media_box(doc: &LopdfDocument, page: usize) -> Option<[f32; 4]> {
    let (_, id) = doc.get_pages().into_iter().nth(page)?;
    let (w, h) = textpdf_pdf_composer::page_size(doc, id).ok()?;
    Some([0.0, 0.0, w, h])
}

pub fn count_operator(doc: &LopdfDocument, operator: &str) -> usize {
    page_operations(doc).iter().flatten().filter(|op| op.operator == operator).count()
}

/// `(x, y)` of every text matrix set on `page`, in drawing order.
pub fn text_origins(doc: &LopdfDocument, page: usize) -> Vec<(f32, f32)> {
    page_operations(doc)
        .get(page)
        .map(|ops| {
            ops.iter()
                .filter(|op| op.operator == "Tm")
                .filter_map(|op| Some((op.operands.get(4)?.as_float().ok()?, op.operands.get(5)?.as_float().ok()?)))
                .collect()
        })
        .unwrap_or_default()
}

/// The text rendering mode (`Tr`) of every text object on `page`.
pub fn render_modes(doc: &LopdfDocument, page: usize) -> Vec<i64> {
    page_operations(doc)
        .get(page)
        .map(|ops| {
            ops.iter()
                .filter(|op| op.operator == "Tr")
                .filter_map(|op| op.operands.first()?.as_i64().ok())
                .collect()
        })
        .unwrap_or_default()
}
