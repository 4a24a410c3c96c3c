//! Streaming PDF output for textpdf templates, built on lopdf.
//!
//! [`PdfSink`] lays each block out as soon as it arrives and writes full pages
//! straight to the output, so memory use stays flat regardless of document
//! length.

mod canvas;
mod defaults;
mod images;
mod layout;
mod sink;
mod table;
mod writer;

pub use defaults::{BlockDefaults, BlockStyle};
pub use layout::{LEADING, RunStyle};
pub use sink::{PDF_VERSION, PRODUCER, PdfSink, text_string};
pub use writer::StreamingPdfWriter;
