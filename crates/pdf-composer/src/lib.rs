//! Post-processing for PDFs produced by textpdf.
//!
//! The renderer streams pages straight to disk, so anything that needs the
//! finished document (page totals, marks on every page) happens here on a
//! loaded [`lopdf::Document`]:
//! - Text watermarks, centered or tiled
//! - Image markers and QR codes
//! - "n / N" page numbers
//! - Raw content overlays and underlays

mod error;
mod page;
mod stamper;

pub use error::ComposerError;
pub use page::{overlay_content, page_size, register_resource, underlay_content};
pub use stamper::{ImageMarker, MarkerStyle, PageNumbers, QR_SIZE, Stamper, TextMarker};
