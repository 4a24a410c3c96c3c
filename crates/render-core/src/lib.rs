//! Core rendering abstractions shared by the textpdf backends.
//!
//! - `BlockSink`, the capability the template engine drives
//! - `SinkError` for backend failures
//! - CJK font objects and text metrics used by the PDF writer and the stamper

mod error;
pub mod fonts;
mod traits;
pub mod utils;

pub use error::SinkError;
pub use traits::{BlockSink, SinkState};
