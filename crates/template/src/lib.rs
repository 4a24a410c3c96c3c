//! The textpdf template engine.
//!
//! Templates are XML documents rooted at `<textpdf>`. The engine streams
//! through them once, splices values from a [`DataBinding`] into `<value>`
//! placeholders, and hands each finished block of styled runs to a
//! [`textpdf_render_core::BlockSink`].

mod binding;
mod driver;
mod engine;
mod error;

pub use binding::{DataBinding, LookupMiss};
pub use driver::{TemplateHandler, drive};
pub use engine::{Diagnostic, ROOT_ELEMENT, RenderReport, TemplateEngine, normalize_text, render};
pub use error::TemplateError;
