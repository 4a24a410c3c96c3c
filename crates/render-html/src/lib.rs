//! HTML5 output for textpdf templates.

mod escape;
mod sink;

pub use escape::{escape_attr, escape_text, unescape_text};
pub use sink::{GENERATOR, HtmlSink, block_tag, run_style};
