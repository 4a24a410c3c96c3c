//! textpdf renders XML document templates filled with JSON data into PDF or HTML.
//!
//! ```no_run
//! use textpdf::{DataBinding, TextPdfBuilder};
//!
//! let pipeline = TextPdfBuilder::new().build()?;
//! let data = DataBinding::from_json_str(r#"{"data": {"name": "Ada"}}"#)?;
//! let template = r#"<textpdf><para>Name: <value id="name"/></para></textpdf>"#;
//! let (pdf, _report) = pipeline.render_to_writer(template.as_bytes(), &data, Vec::new())?;
//! # Ok::<(), textpdf::PipelineError>(())
//! ```

#[cfg(feature = "native")]
pub mod convert;
mod error;
mod pipeline;

pub use error::PipelineError;
pub use pipeline::{OutputFormat, RenderOptions, Stamps, TextPdf, TextPdfBuilder, apply_stamps, default_output_path};

pub use textpdf_pdf_composer::{ImageMarker, MarkerStyle, PageNumbers, TextMarker};
pub use textpdf_render_lopdf::{BlockDefaults, BlockStyle};
pub use textpdf_style::{FontFamily, FontStyles, PageMargins, PageSize, TextAlign};
pub use textpdf_template::{DataBinding, Diagnostic, RenderReport, TemplateError};
pub use textpdf_types::BlockKind;
