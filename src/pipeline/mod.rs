mod builder;
mod config;
mod orchestrator;

pub use builder::TextPdfBuilder;
pub use config::{OutputFormat, RenderOptions, Stamps};
pub use orchestrator::{TextPdf, apply_stamps, default_output_path};
