use std::path::PathBuf;
use textpdf_pdf_composer::ComposerError;
use textpdf_render_core::SinkError;
use textpdf_template::TemplateError;
use thiserror::Error;

/// Everything that can stop a document from being produced.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Template(#[from] TemplateError),

    #[error("Rendering failed: {0}")]
    Sink(#[from] SinkError),

    #[error("Post-processing failed: {0}")]
    Compose(#[from] ComposerError),

    #[error("{} already exists", .0.display())]
    OutputExists(PathBuf),

    #[error("Document conversion failed: {0}")]
    Convert(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<lopdf::Error> for PipelineError {
    fn from(e: lopdf::Error) -> Self {
        PipelineError::Compose(ComposerError::Pdf(e))
    }
}
