use textpdf_render_core::SinkError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error at byte {position}: {source}")]
    Xml {
        #[source]
        source: quick_xml::Error,
        position: u64,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    Data(String),

    #[error("Invalid template structure: {0}")]
    Structure(String),

    #[error("Output failed: {0}")]
    Sink(#[from] SinkError),
}
