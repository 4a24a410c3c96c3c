use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF generation error: {0}")]
    Pdf(String),
    #[error("Sink is already open")]
    AlreadyOpen,
    #[error("Sink is not open")]
    NotOpen,
    #[error("Sink is closed")]
    Closed,
    #[error("Cannot change {0} after the sink has been opened")]
    Frozen(&'static str),
    #[error("Other rendering error: {0}")]
    Other(String),
}

impl From<lopdf::Error> for SinkError {
    fn from(err: lopdf::Error) -> Self {
        SinkError::Pdf(err.to_string())
    }
}

impl From<&str> for SinkError {
    fn from(s: &str) -> Self {
        SinkError::Other(s.to_string())
    }
}
