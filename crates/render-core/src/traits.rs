use crate::error::SinkError;
use textpdf_style::{DocumentConfig, PageMargins, PageSize};
use textpdf_types::{Attributes, BlockKind, TableModel, TextChunk};

/// A backend that receives completed blocks from the template engine.
///
/// Calls arrive in document order: one `open`, any number of content calls,
/// one `close`. Implementations reject content calls outside that window.
pub trait BlockSink {
    /// Overrides the page size before `open`. Fails with [`SinkError::Frozen`] afterwards.
    fn set_page_size(&mut self, size: PageSize) -> Result<(), SinkError>;

    /// Overrides the margins before `open`. Fails with [`SinkError::Frozen`] afterwards.
    fn set_page_margin(&mut self, margins: PageMargins) -> Result<(), SinkError>;

    fn open(&mut self, config: &DocumentConfig) -> Result<(), SinkError>;

    fn close(&mut self) -> Result<(), SinkError>;

    fn is_open(&self) -> bool;

    fn write_block(&mut self, kind: BlockKind, chunks: &[TextChunk]) -> Result<(), SinkError>;

    fn new_page(&mut self) -> Result<(), SinkError>;

    fn add_hrule(&mut self, attrs: &Attributes) -> Result<(), SinkError>;

    fn add_image(&mut self, attrs: &Attributes) -> Result<(), SinkError>;

    fn write_table(&mut self, table: &TableModel) -> Result<(), SinkError>;
}

/// Open/closed bookkeeping shared by the sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkState {
    #[default]
    Idle,
    Open,
    Closed,
}

impl SinkState {
    pub fn ensure_open(self) -> Result<(), SinkError> {
        match self {
            SinkState::Open => Ok(()),
            SinkState::Idle => Err(SinkError::NotOpen),
            SinkState::Closed => Err(SinkError::Closed),
        }
    }

    pub fn begin(&mut self) -> Result<(), SinkError> {
        match self {
            SinkState::Idle => {
                *self = SinkState::Open;
                Ok(())
            }
            SinkState::Open => Err(SinkError::AlreadyOpen),
            SinkState::Closed => Err(SinkError::Closed),
        }
    }

    pub fn end(&mut self) -> Result<(), SinkError> {
        self.ensure_open()?;
        *self = SinkState::Closed;
        Ok(())
    }

    /// Setters are only allowed before the sink has been opened.
    pub fn ensure_mutable(self, what: &'static str) -> Result<(), SinkError> {
        match self {
            SinkState::Idle => Ok(()),
            _ => Err(SinkError::Frozen(what)),
        }
    }
}
