pub mod attributes;
pub mod document;

pub use attributes::{Attributes, FONT_STYLE};
pub use document::{BlockKind, TableCell, TableModel, TableRow, TextChunk};
