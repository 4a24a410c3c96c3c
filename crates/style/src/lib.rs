pub mod config;
pub mod dimension;
pub mod font;
pub mod parsers;
pub mod text;

pub use config::DocumentConfig;
pub use dimension::{PageMargins, PageSize, PaperSeries};
pub use font::{FontFamily, FontStyles};
pub use parsers::StyleParseError;
pub use text::TextAlign;
