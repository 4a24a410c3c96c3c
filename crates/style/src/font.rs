use crate::parsers::{StyleParseError, parse_font_family, parse_value};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The two font families every output supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontFamily {
    /// Heiti / sans-serif.
    Sans,
    /// Songti / serif.
    #[default]
    Serif,
}

impl FromStr for FontFamily {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_value(parse_font_family, s, "font-family")
    }
}

/// Synthesized style flags carried by a run's `font-style` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FontStyles {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl FontStyles {
    pub const BOLD: FontStyles = FontStyles { bold: true, italic: false, underline: false };

    /// Builds flags from `font-style` tokens. Unrecognised tokens are returned
    /// so callers can report them.
    pub fn from_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> (Self, Vec<&'a str>) {
        let mut styles = FontStyles::default();
        let mut unknown = Vec::new();
        for token in tokens {
            match token.trim().to_ascii_lowercase().as_str() {
                "bold" => styles.bold = true,
                "italic" => styles.italic = true,
                "underline" => styles.underline = true,
                "normal" | "" => {}
                _ => unknown.push(token),
            }
        }
        (styles, unknown)
    }

    pub fn union(self, other: FontStyles) -> FontStyles {
        FontStyles {
            bold: self.bold || other.bold,
            italic: self.italic || other.italic,
            underline: self.underline || other.underline,
        }
    }

    pub fn is_plain(&self) -> bool {
        !(self.bold || self.italic || self.underline)
    }
}
