use crate::attributes::Attributes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A contiguous piece of text sharing one set of inherited attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub contents: String,
    pub attrs: Attributes,
    /// Set when the run was produced by a `<value>` placeholder. Placeholder
    /// runs may have empty contents.
    pub is_value: bool,
}

impl TextChunk {
    pub fn new(contents: impl Into<String>, attrs: Attributes) -> Self {
        Self { contents: contents.into(), attrs, is_value: false }
    }

    pub fn value(contents: impl Into<String>, attrs: Attributes) -> Self {
        Self { contents: contents.into(), attrs, is_value: true }
    }

    /// True for a non-placeholder run made only of whitespace.
    pub fn is_blank(&self) -> bool {
        !self.is_value && self.contents.chars().all(char::is_whitespace)
    }

    pub fn has_style(&self, style: &str) -> bool {
        self.attrs.font_style_tokens().any(|t| t.eq_ignore_ascii_case(style))
    }
}

/// The closed set of block kinds a sink can be asked to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Title,
    Chapter,
    Section,
    Para,
    Pagebreak,
    Hrule,
    Image,
    Table,
}

impl BlockKind {
    pub const ALL: [BlockKind; 8] = [
        BlockKind::Title,
        BlockKind::Chapter,
        BlockKind::Section,
        BlockKind::Para,
        BlockKind::Pagebreak,
        BlockKind::Hrule,
        BlockKind::Image,
        BlockKind::Table,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Title => "title",
            BlockKind::Chapter => "chapter",
            BlockKind::Section => "section",
            BlockKind::Para => "para",
            BlockKind::Pagebreak => "pagebreak",
            BlockKind::Hrule => "hrule",
            BlockKind::Image => "image",
            BlockKind::Table => "table",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str().eq_ignore_ascii_case(name))
    }

    /// Kinds whose element collects text runs (`title`, `chapter`, `section`, `para`).
    pub fn is_text_block(self) -> bool {
        matches!(self, BlockKind::Title | BlockKind::Chapter | BlockKind::Section | BlockKind::Para)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cell of a table, holding runs collected the same way a block does.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub attrs: Attributes,
    pub chunks: Vec<TextChunk>,
}

impl TableCell {
    /// Number of grid columns this cell spans; always at least 1.
    pub fn colspan(&self) -> usize {
        self.attrs
            .get("colspan")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(1)
    }

    pub fn text(&self) -> String {
        self.chunks.iter().map(|c| c.contents.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub attrs: Attributes,
    pub cells: Vec<TableCell>,
}

impl TableRow {
    pub fn span(&self) -> usize {
        self.cells.iter().map(TableCell::colspan).sum()
    }
}

/// A fully collected `<table>` element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableModel {
    pub attrs: Attributes,
    pub rows: Vec<TableRow>,
}

impl TableModel {
    /// Relative column widths from the `columns` attribute. Falls back to
    /// equal widths sized by the widest row when the attribute is absent or
    /// contains no usable numbers.
    pub fn column_weights(&self) -> Vec<f32> {
        let declared: Vec<f32> = self
            .attrs
            .get("columns")
            .map(|v| {
                v.split(',')
                    .filter_map(|s| s.trim().parse::<f32>().ok())
                    .filter(|w| *w > 0.0)
                    .collect()
            })
            .unwrap_or_default();
        if !declared.is_empty() {
            return declared;
        }
        let widest = self.rows.iter().map(TableRow::span).max().unwrap_or(0).max(1);
        vec![1.0; widest]
    }

    /// Table width as a fraction of the available width (`width` is a percentage).
    pub fn width_fraction(&self) -> f32 {
        self.attrs
            .get("width")
            .and_then(|v| v.trim().trim_end_matches('%').parse::<f32>().ok())
            .filter(|p| *p > 0.0 && *p <= 100.0)
            .map(|p| p / 100.0)
            .unwrap_or(1.0)
    }
}
