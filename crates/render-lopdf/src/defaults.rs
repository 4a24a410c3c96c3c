use textpdf_style::{FontFamily, FontStyles, TextAlign};
use textpdf_types::BlockKind;

/// Typography applied to every run of a text block unless the run overrides it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockStyle {
    pub family: FontFamily,
    pub font_size: f32,
    pub styles: FontStyles,
    pub align: TextAlign,
    /// First-line indent in points.
    pub indent: f32,
    pub space_before: f32,
    pub space_after: f32,
}

impl BlockStyle {
    const fn new(family: FontFamily, font_size: f32, styles: FontStyles, align: TextAlign) -> Self {
        Self { family, font_size, styles, align, indent: 0.0, space_before: 0.0, space_after: 0.0 }
    }

    const fn spaced(mut self, indent: f32, before: f32, after: f32) -> Self {
        self.indent = indent;
        self.space_before = before;
        self.space_after = after;
        self
    }
}

/// Styles for the four text block kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDefaults {
    pub title: BlockStyle,
    pub chapter: BlockStyle,
    pub section: BlockStyle,
    pub para: BlockStyle,
}

impl Default for BlockDefaults {
    fn default() -> Self {
        Self {
            title: BlockStyle::new(FontFamily::Sans, 18.0, FontStyles::BOLD, TextAlign::Center).spaced(0.0, 0.0, 16.0),
            chapter: BlockStyle::new(FontFamily::Serif, 16.0, FontStyles::BOLD, TextAlign::Left).spaced(0.0, 14.0, 0.0),
            section: BlockStyle::new(FontFamily::Serif, 14.0, FontStyles::BOLD, TextAlign::Left).spaced(0.0, 12.0, 0.0),
            para: BlockStyle::new(FontFamily::Serif, 12.0, FontStyles { bold: false, italic: false, underline: false }, TextAlign::Left)
                .spaced(22.0, 6.0, 0.0),
        }
    }
}

impl BlockDefaults {
    pub fn get(&self, kind: BlockKind) -> Option<&BlockStyle> {
        match kind {
            BlockKind::Title => Some(&self.title),
            BlockKind::Chapter => Some(&self.chapter),
            BlockKind::Section => Some(&self.section),
            BlockKind::Para => Some(&self.para),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, kind: BlockKind) -> Option<&mut BlockStyle> {
        match kind {
            BlockKind::Title => Some(&mut self.title),
            BlockKind::Chapter => Some(&mut self.chapter),
            BlockKind::Section => Some(&mut self.section),
            BlockKind::Para => Some(&mut self.para),
            _ => None,
        }
    }
}
