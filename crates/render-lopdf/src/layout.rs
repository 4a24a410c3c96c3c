//! Turns styled runs into positioned lines.
//!
//! Layout is measured with the half-em/full-em metrics from
//! [`textpdf_render_core::utils`], which is exact for the non-embedded CJK
//! fonts the writer references.

use crate::defaults::BlockStyle;
use log::warn;
use textpdf_render_core::utils::{char_advance_em, is_wide, logical_len, text_width};
use textpdf_style::parsers::{parse_points, parse_value};
use textpdf_style::{FontFamily, FontStyles, TextAlign};
use textpdf_types::{Attributes, TextChunk};

/// Line height as a multiple of the largest font size on the line.
pub const LEADING: f32 = 1.5;
/// Baseline position as a fraction of the line height, measured from the top.
pub const BASELINE: f32 = 0.8;

const SUPER_RISE: f32 = 6.0;
const SUB_RISE: f32 = -3.0;
const SCRIPT_SIZE: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStyle {
    pub family: FontFamily,
    pub size: f32,
    pub styles: FontStyles,
    /// Baseline shift in points (`Ts`).
    pub rise: f32,
    /// An empty placeholder padded out to `minlen`; drawn as a thin underline only.
    pub blank_underline: bool,
    /// The run must not be broken across lines.
    pub keep_together: bool,
}

impl RunStyle {
    pub fn resolve(block: &BlockStyle, attrs: &Attributes) -> Self {
        let family = match attrs.get("font-family") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{}; using the block font", e);
                block.family
            }),
            None => block.family,
        };

        let (run_styles, unknown) = FontStyles::from_tokens(attrs.font_style_tokens());
        if !unknown.is_empty() {
            warn!("Ignoring unknown font-style values: {}", unknown.join(", "));
        }

        let explicit_size = points(attrs, "font-size").filter(|s| *s > 0.0);
        let mut size = explicit_size.unwrap_or(block.font_size);
        let mut rise = 0.0;
        if flag(attrs, "super") {
            rise = SUPER_RISE;
            size = explicit_size.unwrap_or(SCRIPT_SIZE);
        } else if flag(attrs, "sub") {
            rise = SUB_RISE;
            size = explicit_size.unwrap_or(SCRIPT_SIZE);
        }

        Self {
            family,
            size,
            styles: block.styles.union(run_styles),
            rise,
            blank_underline: false,
            keep_together: false,
        }
    }
}

/// True when `key` is present and not explicitly switched off.
pub(crate) fn flag(attrs: &Attributes, key: &str) -> bool {
    attrs
        .get(key)
        .is_some_and(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no"))
}

/// Reads a non-negative length attribute, warning about unusable values.
pub(crate) fn points(attrs: &Attributes, key: &str) -> Option<f32> {
    let raw = attrs.get(key)?;
    match parse_value(parse_points, raw, key) {
        Ok(v) if v >= 0.0 => Some(v),
        Ok(_) | Err(_) => {
            warn!("Ignoring invalid value for '{}': {}", key, raw);
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyledRun {
    pub text: String,
    pub style: RunStyle,
}

/// The block style after applying the overrides carried by the first run.
pub fn paragraph_style(block: &BlockStyle, chunks: &[TextChunk]) -> BlockStyle {
    let mut style = *block;
    let Some(first) = chunks.first() else {
        return style;
    };
    if let Some(raw) = first.attrs.get("align") {
        match raw.parse::<TextAlign>() {
            Ok(align) => style.align = align,
            Err(e) => warn!("{}", e),
        }
    }
    if let Some(indent) = points(&first.attrs, "indent") {
        style.indent = indent;
    }
    if let Some(before) = points(&first.attrs, "space-before") {
        style.space_before = before;
    }
    if let Some(after) = points(&first.attrs, "space-after") {
        style.space_after = after;
    }
    style
}

/// Resolves every chunk's style and applies `minlen` padding.
pub fn prepare_runs(block: &BlockStyle, chunks: &[TextChunk]) -> Vec<StyledRun> {
    chunks
        .iter()
        .map(|chunk| {
            let mut style = RunStyle::resolve(block, &chunk.attrs);
            let mut text = chunk.contents.clone();
            if let Some(minlen) = chunk.attrs.get("minlen") {
                match minlen.trim().parse::<usize>() {
                    Ok(minlen) => {
                        if text.is_empty() && minlen > 0 {
                            style.blank_underline = true;
                        }
                        let pad = minlen.saturating_sub(logical_len(&text));
                        text.extend(std::iter::repeat_n(' ', pad));
                        style.keep_together = true;
                    }
                    Err(_) => warn!("Ignoring invalid minlen '{}'", minlen),
                }
            }
            StyledRun { text, style }
        })
        .collect()
}

/// A horizontal slice of one run placed on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub style: RunStyle,
    /// Offset from the start of the line at zero character spacing.
    pub x: f32,
    pub width: f32,
    /// Characters on the line before this fragment; used to shift fragments
    /// when justification adds character spacing.
    pub chars_before: usize,
}

impl Fragment {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub fragments: Vec<Fragment>,
    /// Natural width, excluding trailing break spaces.
    pub width: f32,
    /// Characters counted in `width`.
    pub chars: usize,
    pub max_size: f32,
    /// Ends the paragraph or was ended by `\n`; never justified.
    pub hard_end: bool,
    pub first: bool,
}

impl Line {
    pub fn height(&self) -> f32 {
        self.max_size * LEADING
    }

    pub fn baseline(&self) -> f32 {
        self.height() * BASELINE
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Horizontal start offset and character spacing for this line inside a
    /// box of `width` points.
    pub fn placement(&self, width: f32, indent: f32, align: TextAlign) -> (f32, f32) {
        let lead = if self.first { indent } else { 0.0 };
        let slack = (width - lead - self.width).max(0.0);
        match align {
            TextAlign::Left => (lead, 0.0),
            TextAlign::Center => (lead + slack / 2.0, 0.0),
            TextAlign::Right => (lead + slack, 0.0),
            TextAlign::Justified => {
                if self.hard_end || self.chars < 2 {
                    (lead, 0.0)
                } else {
                    (lead, slack / (self.chars - 1) as f32)
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Piece {
    run: usize,
    text: String,
    width: f32,
}

#[derive(Debug, Clone, Default)]
struct Word {
    pieces: Vec<Piece>,
    /// Width of the trailing break space, if the word ends with one.
    trailing: f32,
    forced_break: bool,
}

impl Word {
    fn push(&mut self, run: usize, c: char, size: f32) {
        let width = char_advance_em(c) * size;
        match self.pieces.last_mut() {
            Some(piece) if piece.run == run => {
                piece.text.push(c);
                piece.width += width;
            }
            _ => self.pieces.push(Piece { run, text: c.to_string(), width }),
        }
    }

    fn width(&self) -> f32 {
        self.pieces.iter().map(|p| p.width).sum()
    }

    fn content_width(&self) -> f32 {
        self.width() - self.trailing
    }

    fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}

fn split_words(runs: &[StyledRun]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current = Word::default();
    for (idx, run) in runs.iter().enumerate() {
        let size = run.style.size;
        for c in run.text.chars() {
            if c == '\n' {
                current.forced_break = true;
                words.push(std::mem::take(&mut current));
                continue;
            }
            if c == '\r' {
                continue;
            }
            if run.style.keep_together {
                current.push(idx, c, size);
                continue;
            }
            if is_wide(c) {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
                current.push(idx, c, size);
                words.push(std::mem::take(&mut current));
                continue;
            }
            current.push(idx, c, size);
            match c {
                ' ' | '\t' => {
                    current.trailing = text_width(" ", size);
                    words.push(std::mem::take(&mut current));
                }
                '-' | '|' => words.push(std::mem::take(&mut current)),
                _ => {}
            }
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Breaks a word that cannot fit on any line into pieces no wider than `limit`.
fn split_overlong(word: Word, limit: f32, runs: &[StyledRun]) -> Vec<Word> {
    let mut parts = Vec::new();
    let mut current = Word::default();
    let mut width = 0.0;
    for piece in word.pieces {
        let size = runs[piece.run].style.size;
        for c in piece.text.chars() {
            let w = char_advance_em(c) * size;
            if !current.is_empty() && width + w > limit {
                parts.push(std::mem::take(&mut current));
                width = 0.0;
            }
            current.push(piece.run, c, size);
            width += w;
        }
    }
    current.trailing = word.trailing;
    current.forced_break = word.forced_break;
    parts.push(current);
    parts
}

struct LineBuilder<'a> {
    runs: &'a [StyledRun],
    fallback_size: f32,
    lines: Vec<Line>,
    words: Vec<Word>,
}

impl LineBuilder<'_> {
    fn used(&self) -> f32 {
        self.words.iter().map(Word::width).sum()
    }

    fn emit(&mut self, hard_end: bool) {
        let words = std::mem::take(&mut self.words);
        let mut fragments: Vec<Fragment> = Vec::new();
        let mut x = 0.0;
        let mut chars = 0;
        let mut last_run = None;
        for piece in words.into_iter().flat_map(|w| w.pieces) {
            let n = piece.text.chars().count();
            match fragments.last_mut() {
                Some(frag) if last_run == Some(piece.run) => {
                    frag.text.push_str(&piece.text);
                    frag.width += piece.width;
                }
                _ => fragments.push(Fragment {
                    text: piece.text,
                    style: self.runs[piece.run].style,
                    x,
                    width: piece.width,
                    chars_before: chars,
                }),
            }
            last_run = Some(piece.run);
            x += piece.width;
            chars += n;
        }

        let mut width = x;
        let mut counted = chars;
        if let Some(last) = fragments.last() {
            let trailing: String = last.text.chars().rev().take_while(|c| *c == ' ' || *c == '\t').collect();
            if !last.style.keep_together {
                width -= text_width(&trailing, last.style.size);
                counted -= trailing.chars().count();
            }
        }

        let max_size = fragments.iter().map(|f| f.style.size).fold(0.0_f32, f32::max);
        self.lines.push(Line {
            fragments,
            width,
            chars: counted,
            max_size: if max_size > 0.0 { max_size } else { self.fallback_size },
            hard_end,
            first: self.lines.is_empty(),
        });
    }
}

/// Fills lines greedily. The first line is shortened by `indent`.
pub fn layout_lines(runs: &[StyledRun], width: f32, indent: f32, fallback_size: f32) -> Vec<Line> {
    let mut builder = LineBuilder { runs, fallback_size, lines: Vec::new(), words: Vec::new() };
    let full = width.max(1.0);

    for word in split_words(runs) {
        let available = if builder.lines.is_empty() { (full - indent).max(1.0) } else { full };
        let fits = builder.used() + word.content_width() <= available;
        if fits {
            let forced = word.forced_break;
            builder.words.push(word);
            if forced {
                builder.emit(true);
            }
            continue;
        }

        if !builder.words.is_empty() {
            builder.emit(false);
        }
        let available = if builder.lines.is_empty() { (full - indent).max(1.0) } else { full };
        let parts = if word.content_width() > available { split_overlong(word, available, runs) } else { vec![word] };
        let count = parts.len();
        for (i, part) in parts.into_iter().enumerate() {
            let forced = part.forced_break;
            builder.words.push(part);
            if i + 1 < count {
                builder.emit(false);
            } else if forced {
                builder.emit(true);
            }
        }
    }

    if !builder.words.is_empty() || builder.lines.is_empty() {
        builder.emit(true);
    }
    if let Some(last) = builder.lines.last_mut() {
        last.hard_end = true;
    }
    builder.lines
}
