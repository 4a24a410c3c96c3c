//! The streaming template traversal.
//!
//! The engine keeps one frame per open element below the root. Frames inside
//! a block (or table cell) carry the inherited attributes used to style text;
//! character data accumulates in a buffer that is flushed into a run whenever
//! the frame on top of the stack changes.

use crate::binding::{DataBinding, LookupMiss};
use crate::driver::{TemplateHandler, drive};
use crate::error::TemplateError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::io::BufRead;
use std::mem;
use textpdf_render_core::BlockSink;
use textpdf_style::{DocumentConfig, PageMargins, PageSize};
use textpdf_types::{Attributes, BlockKind, FONT_STYLE, TableCell, TableModel, TableRow, TextChunk};

pub const ROOT_ELEMENT: &str = "textpdf";

static LINE_BREAK_WS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[ \t\x0C\r]*\n+[ \t\x0C\r]*").expect("static regex is valid")
});

/// Collapses every newline together with the blanks around it.
pub fn normalize_text(text: &str) -> std::borrow::Cow<'_, str> {
    LINE_BREAK_WS.replace_all(text, "")
}

/// A recoverable problem found while rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub position: u64,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "byte {}: {}", self.position, self.message)
    }
}

/// What a successful render produced.
#[derive(Debug, Clone, Default)]
pub struct RenderReport {
    pub blocks_written: usize,
    pub tables_written: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Renders templates against data into a [`BlockSink`].
#[derive(Debug, Clone, Default)]
pub struct TemplateEngine {
    config: DocumentConfig,
}

impl TemplateEngine {
    pub fn new(config: DocumentConfig) -> Self {
        Self { config }
    }

    /// Reads `xml` to completion, driving `sink` from `open` to `close`.
    pub fn render<R, S>(&self, xml: R, data: &DataBinding, sink: &mut S) -> Result<RenderReport, TemplateError>
    where
        R: BufRead,
        S: BlockSink + ?Sized,
    {
        let mut config = self.config.clone();
        data.apply_metadata(&mut config);
        let mut traversal = Traversal::new(sink, data, config);
        drive(xml, &mut traversal)?;
        Ok(traversal.report)
    }
}

/// Convenience wrapper around [`TemplateEngine::render`].
pub fn render<R, S>(xml: R, data: &DataBinding, config: DocumentConfig, sink: &mut S) -> Result<RenderReport, TemplateError>
where
    R: BufRead,
    S: BlockSink + ?Sized,
{
    TemplateEngine::new(config).render(xml, data, sink)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Opened,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Block(BlockKind),
    Inline,
    Value,
    Hspace,
    Table,
    Row,
    Cell,
    /// Void elements (`break`, `hr`, ...) whose work happens at start.
    Void,
    /// Elements outside any block that contribute nothing.
    Ignored,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    attrs: Attributes,
}

const INLINE_ELEMENTS: [&str; 8] = ["b", "u", "i", "value", "hspace", "sup", "sub", "span"];

struct Traversal<'a, S: BlockSink + ?Sized> {
    sink: &'a mut S,
    data: &'a DataBinding,
    config: DocumentConfig,
    phase: Phase,
    stack: Vec<Frame>,
    chunks: Vec<TextChunk>,
    buffer: String,
    table: Option<TableModel>,
    report: RenderReport,
}

impl<'a, S: BlockSink + ?Sized> Traversal<'a, S> {
    fn new(sink: &'a mut S, data: &'a DataBinding, config: DocumentConfig) -> Self {
        Self {
            sink,
            data,
            config,
            phase: Phase::Init,
            stack: Vec::new(),
            chunks: Vec::new(),
            buffer: String::new(),
            table: None,
            report: RenderReport::default(),
        }
    }

    fn diagnose(&mut self, pos: u64, message: impl Into<String>) {
        let diagnostic = Diagnostic { position: pos, message: message.into() };
        log::warn!("{}", diagnostic);
        self.report.diagnostics.push(diagnostic);
    }

    /// Attributes of the innermost frame, or an empty map outside blocks.
    fn top_attrs(&self) -> Attributes {
        self.stack.last().map(|f| f.attrs.clone()).unwrap_or_default()
    }

    /// True when character data belongs to a block or table cell.
    fn collecting_text(&self) -> bool {
        self.stack
            .iter()
            .any(|f| matches!(f.kind, FrameKind::Block(_) | FrameKind::Cell))
    }

    fn in_cell(&self) -> bool {
        self.stack.iter().any(|f| f.kind == FrameKind::Cell)
    }

    fn innermost_structural(&self) -> Option<FrameKind> {
        self.stack
            .iter()
            .rev()
            .map(|f| f.kind)
            .find(|k| !matches!(k, FrameKind::Ignored | FrameKind::Void))
    }

    /// Turns the buffer into a run styled by `attrs`.
    fn flush(&mut self, attrs: &Attributes, is_value: bool, force: bool) {
        if self.buffer.is_empty() && !force {
            return;
        }
        let contents = mem::take(&mut self.buffer);
        self.chunks.push(TextChunk { contents, attrs: attrs.clone(), is_value });
    }

    fn flush_with_top(&mut self) {
        if let Some(top) = self.stack.last() {
            let (attrs, is_value) = (top.attrs.clone(), top.kind == FrameKind::Value);
            self.flush(&attrs, is_value, false);
        }
    }

    fn push(&mut self, kind: FrameKind, attrs: Attributes) {
        self.stack.push(Frame { kind, attrs });
    }

    // --- Root ---

    fn open_root(&mut self, attrs: &Attributes, pos: u64) -> Result<(), TemplateError> {
        if self.phase != Phase::Init {
            return Err(TemplateError::Structure(format!(
                "duplicate <{}> root element at byte {}",
                ROOT_ELEMENT, pos
            )));
        }
        if let Some(size) = attrs.get("page-size") {
            match size.parse::<PageSize>() {
                Ok(page_size) => self.config.page_size = page_size,
                Err(e) => self.diagnose(pos, format!("{}; using {}", e, self.config.page_size)),
            }
        }
        if let Some(margin) = attrs.get("page-margin") {
            match margin.parse::<PageMargins>() {
                Ok(margins) => self.config.margins = margins,
                Err(e) => self.diagnose(pos, format!("{}; expected left,right,top,bottom", e)),
            }
        }
        log::debug!("Opening sink with page size {}", self.config.page_size);
        self.sink.open(&self.config)?;
        self.phase = Phase::Opened;
        Ok(())
    }

    fn close_root(&mut self) -> Result<(), TemplateError> {
        self.sink.close()?;
        self.phase = Phase::Closed;
        Ok(())
    }

    // --- Element starts ---

    fn start_block(&mut self, kind: BlockKind, own: &Attributes, pos: u64) {
        if self.in_cell() {
            self.diagnose(pos, format!("<{}> inside a table cell is treated as inline", kind));
            self.start_inline(kind.as_str(), own, pos);
            return;
        }
        if self.collecting_text() {
            self.diagnose(pos, format!("<{}> nested inside another block", kind));
        }
        self.chunks.clear();
        self.buffer.clear();
        let attrs = self.top_attrs().inherit(own);
        self.push(FrameKind::Block(kind), attrs);
    }

    fn start_inline(&mut self, name: &str, own: &Attributes, pos: u64) {
        if !INLINE_ELEMENTS.contains(&name) && BlockKind::parse(name).is_none() {
            self.diagnose(pos, format!("unknown element <{}> treated as inline", name));
        }
        self.flush_with_top();

        let mut attrs = self.top_attrs().inherit(own);
        match name {
            "b" => attrs.add_font_style("bold"),
            "u" => attrs.add_font_style("underline"),
            "i" => attrs.add_font_style("italic"),
            "sup" => attrs.insert("super", "true"),
            "sub" => attrs.insert("sub", "true"),
            _ => {}
        }

        let kind = match name {
            "value" => {
                match own.get("id") {
                    None => {
                        self.diagnose(pos, "<value> without an id");
                        self.push(FrameKind::Inline, attrs);
                        return;
                    }
                    Some(id) => match self.data.lookup(id) {
                        Ok(value) => {
                            self.buffer.push_str(value);
                            if !own.contains_key(FONT_STYLE) {
                                attrs.add_font_style("bold,underline");
                            }
                        }
                        Err(LookupMiss::NotString) => {
                            self.diagnose(pos, format!("data value '{}' is not a string", id))
                        }
                        Err(miss) => self.diagnose(pos, format!("no data for <value id=\"{}\">: {}", id, miss)),
                    },
                }
                FrameKind::Value
            }
            "hspace" => {
                let count = match own.get("size") {
                    None => 1,
                    Some(size) => match size.trim().parse::<usize>() {
                        Ok(n) => n,
                        Err(_) => {
                            self.diagnose(pos, format!("bad hspace size '{}'", size));
                            0
                        }
                    },
                };
                self.buffer.extend(std::iter::repeat_n(' ', count));
                FrameKind::Hspace
            }
            _ => FrameKind::Inline,
        };
        self.push(kind, attrs);
    }

    fn start_table(&mut self, own: &Attributes, pos: u64) {
        if self.collecting_text() || self.table.is_some() {
            self.diagnose(pos, "<table> is only allowed between blocks; ignored");
            self.push(FrameKind::Ignored, self.top_attrs());
            return;
        }
        self.table = Some(TableModel { attrs: own.clone(), rows: Vec::new() });
        let attrs = self.top_attrs().inherit(own);
        self.push(FrameKind::Table, attrs);
    }

    fn start_row(&mut self, own: &Attributes, pos: u64) {
        if self.innermost_structural() != Some(FrameKind::Table) {
            self.diagnose(pos, "<tr> outside <table>; ignored");
            self.push(FrameKind::Ignored, self.top_attrs());
            return;
        }
        if let Some(table) = self.table.as_mut() {
            table.rows.push(TableRow { attrs: own.clone(), cells: Vec::new() });
        }
        let attrs = self.top_attrs().inherit(own);
        self.push(FrameKind::Row, attrs);
    }

    fn start_cell(&mut self, own: &Attributes, pos: u64) {
        if self.innermost_structural() != Some(FrameKind::Row) {
            self.diagnose(pos, "<cell> outside <tr>; ignored");
            self.push(FrameKind::Ignored, self.top_attrs());
            return;
        }
        self.chunks.clear();
        self.buffer.clear();
        let attrs = self.top_attrs().inherit(own);
        self.push(FrameKind::Cell, attrs);
    }

    fn start_void(&mut self, name: &str, own: &Attributes, pos: u64) -> Result<(), TemplateError> {
        match name {
            "break" => {
                if self.collecting_text() {
                    self.buffer.push('\n');
                } else {
                    self.diagnose(pos, "<break/> outside a block; ignored");
                }
            }
            "pagebreak" => self.sink.new_page()?,
            "hr" => self.sink.add_hrule(own)?,
            "img" => {
                if own.contains_key("src") {
                    self.sink.add_image(own)?;
                } else {
                    self.diagnose(pos, "<img> without src; ignored");
                }
            }
            _ => {}
        }
        let attrs = self.top_attrs();
        self.push(FrameKind::Void, attrs);
        Ok(())
    }

    // --- Element ends ---

    fn end_block(&mut self, kind: BlockKind, frame: Frame) -> Result<(), TemplateError> {
        self.flush(&frame.attrs, false, false);
        let mut chunks = mem::take(&mut self.chunks);
        if kind == BlockKind::Para && chunks.iter().all(TextChunk::is_blank) {
            chunks = vec![TextChunk::new(" ", frame.attrs)];
        }
        self.sink.write_block(kind, &chunks)?;
        self.report.blocks_written += 1;
        Ok(())
    }

    fn end_cell(&mut self, frame: Frame) {
        self.flush(&frame.attrs, false, false);
        let chunks = mem::take(&mut self.chunks);
        if let Some(row) = self.table.as_mut().and_then(|t| t.rows.last_mut()) {
            row.cells.push(TableCell { attrs: frame.attrs, chunks });
        }
    }

    fn end_table(&mut self) -> Result<(), TemplateError> {
        if let Some(table) = self.table.take() {
            self.sink.write_table(&table)?;
            self.report.tables_written += 1;
        }
        Ok(())
    }
}

impl<S: BlockSink + ?Sized> TemplateHandler for Traversal<'_, S> {
    fn start_element(&mut self, name: &str, attrs: Attributes, pos: u64) -> Result<(), TemplateError> {
        match self.phase {
            Phase::Init if name == ROOT_ELEMENT => return self.open_root(&attrs, pos),
            Phase::Init => {
                return Err(TemplateError::Structure(format!(
                    "expected <{}> root element, found <{}>",
                    ROOT_ELEMENT, name
                )));
            }
            Phase::Closed => {
                return Err(TemplateError::Structure(format!(
                    "<{}> after the root element was closed",
                    name
                )));
            }
            Phase::Opened => {}
        }

        if name == ROOT_ELEMENT {
            return self.open_root(&attrs, pos);
        }

        match name {
            "break" | "pagebreak" | "hr" | "img" => self.start_void(name, &attrs, pos)?,
            "table" => self.start_table(&attrs, pos),
            "tr" => self.start_row(&attrs, pos),
            "cell" => self.start_cell(&attrs, pos),
            _ => match BlockKind::parse(name).filter(|k| k.is_text_block()) {
                Some(kind) => self.start_block(kind, &attrs, pos),
                None if self.collecting_text() => self.start_inline(name, &attrs, pos),
                None => {
                    self.diagnose(pos, format!("<{}> outside a block; ignored", name));
                    self.push(FrameKind::Ignored, Attributes::new());
                }
            },
        }
        Ok(())
    }

    fn end_element(&mut self, name: &str, _pos: u64) -> Result<(), TemplateError> {
        if self.phase != Phase::Opened {
            return Ok(());
        }
        let Some(frame) = self.stack.pop() else {
            if name == ROOT_ELEMENT {
                return self.close_root();
            }
            return Ok(());
        };

        match frame.kind {
            FrameKind::Block(kind) => self.end_block(kind, frame)?,
            FrameKind::Value => self.flush(&frame.attrs, true, true),
            FrameKind::Inline | FrameKind::Hspace => self.flush(&frame.attrs, false, false),
            FrameKind::Cell => self.end_cell(frame),
            FrameKind::Table => self.end_table()?,
            FrameKind::Row | FrameKind::Void | FrameKind::Ignored => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str, pos: u64) -> Result<(), TemplateError> {
        if self.phase == Phase::Opened && self.collecting_text() {
            self.buffer.push_str(&normalize_text(text));
        } else if !text.trim().is_empty() {
            self.diagnose(pos, "text outside a block discarded");
        }
        Ok(())
    }

    fn end_document(&mut self, pos: u64) -> Result<(), TemplateError> {
        match self.phase {
            Phase::Closed => Ok(()),
            Phase::Init => Err(TemplateError::Structure(format!(
                "no <{}> root element found",
                ROOT_ELEMENT
            ))),
            Phase::Opened => Err(TemplateError::Structure(format!(
                "document ended at byte {} before </{}>",
                pos, ROOT_ELEMENT
            ))),
        }
    }
}
