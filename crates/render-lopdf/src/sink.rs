use crate::canvas::{PageCanvas, image_ops, line_ops};
use crate::defaults::{BlockDefaults, BlockStyle};
use crate::images::{ImageCache, PlacedImage, decode_file, display_size, xobject};
use crate::layout::{layout_lines, paragraph_style, points, prepare_runs};
use crate::table::{TABLE_SPACING, draw_row, layout_table};
use crate::writer::StreamingPdfWriter;
use log::{debug, info, warn};
use lopdf::content::Content;
use lopdf::{Dictionary, Object, ObjectId, StringFormat, dictionary};
use std::io::Write;
use std::path::Path;
use textpdf_render_core::fonts::{build_cjk_font, resource_name};
use textpdf_render_core::{BlockSink, SinkError, SinkState};
use textpdf_style::{DocumentConfig, FontFamily, FontStyles, PageMargins, PageSize, TextAlign};
use textpdf_types::{Attributes, BlockKind, TableModel, TextChunk};

pub const PDF_VERSION: &str = "1.7";
pub const PRODUCER: &str = "textpdf";

/// Blank space drawn above a horizontal rule.
const RULE_GAP: f32 = 18.0;
const RULE_AFTER: f32 = 6.0;
const IMAGE_SPACING: f32 = 6.0;

enum Output<W: Write> {
    Pending(W),
    Writing(StreamingPdfWriter<W>),
    Done(W),
    Failed,
}

/// A [`BlockSink`] that lays blocks out onto pages and streams them as PDF.
///
/// Each page's content stream is written out as soon as the page is full;
/// only the page dictionaries and resources are held until `close`.
pub struct PdfSink<W: Write> {
    state: SinkState,
    config: DocumentConfig,
    defaults: BlockDefaults,
    output: Output<W>,
    page: Option<PageCanvas>,
    fonts: Vec<(FontFamily, ObjectId)>,
    images: ImageCache,
}

impl<W: Write> PdfSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            state: SinkState::Idle,
            config: DocumentConfig::new(),
            defaults: BlockDefaults::default(),
            output: Output::Pending(writer),
            page: None,
            fonts: Vec::new(),
            images: ImageCache::default(),
        }
    }

    pub fn block_defaults(&self) -> &BlockDefaults {
        &self.defaults
    }

    pub fn set_block_defaults(&mut self, defaults: BlockDefaults) -> Result<(), SinkError> {
        self.state.ensure_mutable("block defaults")?;
        self.defaults = defaults;
        Ok(())
    }

    pub fn set_block_style(&mut self, kind: BlockKind, style: BlockStyle) -> Result<(), SinkError> {
        *self.block_mut(kind)? = style;
        Ok(())
    }

    pub fn set_block_font_family(&mut self, kind: BlockKind, family: FontFamily) -> Result<(), SinkError> {
        self.block_mut(kind)?.family = family;
        Ok(())
    }

    pub fn set_block_font_size(&mut self, kind: BlockKind, size: f32) -> Result<(), SinkError> {
        if size <= 0.0 {
            return Err(SinkError::Other(format!("font size must be positive, got {}", size)));
        }
        self.block_mut(kind)?.font_size = size;
        Ok(())
    }

    pub fn set_block_font_styles(&mut self, kind: BlockKind, styles: FontStyles) -> Result<(), SinkError> {
        self.block_mut(kind)?.styles = styles;
        Ok(())
    }

    pub fn set_block_align(&mut self, kind: BlockKind, align: TextAlign) -> Result<(), SinkError> {
        self.block_mut(kind)?.align = align;
        Ok(())
    }

    pub fn set_block_indent(&mut self, kind: BlockKind, indent: f32) -> Result<(), SinkError> {
        self.block_mut(kind)?.indent = indent;
        Ok(())
    }

    pub fn set_block_spacing(&mut self, kind: BlockKind, before: f32, after: f32) -> Result<(), SinkError> {
        let style = self.block_mut(kind)?;
        style.space_before = before;
        style.space_after = after;
        Ok(())
    }

    /// Returns the underlying writer once the document has been closed.
    pub fn into_inner(self) -> Result<W, SinkError> {
        match self.output {
            Output::Done(writer) => Ok(writer),
            Output::Pending(_) => Err(SinkError::NotOpen),
            Output::Writing(_) => Err(SinkError::Other("document was not closed".into())),
            Output::Failed => Err(SinkError::Other("document output failed".into())),
        }
    }

    fn block_mut(&mut self, kind: BlockKind) -> Result<&mut BlockStyle, SinkError> {
        self.state.ensure_mutable("block defaults")?;
        self.defaults
            .get_mut(kind)
            .ok_or_else(|| SinkError::Other(format!("'{}' is not a text block", kind)))
    }

    fn writer(&mut self) -> Result<&mut StreamingPdfWriter<W>, SinkError> {
        match &mut self.output {
            Output::Writing(writer) => Ok(writer),
            _ => Err(SinkError::NotOpen),
        }
    }

    fn canvas(&mut self) -> &mut PageCanvas {
        self.page.get_or_insert_with(|| PageCanvas::new(&self.config))
    }

    fn content_width(&self) -> f32 {
        PageCanvas::new(&self.config).content_width()
    }

    /// Makes sure `height` points fit on the current page, starting a new page
    /// when they don't and the current one already has something on it.
    fn reserve(&mut self, height: f32) -> Result<(), SinkError> {
        let needs_break = self.page.as_ref().is_some_and(|p| p.has_content && !p.fits(height));
        if needs_break {
            self.finish_page()?;
        }
        self.canvas();
        Ok(())
    }

    fn finish_page(&mut self) -> Result<(), SinkError> {
        let Some(page) = self.page.take() else {
            return Ok(());
        };
        let (width, height) = (page.width, page.height);
        let content = Content { operations: page.into_operations() };
        let writer = self.writer()?;
        let content_id = writer.write_content_stream(&content)?;
        let page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => writer.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => content_id,
            "Resources" => writer.resources_id,
        };
        let page_id = writer.buffer_object(page_dict.into());
        writer.add_page(page_id);
        debug!("Finished page {}", writer.page_count());
        Ok(())
    }

    fn resources(&self) -> Dictionary {
        let mut fonts = Dictionary::new();
        for (family, id) in &self.fonts {
            fonts.set(resource_name(*family), *id);
        }
        let mut resources = dictionary! { "Font" => fonts };
        if !self.images.resources().is_empty() {
            let mut xobjects = Dictionary::new();
            for (name, id) in self.images.resources() {
                xobjects.set(name.as_bytes().to_vec(), *id);
            }
            resources.set("XObject", xobjects);
        }
        resources
    }

    fn info(&self) -> Dictionary {
        let mut info = Dictionary::new();
        let fields = [
            ("Title", &self.config.title),
            ("Author", &self.config.author),
            ("Subject", &self.config.description),
            ("Keywords", &self.config.keywords),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                info.set(key, text_string(value));
            }
        }
        info.set("Producer", text_string(PRODUCER));
        let now = chrono::Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
        info.set("CreationDate", Object::string_literal(now));
        info
    }

    fn embed_image(&mut self, src: &str) -> Result<Option<PlacedImage>, SinkError> {
        if let Some(placed) = self.images.get(src) {
            return Ok(Some(placed.clone()));
        }
        let decoded = match decode_file(Path::new(src)) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("Skipping image '{}': {}", src, e);
                return Ok(None);
            }
        };
        let placed = PlacedImage { name: self.images.next_name(), width: decoded.width, height: decoded.height };
        let id = self.writer()?.write_object(xobject(decoded).into())?;
        self.images.insert(src, placed.clone(), id);
        Ok(Some(placed))
    }
}

/// Encodes a document information string: ASCII as a literal, anything else
/// as UTF-16BE with a byte order mark.
pub fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        Object::string_literal(value)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in value.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

impl<W: Write> BlockSink for PdfSink<W> {
    fn set_page_size(&mut self, size: PageSize) -> Result<(), SinkError> {
        self.state.ensure_mutable("page size")?;
        self.config.page_size = size;
        Ok(())
    }

    fn set_page_margin(&mut self, margins: PageMargins) -> Result<(), SinkError> {
        self.state.ensure_mutable("page margins")?;
        self.config.margins = margins;
        Ok(())
    }

    fn open(&mut self, config: &DocumentConfig) -> Result<(), SinkError> {
        self.state.begin()?;
        self.config = config.clone();

        let Output::Pending(writer) = std::mem::replace(&mut self.output, Output::Failed) else {
            return Err(SinkError::AlreadyOpen);
        };
        let mut writer = StreamingPdfWriter::new(writer, PDF_VERSION)?;
        for family in [FontFamily::Sans, FontFamily::Serif] {
            let id = build_cjk_font(family, |object| writer.buffer_object(object));
            self.fonts.push((family, id));
        }
        self.output = Output::Writing(writer);
        info!("Opened PDF document ({}, margins {:?})", self.config.page_size, self.config.margins);
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.state.end()?;
        self.finish_page()?;
        if self.writer()?.page_count() == 0 {
            self.canvas();
            self.finish_page()?;
        }

        let resources = self.resources();
        let info = self.info();
        let Output::Writing(mut writer) = std::mem::replace(&mut self.output, Output::Failed) else {
            return Err(SinkError::NotOpen);
        };
        writer.set_resources(resources);
        writer.set_info(info);
        let pages = writer.page_count();
        self.output = Output::Done(writer.finish()?);
        info!("Closed PDF document with {} page(s)", pages);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state == SinkState::Open
    }

    fn write_block(&mut self, kind: BlockKind, chunks: &[TextChunk]) -> Result<(), SinkError> {
        self.state.ensure_open()?;
        let Some(base) = self.defaults.get(kind) else {
            warn!("PDF output cannot write a '{}' block as text; skipping", kind);
            return Ok(());
        };
        let style = paragraph_style(base, chunks);
        let runs = prepare_runs(&style, chunks);
        let width = self.content_width();
        let lines = layout_lines(&runs, width, style.indent, style.font_size);

        let canvas = self.canvas();
        if canvas.has_content {
            canvas.advance(style.space_before);
        }
        for line in &lines {
            self.reserve(line.height())?;
            let canvas = self.canvas();
            let (start, spacing) = line.placement(width, style.indent, style.align);
            let top = canvas.cursor;
            canvas.draw_line(line, 0.0, top, start, spacing);
            canvas.has_content = true;
            canvas.advance(line.height());
        }
        self.canvas().advance(style.space_after);
        Ok(())
    }

    fn new_page(&mut self) -> Result<(), SinkError> {
        self.state.ensure_open()?;
        match &self.page {
            Some(page) if page.has_content => self.finish_page(),
            _ => {
                debug!("Ignoring page break on an empty page");
                Ok(())
            }
        }
    }

    fn add_hrule(&mut self, attrs: &Attributes) -> Result<(), SinkError> {
        self.state.ensure_open()?;
        let thickness = points(attrs, "width").filter(|w| *w > 0.0).unwrap_or(1.0);
        let percent = points(attrs, "percent").filter(|p| *p > 0.0).unwrap_or(100.0).min(100.0);

        self.reserve(RULE_GAP + thickness)?;
        let width = self.content_width();
        let canvas = self.canvas();
        canvas.advance(RULE_GAP);
        let length = width * percent / 100.0;
        let left = (width - length) / 2.0;
        let (x1, y) = canvas.to_pdf(left, canvas.cursor + thickness / 2.0);
        canvas.extend(line_ops(x1, y, x1 + length, y, thickness));
        canvas.advance(thickness + RULE_AFTER);
        Ok(())
    }

    fn add_image(&mut self, attrs: &Attributes) -> Result<(), SinkError> {
        self.state.ensure_open()?;
        let Some(src) = attrs.get("src") else {
            warn!("<img> without a src attribute; skipping");
            return Ok(());
        };
        let Some(placed) = self.embed_image(src)? else {
            return Ok(());
        };

        let requested = (
            points(attrs, "width").filter(|w| *w > 0.0),
            points(attrs, "height").filter(|h| *h > 0.0),
        );
        let probe = PageCanvas::new(&self.config);
        let (w, h) = display_size(
            (placed.width, placed.height),
            requested,
            probe.content_width(),
            probe.content_height() - 2.0 * IMAGE_SPACING,
        );

        self.reserve(h + 2.0 * IMAGE_SPACING)?;
        let canvas = self.canvas();
        canvas.advance(IMAGE_SPACING);
        let left = (canvas.content_width() - w) / 2.0;
        let (x, y) = canvas.to_pdf(left, canvas.cursor + h);
        canvas.extend(image_ops(&placed.name, x, y, w, h));
        canvas.advance(h + IMAGE_SPACING);
        Ok(())
    }

    fn write_table(&mut self, table: &TableModel) -> Result<(), SinkError> {
        self.state.ensure_open()?;
        if table.rows.is_empty() {
            debug!("Skipping empty table");
            return Ok(());
        }
        let layout = layout_table(table, &self.defaults.para, self.content_width());

        let canvas = self.canvas();
        if canvas.has_content {
            canvas.advance(TABLE_SPACING);
        }
        for row in &layout.rows {
            self.reserve(row.height)?;
            draw_row(self.canvas(), layout.left, row);
        }
        self.canvas().advance(TABLE_SPACING);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Document;
    use textpdf_render_core::utils::decode_ucs2;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs.iter().copied().collect()
    }

    fn para(text: &str) -> Vec<TextChunk> {
        vec![TextChunk::new(text, Attributes::new())]
    }

    fn render(build: impl FnOnce(&mut PdfSink<Vec<u8>>)) -> Document {
        let mut sink = PdfSink::new(Vec::new());
        sink.open(&DocumentConfig::new()).unwrap();
        build(&mut sink);
        sink.close().unwrap();
        Document::load_mem(&sink.into_inner().unwrap()).unwrap()
    }

    fn page_texts(doc: &Document) -> Vec<String> {
        doc.get_pages()
            .values()
            .map(|id| {
                let content = Content::decode(&doc.get_page_content(*id).unwrap()).unwrap();
                content
                    .operations
                    .iter()
                    .filter(|op| op.operator == "Tj")
                    .map(|op| decode_ucs2(op.operands[0].as_str().unwrap()))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn empty_document_has_one_blank_page() {
        let doc = render(|_| {});
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn title_uses_bold_sans() {
        let doc = render(|sink| sink.write_block(BlockKind::Title, &para("Hello")).unwrap());
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let tf = content.operations.iter().find(|op| op.operator == "Tf").unwrap();
        assert_eq!(tf.operands[0].as_name().unwrap(), b"F1");
        assert_eq!(tf.operands[1].as_float().unwrap(), 18.0);
        let tr = content.operations.iter().find(|op| op.operator == "Tr").unwrap();
        assert_eq!(tr.operands[0].as_i64().unwrap(), 2);
        assert_eq!(page_texts(&doc), vec!["Hello".to_string()]);
    }

    #[test]
    fn page_breaks_split_pages_but_not_empty_ones() {
        let doc = render(|sink| {
            sink.new_page().unwrap();
            sink.write_block(BlockKind::Para, &para("one")).unwrap();
            sink.new_page().unwrap();
            sink.new_page().unwrap();
            sink.write_block(BlockKind::Para, &para("two")).unwrap();
        });
        assert_eq!(page_texts(&doc), vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn long_text_flows_onto_new_pages() {
        let text = "word ".repeat(3000);
        let doc = render(|sink| sink.write_block(BlockKind::Para, &para(&text)).unwrap());
        assert!(doc.get_pages().len() > 1);
    }

    #[test]
    fn lifecycle_is_enforced() {
        let mut sink = PdfSink::new(Vec::new());
        assert!(matches!(sink.write_block(BlockKind::Para, &para("x")), Err(SinkError::NotOpen)));
        sink.open(&DocumentConfig::new()).unwrap();
        assert!(sink.is_open());
        assert!(matches!(sink.open(&DocumentConfig::new()), Err(SinkError::AlreadyOpen)));
        assert!(matches!(sink.set_page_size(PageSize::A4), Err(SinkError::Frozen(_))));
        assert!(matches!(sink.set_block_font_size(BlockKind::Para, 10.0), Err(SinkError::Frozen(_))));
        sink.close().unwrap();
        assert!(matches!(sink.new_page(), Err(SinkError::Closed)));
        assert!(matches!(sink.close(), Err(SinkError::Closed)));
    }

    #[test]
    fn block_setters_apply_before_open() {
        let mut sink = PdfSink::new(Vec::new());
        sink.set_block_font_size(BlockKind::Para, 10.0).unwrap();
        sink.set_block_font_family(BlockKind::Para, FontFamily::Sans).unwrap();
        assert!(sink.set_block_align(BlockKind::Hrule, TextAlign::Center).is_err());
        assert!(sink.set_block_font_size(BlockKind::Para, 0.0).is_err());
        assert_eq!(sink.block_defaults().para.font_size, 10.0);
        assert_eq!(sink.block_defaults().para.family, FontFamily::Sans);
    }

    #[test]
    fn info_dictionary_carries_metadata() {
        let mut config = DocumentConfig::new();
        config.title = Some("报告".into());
        config.author = Some("Ada".into());
        let mut sink = PdfSink::new(Vec::new());
        sink.open(&config).unwrap();
        sink.close().unwrap();
        let doc = Document::load_mem(&sink.into_inner().unwrap()).unwrap();

        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_object(info_id).unwrap().as_dict().unwrap();
        assert_eq!(info.get(b"Author").unwrap().as_str().unwrap(), b"Ada");
        assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), &[0xFE, 0xFF, 0x62, 0xA5, 0x54, 0x4A]);
        assert_eq!(info.get(b"Producer").unwrap().as_str().unwrap(), PRODUCER.as_bytes());
    }

    #[test]
    fn page_size_follows_config() {
        let mut config = DocumentConfig::new();
        config.page_size = "a5".parse().unwrap();
        let mut sink = PdfSink::new(Vec::new());
        sink.open(&config).unwrap();
        sink.write_block(BlockKind::Para, &para("x")).unwrap();
        sink.close().unwrap();
        let doc = Document::load_mem(&sink.into_inner().unwrap()).unwrap();
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_float().unwrap(), 420.0);
    }

    #[test]
    fn rules_tables_and_missing_images() {
        let doc = render(|sink| {
            sink.add_hrule(&attrs(&[("width", "2"), ("percent", "50")])).unwrap();
            sink.add_image(&attrs(&[("src", "/nonexistent/picture.png")])).unwrap();
            let table = TableModel {
                attrs: attrs(&[("columns", "1,1")]),
                rows: vec![textpdf_types::TableRow {
                    attrs: Attributes::new(),
                    cells: vec![
                        textpdf_types::TableCell { attrs: Attributes::new(), chunks: para("left") },
                        textpdf_types::TableCell { attrs: attrs(&[("align", "center")]), chunks: para("right") },
                    ],
                }],
            };
            sink.write_table(&table).unwrap();
        });
        assert_eq!(page_texts(&doc), vec!["leftright".to_string()]);
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        assert_eq!(content.operations.iter().filter(|op| op.operator == "re").count(), 2);
        assert!(content.operations.iter().any(|op| op.operator == "l"));
    }

    #[test]
    fn images_are_embedded_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        image::RgbImage::from_pixel(40, 20, image::Rgb([0, 0, 255])).save(&path).unwrap();
        let src = path.to_str().unwrap().to_string();

        let doc = render(|sink| {
            sink.add_image(&attrs(&[("src", &src)])).unwrap();
            sink.add_image(&attrs(&[("src", &src), ("width", "80")])).unwrap();
        });
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let draws: Vec<_> = content.operations.iter().filter(|op| op.operator == "Do").collect();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].operands[0].as_name().unwrap(), b"Im1");
        assert_eq!(draws[1].operands[0].as_name().unwrap(), b"Im1");
        let cm: Vec<_> = content.operations.iter().filter(|op| op.operator == "cm").collect();
        assert_eq!(cm[1].operands[0].as_float().unwrap(), 80.0);
        assert_eq!(cm[1].operands[3].as_float().unwrap(), 40.0);
    }
}
