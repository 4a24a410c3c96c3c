use crate::error::ComposerError;
use crate::page::{overlay_content, page_size, register_resource, underlay_content};
use log::{debug, info};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use qrcode::{Color, EcLevel, QrCode};
use std::collections::HashMap;
use std::path::PathBuf;
use textpdf_render_core::fonts::build_cjk_font;
use textpdf_render_core::utils::{encode_ucs2, text_width};
use textpdf_style::FontFamily;

/// Side length of the QR code stamped on the first page, in points.
pub const QR_SIZE: f32 = 128.0;
/// Light modules kept around the code so readers can find the finder patterns.
const QR_QUIET_ZONE: usize = 4;
/// Vertical distance between watermark rows when tiling.
const TILE_ROW_STEP: f32 = 100.0;
const TILE_EDGE: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerStyle {
    /// One copy in the middle of the page.
    Center,
    /// Rows of copies covering the whole page.
    #[default]
    Full,
}

/// A translucent text watermark drawn beneath each page's content.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMarker {
    pub text: String,
    pub opacity: f32,
    /// Counter-clockwise rotation in degrees.
    pub angle: f32,
    pub font_size: f32,
    pub style: MarkerStyle,
    pub family: FontFamily,
    /// Fill gray level, 0 (black) to 1 (white).
    pub gray: f32,
}

impl TextMarker {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            opacity: 0.4,
            angle: 45.0,
            font_size: 18.0,
            style: MarkerStyle::Full,
            family: FontFamily::Serif,
            gray: 0.5,
        }
    }
}

/// An image stamped at a fixed position. `x` is measured from the left edge,
/// or from the right edge when negative; `y` is measured down from the top.
/// The image is scaled to fit inside `width` x `height`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMarker {
    pub path: PathBuf,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub opacity: f32,
    pub only_first_page: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageNumbers {
    pub font_size: f32,
    /// Baseline distance from the bottom edge of the page.
    pub bottom: f32,
    pub family: FontFamily,
}

impl Default for PageNumbers {
    fn default() -> Self {
        Self { font_size: 10.0, bottom: 25.0, family: FontFamily::Serif }
    }
}

/// Applies post-processing marks to a loaded document.
///
/// Resources are registered under `Stamp*` names so they never collide with
/// the ones the renderer wrote.
pub struct Stamper<'a> {
    doc: &'a mut Document,
    fonts: HashMap<FontFamily, ObjectId>,
    next_resource: usize,
}

impl<'a> Stamper<'a> {
    pub fn new(doc: &'a mut Document) -> Self {
        Self { doc, fonts: HashMap::new(), next_resource: 1 }
    }

    fn page_ids(&self) -> Vec<ObjectId> {
        self.doc.get_pages().into_values().collect()
    }

    fn resource_name(&mut self, prefix: &str) -> String {
        let name = format!("{}{}", prefix, self.next_resource);
        self.next_resource += 1;
        name
    }

    fn font(&mut self, family: FontFamily) -> ObjectId {
        let doc = &mut *self.doc;
        *self
            .fonts
            .entry(family)
            .or_insert_with(|| build_cjk_font(family, |object| doc.add_object(object)))
    }

    fn font_name(family: FontFamily) -> &'static str {
        match family {
            FontFamily::Sans => "StampF1",
            FontFamily::Serif => "StampF2",
        }
    }

    fn opacity_state(&mut self, opacity: f32) -> ObjectId {
        let opacity = opacity.clamp(0.0, 1.0);
        self.doc.add_object(dictionary! { "Type" => "ExtGState", "ca" => opacity, "CA" => opacity })
    }

    pub fn add_text_marker(&mut self, marker: &TextMarker) -> Result<(), ComposerError> {
        if marker.text.is_empty() {
            return Ok(());
        }
        if !(marker.font_size.is_finite() && marker.font_size > 0.0) {
            return Err(ComposerError::Other(format!("watermark font size {} must be positive", marker.font_size)));
        }
        let font_id = self.font(marker.family);
        let font_name = Self::font_name(marker.family);
        let gs_id = self.opacity_state(marker.opacity);
        let gs_name = self.resource_name("StampGS");

        let (sin, cos) = marker.angle.to_radians().sin_cos();
        let text_len = text_width(&marker.text, marker.font_size);
        let encoded = encode_ucs2(&marker.text);

        for page_id in self.page_ids() {
            register_resource(self.doc, page_id, "Font", font_name, font_id.into())?;
            register_resource(self.doc, page_id, "ExtGState", &gs_name, gs_id.into())?;
            let (width, height) = page_size(self.doc, page_id)?;

            let origins: Vec<(f32, f32)> = match marker.style {
                MarkerStyle::Center => vec![(width / 2.0 - cos * text_len / 2.0, height / 2.0 - sin * text_len / 2.0)],
                MarkerStyle::Full => {
                    let step = text_len.max(marker.font_size);
                    if step.is_nan() || step <= 0.0 {
                        return Err(ComposerError::Other("watermark has no width to tile".into()));
                    }
                    let mut origins = Vec::new();
                    let mut y = height - TILE_EDGE;
                    while y > -height + TILE_EDGE {
                        let mut x = 10.0;
                        while x < width - 10.0 {
                            origins.push((x, y));
                            x += step;
                        }
                        y -= TILE_ROW_STEP;
                    }
                    origins
                }
            };

            let mut ops = vec![
                Operation::new("q", vec![]),
                Operation::new("gs", vec![Object::Name(gs_name.as_bytes().to_vec())]),
                Operation::new("g", vec![marker.gray.into()]),
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![font_name.into(), marker.font_size.into()]),
            ];
            for (x, y) in origins {
                ops.push(Operation::new("Tm", vec![cos.into(), sin.into(), (-sin).into(), cos.into(), x.into(), y.into()]));
                ops.push(Operation::new("Tj", vec![Object::String(encoded.clone(), StringFormat::Hexadecimal)]));
            }
            ops.push(Operation::new("ET", vec![]));
            ops.push(Operation::new("Q", vec![]));
            underlay_content(self.doc, page_id, Content { operations: ops }.encode()?)?;
        }
        info!("Added text watermark '{}'", marker.text);
        Ok(())
    }

    pub fn add_image_marker(&mut self, marker: &ImageMarker) -> Result<(), ComposerError> {
        let rgb = image::open(&marker.path)?.to_rgb8();
        let (px_w, px_h) = rgb.dimensions();
        let image_id = self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => px_w,
                "Height" => px_h,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            rgb.into_raw(),
        ));
        let scale = (marker.width / px_w.max(1) as f32).min(marker.height / px_h.max(1) as f32);
        let (w, h) = (px_w as f32 * scale, px_h as f32 * scale);
        self.place_xobject(image_id, marker.x, marker.y, marker.height, (w, h), marker.opacity, marker.only_first_page)?;
        info!("Added image marker {}", marker.path.display());
        Ok(())
    }

    /// Stamps a QR code encoding `contents` in the top-right corner of the first page.
    pub fn add_qr_code(&mut self, contents: &str) -> Result<(), ComposerError> {
        let code = QrCode::with_error_correction_level(contents.as_bytes(), EcLevel::L)
            .map_err(|e| ComposerError::QrCode(e.to_string()))?;
        let modules = code.width();
        let colors = code.to_colors();
        let cell = QR_SIZE / (modules + 2 * QR_QUIET_ZONE) as f32;

        let mut ops = vec![
            Operation::new("q", vec![]),
            Operation::new("g", vec![1.into()]),
            Operation::new("re", vec![0.into(), 0.into(), 1.into(), 1.into()]),
            Operation::new("f", vec![]),
            Operation::new("g", vec![0.into()]),
        ];
        for (i, color) in colors.iter().enumerate() {
            if *color != Color::Dark {
                continue;
            }
            let (col, row) = (i % modules, i / modules);
            let x = (col + QR_QUIET_ZONE) as f32 * cell / QR_SIZE;
            // Rows run top to bottom; flip into the unit square's bottom-up space.
            let y = 1.0 - (row + QR_QUIET_ZONE + 1) as f32 * cell / QR_SIZE;
            let side = cell / QR_SIZE;
            ops.push(Operation::new("re", vec![x.into(), y.into(), side.into(), side.into()]));
        }
        ops.push(Operation::new("f", vec![]));
        ops.push(Operation::new("Q", vec![]));

        let form_id = self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 1.into(), 1.into()],
            },
            Content { operations: ops }.encode()?,
        ));
        self.place_xobject(form_id, -QR_SIZE, 0.0, QR_SIZE, (QR_SIZE, QR_SIZE), 1.0, true)?;
        debug!("Added {}x{} QR code", modules, modules);
        Ok(())
    }

    /// Draws "n / N" centered at the bottom of every page.
    pub fn add_page_numbers(&mut self, numbers: &PageNumbers) -> Result<(), ComposerError> {
        let font_id = self.font(numbers.family);
        let font_name = Self::font_name(numbers.family);
        let pages = self.page_ids();
        let total = pages.len();

        for (i, page_id) in pages.into_iter().enumerate() {
            register_resource(self.doc, page_id, "Font", font_name, font_id.into())?;
            let (width, _) = page_size(self.doc, page_id)?;
            let label = format!("{} / {}", i + 1, total);
            let x = (width - text_width(&label, numbers.font_size)) / 2.0;
            let ops = vec![
                Operation::new("q", vec![]),
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![font_name.into(), numbers.font_size.into()]),
                Operation::new("Td", vec![x.into(), numbers.bottom.into()]),
                Operation::new("Tj", vec![Object::String(encode_ucs2(&label), StringFormat::Hexadecimal)]),
                Operation::new("ET", vec![]),
                Operation::new("Q", vec![]),
            ];
            overlay_content(self.doc, page_id, Content { operations: ops }.encode()?)?;
        }
        info!("Numbered {} page(s)", total);
        Ok(())
    }

    /// Draws an XObject beneath the page content. `box_height` is the height of
    /// the box the caller positioned, which anchors the image's bottom edge.
    #[allow(clippy::too_many_arguments)]
    fn place_xobject(
        &mut self,
        object_id: ObjectId,
        x: f32,
        y: f32,
        box_height: f32,
        (w, h): (f32, f32),
        opacity: f32,
        only_first_page: bool,
    ) -> Result<(), ComposerError> {
        let name = self.resource_name("StampIm");
        let gs_id = self.opacity_state(opacity);
        let gs_name = self.resource_name("StampGS");
        let mut pages = self.page_ids();
        if only_first_page {
            pages.truncate(1);
        }

        for page_id in pages {
            register_resource(self.doc, page_id, "XObject", &name, object_id.into())?;
            register_resource(self.doc, page_id, "ExtGState", &gs_name, gs_id.into())?;
            let (width, height) = page_size(self.doc, page_id)?;
            let left = if x < 0.0 { width + x } else { x };
            let bottom = height - y - box_height;
            let ops = vec![
                Operation::new("q", vec![]),
                Operation::new("gs", vec![Object::Name(gs_name.as_bytes().to_vec())]),
                Operation::new("cm", vec![w.into(), 0.into(), 0.into(), h.into(), left.into(), bottom.into()]),
                Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ];
            underlay_content(self.doc, page_id, Content { operations: ops }.encode()?)?;
        }
        Ok(())
    }
}
