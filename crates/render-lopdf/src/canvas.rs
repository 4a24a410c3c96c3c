use crate::layout::{Fragment, Line, RunStyle};
use lopdf::content::Operation;
use lopdf::{Object, StringFormat};
use textpdf_render_core::fonts::resource_name;
use textpdf_render_core::utils::{encode_ucs2, flip_y};
use textpdf_style::{DocumentConfig, PageMargins};

/// Horizontal skew applied to the text matrix for synthesized italics.
const ITALIC_SHEAR: f32 = 0.21;
const UNDERLINE_OFFSET: f32 = 0.12;

fn op(operator: &str, operands: Vec<Object>) -> Operation {
    Operation::new(operator, operands)
}

/// The content of the page currently being filled, plus a cursor measured
/// downwards from the top margin.
pub struct PageCanvas {
    pub width: f32,
    pub height: f32,
    pub margins: PageMargins,
    pub cursor: f32,
    pub has_content: bool,
    content: (f32, f32),
    ops: Vec<Operation>,
}

impl PageCanvas {
    pub fn new(config: &DocumentConfig) -> Self {
        let (width, height) = config.page_size.dimensions_pt();
        let (content_width, content_height) = config.content_size();
        Self {
            width,
            height,
            margins: config.margins,
            cursor: 0.0,
            has_content: false,
            content: (content_width.max(1.0), content_height.max(1.0)),
            ops: Vec::new(),
        }
    }

    pub fn content_width(&self) -> f32 {
        self.content.0
    }

    pub fn content_height(&self) -> f32 {
        self.content.1
    }

    /// Whether `height` more points fit below the cursor.
    pub fn fits(&self, height: f32) -> bool {
        self.cursor + height <= self.content_height() + 0.01
    }

    pub fn advance(&mut self, dy: f32) {
        self.cursor += dy;
    }

    /// Converts an offset inside the content area to PDF user space.
    pub fn to_pdf(&self, x: f32, y: f32) -> (f32, f32) {
        (self.margins.left + x, flip_y(self.margins.top + y, self.height))
    }

    pub fn extend(&mut self, ops: Vec<Operation>) {
        if !ops.is_empty() {
            self.has_content = true;
        }
        self.ops.extend(ops);
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.ops
    }

    /// Draws a laid-out line whose top edge sits at `top` inside a box that
    /// starts at `left` (both relative to the content area).
    pub fn draw_line(&mut self, line: &Line, left: f32, top: f32, start: f32, char_spacing: f32) {
        let baseline = top + line.baseline();
        let mut ops = Vec::new();
        for fragment in &line.fragments {
            let x = left + start + fragment.x + char_spacing * fragment.chars_before as f32;
            let (px, py) = self.to_pdf(x, baseline);
            ops.extend(fragment_ops(fragment, px, py, char_spacing));
        }
        self.extend(ops);
    }
}

/// Operations drawing one fragment with its baseline at (`x`, `y`) in PDF space.
pub fn fragment_ops(fragment: &Fragment, x: f32, y: f32, char_spacing: f32) -> Vec<Operation> {
    let style = &fragment.style;
    let mut ops = Vec::new();
    if !style.blank_underline && !fragment.text.trim().is_empty() {
        ops.extend(text_ops(&fragment.text, style, x, y, char_spacing));
    }
    if style.styles.underline || style.blank_underline {
        let width = fragment.width + char_spacing * fragment.char_count() as f32;
        let thickness = if style.blank_underline { 1.0 } else { style.size / 15.0 };
        let uy = y + style.rise - style.size * UNDERLINE_OFFSET;
        ops.extend(line_ops(x, uy, x + width, uy, thickness));
    }
    ops
}

pub fn text_ops(text: &str, style: &RunStyle, x: f32, y: f32, char_spacing: f32) -> Vec<Operation> {
    let shear = if style.styles.italic { ITALIC_SHEAR } else { 0.0 };
    let mut ops = vec![op("q", vec![])];
    if style.styles.bold {
        ops.push(op("w", vec![(style.size / 30.0).into()]));
    }
    ops.push(op("BT", vec![]));
    ops.push(op("Tf", vec![Object::Name(resource_name(style.family).as_bytes().to_vec()), style.size.into()]));
    let mode = if style.styles.bold { 2 } else { 0 };
    ops.push(op("Tr", vec![Object::Integer(mode)]));
    if style.rise != 0.0 {
        ops.push(op("Ts", vec![style.rise.into()]));
    }
    if char_spacing != 0.0 {
        ops.push(op("Tc", vec![char_spacing.into()]));
    }
    ops.push(op("Tm", vec![1.into(), 0.into(), shear.into(), 1.into(), x.into(), y.into()]));
    ops.push(op("Tj", vec![Object::String(encode_ucs2(text), StringFormat::Hexadecimal)]));
    ops.push(op("ET", vec![]));
    ops.push(op("Q", vec![]));
    ops
}

pub fn line_ops(x1: f32, y1: f32, x2: f32, y2: f32, thickness: f32) -> Vec<Operation> {
    vec![
        op("q", vec![]),
        op("w", vec![thickness.into()]),
        op("m", vec![x1.into(), y1.into()]),
        op("l", vec![x2.into(), y2.into()]),
        op("S", vec![]),
        op("Q", vec![]),
    ]
}

/// A stroked rectangle with its lower-left corner at (`x`, `y`).
pub fn rect_ops(x: f32, y: f32, width: f32, height: f32, thickness: f32) -> Vec<Operation> {
    vec![
        op("q", vec![]),
        op("w", vec![thickness.into()]),
        op("re", vec![x.into(), y.into(), width.into(), height.into()]),
        op("S", vec![]),
        op("Q", vec![]),
    ]
}

pub fn image_ops(name: &str, x: f32, y: f32, width: f32, height: f32) -> Vec<Operation> {
    vec![
        op("q", vec![]),
        op("cm", vec![width.into(), 0.into(), 0.into(), height.into(), x.into(), y.into()]),
        op("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        op("Q", vec![]),
    ]
}
