use crate::canvas::{PageCanvas, rect_ops};
use crate::defaults::BlockStyle;
use crate::layout::{Line, layout_lines, prepare_runs};
use log::warn;
use textpdf_style::TextAlign;
use textpdf_types::{TableCell, TableModel};

pub const CELL_PADDING: f32 = 5.0;
pub const BORDER_WIDTH: f32 = 0.5;
/// Vertical space before and after a table.
pub const TABLE_SPACING: f32 = 6.0;

#[derive(Debug)]
pub struct CellLayout {
    /// Offset from the table's left edge.
    pub x: f32,
    pub width: f32,
    pub align: TextAlign,
    pub lines: Vec<Line>,
}

impl CellLayout {
    pub fn text_height(&self) -> f32 {
        self.lines.iter().map(Line::height).sum()
    }
}

#[derive(Debug)]
pub struct RowLayout {
    pub height: f32,
    pub cells: Vec<CellLayout>,
}

#[derive(Debug)]
pub struct TableLayout {
    /// Offset of the table from the left edge of the content area.
    pub left: f32,
    pub width: f32,
    pub rows: Vec<RowLayout>,
}

/// Resolves column widths, spans and the text of every cell. Cell text uses
/// the paragraph style without its first-line indent.
pub fn layout_table(table: &TableModel, para: &BlockStyle, content_width: f32) -> TableLayout {
    let weights = table.column_weights();
    let total_weight: f32 = weights.iter().sum();
    let width = content_width * table.width_fraction();
    let left = (content_width - width) / 2.0;
    let columns: Vec<f32> = weights.iter().map(|w| width * w / total_weight).collect();

    let mut style = *para;
    style.indent = 0.0;

    let rows = table
        .rows
        .iter()
        .map(|row| {
            let mut cells = Vec::new();
            let mut col = 0;
            for cell in &row.cells {
                if col >= columns.len() {
                    warn!("Dropping table cell beyond the {} declared columns", columns.len());
                    break;
                }
                let span = cell.colspan().min(columns.len() - col);
                cells.push(layout_cell(cell, &columns, col, span, &style));
                col += span;
            }
            let filler = TableCell::default();
            while col < columns.len() {
                cells.push(layout_cell(&filler, &columns, col, 1, &style));
                col += 1;
            }
            let text = cells.iter().map(CellLayout::text_height).fold(0.0_f32, f32::max);
            RowLayout { height: text + 2.0 * CELL_PADDING, cells }
        })
        .collect();

    TableLayout { left, width, rows }
}

fn layout_cell(cell: &TableCell, columns: &[f32], col: usize, span: usize, base: &BlockStyle) -> CellLayout {
    let x = columns[..col].iter().sum();
    let width: f32 = columns[col..col + span].iter().sum();
    let align = match cell.attrs.get("align") {
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("{}", e);
            TextAlign::Left
        }),
        None => TextAlign::Left,
    };
    let mut style = *base;
    style.align = align;
    let runs = prepare_runs(&style, &cell.chunks);
    let inner = (width - 2.0 * CELL_PADDING).max(1.0);
    let lines = layout_lines(&runs, inner, 0.0, style.font_size);
    CellLayout { x, width, align, lines }
}

/// Draws one row with its top edge at the canvas cursor, then advances it.
pub fn draw_row(canvas: &mut PageCanvas, table_left: f32, row: &RowLayout) {
    let top = canvas.cursor;
    for cell in &row.cells {
        let left = table_left + cell.x;
        let (x, y) = canvas.to_pdf(left, top + row.height);
        canvas.extend(rect_ops(x, y, cell.width, row.height, BORDER_WIDTH));

        let inner = (cell.width - 2.0 * CELL_PADDING).max(1.0);
        let mut line_top = top + (row.height - cell.text_height()) / 2.0;
        for line in &cell.lines {
            let (start, spacing) = line.placement(inner, 0.0, cell.align);
            canvas.draw_line(line, left + CELL_PADDING, line_top, start, spacing);
            line_top += line.height();
        }
    }
    canvas.advance(row.height);
}
