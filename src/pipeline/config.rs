use std::path::Path;
use textpdf_pdf_composer::{ImageMarker, PageNumbers, TextMarker};
use textpdf_render_lopdf::BlockDefaults;
use textpdf_style::{PageMargins, PageSize};

/// The two output formats a template can be rendered to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Pdf,
    Html,
}

impl OutputFormat {
    /// Infers the format from an output file name; `.html` and `.htm` select HTML.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "html" | "htm" => Some(OutputFormat::Html),
            "pdf" => Some(OutputFormat::Pdf),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Html => "html",
        }
    }
}

/// Marks applied to a finished PDF. Ignored for HTML output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stamps {
    pub watermark: Option<TextMarker>,
    pub qr_code: Option<String>,
    pub page_numbers: Option<PageNumbers>,
    pub image_markers: Vec<ImageMarker>,
}

impl Stamps {
    pub fn is_empty(&self) -> bool {
        self.watermark.is_none() && self.qr_code.is_none() && self.page_numbers.is_none() && self.image_markers.is_empty()
    }
}

/// Settings for one rendering run, assembled by [`crate::TextPdfBuilder`].
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub format: OutputFormat,
    /// Stylesheet URLs linked from HTML output.
    pub stylesheets: Vec<String>,
    /// Script URLs linked from HTML output.
    pub scripts: Vec<String>,
    pub block_defaults: BlockDefaults,
    /// Starting page size; the template root's `page-size` still wins.
    pub page_size: Option<PageSize>,
    /// Starting margins; the template root's `page-margin` still wins.
    pub page_margins: Option<PageMargins>,
    pub stamps: Stamps,
}
