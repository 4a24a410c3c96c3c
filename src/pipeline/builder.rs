use super::config::{OutputFormat, RenderOptions};
use super::orchestrator::TextPdf;
use crate::error::PipelineError;
use textpdf_pdf_composer::{ImageMarker, PageNumbers, TextMarker};
use textpdf_render_lopdf::{BlockDefaults, BlockStyle};
use textpdf_style::{PageMargins, PageSize};
use textpdf_types::BlockKind;

/// A builder for creating a [`TextPdf`] renderer.
#[derive(Debug, Clone, Default)]
pub struct TextPdfBuilder {
    options: RenderOptions,
}

impl TextPdfBuilder {
    /// Creates a builder with PDF output and the standard block styles.
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.options.format = format;
        self
    }

    /// Links a stylesheet from HTML output. May be called repeatedly.
    pub fn with_stylesheet(mut self, href: impl Into<String>) -> Self {
        self.options.stylesheets.push(href.into());
        self
    }

    /// Links a script from HTML output. May be called repeatedly.
    pub fn with_script(mut self, src: impl Into<String>) -> Self {
        self.options.scripts.push(src.into());
        self
    }

    pub fn with_page_size(mut self, size: PageSize) -> Self {
        self.options.page_size = Some(size);
        self
    }

    pub fn with_page_margins(mut self, margins: PageMargins) -> Self {
        self.options.page_margins = Some(margins);
        self
    }

    pub fn with_block_defaults(mut self, defaults: BlockDefaults) -> Self {
        self.options.block_defaults = defaults;
        self
    }

    /// Overrides the PDF style of one text block kind.
    pub fn with_block_style(mut self, kind: BlockKind, style: BlockStyle) -> Result<Self, PipelineError> {
        let slot = self
            .options
            .block_defaults
            .get_mut(kind)
            .ok_or_else(|| PipelineError::Config(format!("'{}' is not a text block", kind)))?;
        *slot = style;
        Ok(self)
    }

    pub fn with_watermark(mut self, marker: TextMarker) -> Self {
        self.options.stamps.watermark = Some(marker);
        self
    }

    pub fn with_qr_code(mut self, contents: impl Into<String>) -> Self {
        self.options.stamps.qr_code = Some(contents.into());
        self
    }

    pub fn with_page_numbers(mut self, numbers: PageNumbers) -> Self {
        self.options.stamps.page_numbers = Some(numbers);
        self
    }

    pub fn with_image_marker(mut self, marker: ImageMarker) -> Self {
        self.options.stamps.image_markers.push(marker);
        self
    }

    /// Consumes the builder and creates the renderer.
    pub fn build(self) -> Result<TextPdf, PipelineError> {
        for (kind, style) in [
            (BlockKind::Title, &self.options.block_defaults.title),
            (BlockKind::Chapter, &self.options.block_defaults.chapter),
            (BlockKind::Section, &self.options.block_defaults.section),
            (BlockKind::Para, &self.options.block_defaults.para),
        ] {
            if !(style.font_size.is_finite() && style.font_size > 0.0) {
                return Err(PipelineError::Config(format!("font size for '{}' must be positive", kind)));
            }
        }
        if let Some(marker) = &self.options.stamps.watermark {
            if !(0.0..=1.0).contains(&marker.opacity) {
                return Err(PipelineError::Config(format!("watermark opacity {} is outside 0..=1", marker.opacity)));
            }
            if !(marker.font_size.is_finite() && marker.font_size > 0.0) {
                return Err(PipelineError::Config(format!("watermark font size {} must be positive", marker.font_size)));
            }
        }
        Ok(TextPdf::new(self.options))
    }
}
