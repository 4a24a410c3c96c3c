#![allow(dead_code)]

pub mod fixtures;
pub mod pdf_assertions;

use lopdf::Document as LopdfDocument;
use textpdf::{DataBinding, OutputFormat, PipelineError, RenderReport, TextPdfBuilder};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Wrapper around a generated PDF with helper methods
pub struct GeneratedPdf {
    pub bytes: Vec<u8>,
    pub doc: LopdfDocument,
    pub report: RenderReport,
}

impl GeneratedPdf {
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Save PDF to a file for manual debugging
    pub fn save_for_debug(&self, name: &str) -> std::io::Result<()> {
        std::fs::write(format!("test_output_{}.pdf", name), &self.bytes)
    }
}

/// Renders `template` with `data` through a pipeline built by `builder`.
pub fn generate_pdf_with(builder: TextPdfBuilder, template: &str, data: &str) -> Result<GeneratedPdf, PipelineError> {
    init_logger();
    let pipeline = builder.with_format(OutputFormat::Pdf).build()?;
    let data = DataBinding::from_json_str(data)?;
    let (bytes, report) = pipeline.render_to_writer(template.as_bytes(), &data, Vec::new())?;
    let doc = LopdfDocument::load_mem(&bytes)?;
    Ok(GeneratedPdf { bytes, doc, report })
}

pub fn generate_pdf(template: &str, data: &str) -> Result<GeneratedPdf, PipelineError> {
    generate_pdf_with(TextPdfBuilder::new(), template, data)
}

pub fn generate_html(template: &str, data: &str) -> Result<(String, RenderReport), PipelineError> {
    init_logger();
    let pipeline = TextPdfBuilder::new().with_format(OutputFormat::Html).build()?;
    let data = DataBinding::from_json_str(data)?;
    let (bytes, report) = pipeline.render_to_writer(template.as_bytes(), &data, Vec::new())?;
    Ok((String::from_utf8_lossy(&bytes).into_owned(), report))
}
