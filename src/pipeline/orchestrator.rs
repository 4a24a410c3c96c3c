use super::config::{OutputFormat, RenderOptions, Stamps};
use crate::error::PipelineError;
use log::{info, warn};
use lopdf::Document as LopdfDocument;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use textpdf_pdf_composer::Stamper;
use textpdf_render_core::BlockSink;
use textpdf_render_html::HtmlSink;
use textpdf_render_lopdf::PdfSink;
use textpdf_style::DocumentConfig;
use textpdf_template::{DataBinding, RenderReport, TemplateEngine};

/// A configured renderer. Build one with [`crate::TextPdfBuilder`].
#[derive(Debug, Clone)]
pub struct TextPdf {
    options: RenderOptions,
}

impl TextPdf {
    pub(crate) fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    fn document_config(&self) -> DocumentConfig {
        let mut config = DocumentConfig::new();
        config.stylesheets = self.options.stylesheets.clone();
        config.scripts = self.options.scripts.clone();
        if let Some(size) = self.options.page_size {
            config.page_size = size;
        }
        if let Some(margins) = self.options.page_margins {
            config.margins = margins;
        }
        config
    }

    /// Renders `template` against `data` into `writer` in the configured format.
    pub fn render_to_writer<R, W>(&self, template: R, data: &DataBinding, writer: W) -> Result<(W, RenderReport), PipelineError>
    where
        R: BufRead,
        W: Write,
    {
        match self.options.format {
            OutputFormat::Html => self.render_html(template, data, writer),
            OutputFormat::Pdf => self.render_pdf(template, data, writer),
        }
    }

    pub fn render_html<R: BufRead, W: Write>(
        &self,
        template: R,
        data: &DataBinding,
        writer: W,
    ) -> Result<(W, RenderReport), PipelineError> {
        if !self.options.stamps.is_empty() {
            warn!("PDF stamps are ignored for HTML output");
        }
        let mut sink = HtmlSink::new(writer);
        let report = self.render_into(template, data, &mut sink)?;
        let mut writer = sink.into_inner();
        writer.flush()?;
        Ok((writer, report))
    }

    pub fn render_pdf<R: BufRead, W: Write>(
        &self,
        template: R,
        data: &DataBinding,
        mut writer: W,
    ) -> Result<(W, RenderReport), PipelineError> {
        if self.options.stamps.is_empty() {
            let mut sink = PdfSink::new(writer);
            sink.set_block_defaults(self.options.block_defaults.clone())?;
            let report = self.render_into(template, data, &mut sink)?;
            let mut writer = sink.into_inner()?;
            writer.flush()?;
            return Ok((writer, report));
        }

        // Stamps need the finished page tree, so render to memory first.
        let mut sink = PdfSink::new(Vec::new());
        sink.set_block_defaults(self.options.block_defaults.clone())?;
        let report = self.render_into(template, data, &mut sink)?;
        let mut doc = LopdfDocument::load_mem(&sink.into_inner()?)?;
        apply_stamps(&mut doc, &self.options.stamps)?;
        doc.save_to(&mut writer)?;
        writer.flush()?;
        Ok((writer, report))
    }

    fn render_into<R: BufRead, S: BlockSink>(
        &self,
        template: R,
        data: &DataBinding,
        sink: &mut S,
    ) -> Result<RenderReport, PipelineError> {
        let engine = TemplateEngine::new(self.document_config());
        let report = engine.render(template, data, sink)?;
        info!(
            "Rendered {} block(s) and {} table(s) with {} diagnostic(s)",
            report.blocks_written,
            report.tables_written,
            report.diagnostics.len()
        );
        Ok(report)
    }

    /// Renders `template_path` with the JSON in `data_path` to `output_path`.
    ///
    /// The output file must not exist yet. A partially written output is
    /// removed when rendering fails. `.doc` templates are converted first
    /// with the command named by `TEXTPDF_DOC_CONVERTER`.
    pub fn render_files(
        &self,
        template_path: &Path,
        data_path: &Path,
        output_path: &Path,
    ) -> Result<RenderReport, PipelineError> {
        if output_path.exists() {
            return Err(PipelineError::OutputExists(output_path.to_path_buf()));
        }

        let data = DataBinding::from_reader(BufReader::new(open_input(data_path, "data")?))?;
        let (template, _converted) = open_template(template_path)?;

        let file = OpenOptions::new().write(true).create_new(true).open(output_path).map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                PipelineError::OutputExists(output_path.to_path_buf())
            } else {
                PipelineError::Io(io::Error::new(e.kind(), format!("Failed to create '{}': {}", output_path.display(), e)))
            }
        })?;

        match self.render_to_writer(template, &data, BufWriter::new(file)) {
            Ok((_, report)) => {
                info!("Wrote {}", output_path.display());
                Ok(report)
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(output_path) {
                    warn!("Could not remove incomplete output {}: {}", output_path.display(), cleanup);
                }
                Err(e)
            }
        }
    }
}

/// The default output name: the template path with `.pdf` or `.html` appended.
pub fn default_output_path(template_path: &Path, format: OutputFormat) -> PathBuf {
    let mut name = template_path.as_os_str().to_os_string();
    name.push(".");
    name.push(format.extension());
    PathBuf::from(name)
}

pub fn apply_stamps(doc: &mut LopdfDocument, stamps: &Stamps) -> Result<(), PipelineError> {
    let mut stamper = Stamper::new(doc);
    if let Some(marker) = &stamps.watermark {
        stamper.add_text_marker(marker)?;
    }
    for marker in &stamps.image_markers {
        stamper.add_image_marker(marker)?;
    }
    if let Some(contents) = &stamps.qr_code {
        stamper.add_qr_code(contents)?;
    }
    if let Some(numbers) = &stamps.page_numbers {
        stamper.add_page_numbers(numbers)?;
    }
    Ok(())
}

fn open_input(path: &Path, what: &str) -> Result<File, PipelineError> {
    File::open(path).map_err(|e| {
        PipelineError::Io(io::Error::new(e.kind(), format!("Failed to read {} from '{}': {}", what, path.display(), e)))
    })
}

/// Opens the template, converting `.doc` files first. The second value keeps
/// the temporary conversion alive until rendering is done.
#[cfg(feature = "native")]
fn open_template(path: &Path) -> Result<(BufReader<File>, Option<tempfile::NamedTempFile>), PipelineError> {
    use crate::convert::{CommandConverter, convert_to_temp, is_doc};

    if is_doc(path) {
        let converted = convert_to_temp(&CommandConverter::from_env()?, path)?;
        let file = open_input(converted.path(), "converted template")?;
        return Ok((BufReader::new(file), Some(converted)));
    }
    Ok((BufReader::new(open_input(path, "template")?), None))
}

#[cfg(not(feature = "native"))]
fn open_template(path: &Path) -> Result<(BufReader<File>, Option<()>), PipelineError> {
    Ok((BufReader::new(open_input(path, "template")?), None))
}
