use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use textpdf::{OutputFormat, PageNumbers, PipelineError, TextMarker, TextPdfBuilder, default_output_path};

/// Renders an XML template filled with JSON data into PDF or HTML.
#[derive(Parser, Debug)]
#[command(name = "textpdf", version)]
struct Cli {
    /// Output file. Defaults to the template path with `.pdf` (or `.html`) appended.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write HTML instead of PDF. Implied by an `.html` or `.htm` output path.
    #[arg(long)]
    html: bool,

    /// Stylesheet URL to link from HTML output.
    #[arg(long = "css", value_name = "URL")]
    stylesheets: Vec<String>,

    /// Script URL to link from HTML output.
    #[arg(long = "js", value_name = "URL")]
    scripts: Vec<String>,

    /// Tile a text watermark under every PDF page.
    #[arg(long, value_name = "TEXT")]
    watermark: Option<String>,

    /// Put a QR code with this content at the top right of the first PDF page.
    #[arg(long, value_name = "TEXT")]
    qrcode: Option<String>,

    /// Number PDF pages as "n / N" in the bottom margin.
    #[arg(long)]
    page_numbers: bool,

    /// XML template, or a `.doc` file when TEXTPDF_DOC_CONVERTER is set.
    template: PathBuf,

    /// JSON data file.
    data: PathBuf,
}

fn run(cli: Cli) -> Result<(), PipelineError> {
    let format = match (&cli.output, cli.html) {
        (_, true) => OutputFormat::Html,
        (Some(path), false) => OutputFormat::from_path(path).unwrap_or_default(),
        (None, false) => OutputFormat::Pdf,
    };
    let output = cli.output.clone().unwrap_or_else(|| default_output_path(&cli.template, format));

    let mut builder = TextPdfBuilder::new().with_format(format);
    for href in cli.stylesheets {
        builder = builder.with_stylesheet(href);
    }
    for src in cli.scripts {
        builder = builder.with_script(src);
    }
    if let Some(text) = cli.watermark {
        builder = builder.with_watermark(TextMarker::new(text));
    }
    if let Some(contents) = cli.qrcode {
        builder = builder.with_qr_code(contents);
    }
    if cli.page_numbers {
        builder = builder.with_page_numbers(PageNumbers::default());
    }

    let pipeline = builder.build()?;
    let report = pipeline.render_files(&cli.template, &cli.data, &output)?;
    log::info!("{} written with {} diagnostic(s)", output.display(), report.diagnostics.len());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("textpdf: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn repeated_links_are_collected() {
        let cli = Cli::try_parse_from(["textpdf", "--css", "a.css", "--css", "b.css", "--js", "x.js", "t.xml", "d.json"])
            .unwrap();
        assert_eq!(cli.stylesheets, vec!["a.css", "b.css"]);
        assert_eq!(cli.scripts, vec!["x.js"]);
        assert!(!cli.html);
        assert!(cli.output.is_none());
    }
}
