mod common;

use common::fixtures::*;
use common::pdf_assertions::*;
use common::{TestResult, generate_pdf, generate_pdf_with, init_logger};
use lopdf::Document as LopdfDocument;
use std::fs;
use textpdf::{MarkerStyle, OutputFormat, PageNumbers, PipelineError, TextMarker, TextPdfBuilder, default_output_path};

#[test]
fn render_files_writes_a_loadable_pdf() -> TestResult {
    init_logger();
    let dir = tempfile::tempdir()?;
    let template = dir.path().join("invoice.xml");
    let data = dir.path().join("invoice.json");
    fs::write(&template, INVOICE)?;
    fs::write(&data, INVOICE_DATA)?;

    let output = default_output_path(&template, OutputFormat::Pdf);
    assert_eq!(output, dir.path().join("invoice.xml.pdf"));
    let report = TextPdfBuilder::new().build()?.render_files(&template, &data, &output)?;
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    assert_eq!(report.tables_written, 1);

    let doc = LopdfDocument::load_mem(&fs::read(&output)?)?;
    let text = all_text(&doc);
    assert!(text.contains("Invoice 42"));
    assert!(text.contains("Ada Lovelace"));
    assert!(text.contains("Total"));
    Ok(())
}

#[test]
fn existing_output_is_refused() -> TestResult {
    let dir = tempfile::tempdir()?;
    let template = dir.path().join("t.xml");
    let data = dir.path().join("d.json");
    let output = dir.path().join("out.pdf");
    fs::write(&template, TITLE_ONLY)?;
    fs::write(&data, EMPTY_DATA)?;
    fs::write(&output, b"keep me")?;

    let err = TextPdfBuilder::new().build()?.render_files(&template, &data, &output).unwrap_err();
    assert!(matches!(err, PipelineError::OutputExists(_)));
    assert!(err.to_string().ends_with("already exists"));
    assert_eq!(fs::read(&output)?, b"keep me");
    Ok(())
}

#[test]
fn failed_render_leaves_no_output() -> TestResult {
    let dir = tempfile::tempdir()?;
    let template = dir.path().join("t.xml");
    let data = dir.path().join("d.json");
    let output = dir.path().join("out.pdf");
    fs::write(&template, "<textpdf><para>unclosed</textpdf>")?;
    fs::write(&data, EMPTY_DATA)?;

    assert!(TextPdfBuilder::new().build()?.render_files(&template, &data, &output).is_err());
    assert!(!output.exists());

    fs::write(&template, TITLE_ONLY)?;
    fs::write(&data, "not json")?;
    assert!(TextPdfBuilder::new().build()?.render_files(&template, &data, &output).is_err());
    assert!(!output.exists());
    Ok(())
}

#[test]
fn missing_input_names_the_file() -> TestResult {
    let dir = tempfile::tempdir()?;
    let data = dir.path().join("d.json");
    fs::write(&data, EMPTY_DATA)?;
    let err = TextPdfBuilder::new()
        .build()?
        .render_files(&dir.path().join("nope.xml"), &data, &dir.path().join("out.pdf"))
        .unwrap_err();
    assert!(err.to_string().contains("nope.xml"));
    Ok(())
}

#[test]
fn html_output_links_assets_and_metadata() -> TestResult {
    let dir = tempfile::tempdir()?;
    let template = dir.path().join("t.xml");
    let data = dir.path().join("d.json");
    let output = dir.path().join("form.html");
    fs::write(&template, NAME_FIELD)?;
    fs::write(&data, r#"{"title": "A & B", "author": "Ada", "data": {"name": "Ada"}}"#)?;

    TextPdfBuilder::new()
        .with_format(OutputFormat::Html)
        .with_stylesheet("style.css")
        .with_script("form.js")
        .build()?
        .render_files(&template, &data, &output)?;
    let html = fs::read_to_string(&output)?;
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>A &amp; B</title>"));
    assert!(html.contains(r#"<meta name="author" content="Ada"/>"#));
    assert!(html.contains(r#"href="style.css""#));
    assert!(html.contains(r#"src="form.js""#));
    Ok(())
}

#[test]
fn watermark_is_drawn_under_every_page() -> TestResult {
    let mut marker = TextMarker::new("DRAFT");
    marker.style = MarkerStyle::Center;
    let pdf = generate_pdf_with(TextPdfBuilder::new().with_watermark(marker), TWO_PAGES, EMPTY_DATA)?;
    assert_eq!(pdf.page_count(), 2);
    let texts = page_texts(&pdf.doc);
    assert!(texts[0].starts_with("DRAFT"));
    assert!(texts[0].ends_with("first"));
    assert!(texts[1].starts_with("DRAFT"));
    Ok(())
}

#[test]
fn tiled_watermark_repeats() -> TestResult {
    let pdf = generate_pdf_with(TextPdfBuilder::new().with_watermark(TextMarker::new("DRAFT")), TITLE_ONLY, EMPTY_DATA)?;
    let text = all_text(&pdf.doc);
    assert!(text.matches("DRAFT").count() > 10);
    Ok(())
}

#[test]
fn page_numbers_are_added_last() -> TestResult {
    let pdf = generate_pdf_with(TextPdfBuilder::new().with_page_numbers(PageNumbers::default()), TWO_PAGES, EMPTY_DATA)?;
    let texts = page_texts(&pdf.doc);
    assert_eq!(texts, vec!["first1 / 2".to_string(), "second2 / 2".to_string()]);
    Ok(())
}

#[test]
fn qr_code_goes_on_the_first_page_only() -> TestResult {
    let pdf = generate_pdf_with(TextPdfBuilder::new().with_qr_code("https://example.com/42"), TWO_PAGES, EMPTY_DATA)?;
    let ops = page_operations(&pdf.doc);
    let draws = |page: usize| ops[page].iter().filter(|op| op.operator == "Do").count();
    assert_eq!(draws(0), 1);
    assert_eq!(draws(1), 0);
    Ok(())
}

#[test]
fn unstamped_documents_stream_directly() -> TestResult {
    let pdf = generate_pdf(&long_document(60), EMPTY_DATA)?;
    assert!(pdf.page_count() > 1);
    assert!(pdf.bytes.starts_with(b"%PDF-1.7"));
    Ok(())
}
