//! End-to-end rendering benchmarks
//!
//! Measures template parsing, layout and output for both sinks.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use textpdf::{DataBinding, OutputFormat, TextMarker, TextPdfBuilder};

/// A template with `paragraphs` filled paragraphs and a table every ten.
fn report_template(paragraphs: usize) -> String {
    let mut template = String::from(r#"<textpdf page-size="a4"><title><value id="title"/></title>"#);
    for i in 0..paragraphs {
        template.push_str(&format!(
            "<para>Paragraph {} for <value id=\"name\"/>: <b>bold</b>, <i>italic</i> and plain text \
             long enough to wrap over a few lines. 混合排版的中文内容。</para>",
            i
        ));
        if i % 10 == 9 {
            template.push_str(
                "<table columns=\"2,1,1\"><tr><cell>Item</cell><cell>Qty</cell><cell>Price</cell></tr>\
                 <tr><cell>Paper</cell><cell>2</cell><cell>4.00</cell></tr></table>",
            );
        }
    }
    template.push_str("</textpdf>");
    template
}

fn data() -> DataBinding {
    DataBinding::from_json_str(r#"{"title": "Benchmark", "data": {"title": "Quarterly report", "name": "Ada"}}"#)
        .expect("Failed to parse data")
}

fn benchmark_formats(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_formats");
    let data = data();

    for paragraphs in [10, 100, 1000] {
        let template = report_template(paragraphs);
        group.throughput(Throughput::Bytes(template.len() as u64));

        for format in [OutputFormat::Pdf, OutputFormat::Html] {
            let pipeline = TextPdfBuilder::new().with_format(format).build().expect("Failed to build pipeline");
            group.bench_with_input(
                BenchmarkId::new(format.extension(), paragraphs),
                &template,
                |b, template| {
                    b.iter(|| {
                        pipeline
                            .render_to_writer(black_box(template.as_bytes()), &data, Vec::new())
                            .expect("Failed to render")
                    })
                },
            );
        }
    }

    group.finish();
}

fn benchmark_stamping(c: &mut Criterion) {
    let mut group = c.benchmark_group("pdf_stamping");
    let data = data();
    let template = report_template(100);

    let plain = TextPdfBuilder::new().build().expect("Failed to build pipeline");
    let stamped = TextPdfBuilder::new()
        .with_watermark(TextMarker::new("CONFIDENTIAL"))
        .with_qr_code("https://example.com/report/42")
        .with_page_numbers(Default::default())
        .build()
        .expect("Failed to build pipeline");

    for (name, pipeline) in [("plain", &plain), ("stamped", &stamped)] {
        group.bench_function(name, |b| {
            b.iter(|| pipeline.render_to_writer(template.as_bytes(), &data, Vec::new()).expect("Failed to render"))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_formats, benchmark_stamping);
criterion_main!(benches);
