//! Templates shared by the integration tests.
#![allow(dead_code)]

pub const EMPTY_DATA: &str = "{}";

pub const TITLE_ONLY: &str = "<textpdf><title>Hello</title></textpdf>";

pub const NAME_FIELD: &str = r#"<textpdf><para>Name: <value id="name"/></para></textpdf>"#;

pub const NAME_DATA: &str = r#"{"data": {"name": "Ada"}}"#;

pub const NESTED_STYLES: &str = "<textpdf><para>a<b>b<i>c</i>b</b>a</para></textpdf>";

pub const TWO_PAGES: &str = "<textpdf><para>first</para><pagebreak/><para>second</para></textpdf>";

pub const BAD_PAGE_SIZE: &str = r#"<textpdf page-size="zz"><para>x</para></textpdf>"#;

pub const BAD_MARGINS: &str = r#"<textpdf page-margin="10,20"><para>x</para></textpdf>"#;

pub const INVOICE: &str = r#"<textpdf page-size="a4" page-margin="40,40,60,60">
  <title>Invoice <value id="number"/></title>
  <chapter>Customer</chapter>
  <para>Name: <value id="customer" minlen="20"/></para>
  <para align="right">Date: <value id="date"/></para>
  <hr percent="80"/>
  <section>Items</section>
  <table columns="3,1,1" width="90">
    <tr><cell>Item</cell><cell>Qty</cell><cell align="right">Price</cell></tr>
    <tr><cell>Paper</cell><cell>2</cell><cell align="right">4.00</cell></tr>
    <tr><cell colspan="2">Total</cell><cell align="right"><b>8.00</b></cell></tr>
  </table>
  <para>E = mc<sup>2</sup>, H<sub>2</sub>O<break/>signed:<hspace size="4"/><u><value id="signature" minlen="10"/></u></para>
</textpdf>"#;

pub const INVOICE_DATA: &str = r#"{
  "title": "Invoice 42",
  "author": "Accounts",
  "data": {"number": "42", "customer": "Ada Lovelace", "date": "2026-10-19", "signature": "A. L."}
}"#;

/// A template with `paragraphs` paragraphs of filler text.
pub fn long_document(paragraphs: usize) -> String {
    let mut template = String::from("<textpdf><title>Report</title>");
    for i in 0..paragraphs {
        template.push_str(&format!(
            "<para>Paragraph {} holds enough words to wrap across several lines of an A4 page, \
             so the layout has real work to do. 中文段落也需要换行。</para>",
            i
        ));
    }
    template.push_str("</textpdf>");
    template
}
