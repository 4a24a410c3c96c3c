//! A "dumb" XML driver that reads a template and notifies a handler of events.
use crate::error::TemplateError;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event as XmlEvent};
use std::io::BufRead;
use textpdf_types::Attributes;

/// Receives the significant events of a template document.
///
/// Element names arrive lowercased; `pos` is the byte offset of the event.
pub trait TemplateHandler {
    fn start_element(&mut self, name: &str, attrs: Attributes, pos: u64) -> Result<(), TemplateError>;

    fn end_element(&mut self, name: &str, pos: u64) -> Result<(), TemplateError>;

    fn empty_element(&mut self, name: &str, attrs: Attributes, pos: u64) -> Result<(), TemplateError> {
        self.start_element(name, attrs, pos)?;
        self.end_element(name, pos)
    }

    fn text(&mut self, text: &str, pos: u64) -> Result<(), TemplateError>;

    /// Called once after the last event.
    fn end_document(&mut self, pos: u64) -> Result<(), TemplateError>;
}

/// Drives the parse, calling handler methods for each significant XML event.
pub fn drive<R: BufRead>(source: R, handler: &mut impl TemplateHandler) -> Result<(), TemplateError> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    loop {
        let pos = reader.buffer_position();
        let xml_error = |source: quick_xml::Error| TemplateError::Xml { source, position: pos };
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            XmlEvent::Start(e) => {
                let name = element_name(&e);
                let attrs = owned_attributes(&reader, &e).map_err(xml_error)?;
                handler.start_element(&name, attrs, pos)?;
            }
            XmlEvent::Empty(e) => {
                let name = element_name(&e);
                let attrs = owned_attributes(&reader, &e).map_err(xml_error)?;
                handler.empty_element(&name, attrs, pos)?;
            }
            XmlEvent::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
                handler.end_element(&name, pos)?;
            }
            XmlEvent::Text(e) => {
                let raw_text = String::from_utf8_lossy(e.as_ref());
                let text = unescape(&raw_text).map_err(|err| xml_error(err.into()))?;
                handler.text(&text, pos)?;
            }
            XmlEvent::CData(e) => {
                handler.text(&String::from_utf8_lossy(e.as_ref()), pos)?;
            }
            XmlEvent::GeneralRef(e) => {
                let reference = format!("&{};", String::from_utf8_lossy(e.as_ref()));
                let text = unescape(&reference).map_err(|err| xml_error(err.into()))?;
                handler.text(&text, pos)?;
            }
            XmlEvent::Eof => break,
            _ => (),
        }
        buf.clear();
    }

    handler.end_document(reader.buffer_position())
}

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_lowercase()
}

fn owned_attributes<R>(reader: &Reader<R>, e: &BytesStart) -> Result<Attributes, quick_xml::Error> {
    let mut attrs = Attributes::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.decode_and_unescape_value(reader.decoder())?;
        attrs.insert(key, value);
    }
    Ok(attrs)
}
