use lopdf::content::Content;
use lopdf::{Dictionary, Object, ObjectId, Stream, dictionary};
use std::collections::BTreeMap;
use std::io::{self, Write};
use textpdf_render_core::SinkError;

/// Tracks how many bytes have gone through so object offsets can be recorded
/// without requiring `Seek`.
struct CountingWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Writes a PDF incrementally: page content streams go out as soon as a page
/// is finished, while the small structural objects are buffered until
/// [`StreamingPdfWriter::finish`].
pub struct StreamingPdfWriter<W: Write> {
    writer: CountingWriter<W>,
    offsets: BTreeMap<u32, u64>,
    max_id: u32,
    pub catalog_id: ObjectId,
    pub pages_id: ObjectId,
    pub resources_id: ObjectId,
    page_ids: Vec<ObjectId>,
    info: Option<Dictionary>,
    buffered_objects: BTreeMap<ObjectId, Object>,
}

impl<W: Write> StreamingPdfWriter<W> {
    pub fn new(writer: W, version: &str) -> io::Result<Self> {
        let mut writer = CountingWriter { inner: writer, written: 0 };
        writer.write_all(format!("%PDF-{}\n%âãÏÓ\n", version).as_bytes())?;

        Ok(Self {
            writer,
            offsets: BTreeMap::new(),
            max_id: 3,
            resources_id: (1, 0),
            pages_id: (2, 0),
            catalog_id: (3, 0),
            page_ids: Vec::new(),
            info: None,
            buffered_objects: BTreeMap::new(),
        })
    }

    pub fn new_object_id(&mut self) -> ObjectId {
        self.max_id += 1;
        (self.max_id, 0)
    }

    pub fn buffer_object(&mut self, object: Object) -> ObjectId {
        let id = self.new_object_id();
        self.buffered_objects.insert(id, object);
        id
    }

    pub fn buffer_object_at_id(&mut self, id: ObjectId, object: Object) {
        if id.0 > self.max_id {
            self.max_id = id.0;
        }
        self.buffered_objects.insert(id, object);
    }

    /// Writes an object to the output immediately.
    pub fn write_object(&mut self, object: Object) -> io::Result<ObjectId> {
        let id = self.new_object_id();
        self.write_indirect_object(id, &object)?;
        Ok(id)
    }

    pub fn write_content_stream(&mut self, content: &Content) -> Result<ObjectId, SinkError> {
        let stream = Stream::new(dictionary! {}, content.encode()?);
        Ok(self.write_object(Object::Stream(stream))?)
    }

    /// Sets the shared resource dictionary every page points at.
    pub fn set_resources(&mut self, resources: Dictionary) {
        self.buffer_object_at_id(self.resources_id, resources.into());
    }

    pub fn add_page(&mut self, page_id: ObjectId) {
        self.page_ids.push(page_id);
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    pub fn set_info(&mut self, info: Dictionary) {
        self.info = Some(info);
    }

    pub fn finish(mut self) -> io::Result<W> {
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => self.page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<Object>>(),
            "Count" => self.page_ids.len() as i64,
        };
        self.buffer_object_at_id(self.pages_id, pages_dict.into());
        if !self.buffered_objects.contains_key(&self.resources_id) {
            self.buffer_object_at_id(self.resources_id, Dictionary::new().into());
        }

        let catalog_dict = dictionary! { "Type" => "Catalog", "Pages" => self.pages_id };
        self.buffer_object_at_id(self.catalog_id, catalog_dict.into());

        let info_id = self.info.take().map(|info| self.buffer_object(info.into()));

        let buffered = std::mem::take(&mut self.buffered_objects);
        for (id, object) in &buffered {
            self.write_indirect_object(*id, object)?;
        }

        let xref_start = self.writer.written;
        self.write_xref()?;

        let mut trailer = dictionary! { "Size" => (self.max_id + 1) as i64, "Root" => self.catalog_id };
        if let Some(info_id) = info_id {
            trailer.set("Info", info_id);
        }
        writeln!(self.writer, "trailer")?;
        internal_writer::write_dictionary(&mut self.writer, &trailer)?;
        writeln!(self.writer, "\nstartxref")?;
        writeln!(self.writer, "{}", xref_start)?;
        write!(self.writer, "%%EOF")?;

        self.writer.flush()?;
        Ok(self.writer.inner)
    }

    fn write_indirect_object(&mut self, id: ObjectId, object: &Object) -> io::Result<()> {
        self.offsets.insert(id.0, self.writer.written);
        writeln!(self.writer, "{} {} obj", id.0, id.1)?;
        internal_writer::write_object(&mut self.writer, object)?;
        writeln!(self.writer, "\nendobj")?;
        Ok(())
    }

    /// One subsection covering every allocated id; ids that were never
    /// written are listed as free.
    fn write_xref(&mut self) -> io::Result<()> {
        writeln!(self.writer, "xref")?;
        writeln!(self.writer, "0 {}", self.max_id + 1)?;
        writeln!(self.writer, "0000000000 65535 f ")?;
        for id in 1..=self.max_id {
            match self.offsets.get(&id) {
                Some(offset) => writeln!(self.writer, "{:010} 00000 n ", offset)?,
                None => writeln!(self.writer, "0000000000 00001 f ")?,
            }
        }
        Ok(())
    }
}

/// Object serialization. Names and literal strings are escaped so arbitrary
/// bytes survive; reals drop trailing zeros to keep content streams small.
mod internal_writer {
    use super::*;
    use lopdf::StringFormat;

    fn is_name_regular(byte: u8) -> bool {
        (b'!'..=b'~').contains(&byte) && !b"#%()/<>[]{}".contains(&byte)
    }

    fn write_name(writer: &mut dyn Write, name: &[u8]) -> io::Result<()> {
        writer.write_all(b"/")?;
        for &byte in name {
            if is_name_regular(byte) {
                writer.write_all(&[byte])?;
            } else {
                write!(writer, "#{:02X}", byte)?;
            }
        }
        Ok(())
    }

    fn write_real(writer: &mut dyn Write, value: f32) -> io::Result<()> {
        let text = format!("{:.3}", value);
        let text = text.trim_end_matches('0').trim_end_matches('.');
        writer.write_all(if text == "-0" { &b"0"[..] } else { text.as_bytes() })
    }

    fn write_literal(writer: &mut dyn Write, bytes: &[u8]) -> io::Result<()> {
        writer.write_all(b"(")?;
        for &byte in bytes {
            match byte {
                b'(' | b')' | b'\\' => writer.write_all(&[b'\\', byte])?,
                b'\n' => writer.write_all(b"\\n")?,
                b'\r' => writer.write_all(b"\\r")?,
                _ => writer.write_all(&[byte])?,
            }
        }
        writer.write_all(b")")
    }

    pub fn write_object(writer: &mut dyn Write, object: &Object) -> io::Result<()> {
        match object {
            Object::Null => writer.write_all(b"null"),
            Object::Boolean(value) => write!(writer, "{}", value),
            Object::Integer(value) => write!(writer, "{}", value),
            Object::Real(value) => write_real(writer, *value),
            Object::Name(name) => write_name(writer, name),
            Object::String(bytes, StringFormat::Literal) => write_literal(writer, bytes),
            Object::String(bytes, StringFormat::Hexadecimal) => {
                let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
                write!(writer, "<{}>", hex)
            }
            Object::Array(items) => {
                writer.write_all(b"[")?;
                let mut first = true;
                for item in items {
                    if !std::mem::take(&mut first) {
                        writer.write_all(b" ")?;
                    }
                    write_object(writer, item)?;
                }
                writer.write_all(b"]")
            }
            Object::Dictionary(dict) => write_dictionary(writer, dict),
            Object::Stream(stream) => {
                let mut dict = stream.dict.clone();
                dict.set("Length", stream.content.len() as i64);
                write_dictionary(writer, &dict)?;
                writer.write_all(b"\nstream\n")?;
                writer.write_all(&stream.content)?;
                writer.write_all(b"\nendstream")
            }
            Object::Reference((number, generation)) => write!(writer, "{} {} R", number, generation),
        }
    }

    pub fn write_dictionary(writer: &mut dyn Write, dict: &Dictionary) -> io::Result<()> {
        writer.write_all(b"<<")?;
        for (key, value) in dict.iter() {
            write_name(writer, key)?;
            writer.write_all(b" ")?;
            write_object(writer, value)?;
            writer.write_all(b"\n")?;
        }
        writer.write_all(b">>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Document;
    use lopdf::content::Operation;

    #[test]
    fn finished_output_loads_with_lopdf() {
        let mut writer = StreamingPdfWriter::new(Vec::new(), "1.7").unwrap();
        let content = Content { operations: vec![Operation::new("re", vec![10.into(), 10.into(), 50.into(), 50.into()]), Operation::new("f", vec![])] };
        let content_id = writer.write_content_stream(&content).unwrap();
        let page = dictionary! {
            "Type" => "Page",
            "Parent" => writer.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 200.into(), 200.into()],
            "Contents" => content_id,
            "Resources" => writer.resources_id,
        };
        let page_id = writer.buffer_object(page.into());
        writer.add_page(page_id);
        writer.set_info(dictionary! { "Producer" => Object::string_literal("test") });
        let bytes = writer.finish().unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        let content = doc.get_page_content(page_id).unwrap();
        assert!(String::from_utf8_lossy(&content).contains("re"));
        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_object(info_id).unwrap().as_dict().unwrap();
        assert_eq!(info.get(b"Producer").unwrap().as_str().unwrap(), b"test");
    }

    #[test]
    fn strings_are_escaped() {
        let mut out = Vec::new();
        internal_writer::write_object(&mut out, &Object::string_literal("a(b)\\")).unwrap();
        assert_eq!(out, b"(a\\(b\\)\\\\)");
        out.clear();
        internal_writer::write_object(&mut out, &Object::String(vec![0x4E, 0x2D], lopdf::StringFormat::Hexadecimal)).unwrap();
        assert_eq!(out, b"<4E2D>");
    }

    #[test]
    fn names_and_reals_are_normalized() {
        let mut out = Vec::new();
        internal_writer::write_object(&mut out, &Object::Name(b"A B#".to_vec())).unwrap();
        assert_eq!(out, b"/A#20B#23");
        for (value, expected) in [(12.0_f32, "12"), (0.5, "0.5"), (-0.0001, "0"), (1.2345, "1.234")] {
            out.clear();
            internal_writer::write_object(&mut out, &Object::Real(value)).unwrap();
            assert_eq!(String::from_utf8_lossy(&out), expected);
        }
    }
}
