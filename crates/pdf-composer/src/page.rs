use crate::error::ComposerError;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

/// Guards the walk up the page tree against malformed parent cycles.
const MAX_TREE_DEPTH: usize = 32;

/// Appends a content stream to a page so it is drawn on top of the existing content.
pub fn overlay_content(doc: &mut Document, page_id: ObjectId, content_stream: Vec<u8>) -> Result<(), ComposerError> {
    add_content(doc, page_id, content_stream, false)
}

/// Prepends a content stream to a page so the existing content is drawn over it.
pub fn underlay_content(doc: &mut Document, page_id: ObjectId, content_stream: Vec<u8>) -> Result<(), ComposerError> {
    add_content(doc, page_id, content_stream, true)
}

fn add_content(doc: &mut Document, page_id: ObjectId, content_stream: Vec<u8>, under: bool) -> Result<(), ComposerError> {
    let stream = Stream::new(dictionary! {}, content_stream);
    let new_content_id = doc.add_object(Object::Stream(stream));

    let page_dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
    let contents_obj = page_dict
        .get(b"Contents")
        .map_err(|_| ComposerError::Other(format!("Page {:?} is missing a /Contents key.", page_id)))?;

    let mut contents = match contents_obj.as_array() {
        Ok(arr) => arr.clone(),
        Err(_) => vec![contents_obj.clone()],
    };
    if under {
        contents.insert(0, Object::Reference(new_content_id));
    } else {
        contents.push(Object::Reference(new_content_id));
    }
    page_dict.set("Contents", Object::Array(contents));
    Ok(())
}

/// Width and height of a page's MediaBox, following inheritance up the page tree.
pub fn page_size(doc: &Document, page_id: ObjectId) -> Result<(f32, f32), ComposerError> {
    let mut node = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(node)?;
        if let Ok(media_box) = dict.get(b"MediaBox") {
            let values = match media_box {
                Object::Reference(id) => doc.get_object(*id)?.as_array()?,
                other => other.as_array()?,
            };
            if values.len() != 4 {
                return Err(ComposerError::Other(format!("Malformed MediaBox on page {:?}", page_id)));
            }
            let coords = values.iter().map(Object::as_float).collect::<Result<Vec<f32>, _>>()?;
            return Ok(((coords[2] - coords[0]).abs(), (coords[3] - coords[1]).abs()));
        }
        node = dict.get(b"Parent")?.as_reference()?;
    }
    Err(ComposerError::Other(format!("No MediaBox found for page {:?}", page_id)))
}

/// Registers `value` as `/category/name` in the resources used by `page_id`.
///
/// Shared resource dictionaries are edited in place, so registering the same
/// name on several pages that share resources is harmless.
pub fn register_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    name: &str,
    value: Object,
) -> Result<(), ComposerError> {
    let category_ref = {
        let resources = resources_mut(doc, page_id)?;
        match resources.get(category.as_bytes()) {
            Ok(Object::Reference(id)) => Some(*id),
            Ok(Object::Dictionary(_)) => None,
            _ => {
                resources.set(category, Dictionary::new());
                None
            }
        }
    };
    let dict = match category_ref {
        Some(id) => doc.get_object_mut(id)?.as_dict_mut()?,
        None => resources_mut(doc, page_id)?.get_mut(category.as_bytes())?.as_dict_mut()?,
    };
    dict.set(name, value);
    Ok(())
}

fn resources_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary, ComposerError> {
    let entry = doc.get_dictionary(page_id)?.get(b"Resources").ok().cloned();
    match entry {
        Some(Object::Reference(id)) => Ok(doc.get_object_mut(id)?.as_dict_mut()?),
        Some(Object::Dictionary(_)) => {
            let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
            Ok(page.get_mut(b"Resources")?.as_dict_mut()?)
        }
        _ => {
            let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
            page.set("Resources", Dictionary::new());
            Ok(page.get_mut(b"Resources")?.as_dict_mut()?)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::StringFormat;
    use lopdf::content::{Content, Operation};

    /// A document with `num_pages` pages, each showing "`text_prefix` N", sharing
    /// one referenced resource dictionary.
    pub(crate) fn create_dummy_pdf(num_pages: u32, text_prefix: &str) -> Document {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut page_ids = vec![];
        for i in 1..=num_pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![100.into(), 700.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(format!("{} {}", text_prefix, i).into_bytes(), StringFormat::Literal)],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            page_ids.push(page_id.into());
        }

        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => num_pages as i64,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        doc.objects.insert(pages_id, pages_dict.into());

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        doc
    }

    fn literal_content(text: &str) -> Vec<u8> {
        Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tj", vec![Object::String(text.as_bytes().to_vec(), StringFormat::Literal)]),
                Operation::new("ET", vec![]),
            ],
        }
        .encode()
        .unwrap()
    }

    #[test]
    fn overlay_and_underlay_order_streams() {
        let mut doc = create_dummy_pdf(1, "Original Content");
        let page_id = doc.get_pages().get(&1).cloned().unwrap();

        overlay_content(&mut doc, page_id, literal_content("Overlay Content")).unwrap();
        underlay_content(&mut doc, page_id, literal_content("Underlay Content")).unwrap();

        let page_dict = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let contents_array = page_dict.get(b"Contents").unwrap().as_array().unwrap();
        assert_eq!(contents_array.len(), 3);

        let full_content = String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned();
        let under = full_content.find("Underlay Content").unwrap();
        let original = full_content.find("Original Content").unwrap();
        let over = full_content.find("Overlay Content").unwrap();
        assert!(under < original && original < over);
    }

    #[test]
    fn page_size_is_inherited() {
        let doc = create_dummy_pdf(1, "x");
        let page_id = doc.get_pages()[&1];
        assert_eq!(page_size(&doc, page_id).unwrap(), (612.0, 792.0));
    }

    #[test]
    fn resources_are_registered_in_shared_dictionary() {
        let mut doc = create_dummy_pdf(2, "x");
        let pages = doc.get_pages();
        register_resource(&mut doc, pages[&1], "ExtGState", "GS1", dictionary! { "ca" => 0.5_f32 }.into()).unwrap();

        let resources_id = doc.get_dictionary(pages[&2]).unwrap().get(b"Resources").unwrap().as_reference().unwrap();
        let resources = doc.get_dictionary(resources_id).unwrap();
        assert!(resources.get(b"ExtGState").unwrap().as_dict().unwrap().has(b"GS1"));
        assert!(resources.get(b"Font").unwrap().as_dict().unwrap().has(b"F1"));
    }
}
