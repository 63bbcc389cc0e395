//! PDF merging: concatenate the pages of several PDF buffers, in order.
//!
//! The first buffer is the target. Pages of every later buffer are deep-copied
//! into it along with everything they reference (content streams, fonts,
//! images, annotations) and appended to the target's root page tree.
//!
//! Pages are copied without their `/Parent` link, so the source page tree is
//! never dragged along. Attributes a page may inherit from its ancestors
//! (`MediaBox`, `CropBox`, `Resources`, `Rotate`) are copied onto the page
//! itself first. Target ids for all source pages are reserved up front, so
//! link annotations that point at another page of the same source resolve to
//! the copied page.

use crate::error::Md2PdfError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;
use tracing::debug;

const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Guard against malformed parent cycles.
const MAX_TREE_DEPTH: usize = 64;

struct ObjectCopier<'a> {
    source: &'a Document,
    target: &'a mut Document,
    id_map: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    fn new(source: &'a Document, target: &'a mut Document) -> Self {
        Self {
            source,
            target,
            id_map: HashMap::new(),
        }
    }

    fn copy_object(&mut self, source_id: ObjectId) -> Result<ObjectId, lopdf::Error> {
        if let Some(id) = self.id_map.get(&source_id) {
            return Ok(*id);
        }
        // Registered before recursing so reference cycles terminate.
        let new_id = self.target.add_object(Object::Null);
        self.id_map.insert(source_id, new_id);

        let obj = self.source.get_object(source_id)?.clone();
        let obj = self.remap(obj)?;
        self.target.objects.insert(new_id, obj);
        Ok(new_id)
    }

    fn remap(&mut self, obj: Object) -> Result<Object, lopdf::Error> {
        match obj {
            Object::Reference(id) => Ok(Object::Reference(self.copy_object(id)?)),
            Object::Array(items) => items
                .into_iter()
                .map(|o| self.remap(o))
                .collect::<Result<Vec<_>, _>>()
                .map(Object::Array),
            Object::Dictionary(mut dict) => {
                self.remap_dict(&mut dict)?;
                Ok(Object::Dictionary(dict))
            }
            Object::Stream(mut stream) => {
                self.remap_dict(&mut stream.dict)?;
                Ok(Object::Stream(stream))
            }
            other => Ok(other),
        }
    }

    fn remap_dict(&mut self, dict: &mut Dictionary) -> Result<(), lopdf::Error> {
        for (_, value) in dict.iter_mut() {
            *value = self.remap(value.clone())?;
        }
        Ok(())
    }
}

/// Concatenate `pdfs` into one document, pages in input order.
///
/// # Errors
/// [`Md2PdfError::MergeFailed`] naming the 0-based index of the buffer that
/// could not be parsed or copied.
pub fn merge_pdfs(pdfs: &[Vec<u8>]) -> Result<Vec<u8>, Md2PdfError> {
    let (first, rest) = pdfs.split_first().ok_or_else(|| Md2PdfError::MergeFailed {
        index: 0,
        detail: "nothing to merge".into(),
    })?;

    let mut target = load(0, first)?;
    let pages_id = root_pages_id(&target).map_err(|e| failed(0, e))?;

    for (offset, bytes) in rest.iter().enumerate() {
        let index = offset + 1;
        let source = load(index, bytes)?;
        let added = append_pages(&mut target, pages_id, &source).map_err(|e| failed(index, e))?;
        debug!("Merged PDF #{}: {} pages", index, added);
    }

    let mut out = Vec::new();
    target
        .save_to(&mut out)
        .map_err(|e| failed(0, format!("cannot serialise merged document: {e}")))?;
    Ok(out)
}

/// Number of pages in a PDF buffer.
pub fn page_count(pdf: &[u8]) -> Result<usize, Md2PdfError> {
    Ok(load(0, pdf)?.get_pages().len())
}

fn load(index: usize, bytes: &[u8]) -> Result<Document, Md2PdfError> {
    Document::load_mem(bytes).map_err(|e| failed(index, e))
}

fn failed(index: usize, detail: impl ToString) -> Md2PdfError {
    Md2PdfError::MergeFailed {
        index,
        detail: detail.to_string(),
    }
}

fn root_pages_id(doc: &Document) -> Result<ObjectId, lopdf::Error> {
    let root_id = doc.trailer.get(b"Root")?.as_reference()?;
    doc.get_dictionary(root_id)?.get(b"Pages")?.as_reference()
}

fn append_pages(
    target: &mut Document,
    pages_id: ObjectId,
    source: &Document,
) -> Result<usize, lopdf::Error> {
    let source_pages: Vec<ObjectId> = source.get_pages().into_values().collect();
    if source_pages.is_empty() {
        return Ok(0);
    }

    let mut copier = ObjectCopier::new(source, target);
    let mut new_ids = Vec::with_capacity(source_pages.len());
    for &page_id in &source_pages {
        let new_id = copier.target.add_object(Object::Null);
        copier.id_map.insert(page_id, new_id);
        new_ids.push(new_id);
    }

    for (&page_id, &new_id) in source_pages.iter().zip(&new_ids) {
        let mut page = standalone_page(source, page_id)?;
        copier.remap_dict(&mut page)?;
        page.set("Parent", Object::Reference(pages_id));
        copier.target.set_object(new_id, page);
    }

    let pages = target.get_object_mut(pages_id)?.as_dict_mut()?;
    let mut kids = pages.get(b"Kids")?.as_array()?.clone();
    let count = pages.get(b"Count")?.as_i64()?;
    kids.extend(new_ids.iter().map(|id| Object::Reference(*id)));
    pages.set("Kids", Object::Array(kids));
    pages.set("Count", count + new_ids.len() as i64);

    Ok(new_ids.len())
}

/// The page dictionary with inherited attributes filled in and `/Parent` removed.
fn standalone_page(doc: &Document, page_id: ObjectId) -> Result<Dictionary, lopdf::Error> {
    let mut page = doc.get_dictionary(page_id)?.clone();
    for key in INHERITABLE {
        if page.has(key) {
            continue;
        }
        if let Some(value) = inherited(doc, &page, key) {
            page.set(key.to_vec(), value);
        }
    }
    page.remove(b"Parent");
    Ok(page)
}

fn inherited(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream, StringFormat};

    /// A PDF with `pages` pages reading "<label> N". MediaBox and Resources
    /// live on the page tree node, so pages inherit them.
    fn dummy_pdf(pages: u32, label: &str) -> Vec<u8> {
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

        let mut kids: Vec<Object> = Vec::new();
        for i in 1..=pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(
                            format!("{label} {i}").into_bytes(),
                            StringFormat::Literal,
                        )],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Resources" => resources_id,
            }
            .into(),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    fn page_texts(pdf: &[u8]) -> Vec<String> {
        let doc = Document::load_mem(pdf).unwrap();
        doc.get_pages()
            .values()
            .map(|&id| String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned())
            .collect()
    }

    #[test]
    fn pages_are_concatenated_in_order() {
        let merged = merge_pdfs(&[dummy_pdf(1, "Cover"), dummy_pdf(3, "Body")]).unwrap();
        assert!(merged.starts_with(b"%PDF"));
        assert_eq!(page_count(&merged).unwrap(), 4);

        let texts = page_texts(&merged);
        assert!(texts[0].contains("Cover 1"));
        assert!(texts[1].contains("Body 1"));
        assert!(texts[3].contains("Body 3"));
    }

    #[test]
    fn inherited_attributes_are_materialised() {
        let merged = merge_pdfs(&[dummy_pdf(1, "A"), dummy_pdf(1, "B")]).unwrap();
        let doc = Document::load_mem(&merged).unwrap();
        let pages = doc.get_pages();
        let copied = doc.get_dictionary(pages[&2]).unwrap();
        assert!(copied.has(b"MediaBox"));
        assert!(copied.has(b"Resources"));
        let root_pages = root_pages_id(&doc).unwrap();
        let parent = copied.get(b"Parent").unwrap().as_reference().unwrap();
        assert_eq!(parent, root_pages);
    }

    #[test]
    fn three_way_merge() {
        let merged =
            merge_pdfs(&[dummy_pdf(2, "A"), dummy_pdf(1, "B"), dummy_pdf(2, "C")]).unwrap();
        assert_eq!(page_count(&merged).unwrap(), 5);
        assert!(page_texts(&merged)[4].contains("C 2"));
    }

    #[test]
    fn single_input_is_returned_intact() {
        let merged = merge_pdfs(&[dummy_pdf(2, "Only")]).unwrap();
        assert_eq!(page_count(&merged).unwrap(), 2);
    }

    #[test]
    fn malformed_input_names_its_index() {
        let err = merge_pdfs(&[dummy_pdf(1, "A"), b"not a pdf".to_vec()]).unwrap_err();
        match err {
            Md2PdfError::MergeFailed { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            merge_pdfs(&[]),
            Err(Md2PdfError::MergeFailed { index: 0, .. })
        ));
    }

    #[test]
    fn page_count_of_garbage_fails() {
        assert!(page_count(b"garbage").is_err());
    }
}
