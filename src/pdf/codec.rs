use super::{DocumentCodec, PdfDocument};
use crate::error::{Error, Result};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: &[&[u8]] = &[b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against cyclic `Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfCodec;

/// A document under construction. Objects reachable from copied pages are
/// imported once and shared between pages.
pub struct ExtractedPdf {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    imported: BTreeMap<ObjectId, ObjectId>,
}

impl ExtractedPdf {
    #[cfg(test)]
    pub fn page_count(&self) -> u32 {
        self.kids.len() as u32
    }

    fn import(&mut self, source: &PdfDocument, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.import_ref(source, *id),
            Object::Array(items) => {
                Object::Array(items.iter().map(|o| self.import(source, o)).collect())
            }
            Object::Dictionary(dict) => Object::Dictionary(self.import_dict(source, dict)),
            Object::Stream(stream) => {
                let mut copy = stream.clone();
                copy.dict = self.import_dict(source, &stream.dict);
                Object::Stream(copy)
            }
            other => other.clone(),
        }
    }

    fn import_dict(&mut self, source: &PdfDocument, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            copy.set(key.clone(), self.import(source, value));
        }
        copy
    }

    fn import_ref(&mut self, source: &PdfDocument, id: ObjectId) -> Object {
        if let Some(new_id) = self.imported.get(&id) {
            return Object::Reference(*new_id);
        }
        // Links into pages that were not extracted are dropped.
        if source.is_page(id) {
            return Object::Null;
        }

        let new_id = self.doc.new_object_id();
        self.imported.insert(id, new_id);
        let copied = match source.doc.get_object(id) {
            Ok(object) => self.import(source, object),
            Err(_) => Object::Null,
        };
        self.doc.objects.insert(new_id, copied);
        Object::Reference(new_id)
    }
}

fn inherited<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut node = page;
    for _ in 0..MAX_TREE_DEPTH {
        let parent_id = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent_id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
    }
    None
}

impl DocumentCodec for LopdfCodec {
    type Source = PdfDocument;
    type Document = ExtractedPdf;
    type Page = ObjectId;

    fn load(&self, path: &str, bytes: &[u8]) -> Result<PdfDocument> {
        PdfDocument::from_bytes(path, bytes)
    }

    fn page_count(&self, source: &PdfDocument) -> u32 {
        source.page_count()
    }

    fn create_empty(&self) -> ExtractedPdf {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        ExtractedPdf {
            doc,
            pages_id,
            kids: Vec::new(),
            imported: BTreeMap::new(),
        }
    }

    fn copy_page(
        &self,
        source: &PdfDocument,
        index: u32,
        into: &mut ExtractedPdf,
    ) -> Result<ObjectId> {
        let missing = |reason: String| Error::Load {
            path: source.path.clone(),
            reason,
        };
        let page_id = source
            .page_id(index)
            .ok_or_else(|| missing(format!("no page at index {}", index)))?;
        let page = source
            .doc
            .get_dictionary(page_id)
            .map_err(|e| missing(format!("page {} is unreadable: {}", index + 1, e)))?;

        // Registered first so annotations pointing back at the page resolve to the copy.
        let new_id = into.doc.new_object_id();
        into.imported.insert(page_id, new_id);

        let mut copy = Dictionary::new();
        for (key, value) in page.iter() {
            if key.as_slice() != b"Parent" {
                copy.set(key.clone(), into.import(source, value));
            }
        }
        for key in INHERITABLE {
            if !copy.has(key) {
                if let Some(value) = inherited(&source.doc, page, key) {
                    copy.set(key.to_vec(), into.import(source, value));
                }
            }
        }
        copy.set("Parent", into.pages_id);

        into.doc.objects.insert(new_id, Object::Dictionary(copy));
        Ok(new_id)
    }

    fn append_page(&self, doc: &mut ExtractedPdf, page: ObjectId) {
        doc.kids.push(page);
    }

    fn serialize(&self, doc: &mut ExtractedPdf) -> Result<Vec<u8>> {
        let kids: Vec<Object> = doc.kids.iter().map(|id| Object::Reference(*id)).collect();
        doc.doc.objects.insert(
            doc.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => doc.kids.len() as i64,
            }),
        );

        let mut buf = Vec::new();
        doc.doc
            .save_to(&mut buf)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(buf)
    }
}
