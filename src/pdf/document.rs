use crate::error::{Error, Result};
use lopdf::{Document, Object, ObjectId};

/// A loaded source PDF. Read-only once loaded.
pub struct PdfDocument {
    pub doc: Document,
    pub path: String,
    pages: Vec<ObjectId>,
}

impl PdfDocument {
    pub fn from_bytes(path: &str, bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes).map_err(|e| Error::Load {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        // get_pages is keyed by 1-based page number, so values come out in order
        let pages = doc.get_pages().into_values().collect();
        Ok(PdfDocument {
            doc,
            path: path.to_string(),
            pages,
        })
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Object ID of the zero-indexed page `index`.
    pub fn page_id(&self, index: u32) -> Option<ObjectId> {
        self.pages.get(index as usize).copied()
    }

    pub fn is_page(&self, id: ObjectId) -> bool {
        self.pages.contains(&id)
    }

    /// Get metadata from the document info dictionary
    pub fn get_info(&self) -> PdfInfo {
        let mut info = PdfInfo::default();

        if let Ok(Object::Reference(info_ref)) = self.doc.trailer.get(b"Info") {
            if let Ok(Object::Dictionary(dict)) = self.doc.get_object(*info_ref) {
                info.title = get_string_from_dict(dict, b"Title");
                info.author = get_string_from_dict(dict, b"Author");
                info.creator = get_string_from_dict(dict, b"Creator");
                info.producer = get_string_from_dict(dict, b"Producer");
                info.creation_date = get_string_from_dict(dict, b"CreationDate");
                info.subject = get_string_from_dict(dict, b"Subject");
            }
        }

        info.page_count = self.page_count();
        info
    }
}

#[derive(Debug, Default, Clone)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub subject: Option<String>,
    pub page_count: u32,
}

fn get_string_from_dict(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        _ => None,
    })
}

fn decode_pdf_string(bytes: &[u8]) -> Option<String> {
    // UTF-16BE with BOM, otherwise treat as Latin-1
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units).ok()
    } else {
        Some(bytes.iter().map(|&b| b as char).collect())
    }
}
