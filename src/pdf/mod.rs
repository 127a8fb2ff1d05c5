pub mod codec;
pub mod document;
#[cfg(test)]
pub(crate) mod fixtures;

pub use codec::LopdfCodec;
pub use document::PdfDocument;

use crate::error::Result;

/// The document library the core relies on, seen only through page-level
/// operations. Page indices are zero-based.
pub trait DocumentCodec {
    type Source;
    type Document;
    type Page;

    fn load(&self, path: &str, bytes: &[u8]) -> Result<Self::Source>;

    fn page_count(&self, source: &Self::Source) -> u32;

    fn create_empty(&self) -> Self::Document;

    /// Copy page `index` of `source` so it can be appended to `into`.
    /// The source is never modified.
    fn copy_page(
        &self,
        source: &Self::Source,
        index: u32,
        into: &mut Self::Document,
    ) -> Result<Self::Page>;

    fn append_page(&self, doc: &mut Self::Document, page: Self::Page);

    fn serialize(&self, doc: &mut Self::Document) -> Result<Vec<u8>>;
}
