//! Extract a page range into a fresh document and write it to the sandbox.
//!
//! Writes go through a sibling `<name>.temp` file first. With
//! [`CommitStrategy::Rename`] the temp file is checked and renamed over the
//! target. With [`CommitStrategy::Rewrite`] the target is removed and written
//! again from the same buffer, with the previous content restored if that
//! second write fails. Either way a reported success means the target holds
//! exactly the serialized bytes, and a reported failure leaves the target as
//! it was before.

use crate::config::CommitStrategy;
use crate::error::{Error, Result};
use crate::page_range::check_bounds;
use crate::pdf::DocumentCodec;
use crate::safety::{validate, FinalPath};
use crate::storage::Storage;
use tracing::{debug, info, warn};

pub const TEMP_SUFFIX: &str = ".temp";

pub struct DocumentPersister<'a, S: Storage, C: DocumentCodec> {
    storage: &'a S,
    codec: C,
    commit: CommitStrategy,
}

impl<'a, S: Storage, C: DocumentCodec> DocumentPersister<'a, S, C> {
    pub fn new(storage: &'a S, codec: C, commit: CommitStrategy) -> Self {
        DocumentPersister {
            storage,
            codec,
            commit,
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Load a sandbox-relative source document, refusing anything larger
    /// than `max_bytes` before reading it.
    pub fn load_source(&self, path: &str, max_bytes: u64) -> Result<C::Source> {
        let validated = validate(path)?;
        let path = crate::storage::join(&validated.directory_path(), &validated.filename);

        let meta = self.storage.stat(&path).map_err(|e| Error::io(&path, e))?;
        if meta.size > max_bytes {
            return Err(Error::SizeExceeded {
                path,
                size: meta.size,
                max: max_bytes,
            });
        }

        let bytes = self
            .storage
            .read_binary(&path)
            .map_err(|e| Error::io(&path, e))?;
        let source = self.codec.load(&path, &bytes)?;
        debug!(%path, pages = self.codec.page_count(&source), "loaded source");
        Ok(source)
    }

    /// Copy pages `start..=end` (1-based) into a new document.
    pub fn extract_range(&self, source: &C::Source, start: u32, end: u32) -> Result<C::Document> {
        check_bounds(start, end, self.codec.page_count(source))?;

        let mut doc = self.codec.create_empty();
        for index in (start - 1)..end {
            let page = self.codec.copy_page(source, index, &mut doc)?;
            self.codec.append_page(&mut doc, page);
        }
        Ok(doc)
    }

    /// Serialize `doc` and write it to `final_path`.
    ///
    /// Must not be run concurrently against the same `final_path`.
    pub fn persist(&self, doc: &mut C::Document, final_path: &FinalPath) -> Result<()> {
        let bytes = self.codec.serialize(doc)?;
        let target = final_path.as_str();
        let temp = format!("{}{}", target, TEMP_SUFFIX);

        let committed = self
            .storage
            .write_binary(&temp, &bytes)
            .map_err(|e| Error::io(&temp, e))
            .and_then(|()| match self.commit {
                CommitStrategy::Rename => self.commit_rename(&temp, target, &bytes),
                CommitStrategy::Rewrite => self.commit_rewrite(&temp, target, &bytes),
            });
        if let Err(e) = committed {
            self.discard_temp(&temp);
            return Err(e);
        }

        info!(path = target, bytes = bytes.len(), "persisted document");
        Ok(())
    }

    fn commit_rename(&self, temp: &str, target: &str, bytes: &[u8]) -> Result<()> {
        match self.storage.stat(temp) {
            Ok(meta) if meta.size == bytes.len() as u64 => {}
            Ok(meta) => {
                return Err(Error::Verification {
                    path: temp.to_string(),
                    reason: format!("wrote {} bytes but found {}", bytes.len(), meta.size),
                })
            }
            Err(e) => {
                return Err(Error::Verification {
                    path: temp.to_string(),
                    reason: e.to_string(),
                })
            }
        }

        self.storage
            .rename(temp, target)
            .map_err(|e| Error::io(target, e))?;
        self.verify(target, bytes.len() as u64)
    }

    fn commit_rewrite(&self, temp: &str, target: &str, bytes: &[u8]) -> Result<()> {
        let exists = self
            .storage
            .exists(target)
            .map_err(|e| Error::io(target, e))?;
        let previous = if exists {
            let old = self
                .storage
                .read_binary(target)
                .map_err(|e| Error::io(target, e))?;
            self.storage
                .remove(target)
                .map_err(|e| Error::io(target, e))?;
            Some(old)
        } else {
            None
        };

        let written = self
            .storage
            .write_binary(target, bytes)
            .map_err(|e| Error::io(target, e))
            .and_then(|()| self.verify(target, bytes.len() as u64));
        if let Err(e) = written {
            self.restore(target, previous.as_deref());
            return Err(e);
        }

        self.discard_temp(temp);
        Ok(())
    }

    /// Put `target` back the way it was after a failed or unverified final
    /// write.
    fn restore(&self, target: &str, previous: Option<&[u8]>) {
        let restored = match previous {
            Some(old) => self.storage.write_binary(target, old),
            None => match self.storage.exists(target) {
                Ok(true) => self.storage.remove(target),
                Ok(false) => Ok(()),
                Err(e) => Err(e),
            },
        };
        if let Err(e) = restored {
            warn!(path = target, error = %e, "failed to restore previous content");
        }
    }

    fn discard_temp(&self, temp: &str) {
        let removed = match self.storage.exists(temp) {
            Ok(true) => self.storage.remove(temp),
            Ok(false) => Ok(()),
            Err(e) => Err(e),
        };
        if let Err(e) = removed {
            warn!(path = temp, error = %e, "failed to remove temp file");
        }
    }

    fn verify(&self, target: &str, expected: u64) -> Result<()> {
        let exists = self
            .storage
            .exists(target)
            .map_err(|e| Error::io(target, e))?;
        if !exists {
            return Err(Error::Verification {
                path: target.to_string(),
                reason: "file is missing after a successful write".to_string(),
            });
        }
        let size = self
            .storage
            .stat(target)
            .map_err(|e| Error::io(target, e))?
            .size;
        if size != expected {
            return Err(Error::Verification {
                path: target.to_string(),
                reason: format!("expected {} bytes, found {}", expected, size),
            });
        }
        Ok(())
    }
}
