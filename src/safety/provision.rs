use crate::error::{Error, Result};
use crate::storage::{self, Storage};
use std::io;
use tracing::debug;

/// Make sure every directory in `segments` exists, creating what is missing.
///
/// Safe to call repeatedly. A segment created by someone else between the
/// existence check and `mkdir` counts as success.
pub fn ensure_exists<S: Storage>(storage: &S, segments: &[String]) -> Result<()> {
    let mut prefix = String::new();
    for segment in segments {
        prefix = storage::join(&prefix, segment);

        if storage.exists(&prefix).map_err(|e| Error::io(&prefix, e))? {
            let meta = storage.stat(&prefix).map_err(|e| Error::io(&prefix, e))?;
            if !meta.is_dir {
                return Err(Error::io(
                    &prefix,
                    io::Error::new(io::ErrorKind::Other, "exists and is not a directory"),
                ));
            }
            continue;
        }

        match storage.mkdir(&prefix) {
            Ok(()) => debug!(dir = %prefix, "created directory"),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(dir = %prefix, "directory appeared concurrently");
            }
            Err(e) => return Err(Error::io(&prefix, e)),
        }
    }
    Ok(())
}
