//! Everything that stands between an untrusted output path and a write.

pub mod provision;
pub mod sanitize;

use crate::error::{Error, Result};
use crate::storage::{self, Storage};
use std::fmt;
use tracing::debug;

pub use sanitize::{reject_parent_refs, sanitize_filename, validate};

/// A sandbox-relative output path that was validated and had its filename
/// sanitized. Paths from [`SafetyGate::prepare`] also have their parent
/// directories in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalPath(String);

impl FinalPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FinalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of [`SafetyGate::check_conflict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    None,
    /// Something is already at the path; the caller has to decide.
    RequiresDecision,
}

impl Conflict {
    pub fn exists(self) -> bool {
        self == Conflict::RequiresDecision
    }
}

fn plan(output_path: &str) -> Result<(Vec<String>, FinalPath)> {
    let validated = validate(output_path)?;
    let filename = sanitize_filename(&validated.filename);
    if filename.is_empty() || filename == "." || filename == ".." {
        return Err(Error::traversal(
            output_path,
            validated.filename,
            "filename is empty after sanitizing",
        ));
    }
    let path = storage::join(&validated.directory_path(), &filename);
    Ok((validated.directory, FinalPath(path)))
}

pub struct SafetyGate<'a, S: Storage> {
    storage: &'a S,
}

impl<'a, S: Storage> SafetyGate<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        SafetyGate { storage }
    }

    /// Validate `output_path`, sanitize its filename and provision its
    /// directories. All failures come back as [`Error::Safety`].
    pub fn prepare(&self, output_path: &str) -> Result<FinalPath> {
        self.wrap(output_path, || {
            let (directory, path) = plan(output_path)?;
            provision::ensure_exists(self.storage, &directory)?;
            debug!(input = output_path, output = %path, "prepared output path");
            Ok(path)
        })
    }

    /// Where `prepare` would put `output_path`, without creating anything.
    pub fn locate(&self, output_path: &str) -> Result<FinalPath> {
        self.wrap(output_path, || plan(output_path).map(|(_, path)| path))
    }

    fn wrap(&self, output_path: &str, f: impl FnOnce() -> Result<FinalPath>) -> Result<FinalPath> {
        f().map_err(|e| Error::Safety {
            path: output_path.to_string(),
            source: Box::new(e),
        })
    }

    pub fn check_conflict(&self, path: &FinalPath) -> Result<Conflict> {
        let exists = self
            .storage
            .exists(path.as_str())
            .map_err(|e| Error::io(path.as_str(), e))?;
        Ok(if exists {
            Conflict::RequiresDecision
        } else {
            Conflict::None
        })
    }

    /// Turn a conflict plus the caller's decision into go / no-go.
    pub fn resolve(&self, path: &FinalPath, overwrite: bool) -> Result<()> {
        match self.check_conflict(path)? {
            Conflict::RequiresDecision if !overwrite => Err(Error::Conflict {
                path: path.to_string(),
            }),
            _ => Ok(()),
        }
    }
}
