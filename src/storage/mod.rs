//! Raw filesystem capabilities the core is written against.
//!
//! Paths handed to a [`Storage`] are sandbox-relative and use `/` as the
//! separator. Implementations map them onto their backing store.

use std::io;

pub mod fs;
#[cfg(test)]
pub mod memory;

pub use fs::SandboxFs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub size: u64,
    pub is_dir: bool,
}

pub trait Storage {
    fn read_binary(&self, path: &str) -> io::Result<Vec<u8>>;

    /// Replace the content of `path` with `data` in a single call.
    fn write_binary(&self, path: &str, data: &[u8]) -> io::Result<()>;

    fn exists(&self, path: &str) -> io::Result<bool>;

    fn remove(&self, path: &str) -> io::Result<()>;

    /// Create a single directory. The parent must exist. Returns an
    /// `AlreadyExists` error when the directory is already there.
    fn mkdir(&self, path: &str) -> io::Result<()>;

    fn stat(&self, path: &str) -> io::Result<Metadata>;

    /// Move `from` over `to`, replacing `to` if present.
    fn rename(&self, from: &str, to: &str) -> io::Result<()>;
}

/// Join sandbox-relative segments with `/`, skipping empty pieces.
pub fn join(dir: &str, name: &str) -> String {
    match (dir.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (false, true) => dir.to_string(),
        (false, false) => format!("{}/{}", dir, name),
    }
}
