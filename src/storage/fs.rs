use super::{Metadata, Storage};
use soft_canonicalize::soft_canonicalize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// `std::fs` rooted at a sandbox directory. Every path is resolved through
/// symlinks and refused unless it ends up under the root.
#[derive(Debug, Clone)]
pub struct SandboxFs {
    root: PathBuf,
}

impl SandboxFs {
    /// `root` should already be absolute; see `Config::sandbox_root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        SandboxFs {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let mut full = self.root.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            full.push(segment);
        }

        let root = soft_canonicalize(&self.root)?;
        let resolved = soft_canonicalize(&full)?;
        if !resolved.starts_with(&root) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("'{}' resolves outside the sandbox root", path),
            ));
        }
        Ok(resolved)
    }
}

impl Storage for SandboxFs {
    fn read_binary(&self, path: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(path)?)
    }

    fn write_binary(&self, path: &str, data: &[u8]) -> io::Result<()> {
        fs::write(self.resolve(path)?, data)
    }

    fn exists(&self, path: &str) -> io::Result<bool> {
        self.resolve(path)?.try_exists()
    }

    fn remove(&self, path: &str) -> io::Result<()> {
        fs::remove_file(self.resolve(path)?)
    }

    fn mkdir(&self, path: &str) -> io::Result<()> {
        fs::create_dir(self.resolve(path)?)
    }

    fn stat(&self, path: &str) -> io::Result<Metadata> {
        let meta = fs::metadata(self.resolve(path)?)?;
        Ok(Metadata {
            size: meta.len(),
            is_dir: meta.is_dir(),
        })
    }

    fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        fs::rename(self.resolve(from)?, self.resolve(to)?)
    }
}
