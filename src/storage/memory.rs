//! In-memory storage with fault injection, used by tests.

use super::{Metadata, Storage};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    fail_write: BTreeSet<String>,
    drop_write: BTreeSet<String>,
    fail_rename: bool,
    fail_remove: bool,
    mkdir_race: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn parent(path: &str) -> &str {
    path.rfind('/').map(|i| &path[..i]).unwrap_or("")
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{}: not found", path))
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, data: &[u8]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let path = normalize(path);
            let mut dir = parent(&path).to_string();
            while !dir.is_empty() {
                state.dirs.insert(dir.clone());
                dir = parent(&dir).to_string();
            }
            state.files.insert(path, data.to_vec());
        }
        self
    }

    /// The next write to `path` fails as if the disk were full.
    pub fn fail_next_write_to(&self, path: &str) {
        self.state.lock().unwrap().fail_write.insert(normalize(path));
    }

    /// The next write to `path` reports success but stores nothing.
    pub fn drop_next_write_to(&self, path: &str) {
        self.state.lock().unwrap().drop_write.insert(normalize(path));
    }

    pub fn fail_renames(&self) {
        self.state.lock().unwrap().fail_rename = true;
    }

    pub fn fail_removes(&self) {
        self.state.lock().unwrap().fail_remove = true;
    }

    /// Simulate another process creating `path` between the existence check
    /// and the `mkdir` call.
    pub fn race_mkdir(&self, path: &str) {
        self.state.lock().unwrap().mkdir_race.insert(normalize(path));
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().files.get(&normalize(path)).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .dirs
            .iter()
            .map(|d| format!("{}/", d))
            .chain(state.files.keys().cloned())
            .collect()
    }
}

impl Storage for MemoryStorage {
    fn read_binary(&self, path: &str) -> io::Result<Vec<u8>> {
        self.file(path).ok_or_else(|| not_found(path))
    }

    fn write_binary(&self, path: &str, data: &[u8]) -> io::Result<()> {
        let path = normalize(path);
        let mut state = self.state.lock().unwrap();
        if state.fail_write.remove(&path) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "No space left on device",
            ));
        }
        let dir = parent(&path);
        if !dir.is_empty() && !state.dirs.contains(dir) {
            return Err(not_found(dir));
        }
        if !state.drop_write.remove(&path) {
            state.files.insert(path, data.to_vec());
        }
        Ok(())
    }

    fn exists(&self, path: &str) -> io::Result<bool> {
        let path = normalize(path);
        let state = self.state.lock().unwrap();
        Ok(path.is_empty() || state.files.contains_key(&path) || state.dirs.contains(&path))
    }

    fn remove(&self, path: &str) -> io::Result<()> {
        let path = normalize(path);
        let mut state = self.state.lock().unwrap();
        if state.fail_remove {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "Permission denied",
            ));
        }
        state.files.remove(&path).map(|_| ()).ok_or_else(|| not_found(&path))
    }

    fn mkdir(&self, path: &str) -> io::Result<()> {
        let path = normalize(path);
        let mut state = self.state.lock().unwrap();
        let dir = parent(&path);
        if !dir.is_empty() && !state.dirs.contains(dir) {
            return Err(not_found(dir));
        }
        if state.mkdir_race.remove(&path) {
            state.dirs.insert(path.clone());
        }
        if state.dirs.contains(&path) || state.files.contains_key(&path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{}: already exists", path),
            ));
        }
        state.dirs.insert(path);
        Ok(())
    }

    fn stat(&self, path: &str) -> io::Result<Metadata> {
        let path = normalize(path);
        let state = self.state.lock().unwrap();
        if path.is_empty() || state.dirs.contains(&path) {
            return Ok(Metadata {
                size: 0,
                is_dir: true,
            });
        }
        state
            .files
            .get(&path)
            .map(|data| Metadata {
                size: data.len() as u64,
                is_dir: false,
            })
            .ok_or_else(|| not_found(&path))
    }

    fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        let (from, to) = (normalize(from), normalize(to));
        let mut state = self.state.lock().unwrap();
        if state.fail_rename {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "No space left on device",
            ));
        }
        let data = state.files.remove(&from).ok_or_else(|| not_found(&from))?;
        state.files.insert(to, data);
        Ok(())
    }
}
