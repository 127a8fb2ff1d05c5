//! The operations callers use: split a page range out of a source document
//! into the sandbox, and ask whether an output path is already taken.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::page_range::check_bounds;
use crate::pdf::DocumentCodec;
use crate::persist::DocumentPersister;
use crate::safety::{reject_parent_refs, sanitize_filename, FinalPath, SafetyGate};
use crate::storage::{self, Storage};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct SplitRequest {
    /// Sandbox-relative path of the source PDF.
    pub source: String,
    pub start: u32,
    pub end: u32,
    /// Falls back to `Config::default_output_dir`.
    pub output_dir: Option<String>,
    /// Falls back to `<source stem>_<start>-<end>.pdf`.
    pub filename: Option<String>,
    /// The caller's answer to the conflict gate.
    pub overwrite: bool,
}

impl SplitRequest {
    /// The sandbox-relative output path this request asks for, before
    /// validation. Parent references in the raw folder or filename are
    /// refused here, since sanitizing would disguise them.
    pub fn output_candidate(&self, config: &Config) -> Result<String> {
        let dir = self
            .output_dir
            .as_deref()
            .unwrap_or(&config.default_output_dir)
            .trim_matches('/');
        let name = match &self.filename {
            Some(name) => name.trim().to_string(),
            None => format!("{}_{}-{}", source_stem(&self.source), self.start, self.end),
        };

        let raw = storage::join(dir, &name);
        reject_parent_refs(&raw).map_err(|e| Error::Safety {
            path: raw.clone(),
            source: Box::new(e),
        })?;
        Ok(storage::join(dir, &sanitize_filename(&with_pdf_extension(name))))
    }
}

fn source_stem(source: &str) -> &str {
    let name = source.rsplit('/').next().unwrap_or(source);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

fn with_pdf_extension(name: String) -> String {
    if name.to_ascii_lowercase().ends_with(".pdf") {
        name
    } else {
        format!("{}.pdf", name)
    }
}

/// Extract `request.start..=request.end` from the source into a new PDF in
/// the sandbox and return its sandbox-relative path.
///
/// Path, range and size problems are reported before anything is written.
pub fn split_document<S: Storage, C: DocumentCodec>(
    storage: &S,
    codec: C,
    config: &Config,
    request: &SplitRequest,
) -> Result<FinalPath> {
    let persister = DocumentPersister::new(storage, codec, config.commit);
    let source = persister.load_source(&request.source, config.max_source_bytes)?;
    split_loaded(storage, &persister, config, &source, request)
}

/// [`split_document`] for a source the caller already loaded.
pub fn split_loaded<S: Storage, C: DocumentCodec>(
    storage: &S,
    persister: &DocumentPersister<'_, S, C>,
    config: &Config,
    source: &C::Source,
    request: &SplitRequest,
) -> Result<FinalPath> {
    let gate = SafetyGate::new(storage);
    check_bounds(
        request.start,
        request.end,
        persister.codec().page_count(source),
    )?;

    let candidate = request.output_candidate(config)?;
    gate.resolve(&gate.locate(&candidate)?, request.overwrite)?;

    let mut doc = persister.extract_range(source, request.start, request.end)?;
    let final_path = gate.prepare(&candidate)?;
    persister.persist(&mut doc, &final_path)?;

    info!(
        source = %request.source,
        start = request.start,
        end = request.end,
        output = %final_path,
        "split document"
    );
    Ok(final_path)
}

/// Whether something already exists where `candidate` would be written.
pub fn check_output_conflict<S: Storage>(storage: &S, candidate: &str) -> Result<bool> {
    let gate = SafetyGate::new(storage);
    let path = gate.locate(candidate)?;
    Ok(gate.check_conflict(&path)?.exists())
}
