use std::fmt;
use std::io;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Which side of a page range was out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    StartBelowOne,
    StartAfterEnd,
    EndBeyondCount,
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeBound::StartBelowOne => f.write_str("start page below 1"),
            RangeBound::StartAfterEnd => f.write_str("start page after end page"),
            RangeBound::EndBeyondCount => f.write_str("end page beyond page count"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("path '{candidate}' rejected at segment '{segment}': {reason}")]
    Traversal {
        candidate: String,
        segment: String,
        reason: &'static str,
    },

    #[error("invalid page range {start}-{end} for {page_count} page(s): {bound}")]
    Range {
        start: u32,
        end: u32,
        page_count: u32,
        bound: RangeBound,
    },

    #[error("source '{path}' is {size} bytes, over the {max} byte limit")]
    SizeExceeded { path: String, size: u64, max: u64 },

    #[error("failed to load PDF '{path}': {reason}")]
    Load { path: String, reason: String },

    #[error("failed to serialize document: {0}")]
    Serialization(String),

    #[error("I/O error on '{path}': {source}")]
    Io { path: String, source: io::Error },

    #[error("'{path}' failed post-write verification: {reason}")]
    Verification { path: String, reason: String },

    #[error("'{path}' already exists and overwriting was not confirmed")]
    Conflict { path: String },

    #[error("unsafe output path '{path}': {source}")]
    Safety { path: String, source: Box<Error> },
}

impl Error {
    pub(crate) fn io(path: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn traversal(
        candidate: &str,
        segment: impl Into<String>,
        reason: &'static str,
    ) -> Self {
        Error::Traversal {
            candidate: candidate.to_string(),
            segment: segment.into(),
            reason,
        }
    }
}

#[cfg(test)]
impl Error {
    /// The error underneath any `Safety` wrapping.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Safety { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_keeps_low_level_message() {
        let err = Error::io(
            "out/a.pdf",
            io::Error::new(io::ErrorKind::Other, "No space left on device"),
        );
        let msg = err.to_string();
        assert!(msg.contains("out/a.pdf"));
        assert!(msg.contains("No space left on device"));
    }

    #[test]
    fn root_cause_unwraps_safety() {
        let inner = Error::traversal("../x", "..", "parent directory reference");
        let err = Error::Safety {
            path: "../x".to_string(),
            source: Box::new(inner),
        };
        assert!(matches!(err.root_cause(), Error::Traversal { .. }));
        assert!(err.to_string().contains("parent directory reference"));
    }

    #[test]
    fn range_error_names_bound() {
        let err = Error::Range {
            start: 4,
            end: 2,
            page_count: 10,
            bound: RangeBound::StartAfterEnd,
        };
        assert!(err.to_string().contains("start page after end page"));
    }
}
