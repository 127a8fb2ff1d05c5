use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

/// Characters that are unsafe in a filename on at least one common filesystem.
const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*', '\\'];

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static DASH_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

/// A sandbox-relative path that passed [`validate`], split into its
/// directory segments and final filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPath {
    pub directory: Vec<String>,
    pub filename: String,
}

impl ValidatedPath {
    pub fn directory_path(&self) -> String {
        self.directory.join("/")
    }
}

/// Check a caller-supplied path against the sandbox rules.
///
/// Any occurrence of `../` or `..\` is rejected before looking at segments,
/// so names that merely contain those substrings are refused too.
pub fn validate(candidate: &str) -> Result<ValidatedPath> {
    reject_parent_refs(candidate)?;
    if candidate.contains('\0') {
        return Err(Error::traversal(candidate, "\\0", "NUL byte"));
    }

    let mut segments = Vec::new();
    for segment in candidate.trim_matches('/').split('/') {
        let reason = if segment.is_empty() {
            Some("empty segment")
        } else if segment == "." || segment == ".." {
            Some("relative segment")
        } else if segment.contains('\\') {
            Some("backslash in segment")
        } else if segment.contains(':') {
            Some("drive or stream designator")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(Error::traversal(candidate, segment, reason));
        }
        segments.push(segment.to_string());
    }

    // split always yields at least one item
    let filename = segments.pop().unwrap_or_default();
    Ok(ValidatedPath {
        directory: segments,
        filename,
    })
}

/// The textual half of [`validate`]: refuse `../` and `..\` anywhere in
/// `candidate`. Run it on raw input that is rewritten before validation.
pub fn reject_parent_refs(candidate: &str) -> Result<()> {
    for needle in ["../", "..\\"] {
        if candidate.contains(needle) {
            return Err(Error::traversal(
                candidate,
                needle,
                "parent directory reference",
            ));
        }
    }
    Ok(())
}

/// Replace filesystem-hostile characters in `name`, leaving the extension
/// (everything from the last `.`) untouched. Never fails.
pub fn sanitize_filename(name: &str) -> String {
    let (base, extension) = match name.rfind('.') {
        Some(dot) => name.split_at(dot),
        None => (name, ""),
    };

    let replaced: String = base
        .chars()
        .map(|c| if INVALID_FILENAME_CHARS.contains(&c) { '-' } else { c })
        .collect();
    let spaced = WHITESPACE_RUN.replace_all(&replaced, " ");
    let dashed = DASH_RUN.replace_all(&spaced, "-");

    format!("{}{}", dashed.trim(), extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_nested_path() {
        let path = validate("/Splits/2024/report.pdf/").unwrap();
        assert_eq!(path.directory, vec!["Splits", "2024"]);
        assert_eq!(path.filename, "report.pdf");
        assert_eq!(path.directory_path(), "Splits/2024");
    }

    #[test]
    fn test_bare_filename() {
        let path = validate("report.pdf").unwrap();
        assert!(path.directory.is_empty());
        assert_eq!(path.filename, "report.pdf");
    }

    #[test]
    fn test_rejects_etc_passwd() {
        let err = validate("../../etc/passwd").unwrap_err();
        assert!(matches!(err, Error::Traversal { .. }));
    }

    #[test]
    fn test_rejects_bad_segments() {
        for candidate in [
            "",
            "/",
            "a//b.pdf",
            "./a.pdf",
            "a/..",
            "a/./b.pdf",
            "C:/a.pdf",
            "a/file.pdf:stream",
            "a\\b.pdf",
            "a/b\0.pdf",
        ] {
            assert!(
                matches!(validate(candidate), Err(Error::Traversal { .. })),
                "{:?} should be rejected",
                candidate
            );
        }
    }

    #[test]
    fn test_reports_offending_segment() {
        match validate("ok/C:/x.pdf") {
            Err(Error::Traversal { segment, .. }) => assert_eq!(segment, "C:"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_textual_guard_false_positive() {
        // Not a traversal once resolved, but refused by the textual guard.
        assert!(validate("notes../a.pdf").is_err());
    }

    #[test]
    fn test_parent_refs_found_in_raw_names() {
        assert!(reject_parent_refs("..\\..\\evil.pdf").is_err());
        assert!(reject_parent_refs("Out/../x.pdf").is_err());
        assert!(reject_parent_refs("..hidden.pdf").is_ok());
    }

    #[test]
    fn test_sanitize_scenario() {
        assert_eq!(sanitize_filename("My:Notes*.pdf"), "My-Notes-.pdf");
    }

    #[test]
    fn test_sanitize_collapses() {
        assert_eq!(sanitize_filename("  a   b<>|c  .pdf"), "a b-c.pdf");
        assert_eq!(sanitize_filename("a\t\nb"), "a b");
        assert_eq!(sanitize_filename("x--y??z.PDF"), "x-y-z.PDF");
    }

    #[test]
    fn test_sanitize_leaves_extension_alone() {
        assert_eq!(sanitize_filename("a*b.p?f"), "a-b.p?f");
        assert_eq!(sanitize_filename("archive.tar.gz"), "archive.tar.gz");
        assert_eq!(sanitize_filename(".hidden"), ".hidden");
    }

    #[test]
    fn test_sanitize_can_produce_empty_base() {
        assert_eq!(sanitize_filename("   "), "");
        assert_eq!(sanitize_filename("***"), "-");
    }

    proptest! {
        #[test]
        fn prop_parent_refs_always_rejected(
            prefix in ".{0,12}",
            sep in prop_oneof![Just("../"), Just("..\\")],
            suffix in ".{0,12}",
        ) {
            let candidate = format!("{}{}{}", prefix, sep, suffix);
            let rejected = matches!(validate(&candidate), Err(Error::Traversal { .. }));
            prop_assert!(rejected);
        }

        #[test]
        fn prop_sanitize_idempotent(name in r"[ a-zA-Z0-9<>:|?*\\.\t-]{0,24}") {
            let once = sanitize_filename(&name);
            prop_assert_eq!(sanitize_filename(&once), once);
        }

        #[test]
        fn prop_sanitize_keeps_extension(
            base in r"[ a-zA-Z<>:|?*-]{0,16}",
            ext in r"[a-zA-Z0-9<>*?]{1,5}",
        ) {
            let name = format!("{}.{}", base, ext);
            let sanitized = sanitize_filename(&name);
            let expected = format!(".{}", ext);
            prop_assert!(sanitized.ends_with(&expected));
        }
    }
}
