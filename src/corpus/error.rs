//! Error types for corpus loading.

use std::backtrace::Backtrace;
use std::fmt;
use std::path::{Path, PathBuf};

/// Error type for corpus loading and fixture reads.
///
/// A malformed fixture is not an error here: it loads fine and is reported
/// by the contract checks. These errors mean the corpus could not be read
/// at all.
#[derive(Debug)]
pub struct CorpusError {
    kind: CorpusErrorKind,
    path: PathBuf,
    backtrace: Backtrace,
}

/// Internal error variants. Not exposed publicly; use `is_xxx()` methods instead.
#[derive(Debug)]
pub(crate) enum CorpusErrorKind {
    /// The corpus root does not exist.
    MissingRoot,
    /// The corpus root exists but is not a directory.
    NotADirectory,
    /// A fixture is not valid UTF-8.
    Encoding(std::string::FromUtf8Error),
    /// I/O error while walking or reading.
    Io(std::io::Error),
}

impl CorpusError {
    /// Creates an error from an error kind, capturing a backtrace.
    pub(crate) fn new(kind: CorpusErrorKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            backtrace: Backtrace::capture(),
        }
    }

    pub(crate) fn io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::new(CorpusErrorKind::Io(err), path)
    }

    /// Returns true if the corpus root does not exist.
    pub fn is_missing_root(&self) -> bool {
        matches!(self.kind, CorpusErrorKind::MissingRoot)
    }

    /// Returns true if the corpus root is not a directory.
    pub fn is_not_a_directory(&self) -> bool {
        matches!(self.kind, CorpusErrorKind::NotADirectory)
    }

    /// Returns true if a fixture is not valid UTF-8.
    pub fn is_encoding(&self) -> bool {
        matches!(self.kind, CorpusErrorKind::Encoding(_))
    }

    /// Returns true if this error is due to I/O failure.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, CorpusErrorKind::Io(_))
    }

    /// The path the failing operation was working on.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the backtrace captured when this error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for CorpusErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorpusErrorKind::MissingRoot => write!(f, "corpus root does not exist"),
            CorpusErrorKind::NotADirectory => write!(f, "corpus root is not a directory"),
            CorpusErrorKind::Encoding(err) => write!(f, "fixture is not valid UTF-8: {err}"),
            CorpusErrorKind::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl fmt::Display for CorpusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}", self.path.display(), self.kind)?;

        // Backtrace (will be empty unless RUST_BACKTRACE is set).
        write!(f, "{}", self.backtrace)
    }
}

impl std::error::Error for CorpusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            CorpusErrorKind::MissingRoot | CorpusErrorKind::NotADirectory => None,
            CorpusErrorKind::Encoding(err) => Some(err),
            CorpusErrorKind::Io(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn test_missing_root() {
        let err = CorpusError::new(CorpusErrorKind::MissingRoot, "nowhere");

        assert!(err.is_missing_root());
        assert!(!err.is_io());
        assert!(!err.is_encoding());

        assert!(err.to_string().contains("nowhere: corpus root does not exist"));
        assert!(err.source().is_none());
        assert_eq!(err.path(), Path::new("nowhere"));
    }

    #[test]
    fn test_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = CorpusError::io(io_err, "c/basic.c");

        assert!(err.is_io());
        assert!(!err.is_not_a_directory());
        assert!(err.to_string().contains("I/O error"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_encoding_error() {
        let utf8_err = String::from_utf8(vec![0xff, 0xfe]).unwrap_err();
        let err = CorpusError::new(CorpusErrorKind::Encoding(utf8_err), "bad.c");

        assert!(err.is_encoding());
        assert!(err.to_string().contains("not valid UTF-8"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_backtrace_captured() {
        let err = CorpusError::new(CorpusErrorKind::NotADirectory, "file.c");
        // Content depends on RUST_BACKTRACE.
        let _ = err.backtrace();
        assert!(format!("{err:?}").contains("CorpusError"));
    }
}
