//! Error taxonomy for graph preparation, tree joins and tool runs.

use std::fmt;
use std::io;
use std::path::PathBuf;

use commap_core::error::ErrorCode;

use crate::tree::ModulePath;

/// Result alias for `commap-detect`.
pub type Result<T> = std::result::Result<T, DetectError>;

/// Top-level error for detection operations.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    ExternalTool(#[from] ExternalToolError),

    #[error(transparent)]
    MissingData(#[from] MissingDataError),

    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl DetectError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Stable code for this failure class.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Parse(err) => match err.source_kind {
                SourceKind::Tree => ErrorCode::TreeParseError,
                SourceKind::Pajek => ErrorCode::PajekParseError,
            },
            Self::ExternalTool(err) => match err.kind {
                ToolFailure::MissingArtifact(_) => ErrorCode::ToolArtifactMissing,
                _ => ErrorCode::ExternalToolFailed,
            },
            Self::MissingData(_) => ErrorCode::MissingModuleFlow,
            Self::Read { .. } => ErrorCode::InputReadFailed,
            Self::Io { .. } | Self::Csv(_) => ErrorCode::ReportWriteFailed,
        }
    }
}

// ---------------------------------------------------------------------------
// ParseError
// ---------------------------------------------------------------------------

/// Which file format a [`ParseError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Tree,
    Pajek,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree => f.write_str("tree"),
            Self::Pajek => f.write_str("pajek"),
        }
    }
}

/// A malformed line in a tree or Pajek file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{source_kind} line {line}: {reason}: {content:?}")]
pub struct ParseError {
    pub source_kind: SourceKind,
    /// 1-based line number.
    pub line: usize,
    /// Raw line content, without the trailing newline.
    pub content: String,
    pub reason: String,
}

impl ParseError {
    pub(crate) fn tree(line: usize, content: &str, reason: impl Into<String>) -> Self {
        Self {
            source_kind: SourceKind::Tree,
            line,
            content: content.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn pajek(line: usize, content: &str, reason: impl Into<String>) -> Self {
        Self {
            source_kind: SourceKind::Pajek,
            line,
            content: content.to_string(),
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ExternalToolError
// ---------------------------------------------------------------------------

/// How a clustering tool run failed.
#[derive(Debug, thiserror::Error)]
pub enum ToolFailure {
    #[error("could not create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not start clustering run on {input}: {source}")]
    Spawn {
        input: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `None` means the process was terminated by a signal.
    #[error("exited with status {}", .0.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    ExitStatus(Option<i32>),

    #[error("expected output {0} was not produced")]
    MissingArtifact(PathBuf),
}

/// A clustering tool run failed for the given module.
#[derive(Debug, thiserror::Error)]
#[error("clustering tool failed for module {module}: {kind}")]
pub struct ExternalToolError {
    /// Module path of the failing run; the empty path is the whole graph.
    pub module: ModulePath,
    #[source]
    pub kind: ToolFailure,
}

// ---------------------------------------------------------------------------
// MissingDataError
// ---------------------------------------------------------------------------

/// Graph authors and tree authors do not line up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingDataError {
    /// Top authors in the graph with no line in the tree file.
    pub missing_from_tree: Vec<String>,
    /// Tree authors that are not top authors.
    pub unknown_in_tree: Vec<String>,
}

impl MissingDataError {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing_from_tree.is_empty() && self.unknown_in_tree.is_empty()
    }
}

impl fmt::Display for MissingDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing_from_tree.is_empty() {
            parts.push(format!(
                "{} author(s) missing from tree: {}",
                self.missing_from_tree.len(),
                preview(&self.missing_from_tree)
            ));
        }
        if !self.unknown_in_tree.is_empty() {
            parts.push(format!(
                "{} tree author(s) not in top set: {}",
                self.unknown_in_tree.len(),
                preview(&self.unknown_in_tree)
            ));
        }
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for MissingDataError {}

fn preview(addrs: &[String]) -> String {
    const SHOWN: usize = 5;
    let mut out = addrs
        .iter()
        .take(SHOWN)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if addrs.len() > SHOWN {
        out.push_str(", ...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_names_line_and_content() {
        let err = ParseError::tree(7, "1:1 0.5", "expected at least 3 fields");
        let msg = err.to_string();
        assert!(msg.contains("line 7"), "{msg}");
        assert!(msg.contains("\"1:1 0.5\""), "{msg}");
    }

    #[test]
    fn codes_follow_failure_class() {
        let parse = DetectError::from(ParseError::pajek(1, "x", "bad"));
        assert_eq!(parse.code(), ErrorCode::PajekParseError);

        let missing = DetectError::from(ExternalToolError {
            module: ModulePath::root(),
            kind: ToolFailure::MissingArtifact(PathBuf::from("out/g.tree")),
        });
        assert_eq!(missing.code(), ErrorCode::ToolArtifactMissing);

        let exit = DetectError::from(ExternalToolError {
            module: ModulePath::from(vec![2]),
            kind: ToolFailure::ExitStatus(Some(3)),
        });
        assert_eq!(exit.code(), ErrorCode::ExternalToolFailed);

        let read = DetectError::read(
            "infomap/output/g.tree",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(read.code(), ErrorCode::InputReadFailed);
        assert_eq!(read.to_string(), "could not read infomap/output/g.tree: gone");

        let write = DetectError::io("out.csv", io::Error::other("disk full"));
        assert_eq!(write.code(), ErrorCode::ReportWriteFailed);
        assert_eq!(
            exit.to_string(),
            "clustering tool failed for module 2: exited with status 3"
        );
    }

    #[test]
    fn missing_data_message_truncates_long_lists() {
        let err = MissingDataError {
            missing_from_tree: (0..8).map(|i| format!("u{i}@x.com")).collect(),
            unknown_in_tree: vec![],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("8 author(s) missing from tree"));
        assert!(msg.ends_with(", ..."));
    }
}
