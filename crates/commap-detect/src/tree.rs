//! Reader for Infomap `.tree` output.
//!
//! A tree file is line oriented. Lines starting with `#` are comments,
//! blank lines are ignored, and every other line describes one node:
//!
//! ```text
//! # path flow name node_id
//! 1:1 0.25 "a@x.com" 4
//! 1:2 0.10 "b@x.com" 7
//! 2:1 0.05 "c@x.com" 1
//! ```
//!
//! The module path is a colon-separated list of 1-based indices; its first
//! segment is the top-level module. The flow is the node's share of the
//! network flow. The quoted name is the author address. A trailing node id
//! is optional.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{DetectError, ParseError, Result};

// ---------------------------------------------------------------------------
// ModulePath
// ---------------------------------------------------------------------------

/// A position in the module hierarchy, e.g. `1:3:2`.
///
/// The empty path denotes the whole graph. Serializes as `"1:3:2"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModulePath(Vec<u32>);

impl ModulePath {
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse `1:2:3`. Every segment must be a positive integer.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        raw.split(':')
            .map(|seg| seg.parse::<u32>().ok().filter(|idx| *idx > 0))
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The leading (top-level) module index.
    #[must_use]
    pub fn top_level(&self) -> Option<u32> {
        self.0.first().copied()
    }

    #[must_use]
    pub fn segments(&self) -> &[u32] {
        &self.0
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Extend this path with a child module index.
    #[must_use]
    pub fn child(&self, index: u32) -> Self {
        let mut segments = self.0.clone();
        segments.push(index);
        Self(segments)
    }

    /// Underscore-joined form used in artifact names: `1_3_2`.
    #[must_use]
    pub fn file_suffix(&self) -> String {
        self.0
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join("_")
    }
}

impl From<Vec<u32>> for ModulePath {
    fn from(segments: Vec<u32>) -> Self {
        Self(segments)
    }
}

impl Serialize for ModulePath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("root");
        }
        let joined = self
            .0
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(":");
        f.write_str(&joined)
    }
}

// ---------------------------------------------------------------------------
// TreeLine
// ---------------------------------------------------------------------------

/// One data line of a tree file.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeLine {
    /// 1-based line number in the source file.
    pub line: usize,
    pub path: ModulePath,
    pub flow: f64,
    /// Author address, without quotes.
    pub name: String,
    pub node_id: Option<u64>,
    /// The line as read, without the trailing newline.
    pub raw: String,
}

impl TreeLine {
    /// Leading module index. Always present for a parsed line.
    #[must_use]
    pub fn module(&self) -> u32 {
        self.path.top_level().unwrap_or_default()
    }
}

/// Parse one raw line.
///
/// Returns `Ok(None)` for blank and comment lines.
///
/// # Errors
///
/// Returns [`ParseError`] when the line has fewer than three fields, an
/// invalid module path, a non-numeric flow, or an unquoted name.
pub fn parse_tree_line(line_no: usize, raw: &str) -> std::result::Result<Option<TreeLine>, ParseError> {
    let content = raw.trim_end_matches(['\n', '\r']);
    let trimmed = content.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = trimmed.split_whitespace().take(3).collect();
    let [path_field, flow_field, _] = fields[..] else {
        return Err(ParseError::tree(
            line_no,
            content,
            format!(
                "expected at least 3 whitespace-separated fields, found {}",
                fields.len()
            ),
        ));
    };

    let path = ModulePath::parse(path_field)
        .ok_or_else(|| ParseError::tree(line_no, content, "invalid module path"))?;

    let flow = flow_field
        .parse::<f64>()
        .ok()
        .filter(|flow| flow.is_finite())
        .ok_or_else(|| ParseError::tree(line_no, content, "invalid flow value"))?;

    let rest = trimmed[path_field.len()..].trim_start();
    let rest = rest[flow_field.len()..].trim_start();
    let Some(quoted) = rest.strip_prefix('"') else {
        return Err(ParseError::tree(line_no, content, "node name is not quoted"));
    };
    let Some(close) = quoted.rfind('"') else {
        return Err(ParseError::tree(line_no, content, "unterminated node name"));
    };
    let name = &quoted[..close];
    if name.is_empty() {
        return Err(ParseError::tree(line_no, content, "empty node name"));
    }

    let node_id = quoted[close + 1..]
        .split_whitespace()
        .next()
        .and_then(|id| id.parse::<u64>().ok());

    Ok(Some(TreeLine {
        line: line_no,
        path,
        flow,
        name: name.to_string(),
        node_id,
        raw: content.to_string(),
    }))
}

// ---------------------------------------------------------------------------
// TreeReader
// ---------------------------------------------------------------------------

/// Streaming iterator over the data lines of a tree file.
pub struct TreeReader<R> {
    reader: R,
    source: PathBuf,
    line_no: usize,
    buf: String,
    done: bool,
}

impl TreeReader<BufReader<File>> {
    /// Open a tree file for streaming.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::Read`] if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| DetectError::read(path, e))?;
        Ok(Self::new(BufReader::new(file), path))
    }
}

impl<R: BufRead> TreeReader<R> {
    /// Wrap any buffered reader; `source` labels I/O errors.
    pub fn new(reader: R, source: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            source: source.into(),
            line_no: 0,
            buf: String::new(),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for TreeReader<R> {
    type Item = Result<TreeLine>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line_no += 1;
                    match parse_tree_line(self.line_no, &self.buf) {
                        Ok(Some(line)) => return Some(Ok(line)),
                        Ok(None) => {}
                        Err(err) => {
                            self.done = true;
                            return Some(Err(err.into()));
                        }
                    }
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(DetectError::read(&self.source, err)));
                }
            }
        }
        None
    }
}
