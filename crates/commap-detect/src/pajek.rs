//! Pajek `.net` serialization of an [`AuthorGraph`].
//!
//! The writer emits the subset of Pajek the clustering tool consumes:
//!
//! ```text
//! *Vertices 3
//! 1 "a@x.com"
//! 2 "b@x.com"
//! 3 "c@x.com"
//! *Arcs
//! 1 2 0.5
//! 2 3 1
//! ```
//!
//! Vertex ids are 1-based in node-index order and labels are always quoted.
//! Weights use the shortest decimal form that reads back to the same `f64`.
//!
//! The reader accepts what the writer produces plus common variations:
//! section headers in any case, `%` comments, `*Edges` sections (each edge
//! becomes two arcs), unquoted labels, and arcs without a weight (1.0).

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, instrument};

use crate::error::{DetectError, ParseError, Result};
use crate::graph::AuthorGraph;

/// Write `graph` in Pajek format.
///
/// # Errors
///
/// Propagates I/O errors from `out`.
pub fn write_pajek<W: Write>(graph: &AuthorGraph, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "*Vertices {}", graph.node_count())?;
    for (i, author) in graph.authors().enumerate() {
        writeln!(out, "{} \"{}\"", i + 1, author)?;
    }
    writeln!(out, "*Arcs")?;
    for edge in graph.graph.raw_edges() {
        writeln!(
            out,
            "{} {} {}",
            edge.source().index() + 1,
            edge.target().index() + 1,
            edge.weight
        )?;
    }
    out.flush()
}

/// Write `graph` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`DetectError::Io`] on any filesystem failure.
#[instrument(skip(graph), fields(nodes = graph.node_count(), edges = graph.edge_count()))]
pub fn write_pajek_file(graph: &AuthorGraph, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DetectError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| DetectError::io(path, e))?;
    let mut out = BufWriter::new(file);
    write_pajek(graph, &mut out)
        .and_then(|()| out.flush())
        .map_err(|e| DetectError::io(path, e))?;
    debug!(path = %path.display(), "pajek written");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Vertices,
    Arcs,
    Edges,
}

/// Read a Pajek graph.
///
/// # Errors
///
/// Returns [`DetectError::Parse`] for malformed lines or undeclared vertex
/// ids, and [`DetectError::Read`] for read failures.
pub fn read_pajek<R: BufRead>(reader: R, source: &Path) -> Result<AuthorGraph> {
    let mut graph = AuthorGraph::new();
    let mut labels: HashMap<u64, String> = HashMap::new();
    let mut section = Section::Preamble;

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let raw = line.map_err(|e| DetectError::read(source, e))?;
        let content = raw.trim();
        if content.is_empty() || content.starts_with('%') {
            continue;
        }

        if let Some(header) = content.strip_prefix('*') {
            let keyword = header
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_ascii_lowercase();
            section = match keyword.as_str() {
                "vertices" => Section::Vertices,
                "arcs" => Section::Arcs,
                "edges" => Section::Edges,
                other => {
                    return Err(ParseError::pajek(
                        line_no,
                        &raw,
                        format!("unsupported section *{other}"),
                    )
                    .into());
                }
            };
            continue;
        }

        match section {
            Section::Preamble => {
                return Err(ParseError::pajek(line_no, &raw, "data before *Vertices").into());
            }
            Section::Vertices => {
                let (id, label) = parse_vertex(line_no, &raw, content)?;
                graph.ensure_node(&label);
                labels.insert(id, label);
            }
            Section::Arcs | Section::Edges => {
                let (from, to, weight) = parse_arc(line_no, &raw, content)?;
                let lookup = |id: u64| {
                    labels.get(&id).ok_or_else(|| {
                        ParseError::pajek(line_no, &raw, format!("undeclared vertex {id}"))
                    })
                };
                let a = lookup(from)?.clone();
                let b = lookup(to)?.clone();
                graph.set_edge(&a, &b, weight);
                if section == Section::Edges {
                    graph.set_edge(&b, &a, weight);
                }
            }
        }
    }

    Ok(graph)
}

/// Read a Pajek file from disk.
///
/// # Errors
///
/// See [`read_pajek`].
pub fn read_pajek_file(path: &Path) -> Result<AuthorGraph> {
    let file = File::open(path).map_err(|e| DetectError::read(path, e))?;
    read_pajek(BufReader::new(file), path)
}

fn parse_vertex(
    line_no: usize,
    raw: &str,
    content: &str,
) -> std::result::Result<(u64, String), ParseError> {
    let (id_field, rest) = content
        .split_once(char::is_whitespace)
        .unwrap_or((content, ""));
    let id = id_field
        .parse::<u64>()
        .map_err(|_| ParseError::pajek(line_no, raw, "invalid vertex id"))?;
    let rest = rest.trim_start();

    let label = if let Some(quoted) = rest.strip_prefix('"') {
        let close = quoted
            .rfind('"')
            .ok_or_else(|| ParseError::pajek(line_no, raw, "unterminated vertex label"))?;
        quoted[..close].to_string()
    } else {
        rest.split_whitespace()
            .next()
            .map_or_else(|| id.to_string(), str::to_string)
    };
    Ok((id, label))
}

fn parse_arc(
    line_no: usize,
    raw: &str,
    content: &str,
) -> std::result::Result<(u64, u64, f64), ParseError> {
    let mut fields = content.split_whitespace();
    let mut vertex = |what: &str| {
        fields
            .next()
            .and_then(|f| f.parse::<u64>().ok())
            .ok_or_else(|| ParseError::pajek(line_no, raw, format!("invalid {what} vertex")))
    };
    let from = vertex("source")?;
    let to = vertex("target")?;
    let weight = match fields.next() {
        None => 1.0,
        Some(w) => w
            .parse::<f64>()
            .map_err(|_| ParseError::pajek(line_no, raw, "invalid arc weight"))?,
    };
    Ok((from, to, weight))
}
