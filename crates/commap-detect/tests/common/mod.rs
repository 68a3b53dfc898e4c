//! Shared fixtures: a recording clustering runner and corpus helpers.

#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use commap_core::corpus::{Corpus, Message};
use commap_detect::pajek::read_pajek_file;
use commap_detect::runner::{ClusteringRunner, RunStatus};
use commap_detect::AuthorGraph;

/// One recorded tool invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub flags: Vec<String>,
    /// The network file as it was when the tool ran.
    pub graph: AuthorGraph,
}

type TreeFn = Box<dyn Fn(&AuthorGraph) -> String>;

/// Stands in for Infomap: records each call and writes `<stem>.tree`.
pub struct RecordingRunner {
    pub calls: RefCell<Vec<Invocation>>,
    status: RunStatus,
    tree: TreeFn,
}

impl RecordingRunner {
    /// Every author in a single module, flow split evenly.
    pub fn single_module() -> Self {
        Self::with_tree(|graph| {
            let mut out = String::from("# Codelength = 1 bits\n");
            for (i, author) in graph.authors().enumerate() {
                out.push_str(&format!("1:{} 0.1 \"{}\" {}\n", i + 1, author, i + 1));
            }
            out
        })
    }

    pub fn with_tree(tree: impl Fn(&AuthorGraph) -> String + 'static) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            status: RunStatus::SUCCESS,
            tree: Box::new(tree),
        }
    }

    pub fn failing(code: i32) -> Self {
        let mut runner = Self::single_module();
        runner.status = RunStatus { code: Some(code) };
        runner
    }

    pub fn inputs(&self) -> Vec<PathBuf> {
        self.calls.borrow().iter().map(|c| c.input.clone()).collect()
    }
}

impl ClusteringRunner for RecordingRunner {
    fn run(&self, input: &Path, output_dir: &Path, flags: &[String]) -> std::io::Result<RunStatus> {
        let graph = read_pajek_file(input).expect("runner input is valid pajek");
        if self.status.success() {
            let stem = input.file_stem().expect("stem").to_string_lossy().into_owned();
            fs::write(output_dir.join(format!("{stem}.tree")), (self.tree)(&graph))?;
        }
        self.calls.borrow_mut().push(Invocation {
            input: input.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            flags: flags.to_vec(),
            graph,
        });
        Ok(self.status)
    }
}

/// Corpus from `(from, to)` pairs, one message each.
pub fn corpus(pairs: &[(&str, &str)]) -> Corpus {
    pairs
        .iter()
        .enumerate()
        .map(|(i, (from, to))| (format!("m{i:04}"), Message::new(from, &[*to], None)))
        .collect()
}
