//! The clustering tool boundary.
//!
//! Detection is delegated to an external program. The pipeline only needs
//! one capability from it: cluster the network in `input`, writing results
//! into `output_dir`, and report how the run ended. [`ClusteringRunner`]
//! captures that so tests can substitute a recording fake.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, instrument};

use crate::error::{ExternalToolError, ToolFailure};
use crate::tree::ModulePath;

/// How a clustering run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    /// Exit code, or `None` if the process was killed by a signal.
    pub code: Option<i32>,
}

impl RunStatus {
    pub const SUCCESS: Self = Self { code: Some(0) };

    #[must_use]
    pub const fn success(self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Synchronous clustering capability.
pub trait ClusteringRunner {
    /// Cluster `input` into `output_dir` with `flags`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error only when the run could not be started; a run
    /// that started and failed reports it through [`RunStatus`].
    fn run(&self, input: &Path, output_dir: &Path, flags: &[String]) -> std::io::Result<RunStatus>;
}

/// Runs the Infomap binary: `<binary> <input> <output_dir> <flags...>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfomapRunner {
    binary: PathBuf,
}

impl InfomapRunner {
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl ClusteringRunner for InfomapRunner {
    fn run(&self, input: &Path, output_dir: &Path, flags: &[String]) -> std::io::Result<RunStatus> {
        info!(
            "Running: {} {} {} {}",
            self.binary.display(),
            input.display(),
            output_dir.display(),
            flags.join(" ")
        );
        let status = Command::new(&self.binary)
            .arg(input)
            .arg(output_dir)
            .args(flags)
            .status()?;
        Ok(RunStatus {
            code: status.code(),
        })
    }
}

/// One clustering job: the network file and where its results go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusteringJob<'a> {
    pub module: &'a ModulePath,
    pub input: &'a Path,
    pub output_dir: &'a Path,
    pub flags: &'a [String],
}

impl ClusteringJob<'_> {
    /// Tree file the tool writes for this job: `<output_dir>/<input stem>.tree`.
    #[must_use]
    pub fn expected_tree(&self) -> PathBuf {
        let stem = self
            .input
            .file_stem()
            .map_or_else(|| "network".into(), |s| s.to_string_lossy().into_owned());
        self.output_dir.join(format!("{stem}.tree"))
    }

    /// Create the output directory, run the tool and check its tree output.
    ///
    /// Returns the path of the produced tree file.
    ///
    /// # Errors
    ///
    /// Returns [`ExternalToolError`] tagged with this job's module when the
    /// directory cannot be created, the tool cannot be started, exits
    /// unsuccessfully, or leaves no tree file behind.
    #[instrument(skip_all, fields(module = %self.module))]
    pub fn execute(&self, runner: &dyn ClusteringRunner) -> Result<PathBuf, ExternalToolError> {
        let fail = |kind| ExternalToolError {
            module: self.module.clone(),
            kind,
        };

        fs::create_dir_all(self.output_dir).map_err(|source| {
            fail(ToolFailure::CreateDir {
                path: self.output_dir.to_path_buf(),
                source,
            })
        })?;

        let status = runner
            .run(self.input, self.output_dir, self.flags)
            .map_err(|source| {
                fail(ToolFailure::Spawn {
                    input: self.input.to_path_buf(),
                    source,
                })
            })?;
        if !status.success() {
            return Err(fail(ToolFailure::ExitStatus(status.code)));
        }

        let tree = self.expected_tree();
        if !tree.is_file() {
            return Err(fail(ToolFailure::MissingArtifact(tree)));
        }
        debug!(tree = %tree.display(), "clustering finished");
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FixedRunner {
        status: RunStatus,
        write_tree: bool,
        calls: Cell<usize>,
    }

    impl ClusteringRunner for FixedRunner {
        fn run(&self, input: &Path, output_dir: &Path, _flags: &[String]) -> std::io::Result<RunStatus> {
            self.calls.set(self.calls.get() + 1);
            if self.write_tree {
                let stem = input.file_stem().expect("stem").to_string_lossy();
                fs::write(output_dir.join(format!("{stem}.tree")), "1:1 1 \"a\"\n")?;
            }
            Ok(self.status)
        }
    }

    fn job<'a>(module: &'a ModulePath, input: &'a Path, out: &'a Path) -> ClusteringJob<'a> {
        ClusteringJob {
            module,
            input,
            output_dir: out,
            flags: &[],
        }
    }

    #[test]
    fn successful_run_returns_tree_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("submodule_1.net");
        let out = dir.path().join("output_submodule1");
        let module = ModulePath::from(vec![1]);
        let runner = FixedRunner {
            status: RunStatus::SUCCESS,
            write_tree: true,
            calls: Cell::new(0),
        };
        let tree = job(&module, &input, &out).execute(&runner).expect("run");
        assert_eq!(tree, out.join("submodule_1.tree"));
        assert_eq!(runner.calls.get(), 1);
    }

    #[test]
    fn non_zero_exit_is_reported_with_module() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("g.net");
        let out = dir.path().join("out");
        let module = ModulePath::from(vec![3]);
        let runner = FixedRunner {
            status: RunStatus { code: Some(2) },
            write_tree: true,
            calls: Cell::new(0),
        };
        let err = job(&module, &input, &out).execute(&runner).expect_err("exit 2");
        assert_eq!(err.module, module);
        assert!(matches!(err.kind, ToolFailure::ExitStatus(Some(2))));
    }

    #[test]
    fn missing_tree_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("g.net");
        let out = dir.path().join("out");
        let module = ModulePath::root();
        let runner = FixedRunner {
            status: RunStatus::SUCCESS,
            write_tree: false,
            calls: Cell::new(0),
        };
        let err = job(&module, &input, &out).execute(&runner).expect_err("no tree");
        assert!(matches!(err.kind, ToolFailure::MissingArtifact(_)));
    }

    #[test]
    fn missing_binary_is_a_spawn_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("g.net");
        let out = dir.path().join("out");
        let module = ModulePath::root();
        let runner = InfomapRunner::new(dir.path().join("no-such-infomap"));
        let err = job(&module, &input, &out).execute(&runner).expect_err("spawn");
        assert!(matches!(err.kind, ToolFailure::Spawn { .. }));
        assert!(out.is_dir(), "output directory is created before the run");
    }
}
