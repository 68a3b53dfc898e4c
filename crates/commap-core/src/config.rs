use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::ranking::DEFAULT_TOP_N;

/// Name of the project configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "commap.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub infomap: InfomapConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub submodules: SubmoduleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_active_score")]
    pub active_score: f64,
    #[serde(default = "default_passive_score")]
    pub passive_score: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            active_score: default_active_score(),
            passive_score: default_passive_score(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_weighting")]
    pub weighting: WeightingKind,
    #[serde(default = "default_submodule_weighting")]
    pub submodule_weighting: WeightingKind,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            weighting: default_weighting(),
            submodule_weighting: default_submodule_weighting(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfomapConfig {
    #[serde(default = "default_infomap_binary")]
    pub binary: PathBuf,
    #[serde(default = "default_infomap_flags")]
    pub flags: Vec<String>,
}

impl Default for InfomapConfig {
    fn default() -> Self {
        Self {
            binary: default_infomap_binary(),
            flags: default_infomap_flags(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub missing_flow: MissingFlowPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmoduleConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for SubmoduleConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

// ---------------------------------------------------------------------------
// Policy selectors
// ---------------------------------------------------------------------------

/// Which edge-weighting rule a graph build applies to repeated edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightingKind {
    /// `w ← w·w / (w + 1)` on every repeat.
    Rescale,
    /// `w ← w + 1` on every repeat.
    Increment,
}

impl WeightingKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rescale => "rescale",
            Self::Increment => "increment",
        }
    }
}

impl fmt::Display for WeightingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeightingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rescale" => Ok(Self::Rescale),
            "increment" => Ok(Self::Increment),
            other => Err(format!(
                "unknown weighting '{other}' (expected 'rescale' or 'increment')"
            )),
        }
    }
}

/// What the report does with a top author that has no module flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingFlowPolicy {
    /// Fail the join with a missing-data error.
    #[default]
    Error,
    /// Write an empty Module Flow field.
    Null,
}

impl MissingFlowPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for MissingFlowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingFlowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "null" | "empty" => Ok(Self::Null),
            other => Err(format!(
                "unknown missing-flow policy '{other}' (expected 'error' or 'null')"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load `commap.toml` from `project_root`, or defaults when it is absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    load_config_file(&project_root.join(CONFIG_FILE_NAME), false)
}

/// Load configuration from an explicit path.
///
/// With `required = false` a missing file yields defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if it is
/// missing and `required` is set.
pub fn load_config_file(path: &Path, required: bool) -> Result<ProjectConfig> {
    if !path.exists() {
        if required {
            anyhow::bail!("config file {} does not exist", path.display());
        }
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

const fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

const fn default_active_score() -> f64 {
    2.0
}

const fn default_passive_score() -> f64 {
    1.0
}

const fn default_weighting() -> WeightingKind {
    WeightingKind::Rescale
}

const fn default_submodule_weighting() -> WeightingKind {
    WeightingKind::Increment
}

fn default_infomap_binary() -> PathBuf {
    PathBuf::from("./infomap/Infomap")
}

fn default_infomap_flags() -> Vec<String> {
    [
        "--tree",
        "--bftree",
        "--btree",
        "-d",
        "-c",
        "--node-ranks",
        "--flow-network",
        "--map",
    ]
    .iter()
    .map(|flag| (*flag).to_string())
    .collect()
}

const fn default_max_depth() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("tempdir");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.ranking.top_n, 100);
        assert!((cfg.ranking.active_score - 2.0).abs() < f64::EPSILON);
        assert_eq!(cfg.graph.weighting, WeightingKind::Rescale);
        assert_eq!(cfg.graph.submodule_weighting, WeightingKind::Increment);
        assert_eq!(cfg.report.missing_flow, MissingFlowPolicy::Error);
        assert_eq!(cfg.submodules.max_depth, 1);
        assert_eq!(cfg.infomap.flags.len(), 8);
        assert_eq!(cfg.infomap.flags[0], "--tree");
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let root = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            root.path().join(CONFIG_FILE_NAME),
            r#"
[ranking]
top_n = 25

[graph]
weighting = "increment"

[report]
missing_flow = "null"
"#,
        )
        .expect("write config");

        let cfg = load_project_config(root.path()).expect("load");
        assert_eq!(cfg.ranking.top_n, 25);
        assert!((cfg.ranking.passive_score - 1.0).abs() < f64::EPSILON);
        assert_eq!(cfg.graph.weighting, WeightingKind::Increment);
        assert_eq!(cfg.graph.submodule_weighting, WeightingKind::Increment);
        assert_eq!(cfg.report.missing_flow, MissingFlowPolicy::Null);
        assert_eq!(cfg.infomap.binary, PathBuf::from("./infomap/Infomap"));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let root = tempfile::tempdir().expect("tempdir");
        std::fs::write(root.path().join(CONFIG_FILE_NAME), "[graph]\nweighting = \"square\"\n")
            .expect("write config");
        let err = load_project_config(root.path()).expect_err("must fail");
        assert!(format!("{err:#}").contains("Failed to parse"));
    }

    #[test]
    fn required_config_must_exist() {
        let root = tempfile::tempdir().expect("tempdir");
        let path = root.path().join("custom.toml");
        assert!(load_config_file(&path, true).is_err());
        assert!(load_config_file(&path, false).is_ok());
    }

    #[test]
    fn selectors_parse_case_insensitively() {
        assert_eq!("Rescale".parse::<WeightingKind>(), Ok(WeightingKind::Rescale));
        assert_eq!(" increment ".parse::<WeightingKind>(), Ok(WeightingKind::Increment));
        assert!("square".parse::<WeightingKind>().is_err());
        assert_eq!("NULL".parse::<MissingFlowPolicy>(), Ok(MissingFlowPolicy::Null));
        assert!("skip".parse::<MissingFlowPolicy>().is_err());
    }
}
