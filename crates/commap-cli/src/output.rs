//! Output layer shared by all commands.
//!
//! Results go to stdout, either as a short human summary or as pretty JSON
//! (`--json`). Errors go to stderr in the same mode, tagged with their
//! stable [`ErrorCode`].

use std::io::{self, Write};

use commap_core::corpus::CorpusError;
use commap_core::error::ErrorCode;
use commap_detect::DetectError;
use serde::Serialize;

/// Output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<14} {}", format!("{key}:"), value.as_ref())
}

/// Render a serializable value to stdout in the requested format.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if mode.is_json() {
        serde_json::to_writer_pretty(&mut out, value)?;
        writeln!(out)?;
    } else {
        human_fn(value, &mut out)?;
    }
    Ok(())
}

/// Configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
#[error("{0:#}")]
pub struct ConfigError(pub anyhow::Error);

/// A failed command, ready for rendering.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub error_code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

impl From<&anyhow::Error> for CliError {
    fn from(err: &anyhow::Error) -> Self {
        let code = classify(err);
        Self {
            error_code: code.code(),
            message: describe(err),
            hint: code.hint(),
        }
    }
}

/// Join the error chain into one line, dropping causes the previous
/// messages already spell out.
pub fn describe(err: &anyhow::Error) -> String {
    let mut message = String::new();
    for cause in err.chain() {
        let text = cause.to_string();
        if message.contains(&text) {
            continue;
        }
        if !message.is_empty() {
            message.push_str(": ");
        }
        message.push_str(&text);
    }
    message
}

/// Map an error chain to its stable code.
pub fn classify(err: &anyhow::Error) -> ErrorCode {
    for cause in err.chain() {
        if let Some(detect) = cause.downcast_ref::<DetectError>() {
            return detect.code();
        }
        if cause.is::<CorpusError>() {
            return ErrorCode::CorpusLoadFailed;
        }
        if cause.is::<ConfigError>() {
            return ErrorCode::ConfigParseError;
        }
    }
    ErrorCode::InternalUnexpected
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    write_error(mode, error, &mut stderr.lock())
}

fn write_error(mode: OutputMode, error: &CliError, out: &mut dyn Write) -> anyhow::Result<()> {
    if mode.is_json() {
        let wrapper = serde_json::json!({ "error": error });
        serde_json::to_writer_pretty(&mut *out, &wrapper)?;
        writeln!(out)?;
        return Ok(());
    }
    writeln!(out, "error[{}]: {}", error.error_code, error.message)?;
    if let Some(hint) = error.hint {
        writeln!(out, "  hint: {hint}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use commap_detect::ParseError;

    #[test]
    fn detect_errors_keep_their_code_through_context() {
        let tree = commap_detect::TreeReader::new("1:1 0.5\n".as_bytes(), "mem.tree")
            .next()
            .expect("one item")
            .expect_err("short line");
        assert!(matches!(tree, DetectError::Parse(ParseError { .. })));
        let err = anyhow::Error::new(tree).context("joining tree");
        assert_eq!(classify(&err), ErrorCode::TreeParseError);
    }

    #[test]
    fn config_errors_are_classified() {
        let err = anyhow::Error::new(ConfigError(anyhow::anyhow!("bad toml")));
        let cli = CliError::from(&err);
        assert_eq!(cli.error_code, "E1001");
        assert!(cli.hint.is_some());
    }

    #[test]
    fn describe_skips_repeated_causes() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = anyhow::Error::new(DetectError::ExternalTool(commap_detect::ExternalToolError {
            module: commap_detect::ModulePath::root(),
            kind: commap_detect::ToolFailure::Spawn {
                input: "g.net".into(),
                source: io,
            },
        }))
        .context("running detect");
        assert_eq!(
            describe(&err),
            "running detect: clustering tool failed for module root: \
             could not start clustering run on g.net: gone"
        );
    }

    #[test]
    fn unknown_errors_are_internal() {
        let err = anyhow::anyhow!("boom");
        assert_eq!(classify(&err), ErrorCode::InternalUnexpected);
    }

    #[test]
    fn errors_render_per_mode() {
        let error = CliError {
            error_code: "E1003",
            message: "could not read output/author_graph.tree: gone".to_string(),
            hint: None,
        };

        let mut human = Vec::new();
        write_error(OutputMode::Human, &error, &mut human).expect("human");
        assert_eq!(
            String::from_utf8(human).expect("utf8"),
            "error[E1003]: could not read output/author_graph.tree: gone\n"
        );

        let mut json = Vec::new();
        write_error(OutputMode::Json, &error, &mut json).expect("json");
        let value: serde_json::Value = serde_json::from_slice(&json).expect("valid json");
        assert_eq!(value["error"]["error_code"], "E1003");
        assert!(value["error"].get("hint").is_none());
    }

    #[test]
    fn pretty_kv_aligns_keys() {
        let mut buf = Vec::new();
        pretty_kv(&mut buf, "rows", "3").expect("write");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "rows:          3\n");
    }
}
