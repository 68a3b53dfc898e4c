use std::fmt;

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    CorpusLoadFailed,
    InputReadFailed,
    TreeParseError,
    PajekParseError,
    MissingModuleFlow,
    ExternalToolFailed,
    ToolArtifactMissing,
    ReportWriteFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::CorpusLoadFailed => "E1002",
            Self::InputReadFailed => "E1003",
            Self::TreeParseError => "E2001",
            Self::PajekParseError => "E2002",
            Self::MissingModuleFlow => "E3001",
            Self::ExternalToolFailed => "E4001",
            Self::ToolArtifactMissing => "E4002",
            Self::ReportWriteFailed => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::CorpusLoadFailed => "Message corpus could not be loaded",
            Self::InputReadFailed => "Input file could not be read",
            Self::TreeParseError => "Malformed tree file",
            Self::PajekParseError => "Malformed Pajek file",
            Self::MissingModuleFlow => "Author missing from tree output",
            Self::ExternalToolFailed => "Clustering tool failed",
            Self::ToolArtifactMissing => "Clustering tool produced no tree file",
            Self::ReportWriteFailed => "Report write failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in commap.toml and retry."),
            Self::CorpusLoadFailed => {
                Some("The corpus must be a JSON object of message id -> {From, To, Cc}.")
            }
            Self::InputReadFailed => {
                Some("Check the path; `commap detect` writes the tree under <work-dir>/output/.")
            }
            Self::TreeParseError => Some("Re-run Infomap; the tree file may be truncated."),
            Self::PajekParseError => None,
            Self::MissingModuleFlow => Some(
                "Run Infomap on the graph built from the same corpus, or pass --missing-flow null.",
            ),
            Self::ExternalToolFailed => {
                Some("Check the [infomap] binary path and flags in commap.toml.")
            }
            Self::ToolArtifactMissing => Some("Make sure the Infomap flags include --tree."),
            Self::ReportWriteFailed => Some("Check disk space and write permissions."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
