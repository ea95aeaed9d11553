//! Compile error types

use std::path::PathBuf;
use thiserror::Error;

/// Every way a compilation run can fail
///
/// All variants are fatal: the run stops at the first one and no partial
/// output is recovered.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Bad argument '{arg}': expected key=value")]
    BadArgument { arg: String },

    #[error("Missing output path (-o)")]
    MissingOutput,

    #[error("Output {path} would overwrite an input")]
    OutputIsInput { path: PathBuf },

    #[error("Template not found: {name}")]
    TemplateNotFound { name: String },

    #[error("Macro not found: {name}")]
    MacroNotFound { name: String },

    #[error("Failed to compile template {name}: {message}")]
    Parse { name: String, message: String },

    #[error("Failed to render template {name}: {message}")]
    Render { name: String, message: String },

    #[error("Failed to render markdown {target}: {message}")]
    Markdown { target: String, message: String },

    #[error("Recursion limit of {limit} exceeded while invoking {name}")]
    RecursionLimit { name: String, limit: usize },

    #[error("Failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open output {path}")]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output {path}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk {root}: {message}")]
    Discovery { root: PathBuf, message: String },

    #[error("Failed to spawn {program}")]
    ProcessSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout_ms}ms")]
    ProcessTimeout { program: String, timeout_ms: u64 },

    #[error("{program} exited with code {code}: {output}")]
    ProcessFailed { program: String, code: i32, output: String },
}

impl CompileError {
    /// Short category label used in diagnostics
    pub fn category(&self) -> &'static str {
        match self {
            CompileError::BadArgument { .. } | CompileError::MissingOutput | CompileError::OutputIsInput { .. } => {
                "input"
            }
            CompileError::TemplateNotFound { .. } | CompileError::MacroNotFound { .. } => "missing template",
            CompileError::Parse { .. } => "compile",
            CompileError::Render { .. } | CompileError::Markdown { .. } | CompileError::RecursionLimit { .. } => {
                "execution"
            }
            CompileError::Read { .. }
            | CompileError::OutputOpen { .. }
            | CompileError::OutputWrite { .. }
            | CompileError::Discovery { .. }
            | CompileError::ProcessSpawn { .. }
            | CompileError::ProcessTimeout { .. }
            | CompileError::ProcessFailed { .. } => "collaborator",
        }
    }
}

/// Convenience alias for results in this crate
pub type Result<T> = std::result::Result<T, CompileError>;
