/// Error types for the sweep
///
/// Fatal conditions abort the run from `main`; `ExternalToolError` is recorded
/// per step and never stops the remaining steps.

use std::io;
use std::path::PathBuf;

/// Failure of a single external tool invocation
#[derive(Debug, thiserror::Error)]
pub enum ExternalToolError {
    /// The program is not installed or not on PATH
    #[error("{program}: command not found")]
    NotFound { program: String },

    /// The program exists but could not be started
    #[error("{program}: failed to start: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The program ran but reported failure
    #[error("{program}: exited with {}{}", exit_label(.code), stderr_suffix(.stderr))]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

/// Errors surfaced by the library
#[derive(Debug, thiserror::Error)]
pub enum ForensicsError {
    #[error("This program is not being run with root permissions (effective uid {uid}).")]
    Privilege { uid: u32 },

    #[error("\"{}\" not found!", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("invalid flag format: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid header hex: {0}")]
    Decode(#[from] hex::FromHexError),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("prompt failed: {0}")]
    Prompt(#[source] io::Error),

    #[error(transparent)]
    ExternalTool(#[from] ExternalToolError),
}

impl ForensicsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ForensicsError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ForensicsError>;
