//! Failure taxonomy for a single hook invocation.
//!
//! Every variant here is fail-open: the binary converts any `GateError`
//! into an ALLOW with exit code 0 and no output.

use thiserror::Error;

/// Errors that can end a hook invocation before a decision is reached.
#[derive(Error, Debug)]
pub enum GateError {
    /// Reading stdin failed.
    #[error("failed to read hook input: {0}")]
    Stdin(#[from] std::io::Error),

    /// Stdin was empty or whitespace only.
    #[error("empty hook input")]
    EmptyInput,

    /// Stdin was not a JSON object of the expected shape.
    #[error("malformed hook input: {0}")]
    Json(#[from] serde_json::Error),

    /// The event carried no `tool_name` (and was not a prompt submission).
    #[error("hook input has no tool_name")]
    MissingToolName,

    /// The working directory (where binstubs are probed) is unavailable.
    #[error("cannot determine working directory: {0}")]
    Cwd(std::io::Error),
}
