//! Script error types.

use thiserror::Error;

/// Result alias for script operations.
pub type Result<T> = std::result::Result<T, ScriptError>;

/// Failures of a script run.
///
/// The display text of each variant is what callers see as the run's error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    /// The script did not finish within its wall-clock budget
    #[error("Script execution timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// The script uses a construct the sandbox never evaluates
    #[error("Script uses a forbidden construct: {token}")]
    Rejected { token: String },

    /// Syntax error, thrown value, rejected promise or exceeded limit
    #[error("{message}")]
    Exception {
        message: String,
        /// Backtrace or `stack` property of the thrown value
        stack: Option<String>,
    },

    /// The interpreter thread could not run or report back
    #[error("Script worker failed: {0}")]
    Worker(String),

    /// Email collaborator failure
    #[error("Email delivery failed: {0}")]
    Email(String),
}

impl ScriptError {
    /// Returns true for a timed out run.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ScriptError::Timeout { .. })
    }

    /// Stack recorded for a script exception.
    pub fn stack(&self) -> Option<&str> {
        match self {
            ScriptError::Exception { stack, .. } => stack.as_deref(),
            _ => None,
        }
    }
}
