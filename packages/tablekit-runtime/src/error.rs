//! Row lifecycle errors.

use thiserror::Error;

use tablekit_core::table::ExecutionMoment;
use tablekit_core::{CoreError, ErrorPayload};

/// Result alias for row operations.
pub type Result<T> = std::result::Result<T, RowError>;

/// Failures of a row use case.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    /// Table, row or storage failure
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A script that guards the write failed
    #[error("{moment} script failed: {message}")]
    Script {
        moment: ExecutionMoment,
        message: String,
    },
}

impl RowError {
    /// Status code reported to callers.
    pub fn code(&self) -> u16 {
        match self {
            RowError::Core(err) => err.code(),
            RowError::Script { .. } => 400,
        }
    }

    /// Stable cause code callers branch on.
    pub fn cause(&self) -> &'static str {
        match self {
            RowError::Core(err) => err.cause(),
            RowError::Script { .. } => "SCRIPT_EXECUTION_ERROR",
        }
    }

    /// Builds the caller-visible error shape.
    pub fn payload(&self) -> ErrorPayload {
        match self {
            RowError::Core(err) => err.payload(),
            RowError::Script { .. } => ErrorPayload {
                message: self.to_string(),
                code: self.code(),
                cause: self.cause().to_string(),
            },
        }
    }
}
