//! Core error types.

use serde::Serialize;
use thiserror::Error;

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Table, field and storage errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Table not found
    #[error("Table '{table}' not found")]
    TableNotFound { table: String },

    /// Field not found in table
    #[error("Field '{field}' not found in table '{table}'")]
    FieldNotFound { table: String, field: String },

    /// Field group points at a child table that does not exist
    #[error("Group table for field '{field}' not found")]
    GroupTableNotFound { field: String },

    /// Row not found in table
    #[error("Row '{id}' not found in table '{table}'")]
    RowNotFound { table: String, id: String },

    /// Table slug already used
    #[error("Table '{slug}' already exists")]
    TableAlreadyExists { slug: String },

    /// Field slug already used in table
    #[error("Field '{field}' already exists in table '{table}'")]
    FieldAlreadyExists { table: String, field: String },

    /// Attempt to change the type of an existing field
    #[error("Field '{field}' type cannot change from {from} to {to}")]
    FieldTypeImmutable {
        field: String,
        from: String,
        to: String,
    },

    /// Fields payload is neither a list nor a JSON-encoded list
    #[error("Unsupported fields payload type: {found}")]
    UnsupportedFieldsType { found: &'static str },

    /// Fields payload could not be decoded
    #[error("Invalid fields format: {0}")]
    InvalidFieldsFormat(String),

    /// Table cloning failed
    #[error("Internal error while cloning table")]
    CloneTable,

    /// Storage collaborator failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoreError {
    /// Status code reported to callers.
    pub fn code(&self) -> u16 {
        match self {
            CoreError::TableNotFound { .. }
            | CoreError::FieldNotFound { .. }
            | CoreError::GroupTableNotFound { .. }
            | CoreError::RowNotFound { .. } => 404,
            CoreError::TableAlreadyExists { .. } | CoreError::FieldAlreadyExists { .. } => 409,
            CoreError::FieldTypeImmutable { .. }
            | CoreError::UnsupportedFieldsType { .. }
            | CoreError::InvalidFieldsFormat(_) => 400,
            CoreError::CloneTable
            | CoreError::Storage(_)
            | CoreError::Serialization(_)
            | CoreError::Config(_) => 500,
        }
    }

    /// Stable cause code callers branch on.
    pub fn cause(&self) -> &'static str {
        match self {
            CoreError::TableNotFound { .. } => "TABLE_NOT_FOUND",
            CoreError::FieldNotFound { .. } => "FIELD_NOT_FOUND",
            CoreError::GroupTableNotFound { .. } => "GROUP_TABLE_NOT_FOUND",
            CoreError::RowNotFound { .. } => "ROW_NOT_FOUND",
            CoreError::TableAlreadyExists { .. } => "TABLE_ALREADY_EXISTS",
            CoreError::FieldAlreadyExists { .. } => "FIELD_ALREADY_EXISTS",
            CoreError::FieldTypeImmutable { .. } => "FIELD_TYPE_IMMUTABLE",
            CoreError::UnsupportedFieldsType { .. } => "UNSUPPORTED_FIELDS_TYPE",
            CoreError::InvalidFieldsFormat(_) => "INVALID_FIELDS_FORMAT",
            CoreError::CloneTable => "CLONE_TABLE_ERROR",
            CoreError::Storage(_) => "STORAGE_ERROR",
            CoreError::Serialization(_) => "SERIALIZATION_ERROR",
            CoreError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Builds the caller-visible error shape.
    ///
    /// Internal failures get a generic message so the root cause stays in the logs.
    pub fn payload(&self) -> ErrorPayload {
        let message = match self.code() {
            500 => "Internal server error".to_string(),
            _ => self.to_string(),
        };
        ErrorPayload {
            message,
            code: self.code(),
            cause: self.cause().to_string(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

/// Structured failure returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    /// Human readable message
    pub message: String,
    /// Status code
    pub code: u16,
    /// Stable cause code
    pub cause: String,
}
