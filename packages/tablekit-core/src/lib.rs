//! Core model for user-defined tables.
//!
//! Provides the field and table model, runtime schema derivation,
//! storage collaborator contracts, and table cloning.

pub mod clone;
pub mod config;
pub mod error;
pub mod field;
pub mod schema;
pub mod slug;
pub mod storage;
pub mod table;

pub use error::{CoreError, ErrorPayload, Result};
pub use field::{Field, FieldType};
pub use schema::{build_schema, map_field, Schema};
pub use table::{Table, TableType};

/// Identifier of a stored entity (table, field, row, user).
pub type EntityId = String;

/// Mints a fresh entity identifier.
pub fn new_entity_id() -> EntityId {
    uuid::Uuid::new_v4().simple().to_string()
}
