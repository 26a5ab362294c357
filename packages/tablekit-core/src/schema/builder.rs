//! Table schema construction.

use serde_json::Value;

use crate::field::Field;

use super::{map_field, FieldDescriptor, Schema, SchemaFragment, StorageType};

/// Key of the soft-delete flag present on every row.
pub const TRASHED_KEY: &str = "trashed";
/// Key of the soft-delete timestamp present on every row.
pub const TRASHED_AT_KEY: &str = "trashedAt";

/// Builds the composite schema for a field list.
///
/// Starts from the system keys (`trashed`, `trashedAt`) and folds every field
/// in order. A repeated slug replaces the earlier fragment.
pub fn build_schema(fields: &[Field]) -> Schema {
    let mut schema = system_schema();
    for field in fields {
        let (key, fragment) = map_field(field);
        schema.insert(key, fragment);
    }
    schema
}

fn system_schema() -> Schema {
    let mut schema = Schema::new();
    schema.insert(
        TRASHED_KEY,
        SchemaFragment::Scalar(FieldDescriptor {
            default: Some(Value::Bool(false)),
            ..FieldDescriptor::new(StorageType::Boolean, false)
        }),
    );
    schema.insert(
        TRASHED_AT_KEY,
        SchemaFragment::Scalar(FieldDescriptor {
            default: Some(Value::Null),
            ..FieldDescriptor::new(StorageType::Date, false)
        }),
    );
    schema
}
