//! Field-to-schema mapping.

use crate::field::{Field, FieldType};

use super::{FieldDescriptor, SchemaFragment, StorageType};

/// Storage type used for values of a field type.
pub fn storage_type(field_type: &FieldType) -> StorageType {
    match field_type {
        FieldType::Date => StorageType::Date,
        FieldType::TextShort
        | FieldType::TextLong
        | FieldType::Dropdown
        | FieldType::Category
        | FieldType::Relationship
        | FieldType::File
        | FieldType::FieldGroup
        | FieldType::Evaluation
        | FieldType::Reaction
        | FieldType::User => StorageType::String,
        FieldType::Other(_) => StorageType::String,
    }
}

/// Returns true for types that store a list even without `multiple`.
pub fn is_array_by_default(field_type: &FieldType) -> bool {
    match field_type {
        FieldType::Dropdown
        | FieldType::File
        | FieldType::Relationship
        | FieldType::FieldGroup
        | FieldType::Category
        | FieldType::Evaluation
        | FieldType::Reaction
        | FieldType::User => true,
        FieldType::TextShort | FieldType::TextLong | FieldType::Date => false,
        FieldType::Other(_) => false,
    }
}

/// Entity or table the field's values point at.
///
/// A relationship or group without a configured slug yields `None`; partially
/// configured fields still map.
pub fn reference_target(field: &Field) -> Option<String> {
    let configuration = &field.configuration;
    match &field.field_type {
        FieldType::File => Some("Storage".to_string()),
        FieldType::Relationship => configuration
            .relationship
            .as_ref()
            .and_then(|r| r.table_slug())
            .map(str::to_string),
        FieldType::FieldGroup => configuration.group.as_ref().and_then(|g| g.slug.clone()),
        FieldType::Evaluation => Some("Evaluation".to_string()),
        FieldType::Reaction => Some("Reaction".to_string()),
        FieldType::User => Some("User".to_string()),
        _ => None,
    }
}

/// Maps one field to its schema key and fragment.
///
/// Pure and total: unknown types map to a string descriptor.
pub fn map_field(field: &Field) -> (String, SchemaFragment) {
    let descriptor = FieldDescriptor {
        storage: storage_type(&field.field_type),
        required: field.configuration.required,
        reference: reference_target(field),
        default: None,
    };

    let fragment = if field.configuration.multiple || is_array_by_default(&field.field_type) {
        SchemaFragment::Array(descriptor)
    } else {
        SchemaFragment::Scalar(descriptor)
    };

    (field.slug.clone(), fragment)
}
