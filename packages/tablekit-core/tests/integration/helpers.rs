//! Shared fixtures.

use std::sync::Arc;

use tablekit_core::clone::CloneEngine;
use tablekit_core::field::{FieldConfiguration, GroupRef, RelationshipConfig, TableRef};
use tablekit_core::storage::MemoryStore;
use tablekit_core::{Field, FieldType};

pub fn text_field(name: &str) -> Field {
    Field::new(name, FieldType::TextShort, FieldConfiguration::default())
}

pub fn relationship_field(name: &str, target_slug: &str, required: bool) -> Field {
    Field::new(
        name,
        FieldType::Relationship,
        FieldConfiguration {
            required,
            relationship: Some(RelationshipConfig {
                table: Some(TableRef {
                    id: None,
                    slug: Some(target_slug.to_string()),
                }),
                ..Default::default()
            }),
            ..Default::default()
        },
    )
}

pub fn group_field(name: &str, group_slug: &str) -> Field {
    Field::new(
        name,
        FieldType::FieldGroup,
        FieldConfiguration {
            group: Some(GroupRef {
                id: None,
                slug: Some(group_slug.to_string()),
            }),
            ..Default::default()
        },
    )
}

pub fn clone_engine() -> (Arc<MemoryStore>, CloneEngine) {
    let store = Arc::new(MemoryStore::new());
    let engine = CloneEngine::new(store.clone(), store.clone());
    (store, engine)
}
