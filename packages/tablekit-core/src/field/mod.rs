//! User-defined field descriptors.

mod configuration;
mod field_type;

pub use configuration::{
    CategoryNode, DropdownOption, FieldConfiguration, GroupRef, RelationshipConfig, TableRef,
};
pub use field_type::FieldType;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::slug::slugify;
use crate::{new_entity_id, EntityId};

/// Field definition within a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Field identifier
    #[serde(rename = "_id")]
    pub id: EntityId,
    /// Display name
    pub name: String,
    /// Stable identifier derived from the name at creation
    pub slug: String,
    /// Field type, fixed after creation
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Type-dependent configuration
    #[serde(default)]
    pub configuration: FieldConfiguration,
    /// Soft-delete flag
    #[serde(default)]
    pub trashed: bool,
    /// Soft-delete timestamp
    #[serde(default)]
    pub trashed_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Field {
    /// Creates a new field, deriving its slug from the name.
    ///
    /// # Arguments
    /// * `name` - Display name
    /// * `field_type` - Field type
    /// * `configuration` - Type-dependent configuration
    pub fn new(
        name: impl Into<String>,
        field_type: FieldType,
        configuration: FieldConfiguration,
    ) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: new_entity_id(),
            slug: slugify(&name),
            name,
            field_type,
            configuration,
            trashed: false,
            trashed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Soft-deletes the field.
    pub fn trash(&mut self) {
        let now = Utc::now();
        self.trashed = true;
        self.trashed_at = Some(now);
        self.updated_at = now;
    }

    /// Restores a soft-deleted field.
    ///
    /// A restored field is no longer required and shows up in listings and
    /// filters again.
    pub fn restore(&mut self) {
        self.trashed = false;
        self.trashed_at = None;
        self.configuration.required = false;
        self.configuration.listing = true;
        self.configuration.filtering = true;
        self.updated_at = Utc::now();
    }

    /// Returns a copy with a fresh identity and timestamps.
    pub fn with_new_identity(&self) -> Self {
        let now = Utc::now();
        Self {
            id: new_entity_id(),
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }
}
