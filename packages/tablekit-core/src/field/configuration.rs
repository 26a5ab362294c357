//! Type-dependent field configuration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::EntityId;

/// Field configuration.
///
/// Keys the model does not name are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldConfiguration {
    /// Value must be present on save
    pub required: bool,
    /// Field stores a list of values
    pub multiple: bool,
    /// Field shows up in listings
    pub listing: bool,
    /// Field can be filtered on
    pub filtering: bool,
    /// Display or input format
    pub format: Option<String>,
    /// Default value for new rows
    pub default_value: Option<Value>,
    /// Options for DROPDOWN fields
    pub dropdown: Vec<DropdownOption>,
    /// Target of RELATIONSHIP fields
    pub relationship: Option<RelationshipConfig>,
    /// Child table of FIELD_GROUP fields
    pub group: Option<GroupRef>,
    /// Tree for CATEGORY fields
    pub category: Vec<CategoryNode>,
    /// Unrecognised configuration keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for FieldConfiguration {
    fn default() -> Self {
        Self {
            required: false,
            multiple: false,
            listing: true,
            filtering: true,
            format: None,
            default_value: None,
            dropdown: Vec::new(),
            relationship: None,
            group: None,
            category: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// One dropdown option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropdownOption {
    /// Option identifier
    pub id: String,
    /// Display label
    pub label: String,
    /// Optional display color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Reference to another table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRef {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// Relationship target configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipConfig {
    /// Target table
    pub table: Option<TableRef>,
    /// Field of the target table shown as label
    pub field: Option<Value>,
    /// Sort order of candidate rows
    pub order: Option<Value>,
}

impl RelationshipConfig {
    /// Slug of the target table, if configured.
    pub fn table_slug(&self) -> Option<&str> {
        self.table.as_ref().and_then(|t| t.slug.as_deref())
    }
}

/// Child table of a field group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupRef {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// Node of a category tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CategoryNode>,
}
