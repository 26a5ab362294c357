//! Table configuration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::EntityId;

/// Reference to a stored entity, such as the owning user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "_id")]
    pub id: EntityId,
}

impl EntityRef {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self { id: id.into() }
    }
}

/// Display order of fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldOrder {
    /// Field ids in listing order
    pub order_list: Vec<EntityId>,
    /// Field ids in form order
    pub order_form: Vec<EntityId>,
}

impl FieldOrder {
    /// Rewrites both lists through `lookup`, dropping ids it does not map.
    pub fn remap(&self, lookup: impl Fn(&str) -> Option<EntityId>) -> Self {
        Self {
            order_list: self.order_list.iter().filter_map(|id| lookup(id)).collect(),
            order_form: self.order_form.iter().filter_map(|id| lookup(id)).collect(),
        }
    }

    /// Appends a field id to both lists.
    pub fn push(&mut self, id: &str) {
        if !self.order_list.iter().any(|existing| existing == id) {
            self.order_list.push(id.to_string());
        }
        if !self.order_form.iter().any(|existing| existing == id) {
            self.order_form.push(id.to_string());
        }
    }
}

/// Table configuration.
///
/// Keys the model does not name are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfiguration {
    /// Owning user
    pub owner: Option<EntityRef>,
    /// Users allowed to administer the table
    pub administrators: Vec<EntityRef>,
    /// Field display order
    pub fields: FieldOrder,
    /// Unrecognised configuration keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
