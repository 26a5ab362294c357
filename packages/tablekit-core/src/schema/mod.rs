//! Runtime document schema derived from a table's fields.
//!
//! A [`Schema`] maps every field slug to a [`SchemaFragment`] describing the
//! storage type, required-ness, cardinality and reference target of the
//! values stored under that key. It is always derived from the field list,
//! never edited by hand.

mod builder;
mod mapper;

pub use builder::{build_schema, TRASHED_AT_KEY, TRASHED_KEY};
pub use mapper::{is_array_by_default, map_field, reference_target, storage_type};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Storage types understood by the document store.
///
/// References to other entities are stored as string ids with a `ref`
/// target on the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageType {
    String,
    Number,
    Boolean,
    Date,
}

/// Descriptor of the values stored under one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Storage type
    #[serde(rename = "type")]
    pub storage: StorageType,
    /// Value must be present
    #[serde(default)]
    pub required: bool,
    /// Referenced entity or table slug
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Value used when a document omits the key
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,
}

/// Keeps an explicit `null` default distinct from an absent one.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl FieldDescriptor {
    /// Creates a descriptor without reference or default.
    pub fn new(storage: StorageType, required: bool) -> Self {
        Self {
            storage,
            required,
            reference: None,
            default: None,
        }
    }
}

/// Descriptor with its cardinality.
///
/// Serialized as the bare descriptor for single values and as a one-element
/// list for multiple values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FragmentRepr", into = "FragmentRepr")]
pub enum SchemaFragment {
    Scalar(FieldDescriptor),
    Array(FieldDescriptor),
}

impl SchemaFragment {
    /// Returns the wrapped descriptor.
    pub fn descriptor(&self) -> &FieldDescriptor {
        match self {
            SchemaFragment::Scalar(d) | SchemaFragment::Array(d) => d,
        }
    }

    /// Returns true if the key stores a list.
    pub fn is_array(&self) -> bool {
        matches!(self, SchemaFragment::Array(_))
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum FragmentRepr {
    Many(Vec<FieldDescriptor>),
    One(FieldDescriptor),
}

impl TryFrom<FragmentRepr> for SchemaFragment {
    type Error = String;

    fn try_from(repr: FragmentRepr) -> Result<Self, Self::Error> {
        match repr {
            FragmentRepr::One(d) => Ok(SchemaFragment::Scalar(d)),
            FragmentRepr::Many(list) => list
                .into_iter()
                .next()
                .map(SchemaFragment::Array)
                .ok_or_else(|| "array fragment needs one descriptor".to_string()),
        }
    }
}

impl From<SchemaFragment> for FragmentRepr {
    fn from(fragment: SchemaFragment) -> Self {
        match fragment {
            SchemaFragment::Scalar(d) => FragmentRepr::One(d),
            SchemaFragment::Array(d) => FragmentRepr::Many(vec![d]),
        }
    }
}

/// Composite schema of a table, in field order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(IndexMap<String, SchemaFragment>);

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the fragment stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, fragment: SchemaFragment) {
        self.0.insert(key.into(), fragment);
    }

    /// Returns the fragment for `key`.
    pub fn get(&self, key: &str) -> Option<&SchemaFragment> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaFragment)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Renders the schema as a JSON document for the storage engine.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
