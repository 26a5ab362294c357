//! Field type identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Field type.
///
/// Serialized as the upper snake case name (`"TEXT_SHORT"`). Names this build
/// does not know are kept verbatim in [`FieldType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    TextShort,
    TextLong,
    Dropdown,
    Date,
    Relationship,
    File,
    FieldGroup,
    Category,
    Evaluation,
    Reaction,
    User,
    Other(String),
}

impl FieldType {
    /// Returns the canonical type name.
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::TextShort => "TEXT_SHORT",
            FieldType::TextLong => "TEXT_LONG",
            FieldType::Dropdown => "DROPDOWN",
            FieldType::Date => "DATE",
            FieldType::Relationship => "RELATIONSHIP",
            FieldType::File => "FILE",
            FieldType::FieldGroup => "FIELD_GROUP",
            FieldType::Category => "CATEGORY",
            FieldType::Evaluation => "EVALUATION",
            FieldType::Reaction => "REACTION",
            FieldType::User => "USER",
            FieldType::Other(name) => name,
        }
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "TEXT_SHORT" => FieldType::TextShort,
            "TEXT_LONG" => FieldType::TextLong,
            "DROPDOWN" => FieldType::Dropdown,
            "DATE" => FieldType::Date,
            "RELATIONSHIP" => FieldType::Relationship,
            "FILE" => FieldType::File,
            "FIELD_GROUP" => FieldType::FieldGroup,
            "CATEGORY" => FieldType::Category,
            "EVALUATION" => FieldType::Evaluation,
            "REACTION" => FieldType::Reaction,
            "USER" => FieldType::User,
            _ => FieldType::Other(name),
        }
    }
}

impl From<&str> for FieldType {
    fn from(name: &str) -> Self {
        FieldType::from(name.to_string())
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
