//! Table duplication.
//!
//! A clone is structurally identical to its source but every field gets a
//! fresh identity. Field display-order lists are rewritten to the new ids,
//! and the returned id map lets callers remap their own references.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::{CoreError, Result};
use crate::field::Field;
use crate::slug::slugify;
use crate::storage::{FieldStore, NewTable, TableStore};
use crate::table::{EntityRef, Table, TableConfiguration, TableMethods, TableType};
use crate::EntityId;

/// Result of a successful clone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClonedTable {
    /// The persisted copy
    pub table: Table,
    /// Source field id to cloned field id
    pub field_id_map: IndexMap<EntityId, EntityId>,
}

/// Field list as found on a stored table document.
///
/// Older documents keep the list JSON-encoded in a string.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldsPayload {
    List(Vec<Value>),
    Encoded(String),
}

impl FieldsPayload {
    /// Reads the payload out of a raw `fields` value.
    ///
    /// A missing list is treated as empty.
    pub fn from_value(value: Option<Value>) -> Result<Self> {
        match value {
            None => Ok(FieldsPayload::List(Vec::new())),
            Some(Value::Array(items)) => Ok(FieldsPayload::List(items)),
            Some(Value::String(text)) => Ok(FieldsPayload::Encoded(text)),
            Some(other) => Err(CoreError::UnsupportedFieldsType {
                found: json_kind(&other),
            }),
        }
    }

    /// Decodes the payload into its entries.
    pub fn into_entries(self) -> Result<Vec<FieldEntry>> {
        let items = match self {
            FieldsPayload::List(items) => items,
            FieldsPayload::Encoded(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Array(items)) => items,
                Ok(other) => {
                    return Err(CoreError::UnsupportedFieldsType {
                        found: json_kind(&other),
                    })
                }
                Err(err) => return Err(CoreError::InvalidFieldsFormat(err.to_string())),
            },
        };

        items
            .into_iter()
            .map(|item| {
                serde_json::from_value(item)
                    .map_err(|err| CoreError::InvalidFieldsFormat(err.to_string()))
            })
            .collect()
    }
}

/// One entry of a field list: an embedded definition or a bare field id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldEntry {
    Reference(EntityId),
    Embedded(Box<Field>),
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parts of the source document carried over to the copy.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TableTemplate {
    description: Option<String>,
    logo: Option<String>,
    #[serde(rename = "type")]
    kind: TableType,
    configuration: TableConfiguration,
    methods: TableMethods,
}

/// Duplicates tables through the storage collaborators.
pub struct CloneEngine {
    tables: Arc<dyn TableStore>,
    fields: Arc<dyn FieldStore>,
}

impl CloneEngine {
    /// Creates a new clone engine.
    pub fn new(tables: Arc<dyn TableStore>, fields: Arc<dyn FieldStore>) -> Self {
        Self { tables, fields }
    }

    /// Clones a table under a new name and owner.
    ///
    /// All cloned fields are persisted before the table that lists them. A
    /// taken slug is refused before any field is written, and fields written
    /// for a clone that then fails are removed again.
    ///
    /// # Arguments
    /// * `base_table_id` - Id of the table to copy
    /// * `new_name` - Name of the copy; its slug is derived from it
    /// * `owner_id` - Owner of the copy
    ///
    /// # Returns
    /// `Result<ClonedTable, CoreError>`. A missing source is `TableNotFound`;
    /// a malformed field list keeps its own cause; anything else is logged
    /// and reported as `CloneTable`.
    pub async fn clone_table(
        &self,
        base_table_id: &str,
        new_name: &str,
        owner_id: &str,
    ) -> Result<ClonedTable> {
        match self.try_clone(base_table_id, new_name, owner_id).await {
            Ok(cloned) => {
                info!(
                    "Cloned table {} into '{}' ({}) with {} fields",
                    base_table_id,
                    cloned.table.slug,
                    cloned.table.id,
                    cloned.field_id_map.len()
                );
                Ok(cloned)
            }
            Err(
                err @ (CoreError::TableNotFound { .. }
                | CoreError::UnsupportedFieldsType { .. }
                | CoreError::InvalidFieldsFormat(_)
                | CoreError::TableAlreadyExists { .. }),
            ) => Err(err),
            Err(err) => {
                error!("Failed to clone table {}: {}", base_table_id, err);
                Err(CoreError::CloneTable)
            }
        }
    }

    async fn try_clone(
        &self,
        base_table_id: &str,
        new_name: &str,
        owner_id: &str,
    ) -> Result<ClonedTable> {
        let mut document = self
            .tables
            .find_document(base_table_id)
            .await?
            .ok_or_else(|| CoreError::TableNotFound {
                table: base_table_id.to_string(),
            })?;

        let raw_fields = document.as_object_mut().and_then(|doc| doc.remove("fields"));
        let entries = FieldsPayload::from_value(raw_fields)?.into_entries()?;
        let source_fields = self.resolve(entries).await?;

        let template: TableTemplate = serde_json::from_value(document)?;

        let slug = slugify(new_name);
        if self.tables.find_by_slug(&slug).await?.is_some() {
            return Err(CoreError::TableAlreadyExists { slug });
        }

        let mut field_id_map = IndexMap::with_capacity(source_fields.len());
        let mut fields = Vec::with_capacity(source_fields.len());
        for source in &source_fields {
            match self.fields.create(source.with_new_identity()).await {
                Ok(created) => {
                    field_id_map.insert(source.id.clone(), created.id.clone());
                    fields.push(created);
                }
                Err(err) => {
                    self.discard_fields(&field_id_map).await;
                    return Err(err);
                }
            }
        }

        let mut configuration = template.configuration;
        configuration.fields = configuration
            .fields
            .remap(|id| field_id_map.get(id).cloned());
        configuration.owner = Some(EntityRef::new(owner_id));

        let payload = NewTable {
            name: new_name.to_string(),
            slug,
            description: template.description,
            kind: template.kind,
            logo: template.logo,
            fields,
            configuration,
            methods: template.methods,
            trashed: false,
            trashed_at: None,
        };
        let table = match self.tables.create(payload).await {
            Ok(table) => table,
            Err(err) => {
                self.discard_fields(&field_id_map).await;
                return Err(err);
            }
        };

        Ok(ClonedTable {
            table,
            field_id_map,
        })
    }

    /// Removes the fields written for a clone that did not complete.
    async fn discard_fields(&self, field_id_map: &IndexMap<EntityId, EntityId>) {
        for id in field_id_map.values() {
            if let Err(err) = self.fields.delete(id).await {
                warn!("Failed to remove cloned field {}: {}", id, err);
            }
        }
    }

    /// Turns field entries into definitions, loading referenced ones.
    async fn resolve(&self, entries: Vec<FieldEntry>) -> Result<Vec<Field>> {
        let ids: Vec<EntityId> = entries
            .iter()
            .filter_map(|entry| match entry {
                FieldEntry::Reference(id) => Some(id.clone()),
                FieldEntry::Embedded(_) => None,
            })
            .collect();
        let mut loaded: IndexMap<EntityId, Field> = if ids.is_empty() {
            IndexMap::new()
        } else {
            self.fields
                .find_many(&ids)
                .await?
                .into_iter()
                .map(|field| (field.id.clone(), field))
                .collect()
        };

        let mut fields = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry {
                FieldEntry::Embedded(field) => fields.push(*field),
                FieldEntry::Reference(id) => match loaded.shift_remove(&id) {
                    Some(field) => fields.push(field),
                    None => warn!("Skipping dangling field reference {}", id),
                },
            }
        }
        Ok(fields)
    }
}
