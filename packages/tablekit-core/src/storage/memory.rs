//! In-process document store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::debug;

use super::{document_id, FieldStore, NewTable, Query, Row, RowStore, TableStore, ID_KEY};
use crate::error::{CoreError, Result};
use crate::field::Field;
use crate::schema::SchemaFragment;
use crate::table::Table;
use crate::{new_entity_id, EntityId};

const FIELDS_COLLECTION: &str = "fields";

/// Document store kept in memory.
///
/// Tables are kept as raw JSON documents so fixtures in legacy shapes can be
/// loaded; fields and rows are kept typed.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Table documents by id, in creation order
    tables: RwLock<IndexMap<EntityId, Value>>,
    /// Fields by id
    fields: RwLock<IndexMap<EntityId, Field>>,
    /// Rows by table id, then row id
    rows: RwLock<HashMap<EntityId, IndexMap<EntityId, Row>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a raw table document as-is.
    ///
    /// A missing `_id` is minted. Returns the document id.
    ///
    /// # Arguments
    /// * `document` - Table document; must be a JSON object
    pub fn insert_table_document(&self, document: Value) -> Result<EntityId> {
        let Value::Object(mut object) = document else {
            return Err(CoreError::Storage(
                "table document must be an object".to_string(),
            ));
        };
        let id = match document_id(&object) {
            Some(id) => id.to_string(),
            None => {
                let id = new_entity_id();
                object.insert(ID_KEY.to_string(), Value::String(id.clone()));
                id
            }
        };
        self.tables.write().insert(id.clone(), Value::Object(object));
        Ok(id)
    }

    /// Number of stored fields.
    pub fn field_count(&self) -> usize {
        self.fields.read().len()
    }

    /// Number of stored rows of a table.
    pub fn row_count(&self, table_id: &str) -> usize {
        self.rows.read().get(table_id).map_or(0, IndexMap::len)
    }

    fn decode_table(document: &Value) -> Result<Table> {
        Ok(serde_json::from_value(document.clone())?)
    }
}

fn matches_table(table: &Table, query: &Query) -> bool {
    if let Some(trashed) = query.trashed {
        if table.trashed != trashed {
            return false;
        }
    }
    if !query.ids.is_empty() && !query.ids.contains(&table.id) {
        return false;
    }
    if let Some(owner) = &query.owner {
        let owned = table
            .configuration
            .owner
            .as_ref()
            .is_some_and(|o| &o.id == owner);
        if !owned {
            return false;
        }
    }
    match &query.search {
        Some(term) => {
            let term = term.to_lowercase();
            table.name.to_lowercase().contains(&term) || table.slug.contains(&term)
        }
        None => true,
    }
}

fn matches_row(row: &Row, query: &Query) -> bool {
    if let Some(trashed) = query.trashed {
        let row_trashed = row.get("trashed").and_then(Value::as_bool).unwrap_or(false);
        if row_trashed != trashed {
            return false;
        }
    }
    if !query.ids.is_empty() {
        let listed = document_id(row).is_some_and(|id| query.ids.iter().any(|q| q == id));
        if !listed {
            return false;
        }
    }
    match &query.search {
        Some(term) => {
            let term = term.to_lowercase();
            row.values()
                .filter_map(Value::as_str)
                .any(|value| value.to_lowercase().contains(&term))
        }
        None => true,
    }
}

/// Fills keys the row omits from the schema defaults.
///
/// List keys without a default start empty.
fn apply_defaults(table: &Table, row: &mut Row) {
    for (key, fragment) in table.schema.iter() {
        if row.contains_key(key) {
            continue;
        }
        if let Some(default) = &fragment.descriptor().default {
            row.insert(key.to_string(), default.clone());
        } else if let SchemaFragment::Array(_) = fragment {
            row.insert(key.to_string(), Value::Array(Vec::new()));
        }
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn create(&self, payload: NewTable) -> Result<Table> {
        let mut tables = self.tables.write();
        let taken = tables
            .values()
            .any(|doc| doc.get("slug").and_then(Value::as_str) == Some(payload.slug.as_str()));
        if taken {
            return Err(CoreError::TableAlreadyExists { slug: payload.slug });
        }

        let table = payload.into_table();
        tables.insert(table.id.clone(), serde_json::to_value(&table)?);
        debug!("Created table '{}' ({})", table.slug, table.id);
        Ok(table)
    }

    async fn find_one(&self, id: &str) -> Result<Option<Table>> {
        let tables = self.tables.read();
        tables.get(id).map(Self::decode_table).transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Table>> {
        let tables = self.tables.read();
        tables
            .values()
            .find(|doc| doc.get("slug").and_then(Value::as_str) == Some(slug))
            .map(Self::decode_table)
            .transpose()
    }

    async fn find_document(&self, id: &str) -> Result<Option<Value>> {
        Ok(self.tables.read().get(id).cloned())
    }

    async fn find(&self, query: &Query) -> Result<Vec<Table>> {
        let tables = self.tables.read();
        let mut matches = Vec::new();
        for document in tables.values() {
            let table = Self::decode_table(document)?;
            if matches_table(&table, query) {
                matches.push(table);
            }
        }
        Ok(query.paginate(matches))
    }

    async fn update(&self, table: &Table) -> Result<Table> {
        let mut tables = self.tables.write();
        let Some(slot) = tables.get_mut(&table.id) else {
            return Err(CoreError::TableNotFound {
                table: table.id.clone(),
            });
        };
        let mut updated = table.clone();
        updated.updated_at = Utc::now();
        *slot = serde_json::to_value(&updated)?;
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let removed = self.tables.write().shift_remove(id).is_some();
        if removed {
            self.rows.write().remove(id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl FieldStore for MemoryStore {
    async fn create(&self, field: Field) -> Result<Field> {
        let mut fields = self.fields.write();
        if fields.contains_key(&field.id) {
            return Err(CoreError::FieldAlreadyExists {
                table: FIELDS_COLLECTION.to_string(),
                field: field.id,
            });
        }
        fields.insert(field.id.clone(), field.clone());
        Ok(field)
    }

    async fn find_one(&self, id: &str) -> Result<Option<Field>> {
        Ok(self.fields.read().get(id).cloned())
    }

    async fn find_many(&self, ids: &[EntityId]) -> Result<Vec<Field>> {
        let fields = self.fields.read();
        Ok(ids.iter().filter_map(|id| fields.get(id).cloned()).collect())
    }

    async fn update(&self, field: &Field) -> Result<Field> {
        let mut fields = self.fields.write();
        let Some(stored) = fields.get_mut(&field.id) else {
            return Err(CoreError::FieldNotFound {
                table: FIELDS_COLLECTION.to_string(),
                field: field.id.clone(),
            });
        };
        if stored.field_type != field.field_type {
            return Err(CoreError::FieldTypeImmutable {
                field: stored.slug.clone(),
                from: stored.field_type.to_string(),
                to: field.field_type.to_string(),
            });
        }
        let mut updated = field.clone();
        updated.updated_at = Utc::now();
        *stored = updated.clone();
        Ok(updated)
    }

    async fn update_many(&self, ids: &[EntityId], patch: &Map<String, Value>) -> Result<usize> {
        let mut fields = self.fields.write();
        let mut count = 0;
        for id in ids {
            let Some(stored) = fields.get_mut(id) else {
                continue;
            };
            let Value::Object(mut document) = serde_json::to_value(&*stored)? else {
                continue;
            };
            for (key, value) in patch {
                // identity and type are fixed
                if key == ID_KEY || key == "type" {
                    continue;
                }
                document.insert(key.clone(), value.clone());
            }
            let mut patched: Field = serde_json::from_value(Value::Object(document))?;
            patched.updated_at = Utc::now();
            *stored = patched;
            count += 1;
        }
        Ok(count)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.fields.write().shift_remove(id).is_some())
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn create(&self, table: &Table, mut row: Row) -> Result<Row> {
        let id = match document_id(&row) {
            Some(id) => id.to_string(),
            None => new_entity_id(),
        };
        row.insert(ID_KEY.to_string(), Value::String(id.clone()));
        apply_defaults(table, &mut row);
        let now = Value::String(Utc::now().to_rfc3339());
        row.insert("createdAt".to_string(), now.clone());
        row.insert("updatedAt".to_string(), now);

        self.rows
            .write()
            .entry(table.id.clone())
            .or_default()
            .insert(id, row.clone());
        Ok(row)
    }

    async fn find_one(&self, table: &Table, id: &str) -> Result<Option<Row>> {
        let rows = self.rows.read();
        Ok(rows.get(&table.id).and_then(|rows| rows.get(id)).cloned())
    }

    async fn find(&self, table: &Table, query: &Query) -> Result<Vec<Row>> {
        let rows = self.rows.read();
        let matches = rows
            .get(&table.id)
            .map(|rows| {
                rows.values()
                    .filter(|row| matches_row(row, query))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(query.paginate(matches))
    }

    async fn update(&self, table: &Table, id: &str, mut row: Row) -> Result<Row> {
        let mut rows = self.rows.write();
        let Some(stored) = rows.get_mut(&table.id).and_then(|rows| rows.get_mut(id)) else {
            return Err(CoreError::RowNotFound {
                table: table.slug.clone(),
                id: id.to_string(),
            });
        };
        row.insert(ID_KEY.to_string(), Value::String(id.to_string()));
        if let Some(created_at) = stored.get("createdAt") {
            row.insert("createdAt".to_string(), created_at.clone());
        }
        row.insert(
            "updatedAt".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        *stored = row.clone();
        Ok(row)
    }

    async fn delete(&self, table: &Table, id: &str) -> Result<bool> {
        let mut rows = self.rows.write();
        Ok(rows
            .get_mut(&table.id)
            .is_some_and(|rows| rows.shift_remove(id).is_some()))
    }
}
