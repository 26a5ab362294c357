//! Storage collaborator contracts.
//!
//! The document store itself lives outside this crate. Tables, fields and
//! rows are persisted through the async traits below; [`MemoryStore`]
//! implements all of them in process.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::field::Field;
use crate::table::{Table, TableConfiguration, TableMethods, TableType};
use crate::{new_entity_id, EntityId};

/// Row document stored under a table's runtime schema.
pub type Row = Map<String, Value>;

/// Key holding a stored document's identifier.
pub const ID_KEY: &str = "_id";

/// Filters accepted by the `find` operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    /// Match on the soft-delete flag; `None` matches both
    pub trashed: Option<bool>,
    /// Restrict to these identifiers; empty matches all
    pub ids: Vec<EntityId>,
    /// Case-insensitive text search
    pub search: Option<String>,
    /// Restrict tables to this owner
    pub owner: Option<EntityId>,
    /// One-based page number
    pub page: usize,
    /// Page size; `None` returns every match
    pub per_page: Option<usize>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            trashed: Some(false),
            ids: Vec::new(),
            search: None,
            owner: None,
            page: 1,
            per_page: None,
        }
    }
}

impl Query {
    /// Applies pagination to an ordered list of matches.
    pub fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        match self.per_page {
            Some(per_page) => {
                let skip = self.page.saturating_sub(1).saturating_mul(per_page);
                items.into_iter().skip(skip).take(per_page).collect()
            }
            None => items,
        }
    }
}

/// Payload accepted by [`TableStore::create`].
///
/// Only these keys reach the store; anything else on a source document is
/// dropped. The schema is derived from `fields` on conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTable {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: TableType,
    pub logo: Option<String>,
    pub fields: Vec<Field>,
    pub configuration: TableConfiguration,
    pub methods: TableMethods,
    pub trashed: bool,
    pub trashed_at: Option<DateTime<Utc>>,
}

impl NewTable {
    /// Builds the stored table, minting an id and deriving the schema.
    pub fn into_table(self) -> Table {
        let now = Utc::now();
        let mut table = Table {
            id: new_entity_id(),
            name: self.name,
            slug: self.slug,
            description: self.description,
            logo: self.logo,
            kind: self.kind,
            fields: self.fields,
            configuration: self.configuration,
            methods: self.methods,
            schema: Default::default(),
            trashed: self.trashed,
            trashed_at: self.trashed_at,
            created_at: now,
            updated_at: now,
        };
        table.rebuild_schema();
        table
    }
}

impl From<&Table> for NewTable {
    fn from(table: &Table) -> Self {
        Self {
            name: table.name.clone(),
            slug: table.slug.clone(),
            description: table.description.clone(),
            kind: table.kind,
            logo: table.logo.clone(),
            fields: table.fields.clone(),
            configuration: table.configuration.clone(),
            methods: table.methods.clone(),
            trashed: table.trashed,
            trashed_at: table.trashed_at,
        }
    }
}

/// Table persistence.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Persists a new table; fails if the slug is taken.
    async fn create(&self, payload: NewTable) -> Result<Table>;

    /// Finds a table by id.
    async fn find_one(&self, id: &str) -> Result<Option<Table>>;

    /// Finds a table by slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Table>>;

    /// Returns the raw stored document of a table.
    ///
    /// Legacy documents may hold their field list in shapes [`Table`] does
    /// not accept; callers that must cope with those read the raw document.
    async fn find_document(&self, id: &str) -> Result<Option<Value>>;

    /// Finds tables matching `query`, in creation order.
    async fn find(&self, query: &Query) -> Result<Vec<Table>>;

    /// Replaces a stored table.
    async fn update(&self, table: &Table) -> Result<Table>;

    /// Removes a table. Returns false if it did not exist.
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Field persistence.
#[async_trait]
pub trait FieldStore: Send + Sync {
    /// Persists a new field.
    async fn create(&self, field: Field) -> Result<Field>;

    /// Finds a field by id.
    async fn find_one(&self, id: &str) -> Result<Option<Field>>;

    /// Finds fields by id, in the order of `ids`. Unknown ids are skipped.
    async fn find_many(&self, ids: &[EntityId]) -> Result<Vec<Field>>;

    /// Replaces a stored field. The field type cannot change.
    async fn update(&self, field: &Field) -> Result<Field>;

    /// Merges `patch` into every listed field. Returns the number updated.
    async fn update_many(&self, ids: &[EntityId], patch: &Map<String, Value>) -> Result<usize>;

    /// Removes a field. Returns false if it did not exist.
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Row persistence, one collection per table.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Persists a new row, filling schema defaults and minting an id.
    async fn create(&self, table: &Table, row: Row) -> Result<Row>;

    /// Finds a row by id.
    async fn find_one(&self, table: &Table, id: &str) -> Result<Option<Row>>;

    /// Finds rows matching `query`, in creation order.
    async fn find(&self, table: &Table, query: &Query) -> Result<Vec<Row>>;

    /// Replaces a stored row.
    async fn update(&self, table: &Table, id: &str, row: Row) -> Result<Row>;

    /// Removes a row. Returns false if it did not exist.
    async fn delete(&self, table: &Table, id: &str) -> Result<bool>;
}

/// Reads the identifier of a stored document.
pub fn document_id(document: &Map<String, Value>) -> Option<&str> {
    document.get(ID_KEY).and_then(Value::as_str)
}
