//! Table definition and schema maintenance.
//!
//! Each table has:
//! - Ordered field definitions (soft-deleted ones included)
//! - A runtime schema derived from the live fields
//! - Display order lists and optional row scripts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::field::{Field, FieldType};
use crate::schema::{build_schema, Schema};
use crate::slug::slugify;
use crate::{new_entity_id, EntityId};

use super::configuration::TableConfiguration;
use super::methods::{ExecutionMoment, TableMethods};

/// Kind of table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableType {
    /// Top-level table
    #[default]
    Table,
    /// Child table holding the rows of a FIELD_GROUP field
    FieldGroup,
}

/// Table definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Table identifier
    #[serde(rename = "_id")]
    pub id: EntityId,
    /// Display name
    pub name: String,
    /// Unique slug
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    /// Table kind
    #[serde(rename = "type", default)]
    pub kind: TableType,
    /// Field definitions in declaration order
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub configuration: TableConfiguration,
    #[serde(default)]
    pub methods: TableMethods,
    /// Schema derived from the live fields
    #[serde(rename = "_schema", default)]
    pub schema: Schema,
    #[serde(default)]
    pub trashed: bool,
    #[serde(default)]
    pub trashed_at: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Table {
    /// Creates a new table and derives its schema.
    ///
    /// # Arguments
    /// * `name` - Display name, also the source of the slug
    /// * `kind` - Table kind
    /// * `fields` - Field definitions
    ///
    /// # Returns
    /// `Result<Table, CoreError>`; fails when two fields share a slug.
    pub fn new(name: impl Into<String>, kind: TableType, fields: Vec<Field>) -> Result<Self> {
        let name = name.into();
        let now = Utc::now();
        let mut table = Self {
            id: new_entity_id(),
            slug: slugify(&name),
            name,
            description: None,
            logo: None,
            kind,
            fields: Vec::new(),
            configuration: TableConfiguration::default(),
            methods: TableMethods::default(),
            schema: Schema::new(),
            trashed: false,
            trashed_at: None,
            created_at: now,
            updated_at: now,
        };
        table.replace_fields(fields)?;
        Ok(table)
    }

    /// Re-derives the schema from the live fields, replacing the old one.
    pub fn rebuild_schema(&mut self) {
        let live: Vec<Field> = self.active_fields().cloned().collect();
        self.schema = build_schema(&live);
        self.updated_at = Utc::now();
    }

    /// Replaces the whole field list.
    ///
    /// Display order is reset to declaration order.
    pub fn replace_fields(&mut self, fields: Vec<Field>) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for field in &fields {
            if !seen.insert(field.slug.as_str()) {
                return Err(CoreError::FieldAlreadyExists {
                    table: self.slug.clone(),
                    field: field.slug.clone(),
                });
            }
        }

        self.configuration.fields.order_list = fields.iter().map(|f| f.id.clone()).collect();
        self.configuration.fields.order_form = self.configuration.fields.order_list.clone();
        self.fields = fields;
        self.rebuild_schema();
        Ok(())
    }

    /// Adds a field to the end of the table.
    ///
    /// # Returns
    /// `Result<(), CoreError>`; fails when the slug is already taken.
    pub fn add_field(&mut self, field: Field) -> Result<()> {
        if self.fields.iter().any(|f| f.slug == field.slug) {
            return Err(CoreError::FieldAlreadyExists {
                table: self.slug.clone(),
                field: field.slug,
            });
        }
        self.configuration.fields.push(&field.id);
        self.fields.push(field);
        self.rebuild_schema();
        Ok(())
    }

    /// Soft-deletes a field and drops it from the schema.
    pub fn trash_field(&mut self, field_id: &str) -> Result<()> {
        self.field_mut(field_id)?.trash();
        self.rebuild_schema();
        Ok(())
    }

    /// Restores a soft-deleted field and puts it back in the schema.
    pub fn restore_field(&mut self, field_id: &str) -> Result<()> {
        self.field_mut(field_id)?.restore();
        self.configuration.fields.push(field_id);
        self.rebuild_schema();
        Ok(())
    }

    /// Looks up a field by id.
    pub fn field(&self, field_id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    /// Looks up a field by slug.
    pub fn field_by_slug(&self, slug: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.slug == slug)
    }

    fn field_mut(&mut self, field_id: &str) -> Result<&mut Field> {
        let table = self.slug.clone();
        self.fields
            .iter_mut()
            .find(|f| f.id == field_id)
            .ok_or_else(|| CoreError::FieldNotFound {
                table,
                field: field_id.to_string(),
            })
    }

    /// Fields that are not soft-deleted.
    pub fn active_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.trashed)
    }

    /// Slugs of the live fields, in declaration order.
    pub fn field_slugs(&self) -> Vec<String> {
        self.active_fields().map(|f| f.slug.clone()).collect()
    }

    /// Live FIELD_GROUP fields.
    pub fn group_fields(&self) -> impl Iterator<Item = &Field> {
        self.active_fields()
            .filter(|f| f.field_type == FieldType::FieldGroup)
    }

    /// Script configured for `moment`.
    pub fn script(&self, moment: ExecutionMoment) -> Option<&str> {
        self.methods.script(moment)
    }
}
