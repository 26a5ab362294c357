//! Row use cases.
//!
//! Every mutation runs in a fixed order: `beforeSave`, field-group cascade,
//! row write, `afterSave`. Loads run `onLoad` on the stored row before it is
//! returned.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use tablekit_core::config::{ScriptConfig, ScriptFailurePolicy};
use tablekit_core::storage::{document_id, Row, RowStore, TableStore};
use tablekit_core::table::{ExecutionMoment, UserAction};
use tablekit_core::{CoreError, Field, Table};
use tablekit_script::{ScriptContext, ScriptEngine};

use crate::error::{Result, RowError};

/// Loads and writes rows around their table scripts.
pub struct RowService {
    tables: Arc<dyn TableStore>,
    rows: Arc<dyn RowStore>,
    scripts: Arc<ScriptEngine>,
    before_save_failure: ScriptFailurePolicy,
}

impl RowService {
    /// Creates a new row service.
    pub fn new(
        tables: Arc<dyn TableStore>,
        rows: Arc<dyn RowStore>,
        scripts: Arc<ScriptEngine>,
        config: &ScriptConfig,
    ) -> Self {
        Self {
            tables,
            rows,
            scripts,
            before_save_failure: config.before_save_failure,
        }
    }

    /// Loads a row and runs the table's `onLoad` script on it.
    ///
    /// Script changes are returned, never stored. A failing script returns
    /// the row as stored.
    pub async fn load_row(&self, table_slug: &str, row_id: &str, user_id: Option<&str>) -> Result<Row> {
        let table = self.table(table_slug).await?;
        let row = self.stored_row(&table, row_id).await?;

        let outcome = self
            .run(&table, ExecutionMoment::OnLoad, UserAction::Load, &row, user_id)
            .await;
        match outcome {
            Ok(doc) => Ok(doc),
            Err(message) => {
                warn!("onLoad script of '{}' failed, returning stored row: {}", table.slug, message);
                Ok(row)
            }
        }
    }

    /// Creates a row.
    ///
    /// # Arguments
    /// * `table_slug` - Table the row belongs to
    /// * `row` - Row as submitted
    /// * `user_id` - Acting user, exposed to scripts
    ///
    /// # Returns
    /// The stored row. `afterSave` runs after the write and cannot undo it.
    pub async fn create_row(&self, table_slug: &str, row: Row, user_id: Option<&str>) -> Result<Row> {
        let table = self.table(table_slug).await?;
        let row = self.before_save(&table, UserAction::Create, row, user_id).await?;
        let row = self.cascade_groups(&table, row).await?;

        let stored = self.rows.create(&table, row).await?;
        info!(
            "Created row {} in '{}'",
            document_id(&stored).unwrap_or_default(),
            table.slug
        );

        self.after_save(&table, UserAction::Create, &stored, user_id).await;
        Ok(stored)
    }

    /// Updates a row with the submitted keys.
    ///
    /// Keys the patch omits keep their stored values.
    pub async fn update_row(
        &self,
        table_slug: &str,
        row_id: &str,
        patch: Row,
        user_id: Option<&str>,
    ) -> Result<Row> {
        let table = self.table(table_slug).await?;
        let mut row = self.stored_row(&table, row_id).await?;
        row.extend(patch);

        let row = self.before_save(&table, UserAction::Update, row, user_id).await?;
        let row = self.cascade_groups(&table, row).await?;

        let stored = self.rows.update(&table, row_id, row).await?;
        info!("Updated row {} in '{}'", row_id, table.slug);

        self.after_save(&table, UserAction::Update, &stored, user_id).await;
        Ok(stored)
    }

    async fn table(&self, slug: &str) -> Result<Table> {
        self.tables
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| {
                RowError::from(CoreError::TableNotFound {
                    table: slug.to_string(),
                })
            })
    }

    async fn stored_row(&self, table: &Table, row_id: &str) -> Result<Row> {
        self.rows.find_one(table, row_id).await?.ok_or_else(|| {
            RowError::from(CoreError::RowNotFound {
                table: table.slug.clone(),
                id: row_id.to_string(),
            })
        })
    }

    async fn before_save(
        &self,
        table: &Table,
        action: UserAction,
        row: Row,
        user_id: Option<&str>,
    ) -> Result<Row> {
        match self.run(table, ExecutionMoment::BeforeSave, action, &row, user_id).await {
            Ok(doc) => Ok(doc),
            Err(message) => match self.before_save_failure {
                ScriptFailurePolicy::Abort => Err(RowError::Script {
                    moment: ExecutionMoment::BeforeSave,
                    message,
                }),
                ScriptFailurePolicy::Advisory => {
                    warn!(
                        "beforeSave script of '{}' failed, saving row unchanged: {}",
                        table.slug, message
                    );
                    Ok(row)
                }
            },
        }
    }

    async fn after_save(&self, table: &Table, action: UserAction, row: &Row, user_id: Option<&str>) {
        if let Err(message) = self.run(table, ExecutionMoment::AfterSave, action, row, user_id).await {
            warn!("afterSave script of '{}' failed: {}", table.slug, message);
        }
    }

    /// Runs the table's script for `moment`, if it has one.
    ///
    /// # Returns
    /// The row the script left behind, or the script's error message.
    async fn run(
        &self,
        table: &Table,
        moment: ExecutionMoment,
        action: UserAction,
        row: &Row,
        user_id: Option<&str>,
    ) -> std::result::Result<Row, String> {
        let Some(code) = table.script(moment) else {
            return Ok(row.clone());
        };

        let context = ScriptContext {
            user_action: Some(action),
            execution_moment: Some(moment),
            user_id: user_id.map(str::to_string),
            table_id: Some(table.id.clone()),
        };
        let outcome = self
            .scripts
            .run_table_script(code, row, &table.slug, &table.field_slugs(), context)
            .await;

        if outcome.success {
            Ok(outcome.doc)
        } else {
            Err(outcome.error.unwrap_or_default())
        }
    }

    /// Stores nested field-group rows in their child tables and replaces
    /// them with the stored ids.
    async fn cascade_groups(&self, table: &Table, mut row: Row) -> Result<Row> {
        for field in table.group_fields() {
            let entries = match row.get(&field.slug) {
                Some(Value::Array(items)) => items.clone(),
                Some(Value::Object(item)) => vec![Value::Object(item.clone())],
                _ => continue,
            };
            if !entries.iter().any(Value::is_object) {
                continue;
            }

            let child = self.group_table(field).await?;
            let mut ids = Vec::with_capacity(entries.len());
            for entry in entries {
                match entry {
                    Value::Object(nested) => {
                        let id = self.store_group_row(&child, nested).await?;
                        ids.push(Value::String(id));
                    }
                    other => ids.push(other),
                }
            }
            debug!(
                "Stored {} '{}' rows for field '{}'",
                ids.len(),
                child.slug,
                field.slug
            );
            row.insert(field.slug.clone(), Value::Array(ids));
        }
        Ok(row)
    }

    async fn group_table(&self, field: &Field) -> Result<Table> {
        let not_found = || {
            RowError::from(CoreError::GroupTableNotFound {
                field: field.slug.clone(),
            })
        };
        let group = field.configuration.group.as_ref().ok_or_else(not_found)?;

        let table = match (&group.slug, &group.id) {
            (Some(slug), _) => self.tables.find_by_slug(slug).await?,
            (None, Some(id)) => self.tables.find_one(id).await?,
            (None, None) => None,
        };
        table.ok_or_else(not_found)
    }

    /// Creates or updates one nested row. Returns its id.
    async fn store_group_row(&self, child: &Table, nested: Row) -> Result<String> {
        if let Some(id) = document_id(&nested).map(str::to_string) {
            if self.rows.find_one(child, &id).await?.is_some() {
                self.rows.update(child, &id, nested).await?;
                return Ok(id);
            }
        }
        let stored = self.rows.create(child, nested).await?;
        document_id(&stored)
            .map(str::to_string)
            .ok_or_else(|| RowError::from(CoreError::Storage("stored row has no id".to_string())))
    }
}
