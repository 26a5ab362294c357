//! Table cloning through the in-memory store.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use tablekit_core::clone::CloneEngine;
use tablekit_core::error::{CoreError, Result};
use tablekit_core::storage::{FieldStore, MemoryStore, NewTable, Query, TableStore};
use tablekit_core::table::{EntityRef, MethodCode};
use tablekit_core::{Table, TableType};

use super::helpers::{clone_engine, relationship_field, text_field};

#[tokio::test]
async fn test_clone_scenario() {
    let (store, engine) = clone_engine();
    let source = Table::new("Tabela Original", TableType::Table, vec![text_field("Nome")]).unwrap();
    assert_eq!(source.slug, "tabela-original");
    let source = TableStore::create(store.as_ref(), NewTable::from(&source))
        .await
        .unwrap();

    let cloned = engine
        .clone_table(&source.id, "Tabela Clonada", "owner-2")
        .await
        .unwrap();

    assert_eq!(cloned.table.slug, "tabela-clonada");
    assert_eq!(cloned.table.name, "Tabela Clonada");
    assert_ne!(cloned.table.id, source.id);
    assert_eq!(
        cloned.table.configuration.owner,
        Some(EntityRef::new("owner-2"))
    );
    assert_eq!(cloned.field_id_map.len(), 1);
    assert!(!cloned.table.trashed);
}

#[tokio::test]
async fn test_clone_referential_integrity() {
    let (store, engine) = clone_engine();
    let f1 = text_field("Nome");
    let f2 = relationship_field("Autor", "authors", true);
    let (f1_id, f2_id) = (f1.id.clone(), f2.id.clone());

    let mut source = Table::new("Livros", TableType::Table, vec![f1, f2]).unwrap();
    source.configuration.fields.order_form = vec![f2_id.clone(), f1_id.clone()];
    source.methods.before_save = MethodCode::new("setFieldValue('nome', 'x')");
    let source = TableStore::create(store.as_ref(), NewTable::from(&source))
        .await
        .unwrap();

    let cloned = engine
        .clone_table(&source.id, "Livros Copia", "owner-1")
        .await
        .unwrap();

    let new_f1 = cloned.field_id_map.get(&f1_id).unwrap();
    let new_f2 = cloned.field_id_map.get(&f2_id).unwrap();
    assert_ne!(new_f1, &f1_id);
    assert_ne!(new_f2, &f2_id);
    assert_ne!(new_f1, new_f2);

    let order = &cloned.table.configuration.fields;
    assert_eq!(order.order_list, vec![new_f1.clone(), new_f2.clone()]);
    assert_eq!(order.order_form, vec![new_f2.clone(), new_f1.clone()]);

    // Fields exist on their own before the table lists them.
    for id in [new_f1, new_f2] {
        assert!(FieldStore::find_one(store.as_ref(), id)
            .await
            .unwrap()
            .is_some());
    }
    let cloned_ids: HashSet<_> = cloned.table.fields.iter().map(|f| f.id.clone()).collect();
    assert!(!cloned_ids.contains(&f1_id));

    assert_eq!(cloned.table.schema, source.schema);
    assert_eq!(cloned.table.methods, source.methods);
}

#[tokio::test]
async fn test_clone_does_not_alias_source() {
    let (store, engine) = clone_engine();
    let source = Table::new("Pedidos", TableType::Table, vec![text_field("Numero")]).unwrap();
    let source = TableStore::create(store.as_ref(), NewTable::from(&source))
        .await
        .unwrap();

    let mut cloned = engine
        .clone_table(&source.id, "Pedidos 2", "owner-1")
        .await
        .unwrap()
        .table;
    cloned.fields[0].name = "Alterado".to_string();
    TableStore::update(store.as_ref(), &cloned).await.unwrap();

    let reloaded = TableStore::find_one(store.as_ref(), &source.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.fields[0].name, "Numero");
}

#[tokio::test]
async fn test_clone_missing_table() {
    let (_store, engine) = clone_engine();
    let err = engine
        .clone_table("missing", "Copia", "owner-1")
        .await
        .unwrap_err();
    assert_eq!(err.cause(), "TABLE_NOT_FOUND");
    assert_eq!(err.code(), 404);
}

#[tokio::test]
async fn test_clone_legacy_encoded_fields() {
    let (store, engine) = clone_engine();
    let stored = FieldStore::create(store.as_ref(), text_field("Referenciado"))
        .await
        .unwrap();

    let fields = json!([
        {"_id": "f-embedded", "name": "Nome", "slug": "nome", "type": "TEXT_SHORT"},
        stored.id,
        "f-dangling"
    ])
    .to_string();
    let source_id = store
        .insert_table_document(json!({
            "_id": "legacy",
            "name": "Legado",
            "slug": "legado",
            "fields": fields,
            "configuration": {
                "fields": {
                    "orderList": ["f-embedded", stored.id, "f-dangling"],
                    "orderForm": []
                },
                "style": "gallery"
            },
            "transient": {"cached": true}
        }))
        .unwrap();

    let cloned = engine
        .clone_table(&source_id, "Legado Novo", "owner-1")
        .await
        .unwrap();

    assert_eq!(cloned.field_id_map.len(), 2);
    assert_eq!(cloned.table.configuration.fields.order_list.len(), 2);
    assert_eq!(cloned.table.configuration.extra["style"], json!("gallery"));

    let document = TableStore::find_document(store.as_ref(), &cloned.table.id)
        .await
        .unwrap()
        .unwrap();
    assert!(document.get("transient").is_none());
    assert_eq!(
        document["_schema"].as_object().unwrap().len(),
        4,
        "two live fields plus the trash keys"
    );
}

#[tokio::test]
async fn test_clone_unsupported_fields_payload() {
    let (store, engine) = clone_engine();
    let source_id = store
        .insert_table_document(json!({"name": "Quebrada", "slug": "quebrada", "fields": 12}))
        .unwrap();
    let err = engine
        .clone_table(&source_id, "Copia", "owner-1")
        .await
        .unwrap_err();
    assert_eq!(err.cause(), "UNSUPPORTED_FIELDS_TYPE");

    let source_id = store
        .insert_table_document(json!({"name": "Torta", "slug": "torta", "fields": "[{"}))
        .unwrap();
    let err = engine
        .clone_table(&source_id, "Copia 2", "owner-1")
        .await
        .unwrap_err();
    assert_eq!(err.cause(), "INVALID_FIELDS_FORMAT");
}

#[tokio::test]
async fn test_clone_unexpected_failure_is_generic() {
    let (store, engine) = clone_engine();
    let source_id = store
        .insert_table_document(json!({"name": "Ruim", "slug": "ruim", "methods": 7}))
        .unwrap();
    let err = engine
        .clone_table(&source_id, "Copia", "owner-1")
        .await
        .unwrap_err();
    assert_eq!(err.cause(), "CLONE_TABLE_ERROR");
    assert_eq!(err.payload().message, "Internal server error");
}

#[tokio::test]
async fn test_clone_into_taken_name_writes_nothing() {
    let (store, engine) = clone_engine();
    let source = Table::new(
        "Origem",
        TableType::Table,
        vec![text_field("Nome"), text_field("Codigo")],
    )
    .unwrap();
    let source = TableStore::create(store.as_ref(), NewTable::from(&source))
        .await
        .unwrap();
    let fields_before = store.field_count();

    for _ in 0..3 {
        let err = engine
            .clone_table(&source.id, "Origem", "owner-1")
            .await
            .unwrap_err();
        assert_eq!(err.cause(), "TABLE_ALREADY_EXISTS");
        assert_eq!(store.field_count(), fields_before);
    }
}

/// Table store whose writes always fail.
struct RejectingTables(Arc<MemoryStore>);

#[async_trait]
impl TableStore for RejectingTables {
    async fn create(&self, _payload: NewTable) -> Result<Table> {
        Err(CoreError::Storage("disk full".to_string()))
    }

    async fn find_one(&self, id: &str) -> Result<Option<Table>> {
        TableStore::find_one(self.0.as_ref(), id).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Table>> {
        self.0.find_by_slug(slug).await
    }

    async fn find_document(&self, id: &str) -> Result<Option<Value>> {
        self.0.find_document(id).await
    }

    async fn find(&self, query: &Query) -> Result<Vec<Table>> {
        TableStore::find(self.0.as_ref(), query).await
    }

    async fn update(&self, table: &Table) -> Result<Table> {
        TableStore::update(self.0.as_ref(), table).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        TableStore::delete(self.0.as_ref(), id).await
    }
}

#[tokio::test]
async fn test_failed_table_write_removes_cloned_fields() {
    let store = Arc::new(MemoryStore::new());
    let kept = FieldStore::create(store.as_ref(), text_field("Existente"))
        .await
        .unwrap();
    let source = Table::new(
        "Origem",
        TableType::Table,
        vec![text_field("Nome"), text_field("Codigo")],
    )
    .unwrap();
    let source = TableStore::create(store.as_ref(), NewTable::from(&source))
        .await
        .unwrap();
    let engine = CloneEngine::new(Arc::new(RejectingTables(store.clone())), store.clone());

    let err = engine
        .clone_table(&source.id, "Destino", "owner-1")
        .await
        .unwrap_err();

    assert_eq!(err.cause(), "CLONE_TABLE_ERROR");
    assert_eq!(store.field_count(), 1);
    assert!(FieldStore::find_one(store.as_ref(), &kept.id)
        .await
        .unwrap()
        .is_some());
}
