//! Schema derivation from table definitions.

use pretty_assertions::assert_eq;
use serde_json::json;

use tablekit_core::field::FieldConfiguration;
use tablekit_core::{build_schema, map_field, Field, FieldType, Table, TableType};

use super::helpers::{group_field, relationship_field, text_field};

#[test]
fn test_relationship_scenario() {
    let autor = relationship_field("Autor", "authors", true);
    let (key, fragment) = map_field(&autor);

    let mut schema = tablekit_core::Schema::new();
    schema.insert(key, fragment);

    assert_eq!(
        schema.to_json(),
        json!({"autor": [{"type": "String", "required": true, "ref": "authors"}]})
    );
}

#[test]
fn test_cardinality_law() {
    let array_types = [
        FieldType::Dropdown,
        FieldType::File,
        FieldType::Relationship,
        FieldType::FieldGroup,
        FieldType::Category,
        FieldType::Evaluation,
        FieldType::Reaction,
        FieldType::User,
    ];
    for field_type in array_types {
        let field = Field::new("Campo", field_type.clone(), FieldConfiguration::default());
        assert!(map_field(&field).1.is_array(), "{} should be a list", field_type);
    }

    let scalar_types = [
        FieldType::TextShort,
        FieldType::TextLong,
        FieldType::Date,
        FieldType::Other("CURRENCY".to_string()),
    ];
    for field_type in scalar_types {
        let single = Field::new("Campo", field_type.clone(), FieldConfiguration::default());
        assert!(!map_field(&single).1.is_array(), "{} should be scalar", field_type);

        let multiple = Field::new(
            "Campo",
            field_type.clone(),
            FieldConfiguration {
                multiple: true,
                ..Default::default()
            },
        );
        assert!(map_field(&multiple).1.is_array());
    }
}

#[test]
fn test_table_schema_document() {
    let table = Table::new(
        "Livros",
        TableType::Table,
        vec![
            text_field("Título"),
            relationship_field("Autor", "authors", true),
            group_field("Capítulos", "livros-capitulos"),
            Field::new("Publicação", FieldType::Date, FieldConfiguration::default()),
        ],
    )
    .unwrap();

    let document = serde_json::to_value(&table).unwrap();
    assert_eq!(
        document["_schema"],
        json!({
            "trashed": {"type": "Boolean", "required": false, "default": false},
            "trashedAt": {"type": "Date", "required": false, "default": null},
            "titulo": {"type": "String", "required": false},
            "autor": [{"type": "String", "required": true, "ref": "authors"}],
            "capitulos": [{"type": "String", "required": false, "ref": "livros-capitulos"}],
            "publicacao": {"type": "Date", "required": false}
        })
    );
}

#[test]
fn test_partially_configured_fields_still_map() {
    let relationship = Field::new(
        "Cliente",
        FieldType::Relationship,
        FieldConfiguration::default(),
    );
    let group = Field::new("Itens", FieldType::FieldGroup, FieldConfiguration::default());

    let schema = build_schema(&[relationship, group]);
    assert_eq!(schema.len(), 4);
    assert_eq!(schema.get("cliente").unwrap().descriptor().reference, None);
    assert_eq!(schema.get("itens").unwrap().descriptor().reference, None);
}

#[test]
fn test_schema_follows_field_lifecycle() {
    let mut table = Table::new("Contatos", TableType::Table, vec![text_field("Nome")]).unwrap();
    assert_eq!(table.schema.len(), 3);

    let phone = text_field("Telefone");
    let phone_id = phone.id.clone();
    table.add_field(phone).unwrap();
    assert_eq!(table.schema.len(), 4);

    table.trash_field(&phone_id).unwrap();
    assert_eq!(table.schema.len(), 3);
    assert_eq!(table.fields.len(), 2);

    table.restore_field(&phone_id).unwrap();
    assert_eq!(
        table.schema.keys().collect::<Vec<_>>(),
        vec!["trashed", "trashedAt", "nome", "telefone"]
    );
}
