//! End-to-end runs through `ScriptEngine`.

use std::sync::Arc;

use ntest::timeout;
use pretty_assertions::assert_eq;
use serde_json::json;

use tablekit_core::config::ScriptConfig;
use tablekit_core::table::{ExecutionMoment, UserAction};
use tablekit_script::ScriptContext;

use super::helpers::{engine, engine_with, row, slugs, FailingSender, RecordingSender};

#[tokio::test]
#[timeout(10000)]
async fn test_set_field_value_float() {
    let (_, engine) = engine();
    let outcome = engine
        .run_table_script(
            "setFieldValue('total', '150.75')",
            &row(json!({})),
            "pedidos",
            &slugs(&["total"]),
            ScriptContext::default(),
        )
        .await;

    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.doc["total"], json!(150.75));
}

#[tokio::test]
#[timeout(10000)]
async fn test_set_field_value_integer() {
    let (_, engine) = engine();
    let outcome = engine
        .run_table_script(
            "setFieldValue('price', '10')",
            &row(json!({"price": 1})),
            "produtos",
            &slugs(&["price"]),
            ScriptContext::default(),
        )
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.doc["price"], json!(10));
}

#[tokio::test]
#[timeout(10000)]
async fn test_thrown_error_returns_original_doc() {
    let (_, engine) = engine();
    let doc = row(json!({"status": "novo"}));
    let outcome = engine
        .run_table_script(
            "doc.status = 'alterado'\nthrow new Error('x')",
            &doc,
            "pedidos",
            &slugs(&["status"]),
            ScriptContext::default(),
        )
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("x"));
    assert_eq!(outcome.doc, doc);
}

#[tokio::test]
#[timeout(10000)]
async fn test_host_access_is_unavailable() {
    let (_, engine) = engine();
    for code in [
        "const fs = require('fs')",
        "process.exit(1)",
        "fs.readFileSync('/etc/passwd')",
        "fetch('http://example.com')",
    ] {
        let outcome = engine
            .run_table_script(code, &row(json!({})), "t", &[], ScriptContext::default())
            .await;
        assert!(!outcome.success, "{}", code);
    }
}

#[tokio::test]
#[timeout(10000)]
async fn test_infinite_loop_times_out() {
    let config = ScriptConfig {
        timeout_ms: 200,
        loop_iteration_limit: 500_000_000,
        ..ScriptConfig::default()
    };
    let engine = engine_with(config, Arc::new(RecordingSender::default()));
    let doc = row(json!({"a": 1}));

    let outcome = engine
        .run_table_script("while (true) {}", &doc, "t", &[], ScriptContext::default())
        .await;

    assert!(!outcome.success);
    assert_eq!(
        outcome.error.as_deref(),
        Some("Script execution timed out after 200 ms")
    );
    assert_eq!(outcome.doc, doc);
}

#[tokio::test]
#[timeout(10000)]
async fn test_field_placeholders() {
    let (_, engine) = engine();
    let code = "$pedidos_total = $pedidos_preco * $pedidos_qtd\nif ($pedidos_total > 20) {\n  $pedidos_faixa = 'alta'\n}";
    let outcome = engine
        .run_table_script(
            code,
            &row(json!({"preco": 10, "qtd": 3})),
            "pedidos",
            &slugs(&["preco", "qtd", "total", "faixa"]),
            ScriptContext::default(),
        )
        .await;

    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(
        outcome.doc,
        row(json!({"preco": 10, "qtd": 3, "total": 30, "faixa": "alta"}))
    );
}

#[tokio::test]
#[timeout(10000)]
async fn test_hyphenated_slugs() {
    let (_, engine) = engine();
    let outcome = engine
        .run_table_script(
            "$itens_pedido_valor_total = $itens_pedido_valor_unit * 2",
            &row(json!({"valor-unit": 7})),
            "itens-pedido",
            &slugs(&["valor-unit", "valor-total"]),
            ScriptContext::default(),
        )
        .await;

    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.doc["valor-total"], json!(14));
}

#[tokio::test]
#[timeout(10000)]
async fn test_context_values() {
    let (_, engine) = engine();
    let context = ScriptContext {
        user_action: Some(UserAction::Update),
        execution_moment: Some(ExecutionMoment::BeforeSave),
        user_id: Some("user-9".to_string()),
        table_id: Some("table-1".to_string()),
    };
    let outcome = engine
        .run_table_script(
            "doc.trace = [userAction, executionMoment, userId, tableId].join('|')",
            &row(json!({})),
            "t",
            &[],
            context,
        )
        .await;

    assert_eq!(outcome.doc["trace"], json!("update|beforeSave|user-9|table-1"));
}

#[tokio::test]
#[timeout(10000)]
async fn test_emails_dispatched_after_success() {
    let (sender, engine) = engine();
    let code = "const r = sendEmail(['ana@example.com'], 'Pedido ' + doc.numero, 'Aprovado')\ndoc.enviado = r.success";
    let outcome = engine
        .run_table_script(
            code,
            &row(json!({"numero": 42})),
            "pedidos",
            &[],
            ScriptContext::default(),
        )
        .await;

    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.doc["enviado"], json!(true));

    let sent = sender.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["ana@example.com".to_string()]);
    assert_eq!(sent[0].subject, "Pedido 42");
    assert_eq!(sent[0].from, "scripts@tablekit.test");
}

#[tokio::test]
#[timeout(10000)]
async fn test_emails_dropped_after_failure() {
    let (sender, engine) = engine();
    let outcome = engine
        .run_table_script(
            "sendEmail('ana@example.com', 'Pedido', 'Aprovado')\nthrow new Error('abortado')",
            &row(json!({})),
            "pedidos",
            &[],
            ScriptContext::default(),
        )
        .await;

    assert!(!outcome.success);
    assert!(sender.sent.lock().is_empty());
}

#[tokio::test]
#[timeout(10000)]
async fn test_email_failure_does_not_fail_run() {
    let engine = engine_with(ScriptConfig::default(), Arc::new(FailingSender));
    let outcome = engine
        .run_table_script(
            "sendEmail('ana@example.com', 'Pedido', 'Aprovado')",
            &row(json!({})),
            "pedidos",
            &[],
            ScriptContext::default(),
        )
        .await;

    assert!(outcome.success);
}

#[tokio::test]
async fn test_blank_script_is_a_no_op() {
    let (_, engine) = engine();
    let doc = row(json!({"a": 1}));
    let outcome = engine
        .run_table_script("   ", &doc, "t", &[], ScriptContext::default())
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.error, None);
    assert_eq!(outcome.doc, doc);
}
