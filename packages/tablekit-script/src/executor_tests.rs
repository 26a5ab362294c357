use super::*;
use ntest::timeout;
use serde_json::json;

use tablekit_core::table::{ExecutionMoment, UserAction};

fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap()
}

fn executor() -> SandboxExecutor {
    SandboxExecutor::new(ScriptConfig::default())
}

fn sandbox(doc: Value) -> Sandbox {
    Sandbox {
        doc: row(doc),
        ..Sandbox::default()
    }
}

#[test]
fn test_banned_tokens() {
    assert!(check_banned("const x = 1;").is_ok());
    assert!(check_banned("myFunction(1);").is_ok());

    for code in [
        "eval('1')",
        "new Function ('return 1')",
        "import('fs')",
        "require('fs')",
        "process.exit(1)",
        "globalThis . constructor",
    ] {
        let err = check_banned(code).unwrap_err();
        assert!(matches!(err, ScriptError::Rejected { .. }), "{}", code);
    }
}

#[test]
fn test_banned_tokens_ignore_literals_and_members() {
    for code in [
        "doc.process.status = 'ok';",
        "doc.note = 'approval require (manager)';",
        "doc.hint = \"eval(x) is off\";",
        "// process.exit() is not reachable\ndoc.a = 1;",
        "doc.label = `import(${doc.name})`;",
        "return doc.steps?.process . length;",
    ] {
        assert!(check_banned(code).is_ok(), "{}", code);
    }
}

#[test]
#[timeout(10000)]
fn test_member_and_literal_lookalikes_run() {
    let result = executor().execute(
        "doc.process.status = 'ok';\ndoc.note = 'approval require (manager)';",
        sandbox(json!({"process": {"status": "new"}})),
    );
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.doc["process"]["status"], json!("ok"));
    assert_eq!(result.doc["note"], json!("approval require (manager)"));
}

#[test]
fn test_empty_code_skips_interpreter() {
    let result = executor().execute("  \n ", sandbox(json!({"a": 1})));
    assert!(result.success);
    assert_eq!(result.doc, row(json!({"a": 1})));
    assert_eq!(result.result, None);
}

#[test]
#[timeout(10000)]
fn test_doc_mutation() {
    let result = executor().execute("doc.total = doc.qtd * 2;", sandbox(json!({"qtd": 4})));
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.doc, row(json!({"qtd": 4, "total": 8})));
}

#[test]
#[timeout(10000)]
fn test_return_value() {
    let result = executor().execute("return { ok: true, n: 2 };", sandbox(json!({})));
    assert!(result.success);
    assert_eq!(result.result, Some(json!({"ok": true, "n": 2})));
}

#[test]
#[timeout(10000)]
fn test_await_inside_script() {
    let code = "const v = await Promise.resolve(5);\ndoc.v = v;";
    let result = executor().execute(code, sandbox(json!({})));
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.doc["v"], json!(5));
}

#[test]
#[timeout(10000)]
fn test_thrown_error_keeps_doc() {
    let result = executor().execute(
        "doc.a = 2;\nthrow new Error('x');",
        sandbox(json!({"a": 1})),
    );
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("x"));
    assert_eq!(result.doc, row(json!({"a": 1})));
}

#[test]
#[timeout(10000)]
fn test_syntax_error() {
    let result = executor().execute("doc.a = ;", sandbox(json!({"a": 1})));
    assert!(!result.success);
    assert!(result.error.is_some());
    assert_eq!(result.doc, row(json!({"a": 1})));
}

#[test]
#[timeout(10000)]
fn test_unbound_global_fails() {
    let result = executor().execute("fs.readFileSync('/etc/passwd');", sandbox(json!({})));
    assert!(!result.success);
}

#[test]
#[timeout(10000)]
fn test_dynamic_code_is_disabled() {
    let result = executor().execute(
        "const make = (function () {}).constructor;\nreturn make('return 1')();",
        sandbox(json!({})),
    );
    assert!(!result.success);
    assert!(result
        .error
        .unwrap()
        .contains("Dynamic code evaluation is disabled"));

    let result = executor().execute("return typeof Reflect;", sandbox(json!({})));
    assert_eq!(result.result, Some(json!("undefined")));
}

#[test]
#[timeout(10000)]
fn test_timeout() {
    let config = ScriptConfig {
        timeout_ms: 200,
        loop_iteration_limit: 500_000_000,
        ..ScriptConfig::default()
    };
    let started = std::time::Instant::now();
    let result = SandboxExecutor::new(config).execute("while (true) {}", sandbox(json!({"a": 1})));

    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("Script execution timed out after 200 ms")
    );
    assert_eq!(result.doc, row(json!({"a": 1})));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[test]
#[timeout(10000)]
fn test_promise_job_loop_times_out() {
    let config = ScriptConfig {
        timeout_ms: 300,
        ..ScriptConfig::default()
    };
    let code = "const f = async () => { await null; return f(); };\nf();";
    let result = SandboxExecutor::new(config).execute(code, sandbox(json!({"a": 1})));

    assert!(!result.success);
    assert!(result.timed_out);
    assert_eq!(result.doc, row(json!({"a": 1})));
}

#[test]
#[timeout(10000)]
fn test_worker_stops_at_deadline() {
    let config = ScriptConfig {
        timeout_ms: 300,
        ..ScriptConfig::default()
    };
    let source = wrap("const f = async () => { await null; return f(); };\nf();");
    let deadline = Instant::now() + Duration::from_millis(config.timeout_ms);

    let worker = thread::Builder::new()
        .stack_size(WORKER_STACK_SIZE)
        .spawn(move || evaluate(&source, Sandbox::default(), &config, deadline).err())
        .unwrap();
    let err = worker.join().unwrap();

    assert_eq!(err, Some(ScriptError::Timeout { timeout_ms: 300 }));
    assert!(Instant::now() < deadline + Duration::from_secs(2));
}

#[test]
#[timeout(10000)]
fn test_exception_records_stack() {
    let config = ScriptConfig::default();
    let source = wrap("function fail() { throw new Error('x'); }\nfail();");
    let deadline = Instant::now() + Duration::from_millis(config.timeout_ms);

    let worker = thread::Builder::new()
        .stack_size(WORKER_STACK_SIZE)
        .spawn(move || evaluate(&source, Sandbox::default(), &config, deadline).err())
        .unwrap();
    let err = worker.join().unwrap().unwrap();

    assert_eq!(err.to_string(), "x");
    assert!(err.stack().is_some_and(|stack| !stack.is_empty()));
}

#[test]
#[timeout(10000)]
fn test_loop_limit() {
    let config = ScriptConfig {
        loop_iteration_limit: 1000,
        ..ScriptConfig::default()
    };
    let result = SandboxExecutor::new(config).execute(
        "let i = 0;\nwhile (true) { i++; }",
        sandbox(json!({})),
    );
    assert!(!result.success);
}

#[test]
#[timeout(10000)]
fn test_set_field_value_coerces() {
    let code = "setFieldValue('total', '150.75');\nsetFieldValue('$preco', '10');\nsetFieldValue('pago', 'TRUE');\nsetFieldValue('obs', 'sem pressa');";
    let result = executor().execute(code, sandbox(json!({})));
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.doc["total"], json!(150.75));
    assert_eq!(result.doc["preco"], json!(10));
    assert_eq!(result.doc["pago"], json!(true));
    assert_eq!(result.doc["obs"], json!("sem pressa"));
}

#[test]
#[timeout(10000)]
fn test_set_field_value_date_and_keys() {
    let code = "const r = setFieldValue('data_entrega', '2024-03-01T10:00:00.000Z');\nreturn r.success;";
    let result = executor().execute(code, sandbox(json!({})));
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.result, Some(json!(true)));
    assert_eq!(result.doc["data-entrega"], json!("2024-03-01T10:00:00.000Z"));
    assert_eq!(result.doc["data_entrega"], json!("2024-03-01T10:00:00.000Z"));
}

#[test]
#[timeout(10000)]
fn test_get_field_value() {
    let code = "return [getFieldValue('$data_entrega'), getFieldValue('legacy_key'), getFieldValue('nada')];";
    let result = executor().execute(
        code,
        sandbox(json!({"data-entrega": "amanha", "legacy_key": 3})),
    );
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.result, Some(json!(["amanha", 3, null])));
}

#[test]
#[timeout(10000)]
fn test_bindings_are_written_back() {
    let mut sandbox = sandbox(json!({"preco": 10, "qtd": 3}));
    sandbox.bindings = vec![
        Binding {
            name: "pedidos_preco".to_string(),
            field: "preco".to_string(),
            value: Some(json!(10)),
        },
        Binding {
            name: "pedidos_qtd".to_string(),
            field: "qtd".to_string(),
            value: Some(json!(3)),
        },
        Binding {
            name: "pedidos_total".to_string(),
            field: "total".to_string(),
            value: None,
        },
    ];
    let code = "pedidos_total = pedidos_preco * pedidos_qtd;\nsetFieldValue('qtd', '4');\nreturn pedidos_qtd;";

    let result = executor().execute(code, sandbox);
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.doc["total"], json!(30));
    assert_eq!(result.doc["qtd"], json!(4));
    assert_eq!(result.result, Some(json!(4)));
}

#[test]
#[timeout(10000)]
fn test_unset_binding_is_not_written() {
    let mut sandbox = sandbox(json!({}));
    sandbox.bindings = vec![Binding {
        name: "t_obs".to_string(),
        field: "obs".to_string(),
        value: None,
    }];
    let result = executor().execute("doc.x = 1;", sandbox);
    assert!(result.success);
    assert!(!result.doc.contains_key("obs"));
}

#[test]
#[timeout(10000)]
fn test_context_globals() {
    let mut sandbox = sandbox(json!({}));
    sandbox.context = ScriptContext {
        user_action: Some(UserAction::Create),
        execution_moment: Some(ExecutionMoment::BeforeSave),
        user_id: Some("u1".to_string()),
        table_id: None,
    };
    let result = executor().execute(
        "return [userAction, executionMoment, userId, tableId];",
        sandbox,
    );
    assert_eq!(
        result.result,
        Some(json!(["create", "beforeSave", "u1", null]))
    );
}

#[test]
#[timeout(10000)]
fn test_send_email_queues() {
    let code = "const a = sendEmail(['ana@example.com', 'bia@example.com'], 'Pedido', 'Aprovado');\nconst b = sendEmail([], 'x', 'y');\nreturn [a, b];";
    let result = executor().execute(code, sandbox(json!({})));
    assert!(result.success, "{:?}", result.error);
    assert_eq!(
        result.result,
        Some(json!([
            {"success": true, "queued": 2},
            {"success": false, "error": "At least one recipient is required"}
        ]))
    );
    assert_eq!(result.emails.len(), 1);
    assert_eq!(result.emails[0].subject, "Pedido");
}

#[test]
#[timeout(10000)]
fn test_failed_run_drops_queued_emails() {
    let code = "sendEmail('ana@example.com', 'Pedido', 'Aprovado');\nthrow new Error('depois');";
    let result = executor().execute(code, sandbox(json!({})));
    assert!(!result.success);
    assert!(result.emails.is_empty());
}

#[test]
#[timeout(10000)]
fn test_console_is_available() {
    let result = executor().execute(
        "console.log('a', { b: 1 });\nconsole.warn(2);\nconsole.error(null);",
        sandbox(json!({})),
    );
    assert!(result.success, "{:?}", result.error);
}
