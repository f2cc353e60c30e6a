use std::time::{Duration, Instant};

use serde_json::json;

use super::*;
use crate::ToolCall;

fn registry() -> ToolRegistry {
    ToolRegistry::with_builtins()
}

#[tokio::test]
async fn unknown_tool_is_an_error_result() {
    let result = registry()
        .dispatch(&ToolCall::new("frobnicate", json!({})))
        .await;
    assert_eq!(
        result,
        ToolResult::Failure(ToolError::UnknownTool("frobnicate".into()))
    );
    assert!(result.render().contains("frobnicate"));
}

#[test]
fn aliases_resolve_case_insensitively() {
    let registry = registry();
    assert_eq!(registry.resolve("search").unwrap().name(), "web_search");
    assert_eq!(registry.resolve("Web_Search").unwrap().name(), "web_search");
    assert_eq!(registry.resolve("RUN_JS").unwrap().name(), "execute_code");
    assert!(registry.resolve("shell").is_none());
    assert_eq!(
        registry.names(),
        vec!["execute_code", "process_file", "web_search"]
    );
}

#[tokio::test]
async fn process_file_is_not_implemented() {
    let result = registry()
        .dispatch(&ToolCall::new("process_file", json!({"path": "a.txt"})))
        .await;
    assert!(!result.is_success());
    assert_eq!(result.render(), "process_file not implemented");
}

#[tokio::test]
async fn web_search_echoes_query() {
    let result = registry()
        .dispatch(&ToolCall::new("web_search", json!({"query": "rust"})))
        .await;
    let ToolResult::Success(value) = &result else {
        panic!("expected success, got {result:?}");
    };
    assert_eq!(value["query"], "rust");
    assert_eq!(value["items"].as_array().unwrap().len(), 1);
    assert!(value["items"][0]["title"].as_str().unwrap().contains("rust"));
    assert!(result.render().contains("rust"));
}

#[tokio::test]
async fn web_search_accepts_q_and_bare_strings() {
    let registry = registry();
    let by_q = registry
        .dispatch(&ToolCall::new("search", json!({"q": "tokio"})))
        .await;
    assert!(by_q.render().contains("tokio"));

    let bare = registry
        .dispatch(&ToolCall::new("search", json!("serde")))
        .await;
    assert!(bare.render().contains("serde"));
}

#[tokio::test]
async fn empty_query_returns_no_items() {
    let result = registry()
        .dispatch(&ToolCall::new("web_search", json!({"query": ""})))
        .await;
    assert_eq!(result, ToolResult::Success(json!({"items": []})));
}

#[tokio::test]
async fn missing_code_is_reported() {
    let result = registry()
        .dispatch(&ToolCall::new("execute_code", json!({})))
        .await;
    assert_eq!(result.render(), "No code provided");
}

#[tokio::test]
async fn evaluates_expressions_and_chunks() {
    let sandbox = LuaSandbox::new();
    assert_eq!(sandbox.eval("1 + 1").await.unwrap(), json!(2));
    assert_eq!(
        sandbox
            .eval("local s = 0 for i = 1, 4 do s = s + i end return s")
            .await
            .unwrap(),
        json!(10)
    );
    assert_eq!(
        sandbox.eval("return string.upper('abc')").await.unwrap(),
        json!("ABC")
    );
}

#[tokio::test]
async fn tables_become_json() {
    let sandbox = LuaSandbox::new();
    assert_eq!(sandbox.eval("return {1, 2, 3}").await.unwrap(), json!([1, 2, 3]));
    assert_eq!(
        sandbox.eval("return {answer = 42}").await.unwrap(),
        json!({"answer": 42})
    );
}

#[tokio::test]
async fn runtime_errors_are_execution_errors() {
    let result = registry()
        .dispatch(&ToolCall::new("execute_code", json!({"code": "error('boom')"})))
        .await;
    let text = result.render();
    assert!(text.starts_with("Execution error: "), "{text}");
    assert!(text.contains("boom"), "{text}");

    let syntax = LuaSandbox::new().eval("return +").await.unwrap_err();
    assert!(matches!(syntax, ToolError::Execution(_)));
}

#[tokio::test]
async fn no_ambient_privileges() {
    let sandbox = LuaSandbox::new();
    let isolated = sandbox
        .eval("return io == nil and os == nil and debug == nil and dofile == nil and loadfile == nil")
        .await
        .unwrap();
    assert_eq!(isolated, json!(true));

    let err = sandbox.eval("return os.execute('true')").await.unwrap_err();
    assert!(matches!(err, ToolError::Execution(_)));
}

#[tokio::test]
async fn infinite_loop_times_out_and_executor_recovers() {
    let tool = ExecuteCodeTool::new();

    let started = Instant::now();
    let result = tool.call(&json!({"code": "while true do end"})).await;
    let elapsed = started.elapsed();

    assert_eq!(result.render(), "Execution timed out (2s)");
    assert!(elapsed >= EXECUTION_BUDGET, "returned early: {elapsed:?}");
    assert!(elapsed <= Duration::from_millis(2500), "took {elapsed:?}");

    let next = tool.call(&json!({"code": "return 1 + 1"})).await;
    assert_eq!(next, ToolResult::Success(json!(2)));
}

#[tokio::test]
async fn self_referential_table_is_an_execution_error() {
    let result = registry()
        .dispatch(&ToolCall::new(
            "execute_code",
            json!({"code": "local t = {} t.self = t return t"}),
        ))
        .await;
    let text = result.render();
    assert!(text.starts_with("Execution error: "), "{text}");
    assert!(text.contains("refers to itself"), "{text}");
}

#[tokio::test]
async fn deeply_nested_table_is_an_execution_error() {
    let sandbox = LuaSandbox::new();
    let err = sandbox
        .eval("local t = {} for i = 1, 200000 do t = {t} end return t")
        .await
        .unwrap_err();
    match err {
        ToolError::Execution(msg) => assert!(msg.contains("nested deeper"), "{msg}"),
        other => panic!("expected execution error, got {other:?}"),
    }

    // Shared (non-cyclic) subtables still convert.
    let shared = sandbox
        .eval("local s = {1} return {a = s, b = s}")
        .await
        .unwrap();
    assert_eq!(shared, json!({"a": [1], "b": [1]}));
}

#[test]
fn runtime_shutdown_does_not_wait_for_stuck_snippet() {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();

    // Exponential backtracking inside one C call; the instruction hook
    // never fires until the match gives up.
    let code = "return string.find(string.rep('a', 60), string.rep('a*', 30) .. 'b')";
    let err = rt.block_on(LuaSandbox::new().eval(code)).unwrap_err();
    assert_eq!(err, ToolError::Timeout);

    let started = Instant::now();
    drop(rt);
    let elapsed = started.elapsed();
    assert!(elapsed < Duration::from_secs(1), "shutdown took {elapsed:?}");
}

#[test]
fn render_pretty_prints_structured_values() {
    let result = ToolResult::Success(json!({"a": 1}));
    assert_eq!(result.render(), "{\n  \"a\": 1\n}");
    assert_eq!(ToolResult::text("plain").render(), "plain");
    assert_eq!(
        ToolResult::Failure(ToolError::Timeout).render(),
        "Execution timed out (2s)"
    );
}
