// 演示控制器经切面管线调用的端到端场景

use anyhow::{anyhow, Result};
use aopx::aop::{Aop, AopConfig, MethodIdentity};
use aopx::books::{BookController, BookControllerConfig};
use aopx::log::MemoryAppender;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// 与 demos/aop.json5 相同的通知，只是日志写入内存并按 JSON 输出
fn demo_aop(name: &str) -> Result<(Aop, MemoryAppender)> {
    let config = AopConfig::from_json(&format!(
        r#"{{
            loggers: {{
                "{name}": {{
                    level: "info",
                    formatter: {{ type: "JsonFormatter" }},
                    appender: {{ type: "MemoryAppender", options: {{ name: "{name}" }} }},
                }},
            }},
            pointcuts: {{
                loggingOperation: "execution(* *AopDemoController.*(..)) || execution(* *AopDemoService.*(..))",
            }},
            advices: [
                {{ stage: "before", priority: 2, pointcut: "loggingOperation()",
                   handler: {{ type: "EntryLogging", options: {{ logger: {{ $instance: "{name}" }} }} }} }},
                {{ stage: "around", priority: 4, pointcut: "loggingOperation()",
                   handler: {{ type: "Timing", options: {{ logger: {{ $instance: "{name}" }} }} }} }},
                {{ stage: "after_returning", priority: 3, pointcut: "loggingOperation()",
                   handler: {{ type: "ResultLogging", options: {{ logger: {{ $instance: "{name}" }} }} }} }},
                {{ stage: "after_throwing", priority: 1, pointcut: "loggingOperation()",
                   handler: {{ type: "ExceptionLogging", options: {{ logger: {{ $instance: "{name}" }} }} }} }},
            ],
        }}"#,
        name = name
    ))?;

    let aop = Aop::new(config)?;
    let memory = MemoryAppender::named(name);
    memory.clear();
    Ok((aop, memory))
}

fn records(memory: &MemoryAppender) -> Vec<Value> {
    memory
        .lines()
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn messages(records: &[Value]) -> Vec<&str> {
    records
        .iter()
        .map(|r| r["message"].as_str().unwrap_or_default())
        .collect()
}

#[test]
fn test_get_books_scenario() -> Result<()> {
    let (aop, memory) = demo_aop("books-get")?;
    let mut dispatcher = aop.dispatcher();
    Arc::new(BookController::default()).register(&mut dispatcher);
    assert!(dispatcher.is_advised("AopDemoController.getBooks"));

    let books = dispatcher.call("AopDemoController.getBooks", vec![])?;
    assert_eq!(books, json!(["Book 1", "Book 2", "Book 3"]));

    let records = records(&memory);
    assert_eq!(
        messages(&records),
        vec!["Start for execution", "Method executed", "Execution done"]
    );
    assert_eq!(records[0]["method"], "getBooks");
    assert_eq!(records[0]["declaring_type"], "AopDemoController");
    assert_eq!(records[0]["args"], json!([]));
    assert_eq!(records[1]["success"], true);
    assert_eq!(records[2]["result"], json!(["Book 1", "Book 2", "Book 3"]));
    Ok(())
}

#[test]
fn test_add_book_scenario() -> Result<()> {
    let (aop, memory) = demo_aop("books-add")?;
    let mut dispatcher = aop.dispatcher();
    Arc::new(BookController::new(BookControllerConfig::default())).register(&mut dispatcher);

    let added = dispatcher.call("AopDemoController.addBook", vec![json!("Book 4")])?;
    assert_eq!(added, json!("Book added: Book 4"));

    let records = records(&memory);
    assert_eq!(
        messages(&records),
        vec!["Start for execution", "Method executed", "Execution done"]
    );
    assert_eq!(records[0]["args"], json!(["Book 4"]));
    assert!(records[1]["elapsed_ms"].as_u64().unwrap_or(0) >= 2500);
    assert_eq!(records[2]["result"], "Book added: Book 4");
    assert!(!messages(&records).contains(&"Exception in method"));
    Ok(())
}

#[test]
fn test_failing_operation_scenario() -> Result<()> {
    let (aop, memory) = demo_aop("books-boom")?;

    let err = aop
        .invoke(
            MethodIdentity::new("AopDemoService", "explode"),
            vec![json!("x")],
            |_| Err(anyhow!("boom")),
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "boom");

    let records = records(&memory);
    assert_eq!(
        messages(&records),
        vec!["Start for execution", "Method executed", "Exception in method"]
    );
    assert_eq!(records[1]["success"], false);
    assert_eq!(records[2]["level"], "ERROR");
    assert_eq!(records[2]["method"], "explode");
    assert_eq!(records[2]["error"], "boom");
    Ok(())
}

#[test]
fn test_unmatched_method_is_not_logged() -> Result<()> {
    let (aop, memory) = demo_aop("books-unmatched")?;
    let mut dispatcher = aop.dispatcher();
    assert!(!dispatcher.register(MethodIdentity::new("InventoryRepository", "count"), |_| {
        Ok(json!(3))
    }));

    assert_eq!(dispatcher.call("InventoryRepository.count", vec![])?, json!(3));
    assert!(memory.lines().is_empty());
    Ok(())
}

#[test]
fn test_timing_covers_the_whole_call() -> Result<()> {
    let (aop, memory) = demo_aop("books-timing")?;
    let mut dispatcher = aop.dispatcher();
    Arc::new(BookController::new(BookControllerConfig {
        add_delay: Duration::from_millis(120),
    }))
    .register(&mut dispatcher);

    dispatcher.call("AopDemoController.addBook", vec![json!("Book 5")])?;
    let records = records(&memory);
    assert!(records[1]["elapsed_ms"].as_u64().unwrap_or(0) >= 120);
    Ok(())
}
