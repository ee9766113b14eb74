//! 演示用的图书控制器
//!
//! 两个方法都不知道自己被拦截，切面通过 `Dispatcher` 织入

use crate::aop::{Dispatcher, MethodIdentity};
use crate::cfg::serde_duration::{serde_as, HumanDur};
use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use smart_default::SmartDefault;
use std::sync::Arc;
use std::time::Duration;

pub const DECLARING_TYPE: &str = "AopDemoController";
pub const GET_BOOKS: &str = "getBooks";
pub const ADD_BOOK: &str = "addBook";

#[serde_as]
#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct BookControllerConfig {
    /// addBook 的模拟耗时
    #[serde_as(as = "HumanDur")]
    #[default(Duration::from_millis(2500))]
    pub add_delay: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct BookController {
    config: BookControllerConfig,
}

impl BookController {
    pub fn new(config: BookControllerConfig) -> Self {
        Self { config }
    }

    pub fn get_books(&self) -> Vec<String> {
        vec![
            "Book 1".to_string(),
            "Book 2".to_string(),
            "Book 3".to_string(),
        ]
    }

    pub fn add_book(&self, book: &str) -> String {
        std::thread::sleep(self.config.add_delay);
        format!("Book added: {}", book)
    }

    pub fn identity(method: &str) -> MethodIdentity {
        MethodIdentity::new(DECLARING_TYPE, method)
    }

    /// 以 `AopDemoController.getBooks` / `AopDemoController.addBook` 注册到分发表
    pub fn register(self: Arc<Self>, dispatcher: &mut Dispatcher) {
        let controller = Arc::clone(&self);
        dispatcher.register(Self::identity(GET_BOOKS), move |_| {
            Ok(json!(controller.get_books()))
        });

        let controller = self;
        dispatcher.register(Self::identity(ADD_BOOK), move |args| {
            let book = book_argument(args)?;
            Ok(Value::String(controller.add_book(book)))
        });
    }
}

crate::impl_from!(BookControllerConfig => BookController);

fn book_argument(args: &[Value]) -> Result<&str> {
    match args.first() {
        Some(Value::String(book)) => Ok(book),
        Some(other) => Err(anyhow!("book must be a string, got {}", other)),
        None => Err(anyhow!("missing argument: book")),
    }
}
