//! 日志模块
//!
//! 同步的结构化日志：级别过滤、可替换的格式化器和输出器、按名称共享的 logger。
//! 切面通过它输出方法入口、耗时、结果和异常。
//!
//! ```rust,no_run
//! use aopx::log::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config: LoggerCreateConfig = json5::from_str(r#"
//!         {
//!             level: "info",
//!             formatter: { type: "TextFormatter", options: { colored: false } },
//!             appender: { type: "ConsoleAppender", options: { target: "stdout" } }
//!         }
//!     "#)?;
//!
//!     let logger = Logger::new(config)?;
//!     logger.info("application started")?;
//!     aopx::info!(logger, "book added", "title" => "Book 4")?;
//!     Ok(())
//! }
//! ```

pub mod appender;
pub mod formatter;
pub mod log_record;
pub mod logger;
pub mod macros;
pub mod manager;

pub use appender::{
    register_appenders, ConsoleAppender, ConsoleAppenderConfig, FileAppender, FileAppenderConfig,
    LogAppender, MemoryAppender, MemoryAppenderConfig, Target,
};
pub use formatter::{
    register_formatters, JsonFormatter, JsonFormatterConfig, LogFormatter, TextFormatter,
    TextFormatterConfig,
};
pub use log_record::{LogLevel, LogRecord, MetadataValue};
pub use logger::{register_log_components, Logger, LoggerConfig, LoggerCreateConfig};
pub use manager::{
    add, contains, get, get_default, get_or_default, global_logger_manager, init, log, remove,
    set_default, LoggerManager, LoggerManagerConfig,
};
