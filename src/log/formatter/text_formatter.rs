use crate::log::formatter::LogFormatter;
use crate::log::log_record::{LogLevel, LogRecord};
use anyhow::Result;
use chrono::SecondsFormat;
use serde::Deserialize;
use smart_default::SmartDefault;
use std::fmt::Write;

/// TextFormatter 配置
#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct TextFormatterConfig {
    /// 是否启用 ANSI 颜色
    #[default = false]
    pub colored: bool,

    /// 是否输出线程名
    #[default = true]
    pub with_thread: bool,
}

/// 文本格式化器
///
/// 输出形如 `[2025-01-19T12:34:56.789Z] [main] INFO  [aspects.rs:42] Start for execution | method=getBooks`
pub struct TextFormatter {
    config: TextFormatterConfig,
}

impl TextFormatter {
    pub fn new(config: TextFormatterConfig) -> Self {
        Self { config }
    }

    fn dimmed(&self, out: &mut String, text: &str) {
        if self.config.colored {
            out.push_str("\x1b[2m");
            out.push_str(text);
            out.push_str("\x1b[0m");
        } else {
            out.push_str(text);
        }
    }
}

impl LogFormatter for TextFormatter {
    fn format(&self, record: &LogRecord) -> Result<String> {
        let mut out = String::with_capacity(96 + record.message.len());

        out.push('[');
        let timestamp = record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        self.dimmed(&mut out, &timestamp);
        out.push_str("] ");

        if self.config.with_thread {
            out.push('[');
            self.dimmed(&mut out, &record.thread);
            out.push_str("] ");
        }

        if self.config.colored {
            out.push_str(colored_level(record.level));
            out.push(' ');
        } else {
            write!(out, "{:<5} ", record.level)?;
        }

        if let (Some(file), Some(line)) = (&record.file, record.line) {
            out.push('[');
            self.dimmed(&mut out, &format!("{}:{}", file, line));
            out.push_str("] ");
        }

        out.push_str(&record.message);

        if !record.metadata.is_empty() {
            out.push_str(" |");
            for (key, value) in &record.metadata {
                out.push(' ');
                if self.config.colored {
                    write!(out, "\x1b[36m{}\x1b[0m", key)?;
                } else {
                    out.push_str(key);
                }
                write!(out, "={}", value)?;
            }
        }

        Ok(out)
    }
}

fn colored_level(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "\x1b[31mERROR\x1b[0m",
        LogLevel::Warn => "\x1b[33mWARN \x1b[0m",
        LogLevel::Info => "\x1b[32mINFO \x1b[0m",
        LogLevel::Debug => "\x1b[36mDEBUG\x1b[0m",
        LogLevel::Trace => "\x1b[37;2mTRACE\x1b[0m",
    }
}

crate::impl_from!(TextFormatterConfig => TextFormatter);
crate::impl_box_from!(TextFormatter => dyn LogFormatter);
