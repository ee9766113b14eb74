use crate::log::appender::LogAppender;
use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 命名缓冲区，配置创建的 MemoryAppender 通过名称共享同一块缓冲
static BUFFERS: Lazy<Mutex<HashMap<String, MemoryBuffer>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

type MemoryBuffer = Arc<Mutex<Vec<String>>>;

/// MemoryAppender 配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct MemoryAppenderConfig {
    /// 缓冲区名称，为空时使用私有缓冲
    pub name: String,
}

/// 内存输出器
///
/// 把格式化后的日志保存在内存里，主要用于断言日志输出
#[derive(Clone, Default)]
pub struct MemoryAppender {
    lines: MemoryBuffer,
}

impl MemoryAppender {
    pub fn new(config: MemoryAppenderConfig) -> Self {
        if config.name.is_empty() {
            return Self::default();
        }

        // 锁中毒时退回私有缓冲
        match BUFFERS.lock() {
            Ok(mut buffers) => Self {
                lines: Arc::clone(buffers.entry(config.name).or_default()),
            },
            Err(_) => Self::default(),
        }
    }

    /// 按名称取得共享缓冲区的句柄
    pub fn named(name: &str) -> Self {
        Self::new(MemoryAppenderConfig {
            name: name.to_string(),
        })
    }

    /// 当前缓冲的所有行
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// 清空缓冲
    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }
}

impl LogAppender for MemoryAppender {
    fn append(&self, formatted_message: &str) -> Result<()> {
        self.lines
            .lock()
            .map_err(|_| anyhow!("memory appender poisoned"))?
            .push(formatted_message.to_string());
        Ok(())
    }
}

crate::impl_from!(MemoryAppenderConfig => MemoryAppender);
crate::impl_box_from!(MemoryAppender => dyn LogAppender);
