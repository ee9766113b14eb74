use crate::cfg::{create_trait_from_type_options, TypeOptions};
use crate::log::appender::{ConsoleAppender, ConsoleAppenderConfig, LogAppender};
use crate::log::formatter::{LogFormatter, TextFormatter, TextFormatterConfig};
use crate::log::log_record::{LogLevel, LogRecord, MetadataValue};
use anyhow::{anyhow, Context, Result};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use smart_default::SmartDefault;
use std::sync::{Arc, RwLock};

/// Logger 创建配置（用于创建新的 Logger 实例）
#[derive(Debug, Clone, Deserialize, SmartDefault, PartialEq)]
#[serde(default)]
pub struct LoggerCreateConfig {
    /// 日志级别
    #[default = "info"]
    pub level: String,

    #[default(TypeOptions::new("TextFormatter"))]
    pub formatter: TypeOptions,

    #[default(TypeOptions::new("ConsoleAppender"))]
    pub appender: TypeOptions,
}

/// Logger 配置
///
/// 支持两种模式：
/// - Reference: 引用已存在的 logger 实例（通过 $instance 字段）
/// - Create: 创建新的 logger 实例
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LoggerConfig {
    Reference {
        #[serde(rename = "$instance")]
        instance: String,
    },

    Create(LoggerCreateConfig),
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig::Create(LoggerCreateConfig::default())
    }
}

static REGISTERED: OnceCell<()> = OnceCell::new();

/// 注册内置的 formatter 和 appender，成功后不再重复注册
pub fn register_log_components() -> Result<()> {
    REGISTERED
        .get_or_try_init(|| {
            crate::log::register_formatters()?;
            crate::log::register_appenders()
        })
        .map(|_| ())
}

/// 核心日志器
///
/// 负责级别过滤、格式化和输出，所有方法在调用线程上同步完成
pub struct Logger {
    level: RwLock<LogLevel>,
    formatter: Arc<dyn LogFormatter>,
    appender: Arc<dyn LogAppender>,
}

impl Logger {
    /// 从创建配置创建 Logger
    pub fn new(config: LoggerCreateConfig) -> Result<Self> {
        register_log_components()?;

        let level = config
            .level
            .parse::<LogLevel>()
            .context("invalid logger level")?;
        let formatter: Box<dyn LogFormatter> = create_trait_from_type_options(&config.formatter)?;
        let appender: Box<dyn LogAppender> = create_trait_from_type_options(&config.appender)?;

        Ok(Self::from_parts(level, Arc::from(formatter), Arc::from(appender)))
    }

    /// 直接由组件组装 Logger
    pub fn from_parts(
        level: LogLevel,
        formatter: Arc<dyn LogFormatter>,
        appender: Arc<dyn LogAppender>,
    ) -> Self {
        Self {
            level: RwLock::new(level),
            formatter,
            appender,
        }
    }

    /// 输出到标准输出的文本 logger，不依赖注册表
    pub fn console(level: LogLevel) -> Self {
        Self::from_parts(
            level,
            Arc::new(TextFormatter::new(TextFormatterConfig::default())),
            Arc::new(ConsoleAppender::new(ConsoleAppenderConfig::default())),
        )
    }

    /// 从配置解析 Logger
    ///
    /// Reference 模式从全局管理器获取已存在的 logger，Create 模式创建新的 logger
    pub fn resolve(config: LoggerConfig) -> Result<Arc<Self>> {
        match config {
            LoggerConfig::Reference { instance } => crate::log::get(&instance).ok_or_else(|| {
                anyhow!("Logger instance '{}' not found in global manager", instance)
            }),
            LoggerConfig::Create(create_config) => Ok(Arc::new(Logger::new(create_config)?)),
        }
    }

    pub fn set_level(&self, level: LogLevel) {
        if let Ok(mut current) = self.level.write() {
            *current = level;
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level.read().map(|l| *l).unwrap_or(LogLevel::Info)
    }

    /// 该级别的日志是否会被输出
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level()
    }

    pub fn log(&self, record: LogRecord) -> Result<()> {
        if !self.enabled(record.level) {
            return Ok(());
        }

        let formatted = self.formatter.format(&record)?;
        self.appender.append(&formatted)
    }

    /// 记录带 metadata 的日志
    ///
    /// ```ignore
    /// logger.logm(LogLevel::Info, "Method executed", [("elapsed_ms", 12u64.into())])?;
    /// ```
    pub fn logm(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        metadata: impl IntoIterator<Item = (impl Into<String>, MetadataValue)>,
    ) -> Result<()> {
        let mut record = LogRecord::new(level, message);
        record
            .metadata
            .extend(metadata.into_iter().map(|(k, v)| (k.into(), v)));
        self.log(record)
    }

    pub fn trace(&self, message: impl Into<String>) -> Result<()> {
        self.log(LogRecord::new(LogLevel::Trace, message))
    }

    pub fn debug(&self, message: impl Into<String>) -> Result<()> {
        self.log(LogRecord::new(LogLevel::Debug, message))
    }

    pub fn info(&self, message: impl Into<String>) -> Result<()> {
        self.log(LogRecord::new(LogLevel::Info, message))
    }

    pub fn warn(&self, message: impl Into<String>) -> Result<()> {
        self.log(LogRecord::new(LogLevel::Warn, message))
    }

    pub fn error(&self, message: impl Into<String>) -> Result<()> {
        self.log(LogRecord::new(LogLevel::Error, message))
    }

    pub fn flush(&self) -> Result<()> {
        self.appender.flush()
    }
}

impl TryFrom<LoggerCreateConfig> for Logger {
    type Error = anyhow::Error;

    fn try_from(config: LoggerCreateConfig) -> Result<Self> {
        Logger::new(config)
    }
}
