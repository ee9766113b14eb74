use crate::log::log_record::{LogLevel, LogRecord};
use crate::log::logger::{Logger, LoggerConfig};
use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use smart_default::SmartDefault;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Logger Manager 配置
#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct LoggerManagerConfig {
    /// 默认 logger
    pub default: LoggerConfig,

    /// 命名 logger
    pub loggers: HashMap<String, LoggerConfig>,
}

/// Logger 管理器
///
/// 按名称维护 Logger 实例，外加一个始终存在的默认 logger
pub struct LoggerManager {
    loggers: RwLock<HashMap<String, Arc<Logger>>>,
    default: RwLock<Arc<Logger>>,
}

impl LoggerManager {
    pub fn new(config: LoggerManagerConfig) -> Result<Self> {
        let loggers = Self::build_loggers(&config.loggers)?;

        let default = match config.default {
            LoggerConfig::Reference { instance } => Self::lookup(&instance, &loggers)?,
            LoggerConfig::Create(create_config) => Arc::new(Logger::new(create_config)?),
        };

        Ok(Self {
            loggers: RwLock::new(loggers),
            default: RwLock::new(default),
        })
    }

    /// 按配置创建一组命名 logger
    ///
    /// 先创建所有 Create 模式的 logger，再解析 Reference，
    /// 引用既可以指向本组内的 logger，也可以指向全局管理器中已有的 logger
    pub fn build_loggers(
        configs: &HashMap<String, LoggerConfig>,
    ) -> Result<HashMap<String, Arc<Logger>>> {
        let mut loggers = HashMap::new();
        let mut references = Vec::new();

        for (key, logger_config) in configs {
            match logger_config {
                LoggerConfig::Reference { instance } => references.push((key, instance)),
                LoggerConfig::Create(create_config) => {
                    let logger = Logger::new(create_config.clone())
                        .map_err(|e| anyhow!("create logger '{}': {:#}", key, e))?;
                    loggers.insert(key.clone(), Arc::new(logger));
                }
            }
        }

        for (key, instance) in references {
            let logger = Self::lookup(instance, &loggers)?;
            loggers.insert(key.clone(), logger);
        }

        Ok(loggers)
    }

    fn lookup(instance: &str, created: &HashMap<String, Arc<Logger>>) -> Result<Arc<Logger>> {
        if let Some(logger) = created.get(instance) {
            return Ok(Arc::clone(logger));
        }

        get(instance).ok_or_else(|| {
            anyhow!(
                "Logger instance '{}' not found (neither in current config nor in global manager)",
                instance
            )
        })
    }

    /// 只含一个终端 logger 的管理器
    fn fallback() -> Self {
        Self {
            loggers: RwLock::new(HashMap::new()),
            default: RwLock::new(Arc::new(Logger::console(LogLevel::Info))),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<Logger>> {
        self.loggers.read().ok()?.get(key).cloned()
    }

    /// 获取指定 key 的 logger，不存在时返回默认 logger
    pub fn get_or_default(&self, key: &str) -> Arc<Logger> {
        self.get(key).unwrap_or_else(|| self.get_default())
    }

    pub fn get_default(&self) -> Arc<Logger> {
        match self.default.read() {
            Ok(default) => Arc::clone(&default),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn set_default(&self, logger: Arc<Logger>) {
        if let Ok(mut default) = self.default.write() {
            *default = logger;
        }
    }

    pub fn add(&self, key: impl Into<String>, logger: Arc<Logger>) {
        if let Ok(mut loggers) = self.loggers.write() {
            loggers.insert(key.into(), logger);
        }
    }

    pub fn remove(&self, key: &str) -> Option<Arc<Logger>> {
        self.loggers.write().ok()?.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> Vec<String> {
        self.loggers
            .read()
            .map(|loggers| loggers.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// 全局 LoggerManager
///
/// 默认只包含一个输出到终端的文本 logger
static GLOBAL_LOGGER_MANAGER: Lazy<LoggerManager> = Lazy::new(LoggerManager::fallback);

/// 初始化全局 LoggerManager
///
/// 新配置中的 logger 合并进全局表，同名覆盖，默认 logger 被替换
pub fn init(config: LoggerManagerConfig) -> Result<()> {
    let manager = LoggerManager::new(config)?;

    for key in manager.keys() {
        if let Some(logger) = manager.get(&key) {
            GLOBAL_LOGGER_MANAGER.add(key, logger);
        }
    }
    GLOBAL_LOGGER_MANAGER.set_default(manager.get_default());

    Ok(())
}

pub fn global_logger_manager() -> &'static LoggerManager {
    &GLOBAL_LOGGER_MANAGER
}

pub fn get(key: &str) -> Option<Arc<Logger>> {
    GLOBAL_LOGGER_MANAGER.get(key)
}

pub fn get_or_default(key: &str) -> Arc<Logger> {
    GLOBAL_LOGGER_MANAGER.get_or_default(key)
}

pub fn get_default() -> Arc<Logger> {
    GLOBAL_LOGGER_MANAGER.get_default()
}

pub fn set_default(logger: Arc<Logger>) {
    GLOBAL_LOGGER_MANAGER.set_default(logger)
}

pub fn add(key: impl Into<String>, logger: Arc<Logger>) {
    GLOBAL_LOGGER_MANAGER.add(key, logger)
}

pub fn remove(key: &str) -> Option<Arc<Logger>> {
    GLOBAL_LOGGER_MANAGER.remove(key)
}

pub fn contains(key: &str) -> bool {
    GLOBAL_LOGGER_MANAGER.contains(key)
}

/// 使用默认 logger 记录日志
pub fn log(record: LogRecord) -> Result<()> {
    get_default().log(record)
}
