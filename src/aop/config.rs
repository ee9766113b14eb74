use crate::aop::advice::Stage;
use crate::cfg::TypeOptions;
use crate::log::LoggerConfig;
use anyhow::{anyhow, Context, Result};
use garde::Validate;
use serde::Deserialize;
use smart_default::SmartDefault;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// 切面配置
///
/// ```json5
/// {
///   strict_priority: false,
///   loggers: { aop: { level: "info" } },
///   pointcuts: {
///     loggingOperation: "execution(* *AopDemoController.*(..)) || execution(* *AopDemoService.*(..))",
///   },
///   advices: [
///     { stage: "before", priority: 2, pointcut: "loggingOperation",
///       handler: { type: "EntryLogging", options: { logger: { $instance: "aop" } } } },
///   ],
/// }
/// ```
#[derive(Debug, Clone, Deserialize, SmartDefault, Validate)]
#[serde(default)]
pub struct AopConfig {
    /// 同一阶段内优先级是否必须唯一
    #[garde(skip)]
    pub strict_priority: bool,

    /// 通知使用的命名 logger，注册到全局 logger 管理器后可用 `$instance` 引用
    #[garde(skip)]
    pub loggers: HashMap<String, LoggerConfig>,

    /// 命名切点
    #[garde(custom(non_empty_entries))]
    pub pointcuts: BTreeMap<String, String>,

    #[garde(dive)]
    pub advices: Vec<AdviceConfig>,
}

/// 单条通知配置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdviceConfig {
    /// 可选的名称，默认使用处理器类型名
    #[serde(default)]
    #[garde(skip)]
    pub name: String,

    #[garde(skip)]
    pub stage: Stage,

    #[serde(default)]
    #[garde(skip)]
    pub priority: i32,

    /// 命名切点（可带 `()` 后缀）或内联切点表达式
    #[garde(length(min = 1))]
    pub pointcut: String,

    #[garde(custom(non_empty_type))]
    pub handler: TypeOptions,
}

fn non_empty_entries(value: &BTreeMap<String, String>, _: &()) -> garde::Result {
    for (name, expression) in value {
        if name.trim().is_empty() {
            return Err(garde::Error::new("pointcut name must not be empty"));
        }
        if expression.trim().is_empty() {
            return Err(garde::Error::new(format!(
                "pointcut '{}' has an empty expression",
                name
            )));
        }
    }
    Ok(())
}

fn non_empty_type(value: &TypeOptions, _: &()) -> garde::Result {
    if value.type_name.trim().is_empty() {
        return Err(garde::Error::new("handler type must not be empty"));
    }
    Ok(())
}

impl AopConfig {
    /// JSON / JSON5
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(json5::from_str(s)?)
    }

    pub fn from_yaml(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// 按扩展名选择格式：json / json5 / yaml / yml / toml
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();
        let config = match extension.as_str() {
            "json" | "json5" => Self::from_json(&content),
            "yaml" | "yml" => Self::from_yaml(&content),
            "toml" => Self::from_toml(&content),
            other => return Err(anyhow!("Unsupported config format '{}': {}", other, path.display())),
        };

        config.with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

impl AdviceConfig {
    /// 条目名称，未配置时取处理器类型名
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.handler.type_name
        } else {
            &self.name
        }
    }
}
