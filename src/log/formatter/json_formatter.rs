use crate::log::formatter::LogFormatter;
use crate::log::log_record::LogRecord;
use anyhow::Result;
use serde::Deserialize;
use smart_default::SmartDefault;

/// JsonFormatter 配置
#[derive(Debug, Clone, Deserialize, PartialEq, SmartDefault)]
#[serde(default)]
pub struct JsonFormatterConfig {
    /// 是否美化输出（多行）
    #[default = false]
    pub pretty: bool,
}

/// JSON 格式化器
///
/// 每条记录一个 JSON 对象，元数据平铺在顶层
pub struct JsonFormatter {
    config: JsonFormatterConfig,
}

impl JsonFormatter {
    pub fn new(config: JsonFormatterConfig) -> Self {
        Self { config }
    }
}

impl LogFormatter for JsonFormatter {
    fn format(&self, record: &LogRecord) -> Result<String> {
        if self.config.pretty {
            Ok(serde_json::to_string_pretty(record)?)
        } else {
            Ok(serde_json::to_string(record)?)
        }
    }
}

crate::impl_from!(JsonFormatterConfig => JsonFormatter);
crate::impl_box_from!(JsonFormatter => dyn LogFormatter);
