use crate::log::appender::LogAppender;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// FileAppender 配置
#[derive(Debug, Clone, Deserialize)]
pub struct FileAppenderConfig {
    /// 日志文件路径，父目录不存在时自动创建
    pub file_path: String,
}

/// 文件输出器
///
/// 以追加模式打开文件，每行写入后 flush
pub struct FileAppender {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl FileAppender {
    pub fn new(config: FileAppenderConfig) -> Result<Self> {
        let path = PathBuf::from(&config.file_path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create log directory {}", parent.display()))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open log file {}", path.display()))?;

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogAppender for FileAppender {
    fn append(&self, formatted_message: &str) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow!("log file writer poisoned"))?;
        writer.write_all(formatted_message.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow!("log file writer poisoned"))?;
        writer.flush()?;
        Ok(())
    }
}

crate::impl_from!(FileAppenderConfig => FileAppender, fallible);
crate::impl_box_from!(FileAppender => dyn LogAppender);
