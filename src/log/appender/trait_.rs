use anyhow::Result;

/// 日志输出器 trait
///
/// 负责把格式化后的一行日志写到目标介质，调用在当前线程上同步完成
pub trait LogAppender: Send + Sync {
    fn append(&self, formatted_message: &str) -> Result<()>;

    /// 刷新缓冲区（默认实现为空操作）
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
