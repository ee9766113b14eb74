//! 日志宏
//!
//! 自动捕获模块路径、文件和行号
//!
//! ```ignore
//! info!(logger, "Start for execution");
//! info!(logger, "Method executed", "method" => "getBooks", "elapsed_ms" => 3u64);
//! ```

/// 以指定级别记录日志，其他级别宏都委托给它
#[macro_export]
macro_rules! log_at {
    ($level:expr, $logger:expr, $msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $logger.log(
            $crate::log::LogRecord::new($level, $msg)
                .with_module(module_path!())
                .with_location(file!(), line!())
                $(.with_metadata($key, $value))*
        )
    };
}

/// 记录 TRACE 级别日志
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($crate::log::LogLevel::Trace, $logger, $($rest)+)
    };
}

/// 记录 DEBUG 级别日志
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($crate::log::LogLevel::Debug, $logger, $($rest)+)
    };
}

/// 记录 INFO 级别日志
///
/// ```ignore
/// info!(logger, "Execution done", "method" => "addBook", "result" => &result);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($crate::log::LogLevel::Info, $logger, $($rest)+)
    };
}

/// 记录 WARN 级别日志
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($crate::log::LogLevel::Warn, $logger, $($rest)+)
    };
}

/// 记录 ERROR 级别日志
///
/// ```ignore
/// error!(logger, "Exception in method", "method" => "fail", "error" => err.to_string());
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($crate::log::LogLevel::Error, $logger, $($rest)+)
    };
}
