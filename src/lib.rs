//! aopx - 同步的方法拦截管线
//!
//! 用切点选择方法，按阶段和优先级执行通知，方法结果和错误原样交还调用方。
//!
//! ## 模块
//!
//! - **cfg**: 配置管理模块（TypeOptions、trait 注册表、时长格式）
//! - **log**: 日志模块（支持多种格式和输出方式）
//! - **aop**: 切点、通知注册表、拦截管线、织入与内置日志切面
//! - **books**: 演示用的图书控制器

pub mod aop;
pub mod books;
pub mod cfg;
pub mod log;

// 重新导出主要的公共 API
pub use cfg::{create_trait_from_type_options, register_trait, TypeOptions};

pub use log::{LogAppender, LogFormatter, LogLevel, LogRecord, Logger, LoggerConfig};

pub use aop::{
    Advice, AdviceEntry, AdviceRegistry, Aop, AopConfig, AopError, Dispatcher, InvocationContext,
    MethodIdentity, Outcome, Pipeline, Pointcut, Stage, Weaver,
};
