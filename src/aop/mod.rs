//! AOP (Aspect-Oriented Programming) 模块
//!
//! 对方法调用做同步拦截：切点决定拦截哪些方法，通知按阶段和优先级执行。
//! 执行顺序固定为 Before → Around（包住真实方法）→ AfterReturning / AfterThrowing，
//! 方法的返回值和错误原样交还调用方。
//!
//! # 使用示例
//!
//! ```rust,no_run
//! use aopx::aop::{Aop, AopConfig, MethodIdentity};
//! use serde_json::json;
//!
//! fn main() -> anyhow::Result<()> {
//!     let aop = Aop::new(AopConfig::from_json(r#"{
//!         pointcuts: { service: "execution(* *Service.*(..))" },
//!         advices: [
//!             { stage: "before", priority: 1, pointcut: "service", handler: { type: "EntryLogging" } },
//!             { stage: "around", priority: 1, pointcut: "service", handler: { type: "Timing" } },
//!         ],
//!     }"#)?)?;
//!
//!     let mut dispatcher = aop.dispatcher();
//!     dispatcher.register(MethodIdentity::new("BookService", "list"), |_| Ok(json!(["Book 1"])));
//!     let books = dispatcher.call("BookService.list", vec![])?;
//!     assert_eq!(books, json!(["Book 1"]));
//!     Ok(())
//! }
//! ```

pub mod advice;
pub mod aop;
pub mod aspects;
pub mod config;
pub mod context;
pub mod error;
pub mod global;
pub mod identity;
pub mod pipeline;
pub mod pointcut;
pub mod registry;
pub mod weaver;

pub use advice::{
    Advice, AdviceEntry, AfterReturningAdvice, AfterThrowingAdvice, AroundAdvice, BeforeAdvice,
    Stage,
};
pub use aop::Aop;
pub use aspects::{
    create_advice, register_advices, registered_stage, EntryLogging, EntryLoggingConfig,
    ExceptionLogging, ExceptionLoggingConfig, ResultLogging, ResultLoggingConfig, Timing,
    TimingConfig,
};
pub use config::{AdviceConfig, AopConfig};
pub use context::{InvocationContext, Outcome, Proceed};
pub use error::AopError;
pub use global::{global, init, invoke, is_initialized, try_global};
pub use identity::MethodIdentity;
pub use pipeline::Pipeline;
pub use pointcut::Pointcut;
pub use registry::{AdvicePlan, AdviceRegistry, PointcutId};
pub use weaver::{Dispatcher, Operation, WovenOperation, Weaver};
