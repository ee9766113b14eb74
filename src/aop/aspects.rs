//! 内置通知
//!
//! | 名称               | 阶段            | 日志                                             |
//! |--------------------|-----------------|--------------------------------------------------|
//! | `EntryLogging`     | before          | `Start for execution` method/declaring_type/args |
//! | `Timing`           | around          | `Method executed` method/elapsed_ms              |
//! | `ResultLogging`    | after_returning | `Execution done` method/result                   |
//! | `ExceptionLogging` | after_throwing  | `Exception in method` method/error               |

use crate::aop::advice::{
    Advice, AfterReturningAdvice, AfterThrowingAdvice, AroundAdvice, BeforeAdvice, Stage,
};
use crate::aop::context::{InvocationContext, Proceed};
use crate::aop::error::AopError;
use crate::cfg::serde_duration::{serde_as, HumanDur};
use crate::cfg::{create_trait_from_type_options, is_registered, register_trait, TypeOptions};
use crate::log::{Logger, LoggerConfig};
use anyhow::Result;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use serde_json::Value;
use smart_default::SmartDefault;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct EntryLoggingConfig {
    pub logger: LoggerConfig,

    /// 是否输出参数
    #[default = true]
    pub log_args: bool,
}

/// 方法入口日志
pub struct EntryLogging {
    logger: Arc<Logger>,
    log_args: bool,
}

impl EntryLogging {
    pub fn new(config: EntryLoggingConfig) -> Result<Self> {
        Ok(Self {
            logger: Logger::resolve(config.logger)?,
            log_args: config.log_args,
        })
    }

    pub fn with_logger(logger: Arc<Logger>) -> Self {
        Self {
            logger,
            log_args: true,
        }
    }
}

impl BeforeAdvice for EntryLogging {
    fn before(&self, ctx: &InvocationContext) -> Result<()> {
        if self.log_args {
            crate::info!(
                self.logger,
                "Start for execution",
                "method" => ctx.method_name(),
                "declaring_type" => ctx.declaring_type(),
                "args" => ctx.arguments(),
            )
        } else {
            crate::info!(
                self.logger,
                "Start for execution",
                "method" => ctx.method_name(),
                "declaring_type" => ctx.declaring_type(),
            )
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct TimingConfig {
    pub logger: LoggerConfig,

    /// 超过该耗时额外输出一条 WARN
    #[serde_as(as = "Option<HumanDur>")]
    pub slow_threshold: Option<Duration>,
}

/// 耗时统计
///
/// 无论成功失败都记录耗时，方法结果原样返回
pub struct Timing {
    logger: Arc<Logger>,
    slow_threshold: Option<Duration>,
}

impl Timing {
    pub fn new(config: TimingConfig) -> Result<Self> {
        Ok(Self {
            logger: Logger::resolve(config.logger)?,
            slow_threshold: config.slow_threshold,
        })
    }

    pub fn with_logger(logger: Arc<Logger>) -> Self {
        Self {
            logger,
            slow_threshold: None,
        }
    }
}

impl Timing {
    fn log_elapsed(&self, ctx: &InvocationContext, elapsed: Duration, success: bool) -> Result<()> {
        let elapsed_ms = elapsed.as_millis();
        crate::info!(
            self.logger,
            "Method executed",
            "method" => ctx.method_name(),
            "elapsed_ms" => elapsed_ms,
            "success" => success,
        )?;

        if let Some(threshold) = self.slow_threshold {
            if elapsed > threshold {
                crate::warn!(
                    self.logger,
                    "Slow method",
                    "method" => ctx.method_name(),
                    "elapsed_ms" => elapsed_ms,
                    "threshold_ms" => threshold.as_millis(),
                )?;
            }
        }

        Ok(())
    }
}

impl AroundAdvice for Timing {
    fn around(&self, ctx: &InvocationContext, proceed: Proceed<'_>) -> Result<Value> {
        let start = Instant::now();
        let result = proceed.proceed();
        let logged = self.log_elapsed(ctx, start.elapsed(), result.is_ok());

        // 方法自身的错误优先于日志写入错误
        match result {
            Ok(value) => logged.map(|_| value),
            Err(err) => Err(err),
        }
    }
}

#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct ResultLoggingConfig {
    pub logger: LoggerConfig,

    /// 是否输出返回值
    #[default = true]
    pub log_result: bool,
}

/// 返回值日志
pub struct ResultLogging {
    logger: Arc<Logger>,
    log_result: bool,
}

impl ResultLogging {
    pub fn new(config: ResultLoggingConfig) -> Result<Self> {
        Ok(Self {
            logger: Logger::resolve(config.logger)?,
            log_result: config.log_result,
        })
    }

    pub fn with_logger(logger: Arc<Logger>) -> Self {
        Self {
            logger,
            log_result: true,
        }
    }
}

impl AfterReturningAdvice for ResultLogging {
    fn after_returning(&self, ctx: &InvocationContext, result: &Value) -> Result<()> {
        if self.log_result {
            crate::info!(
                self.logger,
                "Execution done",
                "method" => ctx.method_name(),
                "result" => result,
            )
        } else {
            crate::info!(self.logger, "Execution done", "method" => ctx.method_name())
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ExceptionLoggingConfig {
    pub logger: LoggerConfig,
}

/// 异常日志
pub struct ExceptionLogging {
    logger: Arc<Logger>,
}

impl ExceptionLogging {
    pub fn new(config: ExceptionLoggingConfig) -> Result<Self> {
        Ok(Self {
            logger: Logger::resolve(config.logger)?,
        })
    }

    pub fn with_logger(logger: Arc<Logger>) -> Self {
        Self { logger }
    }
}

impl AfterThrowingAdvice for ExceptionLogging {
    fn after_throwing(&self, ctx: &InvocationContext, error: &anyhow::Error) -> Result<()> {
        crate::error!(
            self.logger,
            "Exception in method",
            "method" => ctx.method_name(),
            "error" => error.to_string(),
        )
    }
}

crate::impl_from!(EntryLoggingConfig => EntryLogging, fallible);
crate::impl_from!(TimingConfig => Timing, fallible);
crate::impl_from!(ResultLoggingConfig => ResultLogging, fallible);
crate::impl_from!(ExceptionLoggingConfig => ExceptionLogging, fallible);
crate::impl_box_from!(EntryLogging => dyn BeforeAdvice);
crate::impl_box_from!(Timing => dyn AroundAdvice);
crate::impl_box_from!(ResultLogging => dyn AfterReturningAdvice);
crate::impl_box_from!(ExceptionLogging => dyn AfterThrowingAdvice);

/// 注册内置通知
pub fn register_advices() -> Result<()> {
    register_trait::<EntryLogging, dyn BeforeAdvice, EntryLoggingConfig>("EntryLogging")?;
    register_trait::<Timing, dyn AroundAdvice, TimingConfig>("Timing")?;
    register_trait::<ResultLogging, dyn AfterReturningAdvice, ResultLoggingConfig>(
        "ResultLogging",
    )?;
    register_trait::<ExceptionLogging, dyn AfterThrowingAdvice, ExceptionLoggingConfig>(
        "ExceptionLogging",
    )?;
    Ok(())
}

static REGISTERED: OnceCell<()> = OnceCell::new();

/// 通知和它们依赖的日志组件都注册一次
fn ensure_registered() -> Result<()> {
    REGISTERED
        .get_or_try_init(|| {
            crate::log::register_log_components()?;
            register_advices()
        })
        .map(|_| ())
}

/// 该名称注册在哪个阶段
pub fn registered_stage(type_name: &str) -> Option<Stage> {
    Stage::ALL.into_iter().find(|stage| match stage {
        Stage::Before => is_registered::<dyn BeforeAdvice>(type_name),
        Stage::Around => is_registered::<dyn AroundAdvice>(type_name),
        Stage::AfterReturning => is_registered::<dyn AfterReturningAdvice>(type_name),
        Stage::AfterThrowing => is_registered::<dyn AfterThrowingAdvice>(type_name),
    })
}

/// 按阶段从 TypeOptions 创建通知
///
/// 阶段与处理器不匹配、处理器未注册、选项非法都是配置错误
pub fn create_advice(stage: Stage, handler: &TypeOptions) -> Result<Advice, AopError> {
    ensure_registered()
        .map_err(|e| AopError::InvalidConfig(format!("register advice handlers: {:#}", e)))?;

    let invalid = |reason: String| AopError::InvalidHandler {
        handler: handler.type_name.clone(),
        stage,
        reason,
    };

    match registered_stage(&handler.type_name) {
        Some(registered) if registered == stage => {}
        Some(registered) => {
            return Err(invalid(format!("handler is registered for stage {}", registered)));
        }
        None => return Err(invalid("handler type is not registered".to_string())),
    }

    let advice = match stage {
        Stage::Before => create_trait_from_type_options::<dyn BeforeAdvice>(handler)
            .map(|a| Advice::Before(Arc::from(a))),
        Stage::Around => create_trait_from_type_options::<dyn AroundAdvice>(handler)
            .map(|a| Advice::Around(Arc::from(a))),
        Stage::AfterReturning => create_trait_from_type_options::<dyn AfterReturningAdvice>(handler)
            .map(|a| Advice::AfterReturning(Arc::from(a))),
        Stage::AfterThrowing => create_trait_from_type_options::<dyn AfterThrowingAdvice>(handler)
            .map(|a| Advice::AfterThrowing(Arc::from(a))),
    };

    advice.map_err(|e| invalid(format!("{:#}", e)))
}
