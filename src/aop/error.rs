use crate::aop::advice::Stage;
use thiserror::Error;

/// 切面配置错误
///
/// 都在启动阶段（解析切点、注册通知、加载配置）产生，调用期不会出现
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AopError {
    #[error("invalid pointcut '{expression}': {reason}")]
    InvalidPointcut { expression: String, reason: String },

    #[error("pointcut '{0}' is not defined")]
    UnknownPointcut(String),

    #[error("pointcut '{0}' is already defined")]
    DuplicatePointcut(String),

    #[error("advice handler '{handler}' cannot be used at stage {stage}: {reason}")]
    InvalidHandler {
        handler: String,
        stage: Stage,
        reason: String,
    },

    #[error("duplicate priority {priority} at stage {stage}")]
    DuplicatePriority { stage: Stage, priority: i32 },

    #[error("invalid aop config: {0}")]
    InvalidConfig(String),

    #[error("operation '{0}' is not registered")]
    UnknownOperation(String),

    #[error("aop pipeline is already initialized")]
    AlreadyInitialized,

    #[error("aop pipeline is not initialized")]
    NotInitialized,
}

impl AopError {
    pub(crate) fn invalid_pointcut(expression: &str, reason: impl Into<String>) -> Self {
        AopError::InvalidPointcut {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}
