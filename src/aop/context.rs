use crate::aop::identity::MethodIdentity;
use anyhow::{anyhow, Result};
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};

/// 调用结果
///
/// 完成后只可能是 `Returned` 或 `Threw` 之一
#[derive(Debug)]
pub enum Outcome {
    Pending,
    Returned(Value),
    Threw(anyhow::Error),
}

/// 调用上下文
///
/// 每次调用新建，归该次调用独占，通知代码只能读取
pub struct InvocationContext {
    identity: MethodIdentity,
    arguments: Vec<Value>,
    outcome: Outcome,
    started_at: Instant,
}

impl InvocationContext {
    pub fn new(identity: MethodIdentity, arguments: Vec<Value>) -> Self {
        Self {
            identity,
            arguments,
            outcome: Outcome::Pending,
            started_at: Instant::now(),
        }
    }

    pub fn identity(&self) -> &MethodIdentity {
        &self.identity
    }

    pub fn method_name(&self) -> &str {
        self.identity.method_name()
    }

    pub fn declaring_type(&self) -> &str {
        self.identity.declaring_type()
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Returned(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&anyhow::Error> {
        match &self.outcome {
            Outcome::Threw(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        !matches!(self.outcome, Outcome::Pending)
    }

    /// 自上下文创建起经过的时间
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub(crate) fn complete(&mut self, result: Result<Value>) {
        self.outcome = match result {
            Ok(value) => Outcome::Returned(value),
            Err(err) => Outcome::Threw(err),
        };
    }

    /// 取出结果；错误对象原样返回
    pub fn into_result(self) -> Result<Value> {
        match self.outcome {
            Outcome::Returned(value) => Ok(value),
            Outcome::Threw(err) => Err(err),
            Outcome::Pending => Err(anyhow!("invocation of {} did not complete", self.identity)),
        }
    }
}

impl fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("identity", &self.identity)
            .field("arguments", &self.arguments)
            .field("outcome", &self.outcome)
            .finish()
    }
}

/// Around 通知的后续调用
///
/// 按值消费，最多只能执行一次；不调用即短路，真实方法不会执行
pub struct Proceed<'a> {
    next: Box<dyn FnOnce() -> Result<Value> + 'a>,
}

impl<'a> Proceed<'a> {
    pub fn new(next: impl FnOnce() -> Result<Value> + 'a) -> Self {
        Self {
            next: Box::new(next),
        }
    }

    /// 执行内层通知，最内层是真实方法
    pub fn proceed(self) -> Result<Value> {
        (self.next)()
    }
}

impl fmt::Debug for Proceed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Proceed")
    }
}
