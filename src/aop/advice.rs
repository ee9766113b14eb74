use crate::aop::context::{InvocationContext, Proceed};
use crate::aop::registry::PointcutId;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// 通知阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Before,
    Around,
    AfterReturning,
    AfterThrowing,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Before,
        Stage::Around,
        Stage::AfterReturning,
        Stage::AfterThrowing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Before => "before",
            Stage::Around => "around",
            Stage::AfterReturning => "after_returning",
            Stage::AfterThrowing => "after_throwing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 前置通知，出错时调用立即中止
pub trait BeforeAdvice: Send + Sync {
    fn before(&self, ctx: &InvocationContext) -> Result<()>;
}

/// 环绕通知
///
/// 调用 `proceed` 执行内层，不调用则以自己的返回值短路
pub trait AroundAdvice: Send + Sync {
    fn around(&self, ctx: &InvocationContext, proceed: Proceed<'_>) -> Result<Value>;
}

/// 返回后通知
pub trait AfterReturningAdvice: Send + Sync {
    fn after_returning(&self, ctx: &InvocationContext, result: &Value) -> Result<()>;
}

/// 异常通知，执行完后原错误继续抛给调用方
pub trait AfterThrowingAdvice: Send + Sync {
    fn after_throwing(&self, ctx: &InvocationContext, error: &anyhow::Error) -> Result<()>;
}

impl<F> BeforeAdvice for F
where
    F: Fn(&InvocationContext) -> Result<()> + Send + Sync,
{
    fn before(&self, ctx: &InvocationContext) -> Result<()> {
        self(ctx)
    }
}

impl<F> AroundAdvice for F
where
    F: Fn(&InvocationContext, Proceed<'_>) -> Result<Value> + Send + Sync,
{
    fn around(&self, ctx: &InvocationContext, proceed: Proceed<'_>) -> Result<Value> {
        self(ctx, proceed)
    }
}

impl<F> AfterReturningAdvice for F
where
    F: Fn(&InvocationContext, &Value) -> Result<()> + Send + Sync,
{
    fn after_returning(&self, ctx: &InvocationContext, result: &Value) -> Result<()> {
        self(ctx, result)
    }
}

impl<F> AfterThrowingAdvice for F
where
    F: Fn(&InvocationContext, &anyhow::Error) -> Result<()> + Send + Sync,
{
    fn after_throwing(&self, ctx: &InvocationContext, error: &anyhow::Error) -> Result<()> {
        self(ctx, error)
    }
}

/// 某一阶段的通知处理器
#[derive(Clone)]
pub enum Advice {
    Before(Arc<dyn BeforeAdvice>),
    Around(Arc<dyn AroundAdvice>),
    AfterReturning(Arc<dyn AfterReturningAdvice>),
    AfterThrowing(Arc<dyn AfterThrowingAdvice>),
}

impl Advice {
    pub fn before<F>(f: F) -> Self
    where
        F: Fn(&InvocationContext) -> Result<()> + Send + Sync + 'static,
    {
        Advice::Before(Arc::new(f))
    }

    pub fn around<F>(f: F) -> Self
    where
        F: Fn(&InvocationContext, Proceed<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        Advice::Around(Arc::new(f))
    }

    pub fn after_returning<F>(f: F) -> Self
    where
        F: Fn(&InvocationContext, &Value) -> Result<()> + Send + Sync + 'static,
    {
        Advice::AfterReturning(Arc::new(f))
    }

    pub fn after_throwing<F>(f: F) -> Self
    where
        F: Fn(&InvocationContext, &anyhow::Error) -> Result<()> + Send + Sync + 'static,
    {
        Advice::AfterThrowing(Arc::new(f))
    }

    pub fn stage(&self) -> Stage {
        match self {
            Advice::Before(_) => Stage::Before,
            Advice::Around(_) => Stage::Around,
            Advice::AfterReturning(_) => Stage::AfterReturning,
            Advice::AfterThrowing(_) => Stage::AfterThrowing,
        }
    }
}

impl fmt::Debug for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Advice::{}", self.stage())
    }
}

/// 通知条目：阶段由 advice 决定，同阶段内按 (priority, 注册顺序) 排序
#[derive(Debug, Clone)]
pub struct AdviceEntry {
    pub name: String,
    pub priority: i32,
    pub pointcut: PointcutId,
    pub advice: Advice,
}

impl AdviceEntry {
    pub fn new(priority: i32, pointcut: PointcutId, advice: Advice) -> Self {
        Self {
            name: String::new(),
            priority,
            pointcut,
            advice,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn stage(&self) -> Stage {
        self.advice.stage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aop::identity::MethodIdentity;
    use serde_json::json;

    #[test]
    fn test_stage_serde_and_display() -> Result<()> {
        let stage: Stage = serde_json::from_str(r#""after_returning""#)?;
        assert_eq!(stage, Stage::AfterReturning);
        assert_eq!(Stage::AfterThrowing.to_string(), "after_throwing");
        assert!(serde_json::from_str::<Stage>(r#""after""#).is_err());
        Ok(())
    }

    #[test]
    fn test_closure_advices() -> Result<()> {
        let ctx = InvocationContext::new(MethodIdentity::new("T", "m"), vec![json!(1)]);

        let before = Advice::before(|ctx| {
            assert_eq!(ctx.method_name(), "m");
            Ok(())
        });
        let around = Advice::around(|_, proceed| {
            let inner = proceed.proceed()?;
            Ok(json!({ "wrapped": inner }))
        });

        assert_eq!(before.stage(), Stage::Before);
        assert_eq!(around.stage(), Stage::Around);
        assert_eq!(
            Advice::after_returning(|_, _| Ok(())).stage(),
            Stage::AfterReturning
        );
        assert_eq!(
            Advice::after_throwing(|_, _| Ok(())).stage(),
            Stage::AfterThrowing
        );

        if let Advice::Before(advice) = &before {
            advice.before(&ctx)?;
        }
        if let Advice::Around(advice) = &around {
            let value = advice.around(&ctx, Proceed::new(|| Ok(json!("inner"))))?;
            assert_eq!(value, json!({ "wrapped": "inner" }));
        }
        Ok(())
    }

    #[test]
    fn test_advice_entry() {
        let entry = AdviceEntry::new(4, PointcutId(0), Advice::before(|_| Ok(())))
            .with_name("EntryLogging");
        assert_eq!(entry.stage(), Stage::Before);
        assert_eq!(entry.name, "EntryLogging");
        assert_eq!(format!("{:?}", entry.advice), "Advice::before");
    }
}
