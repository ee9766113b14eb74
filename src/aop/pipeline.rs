use crate::aop::advice::AroundAdvice;
use crate::aop::context::{InvocationContext, Outcome, Proceed};
use crate::aop::identity::MethodIdentity;
use crate::aop::registry::{AdvicePlan, AdviceRegistry};
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;

/// 拦截管道
///
/// 调用顺序：Before → Around（最内层为真实方法）→ AfterReturning | AfterThrowing。
/// 全程在调用线程上同步执行。
#[derive(Debug, Clone)]
pub struct Pipeline {
    registry: Arc<AdviceRegistry>,
}

impl Pipeline {
    pub fn new(registry: Arc<AdviceRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<AdviceRegistry> {
        &self.registry
    }

    /// 执行一次被拦截的调用
    ///
    /// 成功返回结果；真实方法或 Around 的错误在 AfterThrowing 之后原样返回；
    /// 通知自身的错误直接返回
    pub fn invoke<F>(&self, identity: MethodIdentity, arguments: Vec<Value>, op: F) -> Result<Value>
    where
        F: FnOnce(&[Value]) -> Result<Value>,
    {
        self.complete(identity, arguments, op)?.into_result()
    }

    /// 与 `invoke` 相同，但返回完成后的上下文
    ///
    /// `Err` 只表示通知执行失败；方法本身的错误记录在上下文里
    pub fn complete<F>(
        &self,
        identity: MethodIdentity,
        arguments: Vec<Value>,
        op: F,
    ) -> Result<InvocationContext>
    where
        F: FnOnce(&[Value]) -> Result<Value>,
    {
        let plan = self.registry.plan(&identity);
        run(&plan, InvocationContext::new(identity, arguments), op)
    }
}

/// 按给定计划执行一次调用
pub(crate) fn run<F>(plan: &AdvicePlan, mut ctx: InvocationContext, op: F) -> Result<InvocationContext>
where
    F: FnOnce(&[Value]) -> Result<Value>,
{
    for advice in &plan.before {
        advice.before(&ctx)?;
    }

    let result = proceed_through(&plan.around, &ctx, op);
    ctx.complete(result);

    match ctx.outcome() {
        Outcome::Returned(value) => {
            for advice in &plan.after_returning {
                advice.after_returning(&ctx, value)?;
            }
        }
        Outcome::Threw(err) => {
            for advice in &plan.after_throwing {
                advice.after_throwing(&ctx, err)?;
            }
        }
        Outcome::Pending => {}
    }

    Ok(ctx)
}

/// 第一个 Around 在最外层，依次嵌套，最内层执行真实方法
fn proceed_through<'a, F>(
    around: &'a [Arc<dyn AroundAdvice>],
    ctx: &'a InvocationContext,
    op: F,
) -> Result<Value>
where
    F: FnOnce(&[Value]) -> Result<Value> + 'a,
{
    match around.split_first() {
        None => op(ctx.arguments()),
        Some((outer, inner)) => {
            outer.around(ctx, Proceed::new(move || proceed_through(inner, ctx, op)))
        }
    }
}
