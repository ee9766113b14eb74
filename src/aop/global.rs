use crate::aop::aop::Aop;
use crate::aop::config::AopConfig;
use crate::aop::error::AopError;
use crate::aop::identity::MethodIdentity;
use anyhow::Result;
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::sync::Arc;

/// 进程级切面管线，只能初始化一次
static GLOBAL_AOP: OnceCell<Arc<Aop>> = OnceCell::new();

/// 初始化全局切面管线
///
/// # 示例
///
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     let aop = aopx::aop::init(AopConfig::from_file("aop.json5")?)?;
///     let mut dispatcher = aop.dispatcher();
///     Ok(())
/// }
/// ```
pub fn init(config: AopConfig) -> Result<Arc<Aop>> {
    if GLOBAL_AOP.get().is_some() {
        return Err(AopError::AlreadyInitialized.into());
    }

    let aop = Arc::new(Aop::new(config)?);
    GLOBAL_AOP
        .set(Arc::clone(&aop))
        .map_err(|_| AopError::AlreadyInitialized)?;
    Ok(aop)
}

/// 获取全局切面管线，未初始化时返回 None
pub fn global() -> Option<Arc<Aop>> {
    GLOBAL_AOP.get().cloned()
}

/// 获取全局切面管线，未初始化时报错
pub fn try_global() -> Result<Arc<Aop>> {
    global().ok_or_else(|| AopError::NotInitialized.into())
}

pub fn is_initialized() -> bool {
    GLOBAL_AOP.get().is_some()
}

/// 通过全局切面管线执行一次调用
pub fn invoke<F>(identity: MethodIdentity, arguments: Vec<Value>, op: F) -> Result<Value>
where
    F: FnOnce(&[Value]) -> Result<Value>,
{
    try_global()?.invoke(identity, arguments, op)
}
