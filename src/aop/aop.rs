use crate::aop::advice::AdviceEntry;
use crate::aop::aspects::create_advice;
use crate::aop::config::{AdviceConfig, AopConfig};
use crate::aop::context::InvocationContext;
use crate::aop::error::AopError;
use crate::aop::identity::MethodIdentity;
use crate::aop::pipeline::Pipeline;
use crate::aop::pointcut::Pointcut;
use crate::aop::registry::{AdviceRegistry, PointcutId};
use crate::aop::weaver::{Dispatcher, Weaver};
use crate::log::LoggerManager;
use anyhow::Result;
use garde::Validate;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// 切面管线
///
/// 由配置装配：创建命名 logger、定义切点、按阶段注册通知。
/// 装配完成后注册表不再变化，可以在线程间共享
#[derive(Debug, Clone)]
pub struct Aop {
    pipeline: Pipeline,
}

impl Aop {
    /// 从配置创建
    pub fn new(config: AopConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| AopError::InvalidConfig(e.to_string()))?;

        // 通知里的 `$instance` 引用要在创建通知之前可用
        for (key, logger) in LoggerManager::build_loggers(&config.loggers)? {
            crate::log::add(key, logger);
        }

        let mut registry = AdviceRegistry::new().with_strict_priority(config.strict_priority);
        for (name, expression) in &config.pointcuts {
            registry.define_pointcut(name.as_str(), Pointcut::parse(expression)?)?;
        }

        for advice in &config.advices {
            let pointcut = resolve_pointcut(&mut registry, &advice.pointcut)?;
            register_advice(&mut registry, pointcut, advice)?;
        }

        Ok(Self::from_registry(registry))
    }

    /// 从配置文件创建，格式由扩展名决定
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(AopConfig::from_file(path)?)
    }

    /// 使用代码装配好的注册表
    pub fn from_registry(registry: AdviceRegistry) -> Self {
        Self {
            pipeline: Pipeline::new(Arc::new(registry)),
        }
    }

    pub fn registry(&self) -> &Arc<AdviceRegistry> {
        self.pipeline.registry()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn weaver(&self) -> Weaver {
        Weaver::new(Arc::clone(self.registry()))
    }

    /// 空的分发表，注册进来的方法按当前切面织入
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.weaver())
    }

    /// 执行一次被拦截的调用
    pub fn invoke<F>(&self, identity: MethodIdentity, arguments: Vec<Value>, op: F) -> Result<Value>
    where
        F: FnOnce(&[Value]) -> Result<Value>,
    {
        self.pipeline.invoke(identity, arguments, op)
    }

    /// 执行一次被拦截的调用，返回完成后的上下文
    pub fn complete<F>(
        &self,
        identity: MethodIdentity,
        arguments: Vec<Value>,
        op: F,
    ) -> Result<InvocationContext>
    where
        F: FnOnce(&[Value]) -> Result<Value>,
    {
        self.pipeline.complete(identity, arguments, op)
    }
}

impl TryFrom<AopConfig> for Aop {
    type Error = anyhow::Error;

    fn try_from(config: AopConfig) -> Result<Self> {
        Self::new(config)
    }
}

/// 先按名称查找（允许 `name()` 写法），找不到再作为表达式解析
fn resolve_pointcut(registry: &mut AdviceRegistry, reference: &str) -> Result<PointcutId, AopError> {
    let reference = reference.trim();
    let name = reference.strip_suffix("()").unwrap_or(reference);
    if let Some(id) = registry.pointcut_id(name) {
        return Ok(id);
    }

    match Pointcut::parse(reference) {
        Ok(pointcut) => Ok(registry.add_pointcut(pointcut)),
        // 形如标识符的引用解析失败，多半是切点名写错了
        Err(_) if is_identifier(name) => Err(AopError::UnknownPointcut(name.to_string())),
        Err(e) => Err(e),
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn register_advice(
    registry: &mut AdviceRegistry,
    pointcut: PointcutId,
    config: &AdviceConfig,
) -> Result<(), AopError> {
    let advice = create_advice(config.stage, &config.handler)?;
    registry.register(
        AdviceEntry::new(config.priority, pointcut, advice).with_name(config.display_name()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aop::advice::Stage;
    use crate::log::MemoryAppender;
    use serde_json::json;
    use serial_test::serial;

    fn config(json: &str) -> AopConfig {
        AopConfig::from_json(json).unwrap()
    }

    #[test]
    #[serial]
    fn test_aop_from_config() -> Result<()> {
        let aop = Aop::new(config(
            r#"{
                loggers: {
                    "aop-unit": {
                        level: "info",
                        formatter: { type: "JsonFormatter" },
                        appender: { type: "MemoryAppender", options: { name: "aop-unit" } },
                    },
                },
                pointcuts: { service: "execution(* *Service.*(..))" },
                advices: [
                    { stage: "before", priority: 1, pointcut: "service",
                      handler: { type: "EntryLogging", options: { logger: { $instance: "aop-unit" } } } },
                    { stage: "after_returning", priority: 1, pointcut: "service()",
                      handler: { type: "ResultLogging", options: { logger: { $instance: "aop-unit" } } } },
                ],
            }"#,
        ))?;
        let memory = MemoryAppender::named("aop-unit");
        memory.clear();

        assert_eq!(aop.registry().len(), 2);
        assert_eq!(aop.registry().entries()[0].name, "EntryLogging");

        let identity = MethodIdentity::new("BookService", "find");
        let result = aop.invoke(identity, vec![json!(1)], |args| Ok(json!({ "id": args[0] })))?;
        assert_eq!(result, json!({ "id": 1 }));

        let lines = memory.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Start for execution"));
        assert!(lines[1].contains("Execution done"));

        // 未命中的方法不输出日志
        aop.invoke(MethodIdentity::new("Other", "find"), vec![], |_| Ok(Value::Null))?;
        assert_eq!(memory.lines().len(), 2);
        Ok(())
    }

    #[test]
    fn test_aop_inline_pointcut() -> Result<()> {
        let aop = Aop::new(config(
            r#"{ advices: [ { stage: "around", pointcut: "*Controller.get*", handler: { type: "Timing" } } ] }"#,
        ))?;

        let weaver = aop.weaver();
        let woven = weaver.weave(MethodIdentity::new("BookController", "getBooks"), |_| {
            Ok(json!(["a"]))
        });
        assert!(woven.is_advised());
        assert_eq!(woven.plan().around.len(), 1);
        assert_eq!(woven.call(vec![])?, json!(["a"]));
        Ok(())
    }

    #[test]
    fn test_aop_unknown_pointcut_name() {
        let err = Aop::new(config(
            r#"{ advices: [ { stage: "before", pointcut: "loggingOperation", handler: { type: "EntryLogging" } } ] }"#,
        ))
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<AopError>(),
            Some(&AopError::UnknownPointcut("loggingOperation".to_string()))
        );
    }

    #[test]
    fn test_aop_invalid_pointcut_expression() {
        let err = Aop::new(config(r#"{ pointcuts: { broken: "within(*)" } }"#)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AopError>(),
            Some(AopError::InvalidPointcut { .. })
        ));
    }

    #[test]
    fn test_aop_stage_mismatch() {
        let err = Aop::new(config(
            r#"{ advices: [ { stage: "before", pointcut: "*", handler: { type: "Timing" } } ] }"#,
        ))
        .unwrap_err();
        match err.downcast_ref::<AopError>() {
            Some(AopError::InvalidHandler { handler, stage, .. }) => {
                assert_eq!(handler, "Timing");
                assert_eq!(*stage, Stage::Before);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_aop_strict_priority() {
        let json = r#"{
            strict_priority: true,
            advices: [
                { stage: "before", priority: 1, pointcut: "*", handler: { type: "EntryLogging" } },
                { stage: "before", priority: 1, pointcut: "*", handler: { type: "EntryLogging" } },
            ],
        }"#;
        let err = Aop::new(config(json)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AopError>(),
            Some(&AopError::DuplicatePriority {
                stage: Stage::Before,
                priority: 1
            })
        );

        // 宽松模式下按注册顺序
        let lenient = json.replace("strict_priority: true", "strict_priority: false");
        assert!(Aop::new(config(&lenient)).is_ok());
    }

    #[test]
    fn test_aop_invalid_config() {
        let err = Aop::new(config(
            r#"{ advices: [ { stage: "before", pointcut: "", handler: { type: "EntryLogging" } } ] }"#,
        ))
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AopError>(),
            Some(AopError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_aop_dispatcher() -> Result<()> {
        let aop = Aop::new(config(
            r#"{ advices: [ { stage: "around", pointcut: "Calc.add", handler: { type: "Timing" } } ] }"#,
        ))?;

        let mut dispatcher = aop.dispatcher();
        assert!(dispatcher.register(MethodIdentity::new("Calc", "add"), |args| {
            Ok(json!(args[0].as_i64().unwrap_or(0) + args[1].as_i64().unwrap_or(0)))
        }));
        assert!(!dispatcher.register(MethodIdentity::new("Calc", "sub"), |_| Ok(json!(0))));

        assert_eq!(dispatcher.call("Calc.add", vec![json!(1), json!(2)])?, json!(3));
        assert!(dispatcher.is_advised("Calc.add"));
        assert!(!dispatcher.is_advised("Calc.sub"));
        Ok(())
    }
}
