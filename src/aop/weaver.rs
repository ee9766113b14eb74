use crate::aop::context::InvocationContext;
use crate::aop::error::AopError;
use crate::aop::identity::MethodIdentity;
use crate::aop::pipeline::run;
use crate::aop::registry::{AdvicePlan, AdviceRegistry};
use anyhow::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// 目标方法
pub type Operation = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// 织入后的方法
///
/// 命中的通知在织入时确定，调用时不再匹配切点
#[derive(Clone)]
pub struct WovenOperation {
    identity: MethodIdentity,
    plan: AdvicePlan,
    target: Operation,
}

impl WovenOperation {
    pub fn identity(&self) -> &MethodIdentity {
        &self.identity
    }

    pub fn plan(&self) -> &AdvicePlan {
        &self.plan
    }

    pub fn is_advised(&self) -> bool {
        !self.plan.is_empty()
    }

    pub fn call(&self, arguments: Vec<Value>) -> Result<Value> {
        self.complete(arguments)?.into_result()
    }

    pub fn complete(&self, arguments: Vec<Value>) -> Result<InvocationContext> {
        let ctx = InvocationContext::new(self.identity.clone(), arguments);
        run(&self.plan, ctx, |args| (self.target)(args))
    }
}

impl fmt::Debug for WovenOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WovenOperation")
            .field("identity", &self.identity)
            .field("plan", &self.plan)
            .finish()
    }
}

/// 织入器：为目标方法构造包装
#[derive(Debug, Clone)]
pub struct Weaver {
    registry: Arc<AdviceRegistry>,
}

impl Weaver {
    pub fn new(registry: Arc<AdviceRegistry>) -> Self {
        Self { registry }
    }

    pub fn weave<F>(&self, identity: MethodIdentity, target: F) -> WovenOperation
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.weave_operation(identity, Arc::new(target))
    }

    pub fn weave_operation(&self, identity: MethodIdentity, target: Operation) -> WovenOperation {
        let plan = self.registry.plan(&identity);
        WovenOperation {
            identity,
            plan,
            target,
        }
    }
}

#[derive(Clone)]
enum Entry {
    Raw(MethodIdentity, Operation),
    Woven(WovenOperation),
}

/// 调用分发表，键为 `Type.method`
///
/// 命中切点的方法注册为织入后的包装，其余直接注册原方法
#[derive(Clone)]
pub struct Dispatcher {
    weaver: Weaver,
    operations: BTreeMap<String, Entry>,
}

impl Dispatcher {
    pub fn new(weaver: Weaver) -> Self {
        Self {
            weaver,
            operations: BTreeMap::new(),
        }
    }

    /// 注册方法，返回是否被织入；同名方法会被替换
    pub fn register<F>(&mut self, identity: MethodIdentity, target: F) -> bool
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let target: Operation = Arc::new(target);
        let key = identity.signature();

        let woven = self.weaver.weave_operation(identity.clone(), Arc::clone(&target));
        let entry = if woven.is_advised() {
            Entry::Woven(woven)
        } else {
            Entry::Raw(identity, target)
        };

        let advised = matches!(entry, Entry::Woven(_));
        self.operations.insert(key, entry);
        advised
    }

    pub fn call(&self, signature: &str, arguments: Vec<Value>) -> Result<Value> {
        match self.operations.get(signature) {
            Some(Entry::Woven(op)) => op.call(arguments),
            Some(Entry::Raw(_, op)) => op(arguments.as_slice()),
            None => Err(AopError::UnknownOperation(signature.to_string()).into()),
        }
    }

    pub fn contains(&self, signature: &str) -> bool {
        self.operations.contains_key(signature)
    }

    pub fn is_advised(&self, signature: &str) -> bool {
        matches!(self.operations.get(signature), Some(Entry::Woven(_)))
    }

    /// 已注册方法的标识，按签名排序
    pub fn identities(&self) -> Vec<&MethodIdentity> {
        self.operations
            .values()
            .map(|entry| match entry {
                Entry::Raw(identity, _) => identity,
                Entry::Woven(op) => op.identity(),
            })
            .collect()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.operations
                    .iter()
                    .map(|(k, e)| (k, matches!(e, Entry::Woven(_)))),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aop::advice::{Advice, AdviceEntry};
    use crate::aop::pointcut::Pointcut;
    use anyhow::anyhow;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_registry(counter: &Arc<AtomicUsize>) -> Arc<AdviceRegistry> {
        let mut registry = AdviceRegistry::new();
        let id = registry.add_pointcut(Pointcut::parse("*Controller.*").unwrap());
        let c = Arc::clone(counter);
        registry
            .register(AdviceEntry::new(
                1,
                id,
                Advice::before(move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            ))
            .unwrap();
        Arc::new(registry)
    }

    #[test]
    fn test_weave_precomputes_plan() -> Result<()> {
        let counter = Arc::new(AtomicUsize::new(0));
        let weaver = Weaver::new(counting_registry(&counter));

        let woven = weaver.weave(MethodIdentity::new("AopDemoController", "echo"), |args| {
            Ok(args.first().cloned().unwrap_or(Value::Null))
        });
        assert!(woven.is_advised());
        assert_eq!(woven.plan().before.len(), 1);

        assert_eq!(woven.call(vec![json!("x")])?, json!("x"));
        assert_eq!(woven.call(vec![])?, Value::Null);
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        let ctx = woven.complete(vec![json!(1)])?;
        assert_eq!(ctx.result(), Some(&json!(1)));
        Ok(())
    }

    #[test]
    fn test_dispatcher_registers_raw_and_woven() -> Result<()> {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = Dispatcher::new(Weaver::new(counting_registry(&counter)));

        assert!(dispatcher.register(MethodIdentity::new("AopDemoController", "getBooks"), |_| {
            Ok(json!(["Book 1"]))
        }));
        assert!(!dispatcher.register(MethodIdentity::new("Repository", "count"), |_| Ok(json!(3))));

        assert!(dispatcher.is_advised("AopDemoController.getBooks"));
        assert!(!dispatcher.is_advised("Repository.count"));
        assert!(dispatcher.contains("Repository.count"));

        assert_eq!(dispatcher.call("AopDemoController.getBooks", vec![])?, json!(["Book 1"]));
        assert_eq!(dispatcher.call("Repository.count", vec![])?, json!(3));
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        let names: Vec<String> = dispatcher.identities().iter().map(|i| i.signature()).collect();
        assert_eq!(names, vec!["AopDemoController.getBooks", "Repository.count"]);
        Ok(())
    }

    #[test]
    fn test_dispatcher_unknown_operation() {
        let dispatcher = Dispatcher::new(Weaver::new(Arc::new(AdviceRegistry::new())));
        let err = dispatcher.call("Nope.nothing", vec![]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AopError>(),
            Some(&AopError::UnknownOperation("Nope.nothing".to_string()))
        );
    }

    #[test]
    fn test_dispatcher_raw_error_passes_through() {
        let mut dispatcher = Dispatcher::new(Weaver::new(Arc::new(AdviceRegistry::new())));
        dispatcher.register(MethodIdentity::new("Repository", "fail"), |_| Err(anyhow!("boom")));
        let err = dispatcher.call("Repository.fail", vec![]).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
