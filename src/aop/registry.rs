use crate::aop::advice::{
    Advice, AdviceEntry, AfterReturningAdvice, AfterThrowingAdvice, AroundAdvice, BeforeAdvice,
    Stage,
};
use crate::aop::error::AopError;
use crate::aop::identity::MethodIdentity;
use crate::aop::pointcut::Pointcut;
use std::collections::HashMap;
use std::sync::Arc;

/// 注册表内切点的编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointcutId(pub(crate) usize);

/// 通知注册表
///
/// 启动时装配，之后只读，通过 `Arc` 在并发调用间共享
#[derive(Debug, Default)]
pub struct AdviceRegistry {
    pointcuts: Vec<Pointcut>,
    names: HashMap<String, PointcutId>,
    entries: Vec<AdviceEntry>,
    strict_priority: bool,
}

/// 某个方法命中的全部通知，各阶段已排好序
#[derive(Clone, Default)]
pub struct AdvicePlan {
    pub before: Vec<Arc<dyn BeforeAdvice>>,
    pub around: Vec<Arc<dyn AroundAdvice>>,
    pub after_returning: Vec<Arc<dyn AfterReturningAdvice>>,
    pub after_throwing: Vec<Arc<dyn AfterThrowingAdvice>>,
}

impl AdvicePlan {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.before.len() + self.around.len() + self.after_returning.len() + self.after_throwing.len()
    }
}

impl std::fmt::Debug for AdvicePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvicePlan")
            .field("before", &self.before.len())
            .field("around", &self.around.len())
            .field("after_returning", &self.after_returning.len())
            .field("after_throwing", &self.after_throwing.len())
            .finish()
    }
}

impl AdviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 严格模式下同一阶段的优先级不能重复；否则按注册顺序决定先后
    pub fn with_strict_priority(mut self, strict: bool) -> Self {
        self.strict_priority = strict;
        self
    }

    pub fn strict_priority(&self) -> bool {
        self.strict_priority
    }

    /// 定义命名切点，多个通知可以引用同一个切点
    pub fn define_pointcut(
        &mut self,
        name: impl Into<String>,
        pointcut: Pointcut,
    ) -> Result<PointcutId, AopError> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(AopError::DuplicatePointcut(name));
        }

        let id = self.add_pointcut(pointcut);
        self.names.insert(name, id);
        Ok(id)
    }

    /// 添加匿名切点
    pub fn add_pointcut(&mut self, pointcut: Pointcut) -> PointcutId {
        self.pointcuts.push(pointcut);
        PointcutId(self.pointcuts.len() - 1)
    }

    pub fn pointcut_id(&self, name: &str) -> Option<PointcutId> {
        self.names.get(name).copied()
    }

    pub fn pointcut(&self, id: PointcutId) -> Option<&Pointcut> {
        self.pointcuts.get(id.0)
    }

    pub fn register(&mut self, entry: AdviceEntry) -> Result<(), AopError> {
        if self.pointcut(entry.pointcut).is_none() {
            return Err(AopError::UnknownPointcut(format!("#{}", entry.pointcut.0)));
        }

        if self.strict_priority {
            let stage = entry.stage();
            if self
                .entries
                .iter()
                .any(|e| e.stage() == stage && e.priority == entry.priority)
            {
                return Err(AopError::DuplicatePriority {
                    stage,
                    priority: entry.priority,
                });
            }
        }

        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[AdviceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 每个切点对该方法求值一次
    fn matched_pointcuts(&self, identity: &MethodIdentity) -> Vec<bool> {
        self.pointcuts.iter().map(|p| p.matches(identity)).collect()
    }

    /// 某阶段命中的条目，按 (priority, 注册顺序) 排序
    pub fn applicable(&self, stage: Stage, identity: &MethodIdentity) -> Vec<&AdviceEntry> {
        let matched = self.matched_pointcuts(identity);
        let mut entries: Vec<&AdviceEntry> = self
            .entries
            .iter()
            .filter(|e| e.stage() == stage && matched[e.pointcut.0])
            .collect();
        // 稳定排序，同优先级保持注册顺序
        entries.sort_by_key(|e| e.priority);
        entries
    }

    /// 一次求值得到四个阶段的有序通知
    pub fn plan(&self, identity: &MethodIdentity) -> AdvicePlan {
        let matched = self.matched_pointcuts(identity);
        let mut entries: Vec<&AdviceEntry> = self
            .entries
            .iter()
            .filter(|e| matched[e.pointcut.0])
            .collect();
        entries.sort_by_key(|e| e.priority);

        let mut plan = AdvicePlan::default();
        for entry in entries {
            match &entry.advice {
                Advice::Before(a) => plan.before.push(Arc::clone(a)),
                Advice::Around(a) => plan.around.push(Arc::clone(a)),
                Advice::AfterReturning(a) => plan.after_returning.push(Arc::clone(a)),
                Advice::AfterThrowing(a) => plan.after_throwing.push(Arc::clone(a)),
            }
        }
        plan
    }

    /// 是否有任一通知命中该方法
    pub fn matches_any(&self, identity: &MethodIdentity) -> bool {
        let matched = self.matched_pointcuts(identity);
        self.entries.iter().any(|e| matched[e.pointcut.0])
    }
}
