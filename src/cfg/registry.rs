// Trait 注册表和工厂函数

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::type_options::TypeOptions;

// Trait-based 构造函数类型
// 返回 Box<dyn Any>，其中实际装的是 Box<dyn Trait>
type TraitConstructor = Arc<dyn Fn(JsonValue) -> Result<Box<dyn Any + Send + Sync>> + Send + Sync>;

// Trait 注册表：为每个 Trait 类型维护一个独立的注册表
// 外层 HashMap 的 key 是 Trait 的 TypeId，内层 HashMap 的 key 是类型名称
static TRAIT_REGISTRY: Lazy<RwLock<HashMap<TypeId, HashMap<String, TraitConstructor>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// 为实现特定 Trait 的类型注册构造函数
///
/// 构造过程允许失败：`T` 只需实现 `TryFrom<Config>`。
/// 实现了 `From<Config>` 的类型通过标准库的 blanket impl 自动满足约束。
///
/// # 类型参数
/// - `T`: 具体实现类型
/// - `Trait`: 目标 trait（使用 `dyn Trait` 形式）
/// - `Config`: 配置类型
///
/// # 示例
/// ```ignore
/// register_trait::<TextFormatter, dyn LogFormatter, TextFormatterConfig>("TextFormatter")?;
///
/// let formatter: Box<dyn LogFormatter> = create_trait_from_type_options(&type_options)?;
/// ```
pub fn register_trait<T, Trait, Config>(type_name: &str) -> Result<()>
where
    T: Send + Sync + 'static,
    Trait: ?Sized + Send + Sync + 'static,
    Config: DeserializeOwned + Send + Sync + 'static,
    T: TryFrom<Config>,
    <T as TryFrom<Config>>::Error: Into<anyhow::Error>,
    Box<T>: Into<Box<Trait>>,
{
    let trait_id = TypeId::of::<Trait>();
    let name = type_name.to_string();

    let constructor: TraitConstructor = Arc::new(move |value| {
        let config: Config = serde_json::from_value(value)
            .map_err(|e| anyhow!("Invalid options for '{}': {}", name, e))?;
        let instance = T::try_from(config).map_err(Into::into)?;
        let trait_object: Box<Trait> = Box::new(instance).into();
        // 将 Box<dyn Trait> 包装成 Box<dyn Any>
        Ok(Box::new(trait_object) as Box<dyn Any + Send + Sync>)
    });

    let mut registry = TRAIT_REGISTRY
        .write()
        .map_err(|_| anyhow!("Failed to acquire write lock"))?;
    registry
        .entry(trait_id)
        .or_default()
        .insert(type_name.to_string(), constructor);

    Ok(())
}

/// 检查某个类型名称是否已为 Trait 注册
pub fn is_registered<Trait>(type_name: &str) -> bool
where
    Trait: ?Sized + 'static,
{
    TRAIT_REGISTRY
        .read()
        .map(|registry| {
            registry
                .get(&TypeId::of::<Trait>())
                .is_some_and(|m| m.contains_key(type_name))
        })
        .unwrap_or(false)
}

/// 根据 TypeOptions 创建 trait object
///
/// # 示例
/// ```ignore
/// let type_options = TypeOptions::from_json(r#"{"type": "ConsoleAppender", "options": {}}"#)?;
/// let appender: Box<dyn LogAppender> = create_trait_from_type_options(&type_options)?;
/// ```
pub fn create_trait_from_type_options<Trait>(type_options: &TypeOptions) -> Result<Box<Trait>>
where
    Trait: ?Sized + Send + Sync + 'static,
{
    let trait_id = TypeId::of::<Trait>();

    // 构造函数可能再次注册其他 trait，调用前必须释放读锁
    let constructor = {
        let registry = TRAIT_REGISTRY
            .read()
            .map_err(|_| anyhow!("Failed to acquire read lock"))?;

        registry
            .get(&trait_id)
            .and_then(|m| m.get(&type_options.type_name))
            .cloned()
            .ok_or_else(|| {
                anyhow!(
                    "Type '{}' not registered for this trait",
                    type_options.type_name
                )
            })?
    };

    let any_box = constructor(type_options.options.clone())?;

    // Box<dyn Any> 中装的是 Box<Box<dyn Trait>>
    any_box
        .downcast::<Box<Trait>>()
        .map(|boxed| *boxed)
        .map_err(|_| anyhow!("Failed to downcast to target trait type"))
}
