//! 配置管理相关的宏定义
//!
//! 提供简化 From / TryFrom 实现的宏，配合 `register_trait` 使用

/// 为配置类型自动实现转换 trait
///
/// 支持三种模式：
/// 1. `impl_from!(ConfigType => Type)` - `From`，调用 `Type::new(config)`
/// 2. `impl_from!(ConfigType => Type, fallible)` - `TryFrom`，调用返回 `anyhow::Result<Self>` 的 `Type::new(config)`
/// 3. `impl_from!(ConfigType => Type, field: config)` - `From`，使用 `Self { config }`
#[macro_export]
macro_rules! impl_from {
    // 模式1: 直接调用 new 方法
    ($config_type:ty => $target_type:ty) => {
        impl From<$config_type> for $target_type {
            fn from(config: $config_type) -> Self {
                <$target_type>::new(config)
            }
        }
    };

    // 模式2: 调用可能失败的 new 方法，错误交给调用方
    ($config_type:ty => $target_type:ty, fallible) => {
        impl TryFrom<$config_type> for $target_type {
            type Error = anyhow::Error;

            fn try_from(config: $config_type) -> ::core::result::Result<Self, Self::Error> {
                <$target_type>::new(config)
            }
        }
    };

    // 模式3: 直接使用配置字段构造
    ($config_type:ty => $target_type:ty, field: $field:ident) => {
        impl From<$config_type> for $target_type {
            fn from(config: $config_type) -> Self {
                Self { $field: config }
            }
        }
    };
}

/// 为 Box<T> 类型自动实现到 Box<dyn Trait> 的转换
///
/// 用法：`impl_box_from!(Type => dyn TraitName)`
#[macro_export]
macro_rules! impl_box_from {
    ($source_type:ty => dyn $trait_name:path) => {
        impl From<Box<$source_type>> for Box<dyn $trait_name> {
            fn from(source: Box<$source_type>) -> Self {
                source as Box<dyn $trait_name>
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};

    #[derive(Debug)]
    struct TestConfig {
        value: String,
    }

    #[derive(Debug)]
    struct TestService {
        config: TestConfig,
    }

    impl TestService {
        fn new(config: TestConfig) -> Self {
            Self { config }
        }
    }

    #[derive(Debug)]
    struct TestServiceWithField {
        config: TestConfig,
    }

    #[derive(Debug)]
    struct FallibleService {
        value: String,
    }

    impl FallibleService {
        fn new(config: TestConfig) -> Result<Self> {
            if config.value.is_empty() {
                return Err(anyhow!("empty value"));
            }
            Ok(Self {
                value: config.value,
            })
        }
    }

    trait TestTrait {
        fn get_value(&self) -> &str;
    }

    impl TestTrait for TestService {
        fn get_value(&self) -> &str {
            &self.config.value
        }
    }

    impl_from!(TestConfig => TestService);
    impl_from!(TestConfig => TestServiceWithField, field: config);
    impl_from!(TestConfig => FallibleService, fallible);
    impl_box_from!(TestService => dyn TestTrait);

    #[test]
    fn test_impl_from_new() {
        let service = TestService::from(TestConfig {
            value: "test".to_string(),
        });
        assert_eq!(service.config.value, "test");
    }

    #[test]
    fn test_impl_from_field() {
        let service = TestServiceWithField::from(TestConfig {
            value: "test".to_string(),
        });
        assert_eq!(service.config.value, "test");
    }

    #[test]
    fn test_impl_try_from() {
        let ok = FallibleService::try_from(TestConfig {
            value: "x".to_string(),
        });
        assert_eq!(ok.unwrap().value, "x");

        let err = FallibleService::try_from(TestConfig {
            value: String::new(),
        });
        assert!(err.is_err());
    }

    #[test]
    fn test_impl_box_from() {
        let service = TestService::from(TestConfig {
            value: "test".to_string(),
        });
        let boxed_trait: Box<dyn TestTrait> = Box::new(service).into();
        assert_eq!(boxed_trait.get_value(), "test");
    }
}
