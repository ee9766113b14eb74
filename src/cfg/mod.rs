//! cfg 模块 - 配置管理
//!
//! 提供基于 `TypeOptions` 的多态构造，以及配置中常用的 serde 辅助类型

pub mod macros;
pub mod registry;
pub mod serde_duration;
pub mod type_options;

// 重新导出公共 API
pub use registry::{create_trait_from_type_options, is_registered, register_trait};
pub use serde_duration::{format_duration, parse_duration, HumanDur};
pub use type_options::TypeOptions;
