//! 数据表对应的 SeaORM 实体
//!
//! 仅供 `storage` 使用，对外返回前统一转换为 `models` 中的类型。
//! 表结构由 `migration` crate 维护：users、grades、students、attendance。

pub mod prelude;

pub mod attendance;
pub mod grades;
pub mod students;
pub mod users;
