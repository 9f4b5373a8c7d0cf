//! 应用配置
//!
//! 配置来源优先级（从低到高）：`config.toml` → `config.{APP_ENV}.toml` →
//! `ATTENDANCE_<SECTION>__<KEY>` 环境变量 → 直接环境变量覆盖（`DATABASE_URL` 等）。

mod r#impl;
mod structs;

pub use structs::*;
