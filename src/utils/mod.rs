//! 工具函数模块
//!
//! 此模块包含了项目中使用的各种工具函数：
//! - HTTP头部处理工具（Content-Disposition、MIME类型检测）
//! - 对象键与公开URL的拼接

pub mod headers;
pub mod path;
