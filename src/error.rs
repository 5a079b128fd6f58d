//! 存储门面的错误类型。

use std::path::PathBuf;

/// 存储门面所有操作的统一错误。
///
/// 任何错误都不会在本地重试，直接返回给调用方，由调用方决定重试策略。
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 首次使用时缺少必要配置（存储桶、成对的凭据等）。
    #[error("missing storage configuration: {0}")]
    ConfigMissing(&'static str),

    /// 配置值无法使用。
    #[error("invalid storage configuration: {0}")]
    ConfigInvalid(String),

    #[error("failed to read storage config {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse storage config")]
    ConfigParse(#[from] serde_yaml::Error),

    /// 网络/传输失败、后端 5xx，或凭据被拒绝。
    #[error("storage backend unavailable during {operation}: {reason}")]
    BackendUnavailable {
        operation: &'static str,
        reason: String,
    },

    /// `get` 请求的键不存在。
    #[error("object not found: {key}")]
    NotFound { key: String },

    /// 后端明确拒绝了请求（权限不足、请求格式错误等）。
    #[error("storage backend rejected {operation}: {code}: {message}")]
    BackendRejected {
        operation: &'static str,
        code: String,
        message: String,
    },
}

/// 存储操作结果类型。
pub type Result<T, E = StorageError> = std::result::Result<T, E>;
