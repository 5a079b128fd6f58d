//! HTTP请求处理模块
//!
//! 此模块包含了附件存储服务的所有处理器：
//! - 上传、下载、删除附件
//! - 查询附件的访问 URL

pub mod constants;
pub mod files;

// 重新导出主要的公共接口
pub use files::{delete_file, download_file, file_url, upload_file};

use crate::error::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl StorageError {
    /// 错误对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            StorageError::NotFound { .. } => StatusCode::NOT_FOUND,
            StorageError::BackendRejected { .. } => StatusCode::BAD_GATEWAY,
            StorageError::BackendUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            StorageError::ConfigMissing(_)
            | StorageError::ConfigInvalid(_)
            | StorageError::ConfigRead { .. }
            | StorageError::ConfigParse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StorageError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "存储请求失败");
        }
        (status, self.to_string()).into_response()
    }
}
