//! 附件存储服务库
//!
//! 这是一个把宿主应用的上传附件存放到 S3 兼容对象存储中的门面，主要功能包括：
//! - 按部署环境加载存储配置
//! - 延迟创建并共享 S3 客户端
//! - 上传、读取、删除附件，生成公开或预签名访问 URL
//! - 通过 HTTP 暴露上述操作，支持重定向和代理两种下载方式

pub mod config;
pub mod error;
pub mod handlers;
pub mod s3;
pub mod storage;
pub mod utils;

pub use error::{Result, StorageError};
pub use storage::{ObjectRef, StorageFacade};

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use http::Method;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, CorsLayer};
use tower_http::trace::TraceLayer;

/// 单个上传请求体的上限（100 MiB）
pub const MAX_UPLOAD_SIZE: usize = 100 * 1024 * 1024;

/// 处理器共享的应用状态
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<StorageFacade>,
}

/// 创建并配置Axum应用程序
///
/// # 路由
///
/// * `PUT /files/{filename}` - 上传附件
/// * `GET /files/{filename}` - 下载附件（重定向或代理）
/// * `DELETE /files/{filename}` - 删除附件
/// * `GET /urls/{filename}` - 查询附件的访问 URL
///
/// # 参数
///
/// * `storage` - 存储门面实例。
///
/// # Returns
///
/// 返回配置好的Axum Router实例
pub fn app(storage: Arc<StorageFacade>) -> axum::Router {
    // 配置 CORS
    let cors = CorsLayer::permissive()
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::any());

    axum::Router::new()
        .route(
            "/files/{*filename}",
            get(handlers::download_file)
                .put(handlers::upload_file)
                .delete(handlers::delete_file),
        )
        .route("/urls/{*filename}", get(handlers::file_url))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { storage })
}
