//! S3配置模块
//!
//! 该模块负责S3客户端的配置和初始化。

use crate::config::StorageConfig;
use crate::error::Result;
use crate::s3::{ObjectBackend, ObjectData, PutObject, S3Backend};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_config::retry::RetryConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// 凭据提供者名称，出现在 SDK 的调试日志里
const CREDENTIALS_PROVIDER_NAME: &str = "storage-config";

/// 根据存储配置创建 S3 客户端。
///
/// 配置了静态凭据时直接使用；否则交给 AWS 默认的凭据提供链
/// （环境变量、profile、实例元数据等）。SDK 自带的重试被关闭，
/// 每个操作只请求一次，失败直接返回给调用方。
///
/// # 参数
///
/// * `config` - 存储配置。
///
/// # 返回值
///
/// 配置好的 `aws_sdk_s3::Client`。
pub async fn build_s3_client(config: &StorageConfig) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region().to_string()))
        .retry_config(RetryConfig::disabled());

    if let Some(credentials) = config.credentials() {
        loader = loader.credentials_provider(Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            None,
            None,
            CREDENTIALS_PROVIDER_NAME,
        ));
    }

    let sdk_config = loader.load().await;

    let mut builder =
        aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(config.force_path_style());
    if let Some(endpoint) = config.endpoint() {
        builder = builder.endpoint_url(endpoint);
    }

    Client::from_conf(builder.build())
}

/// 延迟创建的共享 S3 后端。
///
/// 第一次调用任意操作时才创建客户端，之后所有调用复用同一个实例。
/// 创建过程由 `OnceCell` 串行化，并发的首次调用只会创建一次。
pub struct LazyBackend {
    config: Arc<StorageConfig>,
    backend: OnceCell<S3Backend>,
}

impl LazyBackend {
    pub fn new(config: Arc<StorageConfig>) -> Self {
        Self {
            config,
            backend: OnceCell::const_new(),
        }
    }

    /// 获取共享的后端实例，必要时创建。
    pub async fn get(&self) -> &S3Backend {
        self.backend
            .get_or_init(|| async {
                let backend = S3Backend::connect(&self.config).await;
                tracing::info!(
                    bucket = self.config.bucket(),
                    region = self.config.region(),
                    endpoint = self.config.endpoint().unwrap_or("aws"),
                    "已创建 S3 客户端"
                );
                backend
            })
            .await
    }

    /// 客户端是否已经创建
    pub fn is_initialized(&self) -> bool {
        self.backend.initialized()
    }
}

#[async_trait]
impl ObjectBackend for LazyBackend {
    async fn bucket_exists(&self) -> Result<bool> {
        self.get().await.bucket_exists().await
    }

    async fn create_bucket(&self) -> Result<()> {
        self.get().await.create_bucket().await
    }

    async fn put_object(&self, request: PutObject) -> Result<()> {
        self.get().await.put_object(request).await
    }

    async fn get_object(&self, key: &str) -> Result<ObjectData> {
        self.get().await.get_object(key).await
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        self.get().await.delete_object(key).await
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String> {
        self.get().await.presign_get(key, expires_in).await
    }
}
