//! S3模块
//!
//! 该模块定义存储门面与对象存储之间的接口 [`ObjectBackend`]，
//! 以及基于 aws-sdk-s3 的实现、客户端的延迟初始化和预签名 URL 生成。

pub mod config;
pub mod presign;
pub mod s3_ops;

pub use config::{LazyBackend, build_s3_client};
pub use presign::generate_presigned_url;
pub use s3_ops::S3Backend;

use crate::error::{Result, StorageError};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use std::time::Duration;

/// 上传对象的可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// 以 `public-read` ACL 上传，可以直接通过公开 URL 访问
    Public,
    /// 不设置 ACL，只能通过预签名 URL 访问
    Private,
}

/// 一次上传请求的完整内容。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObject {
    pub key: String,
    pub body: Bytes,
    pub content_type: String,
    pub content_disposition: String,
    pub visibility: Visibility,
}

/// `get` 返回的对象内容，附带后端报告的元数据。
#[derive(Debug)]
pub struct ObjectData {
    pub body: ByteStream,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub content_length: Option<u64>,
}

impl ObjectData {
    /// 用内存中的字节构造对象内容。
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self {
            content_length: Some(bytes.len() as u64),
            body: ByteStream::from(bytes),
            content_type: None,
            content_disposition: None,
        }
    }

    /// 读取完整的对象内容。
    ///
    /// # Errors
    ///
    /// 读取过程中连接中断时返回 `BackendUnavailable`。
    pub async fn into_bytes(self) -> Result<Bytes> {
        self.body
            .collect()
            .await
            .map(|data| data.into_bytes())
            .map_err(|e| StorageError::BackendUnavailable {
                operation: "get",
                reason: e.to_string(),
            })
    }
}

/// 对象存储后端。
///
/// 每个方法对应一次独立的请求，不做重试。实现需要可以被多个任务并发使用。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// 检查配置的存储桶是否存在
    async fn bucket_exists(&self) -> Result<bool>;

    /// 创建配置的存储桶，已经属于自己的存储桶视为成功
    async fn create_bucket(&self) -> Result<()>;

    async fn put_object(&self, request: PutObject) -> Result<()>;

    /// 键不存在时返回 `NotFound`
    async fn get_object(&self, key: &str) -> Result<ObjectData>;

    async fn delete_object(&self, key: &str) -> Result<()>;

    /// 在本地计算 GET 预签名 URL，不发起网络请求
    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String>;
}
