//! 附件存储门面。
//!
//! 把宿主应用的文件操作（上传、读取、删除、生成访问 URL）翻译成对象存储请求。
//! 对象键总是 `目标目录 + 文件名`，目标目录未指定时使用配置中的目录。

use crate::config::StorageConfig;
use crate::error::Result;
use crate::s3::{LazyBackend, ObjectBackend, ObjectData, PutObject, Visibility};
use crate::utils::headers::{DEFAULT_CONTENT_TYPE, inline_content_disposition};
use crate::utils::path::{object_key, public_object_url};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 存储桶内对象的引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

/// 附件存储门面。
///
/// 配置和后端都在构造时注入；需要延迟建立连接时使用 [`StorageFacade::connect_lazy`]。
pub struct StorageFacade {
    config: Arc<StorageConfig>,
    backend: Arc<dyn ObjectBackend>,
}

impl StorageFacade {
    pub fn new(config: Arc<StorageConfig>, backend: Arc<dyn ObjectBackend>) -> Self {
        Self { config, backend }
    }

    /// 使用延迟初始化的 S3 后端创建门面，第一次操作时才创建客户端。
    pub fn connect_lazy(config: StorageConfig) -> Self {
        let config = Arc::new(config);
        let backend = Arc::new(LazyBackend::new(config.clone()));
        Self::new(config, backend)
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// 缩略图等派生文件使用的目录前缀
    pub fn thumb_folder(&self) -> &str {
        self.config.thumb_folder()
    }

    fn target<'a>(&'a self, target_folder: Option<&'a str>) -> &'a str {
        target_folder.unwrap_or(self.config.folder())
    }

    /// 解析对象引用，不访问网络。
    ///
    /// # 参数
    ///
    /// * `filename` - 文件名，原样拼接，不做规范化。
    /// * `target_folder` - 目标目录，`None` 时使用配置中的目录。
    pub fn object(&self, filename: &str, target_folder: Option<&str>) -> ObjectRef {
        ObjectRef {
            bucket: self.config.bucket().to_string(),
            key: object_key(self.target(target_folder), filename),
        }
    }

    /// 检查存储桶是否存在，不存在时创建。
    ///
    /// # Errors
    ///
    /// 后端不可达或凭据无效时返回 `BackendUnavailable`。
    pub async fn ensure_bucket(&self) -> Result<()> {
        let bucket = self.config.bucket();
        if self.backend.bucket_exists().await? {
            debug!(bucket, "存储桶已存在");
            return Ok(());
        }

        self.backend
            .create_bucket()
            .await
            .inspect_err(|e| warn!(bucket, error = %e, "创建存储桶失败"))?;
        info!(bucket, "已创建存储桶");
        Ok(())
    }

    /// 上传附件。
    ///
    /// 对象键为 `目标目录 + disk_filename`；Content-Disposition 设置为
    /// `inline; filename=<编码后的原始文件名>`；未配置私有时设置 `public-read` ACL。
    ///
    /// # 参数
    ///
    /// * `disk_filename` - 调用方分配的存储文件名。
    /// * `original_filename` - 用户看到的原始文件名。
    /// * `data` - 文件内容。
    /// * `content_type` - MIME 类型，`None` 时为 `application/octet-stream`。
    /// * `target_folder` - 目标目录，`None` 时使用配置中的目录。
    ///
    /// # Errors
    ///
    /// 传输失败返回 `BackendUnavailable`，后端拒绝返回 `BackendRejected`。不做重试。
    pub async fn put(
        &self,
        disk_filename: &str,
        original_filename: &str,
        data: impl Into<Bytes>,
        content_type: Option<&str>,
        target_folder: Option<&str>,
    ) -> Result<()> {
        let object = self.object(disk_filename, target_folder);
        let visibility = if self.config.is_private() {
            Visibility::Private
        } else {
            Visibility::Public
        };
        let request = PutObject {
            key: object.key,
            body: data.into(),
            content_type: content_type.unwrap_or(DEFAULT_CONTENT_TYPE).to_string(),
            content_disposition: inline_content_disposition(original_filename),
            visibility,
        };

        debug!(
            bucket = %object.bucket,
            key = %request.key,
            size = request.body.len(),
            content_type = %request.content_type,
            "上传对象"
        );
        self.backend
            .put_object(request)
            .await
            .inspect_err(|e| warn!(bucket = %object.bucket, error = %e, "上传对象失败"))
    }

    /// 读取附件内容。
    ///
    /// # Errors
    ///
    /// 键不存在时返回 `NotFound`。
    pub async fn get(&self, filename: &str, target_folder: Option<&str>) -> Result<ObjectData> {
        let object = self.object(filename, target_folder);
        debug!(bucket = %object.bucket, key = %object.key, "读取对象");
        self.backend.get_object(&object.key).await
    }

    /// 删除附件。
    ///
    /// S3 对不存在的键同样返回成功，所以重复删除不会报错。
    pub async fn delete(&self, filename: &str, target_folder: Option<&str>) -> Result<()> {
        let object = self.object(filename, target_folder);
        debug!(bucket = %object.bucket, key = %object.key, "删除对象");
        self.backend
            .delete_object(&object.key)
            .await
            .inspect_err(|e| warn!(key = %object.key, error = %e, "删除对象失败"))
    }

    /// 生成附件的访问 URL。
    ///
    /// 公开模式下返回不带签名的公开 URL；私有模式下返回有效期为 `expires_in`
    /// 秒（未配置时 900 秒）的预签名 URL。两种情况都只在本地计算。
    pub async fn object_url(&self, filename: &str, target_folder: Option<&str>) -> Result<String> {
        let object = self.object(filename, target_folder);
        if self.config.is_private() {
            self.backend
                .presign_get(&object.key, self.config.presign_expires())
                .await
        } else {
            Ok(self.public_url(&object.key))
        }
    }

    /// 对象键的公开 URL
    pub fn public_url(&self, key: &str) -> String {
        public_object_url(
            self.config.endpoint(),
            self.config.bucket(),
            self.config.region(),
            self.config.force_path_style(),
            key,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::s3::MockObjectBackend;
    use std::time::Duration;

    fn facade(config: StorageConfig, backend: MockObjectBackend) -> StorageFacade {
        StorageFacade::new(Arc::new(config), Arc::new(backend))
    }

    fn uploads() -> StorageConfig {
        StorageConfig::new("attachments")
            .with_folder("uploads")
            .with_endpoint("http://localhost:9000")
            .with_force_path_style(true)
    }

    #[test]
    fn test_object_uses_configured_folder() {
        let storage = facade(uploads(), MockObjectBackend::new());
        let object = storage.object("a1b2", None);
        assert_eq!(object.bucket, "attachments");
        assert_eq!(object.key, "uploads/a1b2");
    }

    #[test]
    fn test_object_with_target_folder_is_not_normalized() {
        let storage = facade(uploads(), MockObjectBackend::new());
        assert_eq!(storage.object("a1b2", Some("tmp/")).key, "tmp/a1b2");
        assert_eq!(storage.object("a1b2", Some("raw")).key, "rawa1b2");
        assert_eq!(storage.object("x y", Some("")).key, "x y");
    }

    #[tokio::test]
    async fn test_put_sets_disposition_key_and_public_acl() {
        let mut backend = MockObjectBackend::new();
        backend
            .expect_put_object()
            .withf(|request| {
                request.key == "uploads/a1b2"
                    && request.content_disposition == "inline; filename=My%20Report.pdf"
                    && request.content_type == DEFAULT_CONTENT_TYPE
                    && request.visibility == Visibility::Public
                    && request.body.as_ref() == b"%PDF-1.7"
            })
            .times(1)
            .returning(|_| Ok(()));

        let storage = facade(uploads(), backend);
        storage
            .put("a1b2", "My Report.pdf", &b"%PDF-1.7"[..], None, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_put_private_with_content_type_and_target_folder() {
        let mut backend = MockObjectBackend::new();
        backend
            .expect_put_object()
            .withf(|request| {
                request.key == "tmp/thumb-a1b2"
                    && request.content_type == "image/png"
                    && request.visibility == Visibility::Private
            })
            .times(1)
            .returning(|_| Ok(()));

        let storage = facade(uploads().with_private(true), backend);
        let thumb = storage.thumb_folder().to_string();
        storage
            .put("thumb-a1b2", "a.png", vec![1u8, 2, 3], Some("image/png"), Some(&thumb))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_put_propagates_backend_failure() {
        let mut backend = MockObjectBackend::new();
        backend.expect_put_object().times(1).returning(|_| {
            Err(StorageError::BackendRejected {
                operation: "put",
                code: "AccessDenied".into(),
                message: "Access Denied".into(),
            })
        });

        let storage = facade(uploads(), backend);
        let result = storage.put("a1b2", "a.txt", "x", None, None).await;
        assert!(matches!(result, Err(StorageError::BackendRejected { .. })));
    }

    #[tokio::test]
    async fn test_public_object_url_has_no_signature() {
        let storage = facade(uploads(), MockObjectBackend::new());
        let url = storage.object_url("a1b2", None).await.unwrap();
        assert_eq!(url, "http://localhost:9000/attachments/uploads/a1b2");
        assert!(!url.contains("X-Amz-"));
    }

    #[tokio::test]
    async fn test_private_object_url_is_presigned_with_configured_expiry() {
        let mut backend = MockObjectBackend::new();
        backend
            .expect_presign_get()
            .withf(|key, expires| key == "uploads/a1b2" && *expires == Duration::from_secs(3600))
            .times(1)
            .returning(|_, _| Ok("https://signed.example/uploads/a1b2?X-Amz-Expires=3600".into()));

        let config = uploads()
            .with_private(true)
            .with_expires_in(Duration::from_secs(3600));
        let storage = facade(config, backend);
        let url = storage.object_url("a1b2", None).await.unwrap();
        assert!(url.contains("X-Amz-Expires=3600"));
    }

    #[tokio::test]
    async fn test_private_object_url_defaults_expiry() {
        let mut backend = MockObjectBackend::new();
        backend
            .expect_presign_get()
            .withf(|_, expires| *expires == Duration::from_secs(900))
            .times(1)
            .returning(|_, _| Ok("https://signed.example".into()));

        let storage = facade(uploads().with_private(true), backend);
        storage.object_url("a1b2", None).await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_bucket_skips_existing() {
        let mut backend = MockObjectBackend::new();
        backend.expect_bucket_exists().times(1).returning(|| Ok(true));
        backend.expect_create_bucket().never();

        facade(uploads(), backend).ensure_bucket().await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_bucket_creates_missing() {
        let mut backend = MockObjectBackend::new();
        backend.expect_bucket_exists().times(1).returning(|| Ok(false));
        backend.expect_create_bucket().times(1).returning(|| Ok(()));

        facade(uploads(), backend).ensure_bucket().await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_bucket_unavailable() {
        let mut backend = MockObjectBackend::new();
        backend.expect_bucket_exists().times(1).returning(|| {
            Err(StorageError::BackendUnavailable {
                operation: "head_bucket",
                reason: "connection refused".into(),
            })
        });
        backend.expect_create_bucket().never();

        let result = facade(uploads(), backend).ensure_bucket().await;
        assert!(matches!(result, Err(StorageError::BackendUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_get_and_delete_use_resolved_key() {
        let mut backend = MockObjectBackend::new();
        backend
            .expect_get_object()
            .withf(|key| key == "uploads/missing")
            .times(1)
            .returning(|key| {
                Err(StorageError::NotFound {
                    key: key.to_string(),
                })
            });
        backend
            .expect_delete_object()
            .withf(|key| key == "tmp/a1b2")
            .times(1)
            .returning(|_| Ok(()));

        let storage = facade(uploads(), backend);
        let result = storage.get("missing", None).await;
        assert!(matches!(result, Err(StorageError::NotFound { key }) if key == "uploads/missing"));
        storage.delete("a1b2", Some("tmp/")).await.unwrap();
    }
}
