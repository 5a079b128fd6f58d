//! S3操作模块
//!
//! 该模块负责处理与S3存储桶的交互操作，并把 SDK 错误归类为 [`StorageError`]。

use crate::config::StorageConfig;
use crate::error::{Result, StorageError};
use crate::s3::{ObjectBackend, ObjectData, PutObject, Visibility, build_s3_client, presign};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::create_bucket::CreateBucketError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration, ObjectCannedAcl};
use std::time::Duration;

/// 表示凭据无效的错误码，归类为后端不可用
const CREDENTIAL_ERROR_CODES: &[&str] = &[
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "InvalidToken",
];

/// 不需要 LocationConstraint 的区域
const DEFAULT_S3_REGION: &str = "us-east-1";

/// 基于 aws-sdk-s3 的对象存储后端。
#[derive(Debug, Clone)]
pub struct S3Backend {
    client: Client,
    bucket: String,
    region: String,
}

impl S3Backend {
    pub fn new(client: Client, bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            region: region.into(),
        }
    }

    /// 根据存储配置创建客户端并构造后端。
    pub async fn connect(config: &StorageConfig) -> Self {
        let client = build_s3_client(config).await;
        Self::new(client, config.bucket(), config.region())
    }
}

#[async_trait]
impl ObjectBackend for S3Backend {
    async fn bucket_exists(&self) -> Result<bool> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(classify_sdk_error("head_bucket", err)),
        }
    }

    async fn create_bucket(&self) -> Result<()> {
        let mut request = self.client.create_bucket().bucket(&self.bucket);
        if self.region != DEFAULT_S3_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(CreateBucketError::is_bucket_already_owned_by_you) =>
            {
                tracing::debug!(bucket = %self.bucket, "存储桶已存在");
                Ok(())
            }
            Err(err) => Err(classify_sdk_error("create_bucket", err)),
        }
    }

    async fn put_object(&self, request: PutObject) -> Result<()> {
        let mut put = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(request.key)
            .content_type(request.content_type)
            .content_disposition(request.content_disposition)
            .body(ByteStream::from(request.body));
        if request.visibility == Visibility::Public {
            put = put.acl(ObjectCannedAcl::PublicRead);
        }

        put.send()
            .await
            .map_err(|e| classify_sdk_error("put", e))?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<ObjectData> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                let missing = is_not_found(&err)
                    || err
                        .as_service_error()
                        .is_some_and(GetObjectError::is_no_such_key);
                if missing {
                    StorageError::NotFound {
                        key: key.to_string(),
                    }
                } else {
                    classify_sdk_error("get", err)
                }
            })?;

        Ok(ObjectData {
            content_type: output.content_type().map(str::to_string),
            content_disposition: output.content_disposition().map(str::to_string),
            content_length: output.content_length().and_then(|len| u64::try_from(len).ok()),
            body: output.body,
        })
    }

    /// S3 删除不存在的键同样返回 204，因此删除是幂等的。
    async fn delete_object(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify_sdk_error("delete", e))?;
        Ok(())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String> {
        presign::generate_presigned_url(&self.client, &self.bucket, key, expires_in).await
    }
}

/// 后端以 404 应答（HEAD 请求没有响应体，只能看状态码）
fn is_not_found<E>(err: &SdkError<E, HttpResponse>) -> bool {
    matches!(err, SdkError::ServiceError(service) if service.raw().status().as_u16() == 404)
}

/// 把 SDK 错误归类为 [`StorageError`]。
///
/// * 传输层失败（连接、超时、响应无法解析）、5xx 应答和凭据错误 → `BackendUnavailable`
/// * 其余后端应答 → `BackendRejected`
pub(crate) fn classify_sdk_error<E>(
    operation: &'static str,
    err: SdkError<E, HttpResponse>,
) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match err {
        SdkError::ServiceError(service) => {
            let status = service.raw().status().as_u16();
            let err = service.into_err();
            let code = err.code().unwrap_or("Unknown").to_string();
            let message = err.message().unwrap_or_default().to_string();

            if status >= 500 || CREDENTIAL_ERROR_CODES.contains(&code.as_str()) {
                StorageError::BackendUnavailable {
                    operation,
                    reason: format!("{status} {code}: {message}"),
                }
            } else {
                StorageError::BackendRejected {
                    operation,
                    code,
                    message,
                }
            }
        }
        other => StorageError::BackendUnavailable {
            operation,
            reason: DisplayErrorContext(&other).to_string(),
        },
    }
}
