//! S3预签名URL模块
//!
//! 该模块负责生成S3对象的预签名URL。

use crate::error::{Result, StorageError};
use crate::s3::s3_ops::classify_sdk_error;
use aws_sdk_s3::Client;
use aws_sdk_s3::presigning::PresigningConfig;
use std::time::Duration;

/// 为 S3 键生成 GET 预签名 URL。
///
/// 签名完全在本地计算，不会访问网络。
///
/// # 参数
///
/// * `s3_client` - S3 客户端实例。
/// * `bucket_name` - S3 存储桶名称。
/// * `key` - 要为其生成预签名 URL 的 S3 键。
/// * `expires_in` - URL 有效期。
///
/// # 返回值
///
/// 预签名 URL 的字符串表示。
///
/// # Errors
///
/// 有效期超出 SigV4 允许的范围时返回 `ConfigInvalid`。
pub async fn generate_presigned_url(
    s3_client: &Client,
    bucket_name: &str,
    key: &str,
    expires_in: Duration,
) -> Result<String> {
    let presigning_config = PresigningConfig::expires_in(expires_in)
        .map_err(|e| StorageError::ConfigInvalid(format!("presign expiry: {e}")))?;

    let presigned_request = s3_client
        .get_object()
        .bucket(bucket_name)
        .key(key)
        .presigned(presigning_config)
        .await
        .map_err(|e| classify_sdk_error("presign", e))?;

    Ok(presigned_request.uri().to_string())
}
