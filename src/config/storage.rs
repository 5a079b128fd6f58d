//! 存储配置。
//!
//! 配置文件是按部署环境分段的 YAML（`development:`、`production:` 等），
//! 每段包含同样的字段；环境变量可以覆盖文件中的值。解析完成后得到不可变的
//! [`StorageConfig`]，进程内不支持重新加载。

use crate::error::{Result, StorageError};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// 未配置区域时使用的默认区域
pub const DEFAULT_REGION: &str = "ap-northeast-1";

/// 未配置缩略图目录时使用的默认前缀
pub const DEFAULT_THUMB_FOLDER: &str = "tmp/";

/// 未配置 `expires_in` 时预签名 URL 的有效期（与 AWS SDK 默认值一致）
pub const DEFAULT_PRESIGN_EXPIRES: Duration = Duration::from_secs(900);

/// SigV4 预签名允许的最长有效期（7 天）
pub const MAX_PRESIGN_EXPIRES_SECS: u64 = 7 * 24 * 60 * 60;

/// 配置文件中单个环境的原始设置，所有字段都是可选的。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageSettings {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub bucket: Option<String>,
    pub folder: Option<String>,
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub private: Option<bool>,
    pub expires_in: Option<u64>,
    pub force_path_style: Option<bool>,
    pub thumb_folder: Option<String>,
    pub proxy: Option<bool>,
}

impl StorageSettings {
    /// 从 YAML 文本中取出指定环境的设置段。
    ///
    /// # 参数
    ///
    /// * `contents` - 配置文件内容。
    /// * `environment` - 部署环境名称，例如 `production`。
    ///
    /// # Errors
    ///
    /// YAML 无法解析，或文件中没有该环境的设置段时返回错误。
    pub fn from_yaml(contents: &str, environment: &str) -> Result<Self> {
        let mut sections: HashMap<String, Option<StorageSettings>> =
            serde_yaml::from_str(contents)?;

        match sections.remove(environment) {
            Some(section) => Ok(section.unwrap_or_default()),
            None => Err(StorageError::ConfigInvalid(format!(
                "no `{environment}` section in storage config"
            ))),
        }
    }

    /// 读取配置文件并取出指定环境的设置段。
    ///
    /// 文件不存在时返回空设置，此时所有值都需要由环境变量提供。
    pub fn load(path: &Path, environment: &str) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "存储配置文件不存在，仅使用环境变量");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(StorageError::ConfigRead {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        Self::from_yaml(&contents, environment)
    }

    /// 用环境变量覆盖文件中的值。
    ///
    /// # 参数
    ///
    /// * `lookup` - 环境变量查询函数，通常是 `|key| std::env::var(key).ok()`。
    ///
    /// # Errors
    ///
    /// 布尔值或整数格式不正确时返回 `ConfigInvalid`。
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, slot: &mut Option<String>| {
            if let Some(value) = lookup(key) {
                *slot = Some(value);
            }
        };
        text("S3_ACCESS_KEY_ID", &mut self.access_key_id);
        text("S3_SECRET_ACCESS_KEY", &mut self.secret_access_key);
        text("S3_BUCKET", &mut self.bucket);
        text("S3_FOLDER", &mut self.folder);
        text("S3_ENDPOINT", &mut self.endpoint);
        text("S3_REGION", &mut self.region);
        text("S3_THUMB_FOLDER", &mut self.thumb_folder);

        if let Some(value) = lookup("S3_PRIVATE") {
            self.private = Some(parse_flag("S3_PRIVATE", &value)?);
        }
        if let Some(value) = lookup("S3_FORCE_PATH_STYLE") {
            self.force_path_style = Some(parse_flag("S3_FORCE_PATH_STYLE", &value)?);
        }
        if let Some(value) = lookup("S3_PROXY") {
            self.proxy = Some(parse_flag("S3_PROXY", &value)?);
        }
        if let Some(value) = lookup("S3_EXPIRES_IN") {
            let seconds = value.trim().parse::<u64>().map_err(|_| {
                StorageError::ConfigInvalid(format!("S3_EXPIRES_IN is not a number: {value}"))
            })?;
            self.expires_in = Some(seconds);
        }

        Ok(self)
    }

    /// 校验并解析为最终的 [`StorageConfig`]。
    ///
    /// # Errors
    ///
    /// * 缺少存储桶，或凭据只提供了一半时返回 `ConfigMissing`。
    /// * `expires_in` 超出 1..=604800 秒时返回 `ConfigInvalid`。
    pub fn resolve(self) -> Result<StorageConfig> {
        let bucket = present(self.bucket).ok_or(StorageError::ConfigMissing("bucket"))?;

        let credentials = match (
            present(self.access_key_id),
            present(self.secret_access_key),
        ) {
            (Some(access_key_id), Some(secret_access_key)) => Some(StaticCredentials {
                access_key_id,
                secret_access_key,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(StorageError::ConfigMissing("secret_access_key")),
            (None, Some(_)) => return Err(StorageError::ConfigMissing("access_key_id")),
        };

        let expires_in = match self.expires_in {
            None => None,
            Some(seconds) if (1..=MAX_PRESIGN_EXPIRES_SECS).contains(&seconds) => {
                Some(Duration::from_secs(seconds))
            }
            Some(seconds) => {
                return Err(StorageError::ConfigInvalid(format!(
                    "expires_in must be between 1 and {MAX_PRESIGN_EXPIRES_SECS} seconds, got {seconds}"
                )));
            }
        };

        let mut config = StorageConfig::new(bucket)
            .with_folder(self.folder.as_deref().unwrap_or_default())
            .with_private(self.private.unwrap_or(false))
            .with_force_path_style(self.force_path_style.unwrap_or(false))
            .with_proxy(self.proxy.unwrap_or(false));
        config.credentials = credentials;
        config.expires_in = expires_in;
        if let Some(region) = present(self.region) {
            config = config.with_region(region);
        }
        if let Some(endpoint) = present(self.endpoint) {
            config = config.with_endpoint(endpoint);
        }
        if let Some(thumb_folder) = self.thumb_folder {
            config = config.with_thumb_folder(&thumb_folder);
        }

        Ok(config)
    }
}

/// 空白字符串视为未设置
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub(crate) fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(StorageError::ConfigInvalid(format!(
            "{key} is not a boolean: {value}"
        ))),
    }
}

/// 规范化目录前缀：非空时保证以恰好一个 `/` 结尾，空白时为空字符串。
///
/// # 示例
///
/// ```
/// use attachment_store::config::normalize_folder;
///
/// assert_eq!(normalize_folder("uploads"), "uploads/");
/// assert_eq!(normalize_folder("uploads/"), "uploads/");
/// assert_eq!(normalize_folder("uploads//"), "uploads/");
/// assert_eq!(normalize_folder(""), "");
/// ```
pub fn normalize_folder(value: &str) -> String {
    let stem = value
        .trim()
        .trim_end_matches(|c: char| c == '/' || c.is_whitespace());
    if stem.is_empty() {
        return String::new();
    }
    format!("{stem}/")
}

/// 静态访问凭据。
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .finish()
    }
}

/// 解析完成的存储配置，加载后只读。
#[derive(Debug, Clone)]
pub struct StorageConfig {
    credentials: Option<StaticCredentials>,
    bucket: String,
    folder: String,
    endpoint: Option<String>,
    region: String,
    private: bool,
    expires_in: Option<Duration>,
    force_path_style: bool,
    thumb_folder: String,
    proxy: bool,
}

impl StorageConfig {
    /// 以默认值创建配置：空目录前缀、公开可读、默认区域、`tmp/` 缩略图目录。
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            credentials: None,
            bucket: bucket.into(),
            folder: String::new(),
            endpoint: None,
            region: DEFAULT_REGION.to_string(),
            private: false,
            expires_in: None,
            force_path_style: false,
            thumb_folder: DEFAULT_THUMB_FOLDER.to_string(),
            proxy: false,
        }
    }

    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.credentials = Some(StaticCredentials {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        });
        self
    }

    pub fn with_folder(mut self, folder: &str) -> Self {
        self.folder = normalize_folder(folder);
        self
    }

    /// 设置缩略图目录，空白时回落到 `tmp/`。
    pub fn with_thumb_folder(mut self, thumb_folder: &str) -> Self {
        let folder = normalize_folder(thumb_folder);
        self.thumb_folder = if folder.is_empty() {
            DEFAULT_THUMB_FOLDER.to_string()
        } else {
            folder
        };
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        self.endpoint = Some(endpoint.trim_end_matches('/').to_string());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in);
        self
    }

    pub fn with_force_path_style(mut self, force_path_style: bool) -> Self {
        self.force_path_style = force_path_style;
        self
    }

    pub fn with_proxy(mut self, proxy: bool) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn credentials(&self) -> Option<&StaticCredentials> {
        self.credentials.as_ref()
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// 默认目录前缀，以 `/` 结尾或为空
    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    /// 配置中的预签名有效期，未设置时为 `None`
    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_in
    }

    /// 实际使用的预签名有效期
    pub fn presign_expires(&self) -> Duration {
        self.expires_in.unwrap_or(DEFAULT_PRESIGN_EXPIRES)
    }

    pub fn force_path_style(&self) -> bool {
        self.force_path_style
    }

    pub fn thumb_folder(&self) -> &str {
        &self.thumb_folder
    }

    pub fn proxy(&self) -> bool {
        self.proxy
    }
}
