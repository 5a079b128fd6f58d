//! 服务配置模块。
//!
//! 该模块负责从环境变量加载服务设置，并按部署环境读取存储配置文件。

mod storage;

pub use storage::{
    DEFAULT_PRESIGN_EXPIRES, DEFAULT_REGION, DEFAULT_THUMB_FOLDER, MAX_PRESIGN_EXPIRES_SECS,
    StaticCredentials, StorageConfig, StorageSettings, normalize_folder,
};

use storage::parse_flag;

use crate::error::Result;
use std::env;
use std::path::PathBuf;

/// 默认监听地址
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// 默认部署环境
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// 默认存储配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config/s3.yml";

/// 服务进程设置。
///
/// # 环境变量
///
/// * `BIND_ADDR` - 监听地址（默认：0.0.0.0:3000）
/// * `APP_ENV` - 部署环境，决定读取配置文件中的哪一段（默认：development）
/// * `S3_CONFIG_PATH` - 存储配置文件路径（默认：config/s3.yml）
/// * `S3_ENSURE_BUCKET` - 启动时检查并创建存储桶
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub environment: String,
    pub storage_config_path: PathBuf,
    pub ensure_bucket: bool,
}

impl AppConfig {
    /// 从进程环境变量读取服务设置。
    ///
    /// # Errors
    ///
    /// `S3_ENSURE_BUCKET` 不是布尔值时返回 `ConfigInvalid`。
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 使用给定的查询函数读取服务设置。
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ensure_bucket = match lookup("S3_ENSURE_BUCKET") {
            Some(value) => parse_flag("S3_ENSURE_BUCKET", &value)?,
            None => false,
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            environment: lookup("APP_ENV").unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            storage_config_path: lookup("S3_CONFIG_PATH")
                .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
                .into(),
            ensure_bucket,
        })
    }

    /// 加载当前环境的存储配置。
    ///
    /// 先读取配置文件中 `environment` 对应的设置段，再用 `S3_*` 环境变量覆盖。
    ///
    /// # Errors
    ///
    /// 配置文件无法读取或解析、缺少必要字段时返回错误。
    pub fn load_storage_config(&self) -> Result<StorageConfig> {
        StorageSettings::load(&self.storage_config_path, &self.environment)?
            .apply_env(|key| env::var(key).ok())?
            .resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.environment, DEFAULT_ENVIRONMENT);
        assert_eq!(config.storage_config_path, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(!config.ensure_bucket);
    }

    #[test]
    fn test_app_config_from_lookup() {
        let config = AppConfig::from_lookup(|key| match key {
            "BIND_ADDR" => Some("127.0.0.1:8080".to_string()),
            "APP_ENV" => Some("production".to_string()),
            "S3_CONFIG_PATH" => Some("/etc/attachments/s3.yml".to_string()),
            "S3_ENSURE_BUCKET" => Some("true".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.environment, "production");
        assert_eq!(
            config.storage_config_path,
            PathBuf::from("/etc/attachments/s3.yml")
        );
        assert!(config.ensure_bucket);
    }

    #[test]
    fn test_app_config_ensure_bucket_flag() {
        let lookup = |value: &'static str| {
            move |key: &str| (key == "S3_ENSURE_BUCKET").then(|| value.to_string())
        };
        assert!(AppConfig::from_lookup(lookup("on")).unwrap().ensure_bucket);
        assert!(AppConfig::from_lookup(lookup("YES")).unwrap().ensure_bucket);
        assert!(!AppConfig::from_lookup(lookup("off")).unwrap().ensure_bucket);

        let result = AppConfig::from_lookup(lookup("sure"));
        assert!(matches!(result, Err(StorageError::ConfigInvalid(_))));
    }
}
