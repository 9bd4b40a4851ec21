use crate::core::media::{
    DEFAULT_MAX_FILE_SIZE_BYTES, DEFAULT_MAX_IMAGES, DEFAULT_SIGNED_URL_TTL_SECONDS,
};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::{
    validate_bucket_name, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "troca.toml";
pub const ENV_BACKEND_URL: &str = "TROCA_BACKEND_URL";
pub const ENV_ANON_KEY: &str = "TROCA_ANON_KEY";
pub const ENV_BUCKET: &str = "TROCA_BUCKET";
pub const ENV_SESSION_DIR: &str = "TROCA_SESSION_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub session: SessionConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_max_file_size_bytes")]
    pub max_file_size_bytes: u64,
    #[serde(default = "default_signed_url_ttl_seconds")]
    pub signed_url_ttl_seconds: u64,
    #[serde(default = "default_max_images")]
    pub max_images: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            max_file_size_bytes: default_max_file_size_bytes(),
            signed_url_ttl_seconds: default_signed_url_ttl_seconds(),
            max_images: default_max_images(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_dir")]
    pub directory: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            directory: default_session_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: Option<String>,
    pub json_logs: Option<bool>,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_bucket() -> String {
    "items".to_string()
}

fn default_max_file_size_bytes() -> u64 {
    DEFAULT_MAX_FILE_SIZE_BYTES
}

fn default_signed_url_ttl_seconds() -> u64 {
    DEFAULT_SIGNED_URL_TTL_SECONDS
}

fn default_max_images() -> usize {
    DEFAULT_MAX_IMAGES
}

fn default_session_dir() -> String {
    ".troca".to_string()
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MarketError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MarketError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 沒有設定檔時改用環境變數
    pub fn from_env() -> Result<Self> {
        let url = std::env::var(ENV_BACKEND_URL).map_err(|_| MarketError::MissingConfigError {
            field: ENV_BACKEND_URL.to_string(),
        })?;
        let anon_key = std::env::var(ENV_ANON_KEY).map_err(|_| MarketError::MissingConfigError {
            field: ENV_ANON_KEY.to_string(),
        })?;

        let mut storage = StorageConfig::default();
        if let Ok(bucket) = std::env::var(ENV_BUCKET) {
            storage.bucket = bucket;
        }

        let mut session = SessionConfig::default();
        if let Ok(directory) = std::env::var(ENV_SESSION_DIR) {
            session.directory = directory;
        }

        Ok(Self {
            backend: BackendConfig {
                url,
                anon_key,
                timeout_seconds: default_timeout_seconds(),
            },
            storage,
            session,
            monitoring: None,
        })
    }

    /// The file when it exists, the environment otherwise.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            Self::from_file(path)
        } else {
            tracing::debug!("{} not found, reading config from environment", path.display());
            Self::from_env()
        }
    }

    /// 替換環境變數 (例如 ${SUPABASE_ANON_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MarketError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("backend.url", &self.backend.url)?;
        validate_non_empty_string("backend.anon_key", &self.backend.anon_key)?;
        if self.backend.anon_key.starts_with("${") {
            return Err(MarketError::InvalidConfigValueError {
                field: "backend.anon_key".to_string(),
                value: self.backend.anon_key.clone(),
                reason: "Environment variable is not set".to_string(),
            });
        }
        validate_range("backend.timeout_seconds", self.backend.timeout_seconds, 1, 300)?;

        validate_bucket_name("storage.bucket", &self.storage.bucket)?;
        validate_positive_number("storage.max_file_size_bytes", self.storage.max_file_size_bytes, 1)?;
        validate_positive_number(
            "storage.signed_url_ttl_seconds",
            self.storage.signed_url_ttl_seconds,
            1,
        )?;
        validate_positive_number("storage.max_images", self.storage.max_images as u64, 1)?;

        validate_path("session.directory", &self.session.directory)?;
        Ok(())
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }
}

impl ConfigProvider for AppConfig {
    fn backend_url(&self) -> &str {
        &self.backend.url
    }

    fn anon_key(&self) -> &str {
        &self.backend.anon_key
    }

    fn request_timeout_seconds(&self) -> u64 {
        self.backend.timeout_seconds
    }

    fn bucket(&self) -> &str {
        &self.storage.bucket
    }

    fn max_file_size_bytes(&self) -> u64 {
        self.storage.max_file_size_bytes
    }

    fn signed_url_ttl_seconds(&self) -> u64 {
        self.storage.signed_url_ttl_seconds
    }

    fn max_images(&self) -> usize {
        self.storage.max_images
    }

    fn session_dir(&self) -> &str {
        &self.session.directory
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
