use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Invalid price input: {input}")]
    InvalidPrice { input: String },

    #[error("Unsupported media type '{content_type}' for {file_name}")]
    UnsupportedMediaType {
        file_name: String,
        content_type: String,
    },

    #[error("File {file_name} is {size} bytes, limit is {max} bytes")]
    FileTooLarge {
        file_name: String,
        size: u64,
        max: u64,
    },

    #[error("File {file_name} is empty")]
    EmptyFile { file_name: String },

    #[error("At most {max} images are allowed, got {requested}")]
    TooManyImages { max: usize, requested: usize },

    #[error("Backend returned {status}: {message}")]
    BackendError { status: u16, message: String },

    #[error("Authentication failed: {message}")]
    AuthError { message: String },

    #[error("No signed-in user")]
    NotSignedIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Configuration,
    Collaborator,
    Unexpected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MarketError {
    pub fn validation(message: impl Into<String>) -> Self {
        MarketError::ValidationError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            MarketError::ValidationError { .. }
            | MarketError::InvalidPrice { .. }
            | MarketError::UnsupportedMediaType { .. }
            | MarketError::FileTooLarge { .. }
            | MarketError::EmptyFile { .. }
            | MarketError::TooManyImages { .. } => ErrorCategory::Validation,
            MarketError::ConfigError { .. }
            | MarketError::ConfigValidationError { .. }
            | MarketError::InvalidConfigValueError { .. }
            | MarketError::MissingConfigError { .. } => ErrorCategory::Configuration,
            MarketError::BackendError { .. }
            | MarketError::AuthError { .. }
            | MarketError::NotSignedIn => ErrorCategory::Collaborator,
            MarketError::ApiError(_)
            | MarketError::CsvError(_)
            | MarketError::IoError(_)
            | MarketError::SerializationError(_) => ErrorCategory::Unexpected,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation => ErrorSeverity::Low,
            ErrorCategory::Collaborator => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Unexpected => ErrorSeverity::Critical,
        }
    }

    /// 給使用者看的訊息；非預期錯誤一律收斂成通用訊息
    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Validation | ErrorCategory::Configuration => self.to_string(),
            ErrorCategory::Collaborator => match self {
                MarketError::BackendError { message, .. } => message.clone(),
                MarketError::AuthError { message } => message.clone(),
                other => other.to_string(),
            },
            ErrorCategory::Unexpected => {
                "Something went wrong while talking to the marketplace. Please try again."
                    .to_string()
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MarketError::NotSignedIn => "Run `troca login` first",
            MarketError::AuthError { .. } => "Check your email and password",
            MarketError::FileTooLarge { .. } => "Pick an image smaller than 5 MB",
            MarketError::UnsupportedMediaType { .. } => "Only image files (PNG, JPG, GIF) are accepted",
            MarketError::TooManyImages { .. } => "Remove some images before adding new ones",
            MarketError::MissingConfigError { .. }
            | MarketError::ConfigError { .. }
            | MarketError::ConfigValidationError { .. }
            | MarketError::InvalidConfigValueError { .. } => {
                "Check troca.toml or the TROCA_BACKEND_URL / TROCA_ANON_KEY variables"
            }
            MarketError::BackendError { .. } | MarketError::ApiError(_) => {
                "Repeat the action; if it keeps failing the backend may be unavailable"
            }
            _ => "Fix the input and try again",
        }
    }

    /// 程序結束碼：任何錯誤都代表操作被中止，一律非 0
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 2, // 輸入被拒絕
            ErrorSeverity::Medium => 4, // 後端或登入問題
            ErrorSeverity::High => 1, // 配置錯誤
            ErrorSeverity::Critical => 3, // 系統錯誤
        }
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;
