use crate::utils::error::{MarketError, Result};
use url::Url;

pub const MIN_PASSWORD_LENGTH: usize = 6;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(MarketError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Storage bucket 名稱：小寫英數、`-`、`_`，長度 3..=63
pub fn validate_bucket_name(field_name: &str, bucket: &str) -> Result<()> {
    let valid_chars = bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');

    if bucket.len() < 3 || bucket.len() > 63 || !valid_chars {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket.to_string(),
            reason: "Bucket names use 3-63 lowercase letters, digits, '-' or '_'".to_string(),
        });
    }
    Ok(())
}

/// 只做基本格式檢查，真正的驗證交給後端
pub fn validate_email(email: &str) -> Result<()> {
    let trimmed = email.trim();
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !trimmed.contains(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(MarketError::validation(format!(
            "'{}' is not a valid email address",
            email
        )));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(MarketError::validation(format!(
            "Password must have at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("backend.url", "https://example.supabase.co").is_ok());
        assert!(validate_url("backend.url", "http://localhost:54321").is_ok());
        assert!(validate_url("backend.url", "").is_err());
        assert!(validate_url("backend.url", "invalid-url").is_err());
        assert!(validate_url("backend.url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("storage.max_images", 5, 1).is_ok());
        assert!(validate_positive_number("storage.max_images", 0, 1).is_err());
    }

    #[test]
    fn test_validate_bucket_name() {
        assert!(validate_bucket_name("storage.bucket", "items").is_ok());
        assert!(validate_bucket_name("storage.bucket", "user_media-01").is_ok());
        assert!(validate_bucket_name("storage.bucket", "It").is_err());
        assert!(validate_bucket_name("storage.bucket", "Items").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("ana@example").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana example@x.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("123456").is_ok());
        assert!(validate_password("12345").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("backend.timeout_seconds", 30, 1, 300).is_ok());
        assert!(validate_range("backend.timeout_seconds", 0, 1, 300).is_err());
    }
}
