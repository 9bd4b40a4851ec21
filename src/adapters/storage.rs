use crate::adapters::http::{check_status, BackendClient};
use crate::domain::ports::ObjectStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: String,
}

#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    backend: BackendClient,
    bucket: String,
    access_token: Option<String>,
}

impl SupabaseStorage {
    pub fn new(backend: BackendClient, bucket: &str) -> Self {
        Self {
            backend,
            bucket: bucket.to_string(),
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, access_token: &str) -> Self {
        self.access_token = Some(access_token.to_string());
        self
    }

    /// 後端回傳的是相對於 `/storage/v1` 的路徑
    fn absolute_url(&self, signed: &str) -> String {
        if signed.starts_with("http://") || signed.starts_with("https://") {
            signed.to_string()
        } else {
            self.backend.endpoint(&format!("/storage/v1{}", signed))
        }
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn put_object(&self, path: &str, content_type: &str, data: Vec<u8>) -> Result<()> {
        let route = format!("/storage/v1/object/{}/{}", self.bucket, path);
        let response = self
            .backend
            .request(Method::POST, &route, self.access_token.as_deref())
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn create_signed_url(&self, path: &str, expires_in_seconds: u64) -> Result<String> {
        let route = format!("/storage/v1/object/sign/{}/{}", self.bucket, path);
        let response = self
            .backend
            .request(Method::POST, &route, self.access_token.as_deref())
            .json(&json!({ "expiresIn": expires_in_seconds }))
            .send()
            .await?;
        let signed: SignedUrlResponse = check_status(response).await?.json().await?;
        Ok(self.absolute_url(&signed.signed_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_relative_signed_url_is_made_absolute() {
        let backend =
            BackendClient::new("https://x.supabase.co", "anon", Duration::from_secs(5)).unwrap();
        let storage = SupabaseStorage::new(backend, "items");

        assert_eq!(
            storage.absolute_url("/object/sign/items/a.png?token=t"),
            "https://x.supabase.co/storage/v1/object/sign/items/a.png?token=t"
        );
        assert_eq!(
            storage.absolute_url("https://cdn.example/a.png"),
            "https://cdn.example/a.png"
        );
    }
}
