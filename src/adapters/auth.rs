use crate::adapters::http::{check_status, BackendClient};
use crate::domain::model::{Session, User};
use crate::domain::ports::{AuthProvider, SignUpOutcome};
use crate::utils::error::{MarketError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone, Deserialize)]
pub struct UserRow {
    pub id: String,
    pub email: Option<String>,
}

/// Token endpoint payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
    pub expires_at: Option<i64>,
    pub refresh_token: Option<String>,
    pub user: UserRow,
}

impl SessionResponse {
    pub fn into_session(self, now: DateTime<Utc>) -> Result<Session> {
        if self.access_token.is_empty() || self.user.id.is_empty() {
            return Err(MarketError::AuthError {
                message: "Auth provider returned an incomplete session".to_string(),
            });
        }

        let expires_at = match (self.expires_at, self.expires_in) {
            (Some(at), _) => Utc.timestamp_opt(at, 0).single(),
            (None, Some(secs)) => Some(now + Duration::seconds(secs)),
            (None, None) => None,
        };

        Ok(Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
            expires_at,
            user: User {
                id: self.user.id,
                email: self.user.email,
            },
        })
    }
}

/// 4xx 回應代表帳密或請求本身有問題
fn into_auth_error(err: MarketError) -> MarketError {
    match err {
        MarketError::BackendError { status, message } if (400..500).contains(&status) => {
            MarketError::AuthError { message }
        }
        other => other,
    }
}

#[derive(Debug, Clone)]
pub struct SupabaseAuth {
    backend: BackendClient,
}

impl SupabaseAuth {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    async fn post_json(
        &self,
        path: &str,
        access_token: Option<&str>,
        body: serde_json::Value,
    ) -> Result<reqwest::Response> {
        let response = self
            .backend
            .request(Method::POST, path, access_token)
            .json(&body)
            .send()
            .await?;
        check_status(response).await.map_err(into_auth_error)
    }

    async fn token(&self, grant_type: &str, body: serde_json::Value) -> Result<Session> {
        let path = format!("/auth/v1/token?grant_type={}", grant_type);
        let response = self.post_json(&path, None, body).await?;
        let payload: SessionResponse = response.json().await?;
        payload.into_session(Utc::now())
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        self.token("password", json!({ "email": email, "password": password }))
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let response = self
            .post_json(
                "/auth/v1/signup",
                None,
                json!({ "email": email, "password": password }),
            )
            .await?;
        let payload: serde_json::Value = response.json().await?;

        // 啟用 email 確認時只回傳 user，沒有 access_token
        if payload.get("access_token").is_some() {
            let session: SessionResponse = serde_json::from_value(payload)?;
            Ok(SignUpOutcome::SignedIn(session.into_session(Utc::now())?))
        } else {
            Ok(SignUpOutcome::ConfirmationRequired {
                email: email.to_string(),
            })
        }
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        self.token("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        self.post_json("/auth/v1/logout", Some(access_token), json!({}))
            .await?;
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str) -> Result<()> {
        self.post_json("/auth/v1/recover", None, json!({ "email": email }))
            .await?;
        Ok(())
    }

    async fn update_password(&self, access_token: &str, password: &str) -> Result<()> {
        let response = self
            .backend
            .request(Method::PUT, "/auth/v1/user", Some(access_token))
            .json(&json!({ "password": password }))
            .send()
            .await?;
        check_status(response).await.map_err(into_auth_error)?;
        Ok(())
    }
}
