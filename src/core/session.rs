use crate::domain::model::Session;
use crate::domain::ports::{AuthProvider, SignUpOutcome, Storage};
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::{validate_email, validate_password};
use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Published {
    /// 尚未從儲存載入
    Pending,
    Ready(Option<Session>),
}

/// Receives each distinct session state, starting with the current one once known.
pub struct SessionEvents {
    rx: watch::Receiver<Published>,
    delivered_initial: bool,
}

impl SessionEvents {
    /// `None` once the gateway is gone.
    pub async fn next(&mut self) -> Option<Option<Session>> {
        if !self.delivered_initial {
            self.delivered_initial = true;
            if let Published::Ready(session) = self.rx.borrow_and_update().clone() {
                return Some(session);
            }
        }

        loop {
            self.rx.changed().await.ok()?;
            if let Published::Ready(session) = self.rx.borrow_and_update().clone() {
                return Some(session);
            }
        }
    }
}

/// Handle returned by [`SessionGateway::on_session_change`]; delivery stops when dropped.
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// 登入狀態的單一入口：建立於啟動時，明確傳遞，關閉時丟棄
pub struct SessionGateway<A: AuthProvider, S: Storage> {
    auth: A,
    storage: S,
    state: watch::Sender<Published>,
}

impl<A: AuthProvider, S: Storage> SessionGateway<A, S> {
    pub fn new(auth: A, storage: S) -> Self {
        let (state, _) = watch::channel(Published::Pending);
        Self {
            auth,
            storage,
            state,
        }
    }

    /// Loads the persisted session and publishes it as the first event.
    pub async fn restore(&self) -> Result<Option<Session>> {
        let session = match self.storage.read_file(SESSION_FILE).await {
            Ok(bytes) => match serde_json::from_slice::<Session>(&bytes) {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::warn!("⚠️ Ignoring unreadable session file: {}", e);
                    None
                }
            },
            Err(MarketError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };

        tracing::debug!(signed_in = session.is_some(), "session restored");
        self.publish(session.clone());
        Ok(session)
    }

    pub fn current_session(&self) -> Option<Session> {
        match &*self.state.borrow() {
            Published::Ready(Some(session)) => Some(session.clone()),
            _ => None,
        }
    }

    /// Current session, refreshed first when it has expired.
    pub async fn get_session(&self) -> Result<Option<Session>> {
        let Some(session) = self.current_session() else {
            return Ok(None);
        };

        if !session.is_expired_at(Utc::now()) {
            return Ok(Some(session));
        }

        let Some(refresh_token) = session.refresh_token.as_deref() else {
            tracing::info!("Session expired without refresh token, signing out locally");
            self.clear().await?;
            return Ok(None);
        };

        match self.auth.refresh_session(refresh_token).await {
            Ok(refreshed) => {
                tracing::debug!("session refreshed");
                self.store(refreshed.clone()).await?;
                Ok(Some(refreshed))
            }
            Err(e) => {
                tracing::warn!("⚠️ Session refresh failed: {}", e);
                self.clear().await?;
                Ok(None)
            }
        }
    }

    pub async fn require_session(&self) -> Result<Session> {
        self.get_session().await?.ok_or(MarketError::NotSignedIn)
    }

    pub fn events(&self) -> SessionEvents {
        SessionEvents {
            rx: self.state.subscribe(),
            delivered_initial: false,
        }
    }

    /// Runs `callback` on a background task for every distinct session state.
    pub fn on_session_change<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(Option<Session>) + Send + 'static,
    {
        let mut events = self.events();
        let handle = tokio::spawn(async move {
            while let Some(session) = events.next().await {
                callback(session);
            }
        });
        Subscription { handle }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        validate_email(email)?;
        validate_password(password)?;

        let session = self.auth.sign_in_with_password(email.trim(), password).await?;
        tracing::info!("✅ Signed in as {}", session.user.id);
        self.store(session.clone()).await?;
        Ok(session)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        validate_email(email)?;
        validate_password(password)?;

        let outcome = self.auth.sign_up(email.trim(), password).await?;
        if let SignUpOutcome::SignedIn(session) = &outcome {
            self.store(session.clone()).await?;
        }
        Ok(outcome)
    }

    /// Local session is cleared even when the remote call fails.
    pub async fn sign_out(&self) -> Result<()> {
        let Some(session) = self.current_session() else {
            return Ok(());
        };

        let remote = self.auth.sign_out(&session.access_token).await;
        self.clear().await?;

        if let Err(e) = &remote {
            tracing::warn!("⚠️ Remote sign-out failed: {}", e);
        }
        remote
    }

    pub async fn reset_password(&self, email: &str) -> Result<()> {
        validate_email(email)?;
        self.auth.reset_password_for_email(email.trim()).await
    }

    pub async fn update_password(&self, password: &str) -> Result<()> {
        validate_password(password)?;
        let session = self.require_session().await?;
        self.auth
            .update_password(&session.access_token, password)
            .await
    }

    async fn store(&self, session: Session) -> Result<()> {
        let data = serde_json::to_vec_pretty(&session)?;
        self.storage.write_file(SESSION_FILE, &data).await?;
        self.publish(Some(session));
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.storage.remove_file(SESSION_FILE).await?;
        self.publish(None);
        Ok(())
    }

    fn publish(&self, session: Option<Session>) {
        self.state.send_if_modified(|current| {
            let next = Published::Ready(session);
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}
