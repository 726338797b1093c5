use crate::backend::Backend;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::identity::{IdentityProvider, bearer_token};
use crate::remote::RemoteStore;
use crate::session::SessionHandle;
use axum::http::HeaderMap;
use chrono::{DateTime, NaiveDate, Utc};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<IdentityProvider>,
    pub remote: Arc<dyn RemoteStore>,
    pub anonymous: SessionHandle,
    sessions: Arc<Mutex<HashMap<String, SessionHandle>>>,
    default_start: NaiveDate,
}

impl AppState {
    pub fn new(config: &AppConfig, remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            identity: Arc::new(IdentityProvider::new()),
            remote,
            anonymous: SessionHandle::new(Backend::local(
                config.data_path.clone(),
                config.default_start,
            )),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            default_start: config.default_start,
        }
    }

    /// Picks the session a request acts on: the token's own session when a
    /// bearer token is sent, the anonymous local one otherwise.
    pub async fn session_for(&self, headers: &HeaderMap) -> Result<SessionHandle, AppError> {
        self.session_for_at(headers, Utc::now()).await
    }

    async fn session_for_at(
        &self,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<SessionHandle, AppError> {
        let Some(token) = bearer_token(headers) else {
            return Ok(self.anonymous.clone());
        };
        let Some(user) = self.identity.resolve_at(token, now).await else {
            if self.sessions.lock().await.remove(token).is_some() {
                debug!("dropped session of an expired token");
            }
            return Err(AppError::unauthorized("unknown or expired token"));
        };

        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(token.to_string()).or_insert_with(|| {
            SessionHandle::new(Backend::remote(
                user,
                Arc::clone(&self.remote),
                self.default_start,
            ))
        });
        Ok(session.clone())
    }

    /// Revokes the token and drops its session. In-flight operations keep
    /// their own handle and finish on their own.
    pub async fn end_session(&self, token: &str) -> Result<(), AppError> {
        self.sessions.lock().await.remove(token);
        self.identity
            .sign_out(token)
            .await
            .map(|_| ())
            .ok_or_else(|| AppError::unauthorized("unknown or expired token"))
    }
}
