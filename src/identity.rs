use crate::errors::AppError;
use crate::remote::UserId;
use axum::http::{HeaderMap, header::AUTHORIZATION};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// Tokens stay valid for 111 days.
pub const TOKEN_TTL_DAYS: i64 = 111;
const MAX_USER_ID_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub user: UserId,
    pub expires_at: DateTime<Utc>,
}

/// Issues opaque bearer tokens and maps them back to user ids.
pub struct IdentityProvider {
    grants: Mutex<HashMap<String, Grant>>,
    ttl: Duration,
}

impl IdentityProvider {
    pub fn new() -> Self {
        Self {
            grants: Mutex::new(HashMap::new()),
            ttl: Duration::days(TOKEN_TTL_DAYS),
        }
    }

    pub async fn sign_in(&self, user_id: &str) -> Result<(String, Grant), AppError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::bad_request("user_id must not be empty"));
        }
        if user_id.len() > MAX_USER_ID_LEN || user_id.contains('/') {
            return Err(AppError::bad_request(
                "user_id must be at most 128 characters and contain no '/'",
            ));
        }

        let token = Uuid::new_v4().to_string();
        let grant = Grant {
            user: UserId::new(user_id),
            expires_at: Utc::now() + self.ttl,
        };
        self.grants.lock().await.insert(token.clone(), grant.clone());
        info!(user = %grant.user, "signed in");
        Ok((token, grant))
    }

    pub async fn resolve(&self, token: &str) -> Option<UserId> {
        self.resolve_at(token, Utc::now()).await
    }

    pub async fn resolve_at(&self, token: &str, now: DateTime<Utc>) -> Option<UserId> {
        let mut grants = self.grants.lock().await;
        let grant = grants.get(token)?;
        if grant.expires_at > now {
            return Some(grant.user.clone());
        }
        grants.remove(token);
        None
    }

    pub async fn sign_out(&self, token: &str) -> Option<UserId> {
        let grant = self.grants.lock().await.remove(token)?;
        info!(user = %grant.user, "signed out");
        Some(grant.user)
    }
}

impl Default for IdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
