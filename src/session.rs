use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
    response::Redirect,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::AppState;

pub const SESSION_COOKIE: &str = "moodtune_session";

/// Server-side sessions: opaque token -> username.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, username: &str) -> String {
        let token = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        sessions.insert(token.clone(), username.to_string());
        token
    }

    pub async fn username(&self, token: &str) -> Option<String> {
        let sessions = self.sessions.read().await;
        sessions.get(token).cloned()
    }

    pub async fn remove(&self, token: &str) -> Option<String> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(token)
    }
}

pub fn session_cookie(token: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token)
}

pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Finds our session token among the request's `Cookie` headers.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
        .filter(|token| !token.is_empty())
}

/// The authenticated user for this request. Handlers that take it are behind
/// the login gate: without a live session the request is sent to `/login`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub username: String,
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or_else(|| Redirect::to("/login"))?;
        let username = state
            .sessions
            .username(&token)
            .await
            .ok_or_else(|| Redirect::to("/login"))?;

        // The account may have vanished from the users file since login.
        if state.storage.get(&username).await.is_none() {
            state.sessions.remove(&token).await;
            return Err(Redirect::to("/login"));
        }

        Ok(CurrentUser { username })
    }
}
