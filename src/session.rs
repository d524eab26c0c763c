//! Logged-in user state, shared between the dashboard and the CLI
//! subcommands through a small JSON file.

use crate::api::types::{AuthResponse, LoginRequest, RegisterRequest, User};
use crate::api::{ApiError, BetApi};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid auth token: {0}")]
    InvalidToken(String),
    #[error("session file: {0}")]
    Io(#[from] io::Error),
    #[error("session file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// The `sub` claim of a JWT. The signature is not checked; the backend
/// does that on every request.
pub fn token_subject(token: &str) -> Result<String, SessionError> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| SessionError::InvalidToken("missing payload segment".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| SessionError::InvalidToken(format!("payload is not base64url: {}", e)))?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| SessionError::InvalidToken(format!("payload is not JSON: {}", e)))?;
    match claims.get("sub") {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        _ => Err(SessionError::InvalidToken("missing sub claim".to_string())),
    }
}

/// Owns the current session. Created at startup with `restore`, filled by
/// `login`/`register`, and torn down by `logout`.
#[derive(Debug)]
pub struct SessionContext {
    path: Option<PathBuf>,
    current: Option<Session>,
}

impl SessionContext {
    /// A context that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            current: None,
        }
    }

    /// Load the saved session, if any. A corrupt file is treated as logged
    /// out.
    pub fn restore(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let current = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Session>(&contents) {
                Ok(session) => {
                    tracing::info!(user = %session.user.email, "restored session");
                    Some(session)
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable session file");
                    None
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: Some(path),
            current,
        })
    }

    pub fn user(&self) -> Option<&User> {
        self.current.as_ref().map(|s| &s.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub fn require(&self) -> Result<&Session, ApiError> {
        self.current.as_ref().ok_or(ApiError::NotAuthenticated)
    }

    /// Store the session carried by an auth response.
    pub fn establish(&mut self, resp: AuthResponse) -> Result<&Session, SessionError> {
        let id = token_subject(&resp.auth_token)?;
        let session = Session {
            token: resp.auth_token,
            user: User {
                id,
                full_name: resp.full_name,
                email: resp.email,
                default_stake: resp.default_stake,
                balance: resp.balance,
            },
        };
        self.save(&session)?;
        tracing::info!(user = %session.user.email, "session established");
        Ok(self.current.insert(session))
    }

    pub async fn login(&mut self, api: &BetApi, email: &str, password: &str) -> Result<&Session, ApiError> {
        let resp = api
            .login(&LoginRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
            })
            .await?;
        Ok(self.establish(resp)?)
    }

    pub async fn register(&mut self, api: &BetApi, body: &RegisterRequest) -> Result<&Session, ApiError> {
        let resp = api.register(body).await?;
        Ok(self.establish(resp)?)
    }

    /// Clear memory and disk. Logging out twice is fine.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        if let Some(session) = self.current.take() {
            tracing::info!(user = %session.user.email, "logged out");
        }
        if let Some(path) = &self.path {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Apply a local edit to the stored user (after a profile update).
    pub fn update_user(&mut self, edit: impl FnOnce(&mut User)) -> Result<(), SessionError> {
        let Some(mut session) = self.current.take() else {
            return Ok(());
        };
        edit(&mut session.user);
        let saved = self.save(&session);
        self.current = Some(session);
        saved
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(path) = &self.path {
            let json = serde_json::to_string_pretty(session)?;
            std::fs::write(path, json)?;
            restrict_to_owner(path)?;
        }
        Ok(())
    }
}

/// The file holds the bearer token.
#[cfg(unix)]
fn restrict_to_owner(path: &std::path::Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &std::path::Path) -> io::Result<()> {
    Ok(())
}
