use thiserror::Error;

use super::rest::Endpoint;
use crate::forms::ValidationError;
use crate::session::SessionError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP client setup failed: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{endpoint} request failed: {source}")]
    Http {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} failed ({status}): {body}")]
    Status {
        endpoint: Endpoint,
        status: u16,
        body: String,
        server_message: Option<String>,
    },

    #[error("{endpoint} returned an invalid response: {reason}")]
    Parse { endpoint: Endpoint, reason: String },

    #[error("Usuário não autenticado")]
    NotAuthenticated,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("WebSocket error: {0}")]
    WebSocket(String),
}

impl ApiError {
    /// Localized text for the page-level error banner.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Client(_) => "Erro ao configurar o cliente HTTP".to_string(),
            ApiError::Http { endpoint, .. } | ApiError::Parse { endpoint, .. } => {
                endpoint.failure_message().to_string()
            }
            ApiError::Status { endpoint, server_message, .. } => server_message
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(endpoint.failure_message())
                .to_string(),
            ApiError::NotAuthenticated => self.to_string(),
            ApiError::Validation(e) => e.to_string(),
            ApiError::Session(_) => "Erro ao salvar a sessão".to_string(),
            ApiError::WebSocket(_) => "Conexão de notificações perdida".to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::NotAuthenticated)
            || matches!(self, ApiError::Status { status: 401, .. })
    }
}
