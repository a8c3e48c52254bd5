use reqwest::StatusCode;
use thiserror::Error;

use cartas_types::api::ErrorBody;

/// Every failure of a call to the correspondence API.
///
/// The `Display` text is what the dashboard shows the user: the API's own
/// message for error responses, the raw transport message otherwise.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The API answered 4xx/5xx.
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// The API answered 401; the session token is missing, expired or revoked.
    #[error("{0}")]
    Unauthorized(String),

    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("{0}")]
    Transport(String),

    /// A successful response whose body did not match the expected shape.
    #[error("Respuesta inesperada del servidor: {0}")]
    Decode(String),

    #[error("Configuración inválida: {0}")]
    Config(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(401),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Build the error for a non-success response from its status and body.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = extract_message(status, body);
        if status == StatusCode::UNAUTHORIZED {
            Self::Unauthorized(message)
        } else {
            Self::Backend {
                status: status.as_u16(),
                message,
            }
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// The API's `message` (joined when it is a list), then its `error` field,
/// then the canonical reason for the status.
pub fn extract_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| {
            body.message
                .map(|m| m.joined())
                .filter(|m| !m.trim().is_empty())
                .or(body.error)
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Error desconocido")
                .to_string()
        })
}
