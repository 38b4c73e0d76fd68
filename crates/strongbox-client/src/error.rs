//! Client error types.

use reqwest::StatusCode;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Nothing exists at the requested path.
    #[error("secret not found")]
    SecretNotFound,

    /// Any other non-success response. The message is the response body.
    #[error("{message}")]
    Server { status: StatusCode, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode secrets: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::SecretNotFound)
    }

    /// HTTP status of a rejected request, if the server answered.
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::SecretNotFound => Some(StatusCode::NOT_FOUND),
            Self::Server { status, .. } => Some(*status),
            Self::Http(_) | Self::Decode(_) | Self::InvalidUrl(_) => None,
        }
    }
}
