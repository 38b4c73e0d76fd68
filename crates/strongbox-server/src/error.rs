//! Server error types.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::config::ConfigError;
use crate::source::LoadError;

/// Body of the 500 response for a malformed secrets document.
pub const MALFORMED_MESSAGE: &str = "malformed secrets file";

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("secret not found")]
    SecretNotFound,

    #[error("malformed secrets file")]
    MalformedTree,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load secrets: {0}")]
    Load(#[from] LoadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::SecretNotFound => "secret_not_found",
            Self::MalformedTree => "malformed_tree",
            Self::Config(_) => "config_error",
            Self::Load(_) => "load_error",
            Self::Io(_) => "io_error",
            Self::Internal(_) => "internal_error",
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::SecretNotFound => StatusCode::NOT_FOUND,
            Self::MalformedTree
            | Self::Config(_)
            | Self::Load(_)
            | Self::Io(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            Self::Unauthorized => "unauthorized",
            Self::SecretNotFound => "secret not found",
            Self::MalformedTree => MALFORMED_MESSAGE,

            // Hide internal details
            Self::Config(_) | Self::Load(_) | Self::Io(_) | Self::Internal(_) => {
                "internal server error"
            }
        };

        if matches!(self, Self::Unauthorized) {
            return (
                status,
                [(header::WWW_AUTHENTICATE, "Bearer realm=\"strongbox\"")],
                message,
            )
                .into_response();
        }

        (status, message).into_response()
    }
}
