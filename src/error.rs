use std::{io, path::PathBuf};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

/// Startup failures. Any of these aborts the process before the listener opens.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid port '{0}', must be between 1 and 65535")]
    InvalidPort(String),

    #[error("nothing to share: provide a file, a directory, a content file or a message")]
    NothingToShare,

    #[error("path does not exist: '{}'", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied while accessing '{}'", .0.display())]
    PermissionDenied(PathBuf),

    #[error("error accessing '{}': {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("'{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("'{}' is a directory, a file path is required", .0.display())]
    IsADirectory(PathBuf),

    #[error("cannot determine the current working directory: {0}")]
    CurrentDir(io::Error),
}

impl ConfigError {
    /// Classifies an I/O failure on `path`, keeping not-found and permission
    /// problems apart from everything else.
    pub fn from_io(path: PathBuf, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source },
        }
    }
}

/// Per-request failures on the JSON API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            debug!(error = %self, "request rejected");
        }

        let message = match &self {
            Self::BadRequest(msg) | Self::NotFound(msg) | Self::Internal(msg) => msg.clone(),
        };
        let body = ErrorBody {
            error: message,
            code: self.error_code(),
        };

        (status, Json(body)).into_response()
    }
}
