//! Top-level error types for PhotoSwipe.
//!
//! Every failure in the core ends up as a [`PhotoSwipeError`]. Callers branch
//! on [`PhotoSwipeError::kind`] and render [`PhotoSwipeError::envelope`];
//! neither requires inspecting message text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// Convenience alias used throughout the crate.
pub type Result<T, E = PhotoSwipeError> = std::result::Result<T, E>;

/// Why a session cannot produce a usable credential.
///
/// Every variant means the user has to authorize again.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential is stored for the session.
    #[error("no active session")]
    NoSession,

    /// The credential expired and carries no refresh token.
    #[error("credential expired and no refresh token is available")]
    Unrefreshable,

    /// The identity provider rejected the refresh, or could not be reached.
    #[error("credential refresh failed: {message}")]
    RefreshFailed { message: String },

    /// The library API rejected a credential that looked valid locally.
    #[error("credential rejected by the library API: {message}")]
    Revoked { message: String },
}

/// Top-level error type encompassing all PhotoSwipe errors.
#[derive(Debug, Error)]
pub enum PhotoSwipeError {
    /// Malformed or missing request fields.
    #[error("{message}")]
    Validation { message: String },

    /// The session must re-authenticate.
    #[error("authentication required: {0}")]
    Auth(#[from] AuthError),

    /// The library API answered with a non-2xx status.
    #[error("library API error ({status}): {message}")]
    Upstream {
        status: u16,
        message: String,
        body: String,
    },

    /// A local resource does not exist or belongs to someone else.
    #[error("{message}")]
    NotFound { message: String },

    /// The library API could not be reached.
    #[error("network error: {message}")]
    Network { message: String },

    /// Session storage failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

/// Coarse classification of [`PhotoSwipeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Auth,
    Upstream,
    NotFound,
    Internal,
}

/// Error body returned to callers: `{ "error": ..., "httpStatus": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(rename = "error")]
    pub message: String,
    #[serde(rename = "httpStatus")]
    pub http_status: u16,
}

impl PhotoSwipeError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Upstream { .. } | Self::Network { .. } => ErrorKind::Upstream,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Store(_) | Self::Config { .. } => ErrorKind::Internal,
        }
    }

    /// HTTP status the boundary layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Auth(_) => 401,
            Self::Upstream { status, .. } => *status,
            Self::NotFound { .. } => 404,
            Self::Network { .. } => 502,
            Self::Store(_) | Self::Config { .. } => 500,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            message: self.to_string(),
            http_status: self.http_status(),
        }
    }
}
