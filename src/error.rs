//! Master server error types with HTTP status code mapping.
//!
//! [`MasterError`] is the central error type. Each variant maps to a numeric
//! code and an HTTP status. Bodies are plain text because game clients read
//! the master server's responses with a line tokenizer, not a JSON parser.
//!
//! Corrupt persisted lines are not represented here; they surface as
//! [`crate::domain::RecordError`] and are skipped by the reader.

use axum::http::StatusCode;
use axum::http::header;
use axum::response::{IntoResponse, Response};

/// Body returned for a request that names no known operation.
pub const INVALID_COMMAND_BODY: &str = "Invalid command\n";

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category   | HTTP Status                    |
/// |-----------|------------|--------------------------------|
/// | 1000–1999 | Request    | 400 Bad Request / 200          |
/// | 3000–3999 | Store      | 503 Service Unavailable        |
#[derive(Debug, thiserror::Error)]
pub enum MasterError {
    /// The caller-supplied port is not an integer in `1..=65535`.
    #[error("invalid port: {0:?}")]
    MalformedIdentity(String),

    /// The query string could not be decoded, e.g. a repeated key.
    #[error("malformed query: {0}")]
    MalformedQuery(String),

    /// No recognized operation selector in the request.
    #[error("invalid command")]
    UnknownOperation,

    /// The backing store could not be opened or written.
    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),

    /// Exclusive store access was not obtained within the retry budget.
    #[error("record store busy; gave up after {attempts} attempts")]
    LockTimeout {
        /// Number of acquisition attempts made.
        attempts: u32,
    },

}

impl MasterError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::MalformedIdentity(_) => 1001,
            Self::UnknownOperation => 1002,
            Self::MalformedQuery(_) => 1003,
            Self::StoreUnavailable(_) => 3001,
            Self::LockTimeout { .. } => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    ///
    /// An unknown operation is answered with `200 OK` and a diagnostic body,
    /// which is what deployed clients expect.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedIdentity(_) | Self::MalformedQuery(_) => StatusCode::BAD_REQUEST,
            Self::UnknownOperation => StatusCode::OK,
            Self::StoreUnavailable(_) | Self::LockTimeout { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }

    /// Returns `true` for failures of the record store.
    #[must_use]
    pub const fn is_store_failure(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::LockTimeout { .. })
    }
}

impl From<std::io::Error> for MasterError {
    fn from(err: std::io::Error) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

impl IntoResponse for MasterError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Self::UnknownOperation => INVALID_COMMAND_BODY.to_string(),
            other => format!("error {}: {other}\n", other.error_code()),
        };
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}
