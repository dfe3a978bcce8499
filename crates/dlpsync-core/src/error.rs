// ── Core error types ──
//
// Errors surfaced by the sync engine. Consumers never see raw HTTP
// status codes or JSON parse failures directly: the
// `From<dlpsync_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

use crate::model::EntityKind;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Authentication failed for tenant '{tenant}': {message}")]
    AuthenticationFailed { tenant: String, message: String },

    #[error("Cannot reach {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    // ── Remote call errors ───────────────────────────────────────────
    #[error("Failed to list {kind}s: {message}")]
    Fetch { kind: EntityKind, message: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{kind} payload is not a JSON object")]
    NotAnObject { kind: EntityKind },

    #[error("{kind} is missing required field '{field}'")]
    MissingField {
        kind: EntityKind,
        field: &'static str,
    },

    #[error("{kind} '{name}' is predefined and cannot be written")]
    ReadOnly { kind: EntityKind, name: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Wrap a listing failure so the report names which collection failed.
    pub fn fetch(kind: EntityKind, err: impl Into<Self>) -> Self {
        match err.into() {
            already @ Self::Fetch { .. } => already,
            other => Self::Fetch {
                kind,
                message: other.to_string(),
            },
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<dlpsync_api::Error> for CoreError {
    fn from(err: dlpsync_api::Error) -> Self {
        let status = err.status();
        match err {
            dlpsync_api::Error::Authentication { message } => CoreError::AuthenticationFailed {
                tenant: String::new(),
                message,
            },
            dlpsync_api::Error::InvalidToken => CoreError::Api {
                message: "access token rejected".into(),
                status,
            },
            dlpsync_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status,
                    }
                }
            }
            dlpsync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            dlpsync_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            dlpsync_api::Error::Api { status: code, message } => CoreError::Api {
                message: format!("HTTP {code}: {message}"),
                status,
            },
            dlpsync_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
