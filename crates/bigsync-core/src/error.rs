// ── Core error types ──
//
// User-facing errors from bigsync-core. These are NOT API-specific --
// consumers never see HTTP plumbing details directly. The
// `From<bigsync_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to appliance at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// The appliance rejected a write; its message is passed through
    /// verbatim -- it is the only actionable detail it provides.
    #[error("Appliance rejected the operation: {message}")]
    Rejected { message: String },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Declaration error: {message}")]
    Declaration { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a validation failure on a named field.
    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<bigsync_api::Error> for CoreError {
    fn from(err: bigsync_api::Error) -> Self {
        match err {
            bigsync_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            bigsync_api::Error::TokenExpired => CoreError::AuthenticationFailed {
                message: "Auth token expired -- re-authentication required".into(),
            },
            bigsync_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            bigsync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            bigsync_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            bigsync_api::Error::RestApi { status, message } => {
                // Write rejections carry the device's own message; surface
                // it as-is rather than as transport noise.
                if status == 400 || status == 403 || status == 409 {
                    CoreError::Rejected { message }
                } else {
                    CoreError::Api {
                        message,
                        status: Some(status),
                    }
                }
            }
            bigsync_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
