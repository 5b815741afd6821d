//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use bigsync_core::CoreError;

/// Exit codes per the CLI contract.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(dead_code)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to appliance at {url}")]
    #[diagnostic(
        code(bigsync::connection_failed),
        help(
            "Check that the management interface is reachable.\n\
             URL: {url}\n\
             Try: bigsync show sys-db setup.run --insecure"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed")]
    #[diagnostic(
        code(bigsync::auth_failed),
        help(
            "Verify your username and password.\n\
             Run: bigsync config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(bigsync::no_credentials),
        help(
            "Configure credentials with: bigsync config init\n\
             Or set BIGSYNC_USERNAME / BIGSYNC_PASSWORD environment variables."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{kind} '{name}' not found")]
    #[diagnostic(code(bigsync::not_found))]
    NotFound { kind: String, name: String },

    // ── API ──────────────────────────────────────────────────────────

    /// The appliance rejected an operation; its message is shown verbatim.
    #[error("Appliance rejected the operation: {message}")]
    #[diagnostic(code(bigsync::rejected))]
    Rejected { message: String },

    #[error("API error: {message}")]
    #[diagnostic(code(bigsync::api_error))]
    ApiError { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(bigsync::validation))]
    Validation { field: String, reason: String },

    #[error("Declaration error: {message}")]
    #[diagnostic(
        code(bigsync::declaration),
        help("Check the declaration file syntax and field names.")
    )]
    Declaration { message: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(bigsync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: bigsync config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(bigsync::no_config),
        help(
            "Create one with: bigsync config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(bigsync::config))]
    Config(Box<figment::Error>),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(bigsync::confirmation_required),
        help("Use --yes (-y) to confirm, or --check to preview.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(bigsync::timeout),
        help("Increase timeout with --timeout or check appliance responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(bigsync::json))]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl From<bigsync_config::ConfigError> for CliError {
    fn from(err: bigsync_config::ConfigError) -> Self {
        match err {
            bigsync_config::ConfigError::Validation { field, reason } => {
                Self::Validation { field, reason }
            }
            bigsync_config::ConfigError::NoCredentials { profile } => {
                Self::NoCredentials { profile }
            }
            bigsync_config::ConfigError::Figment(e) => Self::Config(e),
            bigsync_config::ConfigError::Io(e) => Self::Io(e),
            bigsync_config::ConfigError::Serialization(e) => Self::Validation {
                field: "config".into(),
                reason: e.to_string(),
            },
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::Declaration { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::AuthenticationFailed { message: _ } => CliError::AuthFailed {
                profile: "current".into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::NotFound { kind, name } => CliError::NotFound { kind, name },

            CoreError::Validation { field, reason } => CliError::Validation { field, reason },

            CoreError::Rejected { message } => CliError::Rejected { message },

            CoreError::OperationFailed { message } => CliError::ApiError { message },

            CoreError::Api { message, status: _ } => CliError::ApiError { message },

            CoreError::Declaration { message } => CliError::Declaration { message },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::ApiError { message },
        }
    }
}
