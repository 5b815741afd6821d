// ── Runtime connection configuration ──
//
// These types describe *how* to connect to a BIG-IP appliance.
// They carry credential data and connection tuning, but never touch disk.
// The CLI constructs an `ApplianceConfig` and hands it in.

use secrecy::SecretString;
use url::Url;

/// Credentials for the appliance's management interface.
#[derive(Debug, Clone)]
pub struct AuthCredentials {
    pub username: String,
    pub password: SecretString,
    /// Login provider name; `tmos` for local accounts.
    pub login_provider: String,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification. Default -- management interfaces are almost
    /// always self-signed.
    #[default]
    DangerAcceptInvalid,
}

impl PartialEq for TlsVerification {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::SystemDefaults, Self::SystemDefaults) => true,
            (Self::CustomCa(a), Self::CustomCa(b)) => a == b,
            (Self::DangerAcceptInvalid, Self::DangerAcceptInvalid) => true,
            _ => false,
        }
    }
}

impl Eq for TlsVerification {}

/// Configuration for connecting to a single appliance.
///
/// Built by the CLI from profile + flags -- core never reads config files.
#[derive(Debug, Clone)]
pub struct ApplianceConfig {
    /// Management URL (e.g., `https://192.168.1.245`).
    pub url: Url,
    /// Authentication credentials.
    pub auth: AuthCredentials,
    /// Default partition for resources that don't name one.
    pub partition: String,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: std::time::Duration,
}

impl ApplianceConfig {
    /// Translate the TLS setting into the api-layer `TlsMode`.
    pub(crate) fn tls_mode(&self) -> bigsync_api::transport::TlsMode {
        match &self.tls {
            TlsVerification::SystemDefaults => bigsync_api::transport::TlsMode::System,
            TlsVerification::CustomCa(path) => {
                bigsync_api::transport::TlsMode::CustomCa(path.clone())
            }
            TlsVerification::DangerAcceptInvalid => {
                bigsync_api::transport::TlsMode::DangerAcceptInvalid
            }
        }
    }
}
