//! CLI configuration -- thin wrapper around `bigsync_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--appliance, --partition, etc.).

use std::time::Duration;

use bigsync_core::{ApplianceConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use bigsync_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Translate a `Profile` + global flags into an `ApplianceConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<ApplianceConfig, CliError> {
    // 1. Appliance URL (flag > env > profile)
    let url_str = global.appliance.as_deref().unwrap_or(&profile.appliance);
    let url: url::Url = url_str.parse().map_err(|_| CliError::Validation {
        field: "appliance".into(),
        reason: format!("invalid URL: {url_str}"),
    })?;

    // 2. Credentials from the shared chain (env, keyring, plaintext)
    let auth = bigsync_config::resolve_auth(profile, profile_name)?;

    // 3. TLS verification
    let tls = if global.insecure || profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    // 4. Partition (flag > profile)
    let partition = global
        .partition
        .as_deref()
        .unwrap_or(&profile.partition)
        .to_string();

    // 5. Timeout
    let timeout = Duration::from_secs(global.timeout);

    Ok(ApplianceConfig {
        url,
        auth,
        partition,
        tls,
        timeout,
    })
}
