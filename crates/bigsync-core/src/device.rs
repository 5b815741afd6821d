// ── Device session ──
//
// A connected appliance: authenticated REST client plus the default
// partition. Managers borrow this for the duration of one reconciliation.

use bigsync_api::RestClient;

use crate::config::ApplianceConfig;
use crate::error::CoreError;

/// An authenticated session against one BIG-IP appliance.
pub struct Device {
    rest: RestClient,
    partition: String,
}

impl Device {
    /// Connect and authenticate.
    ///
    /// Builds the transport from the config's TLS/timeout settings and
    /// performs the token login before returning.
    pub async fn connect(config: &ApplianceConfig) -> Result<Self, CoreError> {
        let transport = bigsync_api::transport::TransportConfig {
            tls: config.tls_mode(),
            timeout: config.timeout,
        };
        let rest = RestClient::new(config.url.clone(), &transport)?;
        let credentials = bigsync_api::Credentials::with_provider(
            config.auth.username.clone(),
            config.auth.password.clone(),
            config.auth.login_provider.clone(),
        );
        rest.login(&credentials).await?;
        tracing::debug!(url = %config.url, "connected to appliance");
        Ok(Self {
            rest,
            partition: config.partition.clone(),
        })
    }

    /// Wrap a pre-built REST client (no login performed).
    ///
    /// Used by tests and by callers that manage authentication themselves.
    pub fn from_client(rest: RestClient, partition: impl Into<String>) -> Self {
        Self {
            rest,
            partition: partition.into(),
        }
    }

    /// The underlying REST client.
    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    /// The default partition for resources that don't name one.
    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// Revoke the auth token. Errors are swallowed -- the session is
    /// ending either way.
    pub async fn disconnect(&self) {
        if let Err(e) = self.rest.logout().await {
            tracing::debug!(error = %e, "logout failed (ignored)");
        }
    }

    /// Fetch one object's current state as raw JSON, for display.
    ///
    /// `kind` uses the declaration vocabulary (`http-profile`, `vlan`,
    /// ...). Sys db variables ignore the partition.
    pub async fn read_object(
        &self,
        kind: &str,
        partition: Option<&str>,
        name: &str,
    ) -> Result<Option<serde_json::Value>, CoreError> {
        let partition = partition.unwrap_or(&self.partition);
        let value = match kind {
            "http-profile" => to_value(self.rest.read_http_profile(partition, name).await?),
            "tcp-profile" => to_value(self.rest.read_tcp_profile(partition, name).await?),
            "server-ssl-profile" => {
                to_value(self.rest.read_server_ssl_profile(partition, name).await?)
            }
            "vlan" => to_value(self.rest.read_vlan(partition, name).await?),
            "sys-db" => to_value(self.rest.read_db_variable(name).await?),
            "gtm-monitor" => to_value(self.rest.read_gtm_bigip_monitor(partition, name).await?),
            other => {
                return Err(CoreError::Validation {
                    field: "kind".into(),
                    reason: format!("unknown resource kind '{other}'"),
                });
            }
        };
        Ok(value)
    }
}

fn to_value<T: serde::Serialize>(object: Option<T>) -> Option<serde_json::Value> {
    object.and_then(|o| serde_json::to_value(o).ok())
}
