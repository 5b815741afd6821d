// ── Declaration files ──
//
// The desired state is declared in TOML: one array-of-tables per
// resource kind. Reconciliation is a single synchronous pass -- each
// resource is one sequence of blocking REST calls, applied kind by kind
// in dependency-friendly order (VLANs before profiles, monitors last).

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::device::Device;
use crate::diff::Outcome;
use crate::error::CoreError;
use crate::resource::gtm_monitor::{GtmMonitorManager, GtmMonitorSpec};
use crate::resource::http_profile::{HttpProfileManager, HttpProfileSpec};
use crate::resource::server_ssl::{ServerSslManager, ServerSslSpec};
use crate::resource::sys_db::{SysDbManager, SysDbSpec};
use crate::resource::tcp_profile::{TcpProfileManager, TcpProfileSpec};
use crate::resource::vlan::{VlanManager, VlanSpec};

/// A parsed declaration document.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Declaration {
    #[serde(default, rename = "sys_db")]
    pub sys_dbs: Vec<SysDbSpec>,
    #[serde(default, rename = "vlan")]
    pub vlans: Vec<VlanSpec>,
    #[serde(default, rename = "tcp_profile")]
    pub tcp_profiles: Vec<TcpProfileSpec>,
    #[serde(default, rename = "http_profile")]
    pub http_profiles: Vec<HttpProfileSpec>,
    #[serde(default, rename = "server_ssl_profile")]
    pub server_ssl_profiles: Vec<ServerSslSpec>,
    #[serde(default, rename = "gtm_monitor")]
    pub gtm_monitors: Vec<GtmMonitorSpec>,
}

/// One reconciled resource in an apply run.
#[derive(Debug, Serialize)]
pub struct AppliedResource {
    pub kind: &'static str,
    pub name: String,
    pub outcome: Outcome,
}

impl Declaration {
    /// Parse a declaration from TOML text. Unknown keys fail loudly --
    /// a typo in a declaration must never silently no-op.
    pub fn from_toml_str(raw: &str) -> Result<Self, CoreError> {
        toml::from_str(raw).map_err(|e| CoreError::Declaration {
            message: e.to_string(),
        })
    }

    /// Read and parse a declaration file.
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path).map_err(|e| CoreError::Declaration {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&raw)
    }

    /// Total number of declared resources.
    pub fn len(&self) -> usize {
        self.sys_dbs.len()
            + self.vlans.len()
            + self.tcp_profiles.len()
            + self.http_profiles.len()
            + self.server_ssl_profiles.len()
            + self.gtm_monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reconcile every declared resource against the device.
    ///
    /// Resources are applied sequentially; the first failure aborts the
    /// run with the device's message. In check mode nothing is written.
    pub async fn apply(
        &self,
        device: &Device,
        check: bool,
    ) -> Result<Vec<AppliedResource>, CoreError> {
        let mut results = Vec::with_capacity(self.len());

        for spec in &self.sys_dbs {
            let outcome = SysDbManager::new(device, spec).ensure(check).await?;
            results.push(applied("sys-db", &spec.key, outcome));
        }
        for spec in &self.vlans {
            let outcome = VlanManager::new(device, spec).ensure(check).await?;
            results.push(applied("vlan", &spec.name, outcome));
        }
        for spec in &self.tcp_profiles {
            let outcome = TcpProfileManager::new(device, spec).ensure(check).await?;
            results.push(applied("tcp-profile", &spec.name, outcome));
        }
        for spec in &self.http_profiles {
            let outcome = HttpProfileManager::new(device, spec).ensure(check).await?;
            results.push(applied("http-profile", &spec.name, outcome));
        }
        for spec in &self.server_ssl_profiles {
            let outcome = ServerSslManager::new(device, spec).ensure(check).await?;
            results.push(applied("server-ssl-profile", &spec.name, outcome));
        }
        for spec in &self.gtm_monitors {
            let outcome = GtmMonitorManager::new(device, spec).ensure(check).await?;
            results.push(applied("gtm-monitor", &spec.name, outcome));
        }

        Ok(results)
    }
}

fn applied(kind: &'static str, name: &str, outcome: Outcome) -> AppliedResource {
    info!(kind, name, changed = outcome.changed, "reconciled");
    AppliedResource {
        kind,
        name: name.to_owned(),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceState;

    #[test]
    fn parses_a_mixed_declaration() {
        let decl = Declaration::from_toml_str(
            r#"
            [[vlan]]
            name = "vlan-internal"
            tag = 1234
            mtu = 1500
            tagged_interfaces = ["1.1"]

            [[http_profile]]
            name = "app-http"
            parent = "http"
            insert_xforwarded_for = true

            [http_profile.hsts]
            enabled = true
            maximum_age = "indefinite"

            [[sys_db]]
            key = "setup.run"
            value = false

            [[tcp_profile]]
            name = "app-tcp"
            state = "absent"
            "#,
        )
        .expect("valid declaration");

        assert_eq!(decl.len(), 4);
        assert_eq!(decl.vlans[0].tag, Some(1234));
        assert_eq!(decl.http_profiles[0].parent.as_deref(), Some("http"));
        assert_eq!(decl.tcp_profiles[0].state, ResourceState::Absent);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Declaration::from_toml_str(
            r#"
            [[http_profile]]
            name = "app-http"
            insert_xforwarded = true
            "#,
        )
        .expect_err("typo should fail");
        assert!(matches!(err, CoreError::Declaration { .. }));
    }

    #[test]
    fn empty_document_is_an_empty_declaration() {
        let decl = Declaration::from_toml_str("").expect("empty is fine");
        assert!(decl.is_empty());
    }
}
