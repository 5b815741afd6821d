// ── LTM server-ssl profile ──
//
// Certificate, key, chain, and OCSP references are partition-qualified
// on the wire; `""`/`"none"` in a declaration clears them. SNI flags
// travel as `"true"`/`"false"` strings.

use serde::{Deserialize, Serialize};

use bigsync_api::rest::models::ServerSslProfile;

use crate::device::Device;
use crate::diff::{Changes, Outcome};
use crate::error::CoreError;
use crate::norm;
use crate::resource::{Create, ResourceState};

/// Desired state for an LTM server-ssl profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSslSpec {
    pub name: String,
    pub partition: Option<String>,
    #[serde(default)]
    pub state: ResourceState,
    /// Parent profile; the bare name `serverssl` always resolves to
    /// `/Common/serverssl` regardless of partition.
    pub parent: Option<String>,
    /// Client certificate presented to the server. `""`/`"none"` clears.
    pub certificate: Option<String>,
    /// Private key for the certificate. `""`/`"none"` clears.
    pub key: Option<String>,
    /// Certificate chain. `""`/`"none"` clears.
    pub chain: Option<String>,
    /// Cipher string, e.g. `DEFAULT` or `!SSLv3:!SSLv2:ECDHE+AES-GCM`.
    pub ciphers: Option<String>,
    /// OCSP profile for response validation. `""`/`"none"` clears.
    pub ocsp_profile: Option<String>,
    /// `require`, `require-strict`, or `request`.
    pub secure_renegotiation: Option<String>,
    /// SNI server name sent in the handshake. `""`/`"none"` clears.
    pub server_name: Option<String>,
    pub sni_default: Option<bool>,
    pub sni_require: Option<bool>,
    /// How the server certificate is handled: `ignore` or `require`.
    pub server_certificate: Option<String>,
}

// ── Normalized form ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
struct Normalized {
    parent: Option<String>,
    cert: Option<String>,
    key: Option<String>,
    chain: Option<String>,
    ciphers: Option<String>,
    ocsp: Option<String>,
    secure_renegotiation: Option<String>,
    server_name: Option<String>,
    sni_default: Option<bool>,
    sni_require: Option<bool>,
    peer_cert_mode: Option<String>,
}

/// Qualify an object reference, folding `""`/`"none"` to the empty
/// string (the wire form for "cleared").
fn fq_or_clear(partition: &str, raw: &str) -> String {
    if norm::is_none_marker(raw) {
        String::new()
    } else {
        norm::fq_name(partition, raw)
    }
}

impl ServerSslSpec {
    fn normalize(&self, partition: &str) -> Result<Normalized, CoreError> {
        if self.sni_require == Some(true) && !matches!(self.sni_default, Some(true)) {
            return Err(CoreError::validation(
                "sni_require",
                "Cannot set 'sni_require' to yes if 'sni_default' is set as no",
            ));
        }

        let parent = self.parent.as_deref().map(|p| {
            if p == "serverssl" {
                "/Common/serverssl".to_owned()
            } else {
                norm::fq_name(partition, p)
            }
        });

        Ok(Normalized {
            parent,
            cert: self
                .certificate
                .as_deref()
                .map(|v| fq_or_clear(partition, v)),
            key: self.key.as_deref().map(|v| fq_or_clear(partition, v)),
            chain: self.chain.as_deref().map(|v| fq_or_clear(partition, v)),
            ciphers: self.ciphers.clone(),
            ocsp: self
                .ocsp_profile
                .as_deref()
                .map(|v| fq_or_clear(partition, v)),
            secure_renegotiation: self.secure_renegotiation.clone(),
            server_name: self.server_name.as_deref().map(|v| {
                if norm::is_none_marker(v) {
                    String::new()
                } else {
                    v.to_owned()
                }
            }),
            sni_default: self.sni_default,
            sni_require: self.sni_require,
            peer_cert_mode: self.server_certificate.clone(),
        })
    }
}

impl Normalized {
    fn from_api(api: &ServerSslProfile) -> Self {
        Self {
            parent: api.defaults_from.clone(),
            cert: api.cert.clone(),
            key: api.key.clone(),
            chain: api.chain.clone(),
            ciphers: api.ciphers.clone(),
            ocsp: api.ocsp.clone(),
            secure_renegotiation: api.secure_renegotiation.clone(),
            // The device reports an unset server name as `"none"` or omits it.
            server_name: api
                .server_name
                .as_deref()
                .filter(|v| !norm::is_none_marker(v))
                .map(str::to_owned),
            sni_default: api.sni_default.as_deref().and_then(norm::parse_flag),
            sni_require: api.sni_require.as_deref().and_then(norm::parse_flag),
            peer_cert_mode: api.peer_cert_mode.clone(),
        }
    }
}

// ── Patch body ──────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ServerSslPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    defaults_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ciphers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ocsp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secure_renegotiation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    server_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sni_default: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sni_require: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    peer_cert_mode: Option<String>,
}

/// Wire form for the SNI flags: `"true"`/`"false"` strings.
fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Compare an optional reference where desired `""` (cleared) equals an
/// absent device value.
fn ref_changed(want: Option<&str>, have: Option<&str>) -> Option<String> {
    let want = want?;
    if want.is_empty() && have.is_none_or(norm::is_none_marker) {
        return None;
    }
    if Some(want) == have {
        return None;
    }
    Some(want.to_owned())
}

fn diff(want: &Normalized, have: &Normalized) -> (ServerSslPatch, Changes) {
    let mut patch = ServerSslPatch::default();
    let mut changes = Changes::new();

    if want.parent.is_some() && want.parent != have.parent {
        patch.defaults_from = want.parent.clone();
        changes.record(
            "parent",
            norm::str_report(have.parent.as_deref()),
            norm::str_report(want.parent.as_deref()),
        );
    }
    if let Some(v) = ref_changed(want.cert.as_deref(), have.cert.as_deref()) {
        changes.record(
            "certificate",
            norm::str_report(have.cert.as_deref()),
            norm::str_report(Some(v.as_str())),
        );
        patch.cert = Some(v);
    }
    if let Some(v) = ref_changed(want.key.as_deref(), have.key.as_deref()) {
        changes.record(
            "key",
            norm::str_report(have.key.as_deref()),
            norm::str_report(Some(v.as_str())),
        );
        patch.key = Some(v);
    }
    if let Some(v) = ref_changed(want.chain.as_deref(), have.chain.as_deref()) {
        changes.record(
            "chain",
            norm::str_report(have.chain.as_deref()),
            norm::str_report(Some(v.as_str())),
        );
        patch.chain = Some(v);
    }
    if want.ciphers.is_some() && want.ciphers != have.ciphers {
        patch.ciphers = want.ciphers.clone();
        changes.record(
            "ciphers",
            norm::str_report(have.ciphers.as_deref()),
            norm::str_report(want.ciphers.as_deref()),
        );
    }
    if let Some(v) = ref_changed(want.ocsp.as_deref(), have.ocsp.as_deref()) {
        changes.record(
            "ocsp_profile",
            norm::str_report(have.ocsp.as_deref()),
            norm::str_report(Some(v.as_str())),
        );
        patch.ocsp = Some(v);
    }
    if want.secure_renegotiation.is_some()
        && want.secure_renegotiation != have.secure_renegotiation
    {
        patch.secure_renegotiation = want.secure_renegotiation.clone();
        changes.record(
            "secure_renegotiation",
            norm::str_report(have.secure_renegotiation.as_deref()),
            norm::str_report(want.secure_renegotiation.as_deref()),
        );
    }
    if let Some(v) = ref_changed(want.server_name.as_deref(), have.server_name.as_deref()) {
        changes.record(
            "server_name",
            norm::str_report(have.server_name.as_deref()),
            norm::str_report(Some(v.as_str())),
        );
        patch.server_name = Some(v);
    }
    if want.sni_default.is_some() && want.sni_default != have.sni_default {
        patch.sni_default = want.sni_default.map(bool_str);
        changes.record(
            "sni_default",
            norm::flag_report(have.sni_default),
            norm::flag_report(want.sni_default),
        );
    }
    if want.sni_require.is_some() && want.sni_require != have.sni_require {
        patch.sni_require = want.sni_require.map(bool_str);
        changes.record(
            "sni_require",
            norm::flag_report(have.sni_require),
            norm::flag_report(want.sni_require),
        );
    }
    if want.peer_cert_mode.is_some() && want.peer_cert_mode != have.peer_cert_mode {
        patch.peer_cert_mode = want.peer_cert_mode.clone();
        changes.record(
            "server_certificate",
            norm::str_report(have.peer_cert_mode.as_deref()),
            norm::str_report(want.peer_cert_mode.as_deref()),
        );
    }

    (patch, changes)
}

// ── Manager ─────────────────────────────────────────────────────────

/// Reconciles one server-ssl profile against the device.
pub struct ServerSslManager<'a> {
    device: &'a Device,
    spec: &'a ServerSslSpec,
}

impl<'a> ServerSslManager<'a> {
    pub fn new(device: &'a Device, spec: &'a ServerSslSpec) -> Self {
        Self { device, spec }
    }

    fn partition(&self) -> &str {
        self.spec
            .partition
            .as_deref()
            .unwrap_or_else(|| self.device.partition())
    }

    /// Drive the profile to its declared state.
    pub async fn ensure(&self, check: bool) -> Result<Outcome, CoreError> {
        match self.spec.state {
            ResourceState::Present => self.present(check).await,
            ResourceState::Absent => self.absent(check).await,
        }
    }

    async fn present(&self, check: bool) -> Result<Outcome, CoreError> {
        let exists = self
            .device
            .rest()
            .server_ssl_profile_exists(self.partition(), &self.spec.name)
            .await?;
        if exists {
            self.update(check).await
        } else {
            self.create(check).await
        }
    }

    async fn create(&self, check: bool) -> Result<Outcome, CoreError> {
        let want = self.spec.normalize(self.partition())?;
        let (patch, changes) = diff(&want, &Normalized::default());
        if check {
            return Ok(Outcome::created(changes));
        }
        let body = Create {
            name: &self.spec.name,
            partition: self.partition(),
            attrs: &patch,
        };
        self.device.rest().create_server_ssl_profile(&body).await?;
        Ok(Outcome::created(changes))
    }

    async fn update(&self, check: bool) -> Result<Outcome, CoreError> {
        let current = self
            .device
            .rest()
            .read_server_ssl_profile(self.partition(), &self.spec.name)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                kind: "server-ssl profile".into(),
                name: self.spec.name.clone(),
            })?;
        let have = Normalized::from_api(&current);
        let want = self.spec.normalize(self.partition())?;
        let (patch, changes) = diff(&want, &have);
        if changes.is_empty() {
            return Ok(Outcome::unchanged());
        }
        if check {
            return Ok(Outcome::updated(changes));
        }
        self.device
            .rest()
            .patch_server_ssl_profile(self.partition(), &self.spec.name, &patch)
            .await?;
        Ok(Outcome::updated(changes))
    }

    async fn absent(&self, check: bool) -> Result<Outcome, CoreError> {
        let exists = self
            .device
            .rest()
            .server_ssl_profile_exists(self.partition(), &self.spec.name)
            .await?;
        if !exists {
            return Ok(Outcome::unchanged());
        }
        if check {
            return Ok(Outcome::deleted());
        }
        self.device
            .rest()
            .delete_server_ssl_profile(self.partition(), &self.spec.name)
            .await?;
        if self
            .device
            .rest()
            .server_ssl_profile_exists(self.partition(), &self.spec.name)
            .await?
        {
            return Err(CoreError::OperationFailed {
                message: "Failed to delete the resource.".into(),
            });
        }
        Ok(Outcome::deleted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn spec(value: serde_json::Value) -> ServerSslSpec {
        serde_json::from_value(value).expect("valid spec")
    }

    #[test]
    fn normalize_qualifies_references() {
        let s = spec(json!({
            "name": "foo",
            "certificate": "client.crt",
            "key": "client.key",
            "chain": "none",
            "parent": "serverssl"
        }));
        let n = s.normalize("Tenant1").expect("normalizes");
        assert_eq!(n.cert.as_deref(), Some("/Tenant1/client.crt"));
        assert_eq!(n.key.as_deref(), Some("/Tenant1/client.key"));
        assert_eq!(n.chain.as_deref(), Some(""));
        // "serverssl" is the built-in root profile, always in /Common.
        assert_eq!(n.parent.as_deref(), Some("/Common/serverssl"));
    }

    #[test]
    fn normalize_rejects_sni_require_without_default() {
        let s = spec(json!({ "name": "foo", "sni_require": true }));
        assert!(matches!(
            s.normalize("Common"),
            Err(CoreError::Validation { .. })
        ));

        let s = spec(json!({ "name": "foo", "sni_require": true, "sni_default": true }));
        assert!(s.normalize("Common").is_ok());
    }

    #[test]
    fn clearing_an_unset_reference_is_not_a_change() {
        let s = spec(json!({ "name": "foo", "certificate": "none", "server_name": "" }));
        let want = s.normalize("Common").expect("normalizes");
        let (patch, changes) = diff(&want, &Normalized::default());
        assert!(changes.is_empty());
        assert_eq!(patch, ServerSslPatch::default());
    }

    #[test]
    fn diff_emits_wire_field_names() {
        let s = spec(json!({
            "name": "foo",
            "server_certificate": "require",
            "sni_default": true
        }));
        let want = s.normalize("Common").expect("normalizes");
        let api: ServerSslProfile = serde_json::from_value(json!({
            "name": "foo",
            "partition": "Common",
            "defaultsFrom": "/Common/serverssl",
            "peerCertMode": "ignore",
            "sniDefault": "false",
            "serverName": "none"
        }))
        .expect("valid fixture");
        let have = Normalized::from_api(&api);
        let (patch, changes) = diff(&want, &have);
        assert_eq!(changes.len(), 2);
        let body = serde_json::to_value(&patch).expect("serializes");
        assert_eq!(
            body,
            json!({ "peerCertMode": "require", "sniDefault": "true" })
        );
    }
}
