// Wire models for iControl REST responses.
//
// Field names mirror the device's camelCase JSON. These are raw API
// shapes -- `bigsync-core` normalizes them into user-facing form.

use serde::{Deserialize, Serialize};

// ── Auth ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    #[serde(rename = "loginProviderName")]
    pub login_provider_name: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub token: AuthToken,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthToken {
    pub token: String,
}

// ── Error envelope ──────────────────────────────────────────────────

/// The uniform iControl error body: `{"code": 404, "message": "..."}`.
///
/// Some endpoints return this inside an HTTP 200, so the client probes
/// every body for it.
#[derive(Debug, Deserialize)]
pub struct RestErrorBody {
    pub code: Option<u16>,
    pub message: Option<String>,
}

// ── LTM: HTTP profile ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpProfile {
    pub name: String,
    pub partition: Option<String>,
    pub defaults_from: Option<String>,
    pub description: Option<String>,
    pub insert_xforwarded_for: Option<String>,
    pub redirect_rewrite: Option<String>,
    pub encrypt_cookies: Option<Vec<String>>,
    pub proxy_type: Option<String>,
    pub explicit_proxy: Option<ExplicitProxy>,
    pub header_erase: Option<String>,
    pub header_insert: Option<String>,
    pub server_agent_name: Option<String>,
    pub accept_xff: Option<String>,
    pub xff_alternative_names: Option<Vec<String>>,
    pub fallback_host: Option<String>,
    pub fallback_status_codes: Option<Vec<String>>,
    pub oneconnect_transformations: Option<String>,
    pub request_chunking: Option<String>,
    pub response_chunking: Option<String>,
    pub hsts: Option<HstsSettings>,
    pub enforcement: Option<EnforcementSettings>,
    pub sflow: Option<SflowSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplicitProxy {
    pub dns_resolver: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HstsSettings {
    pub mode: Option<String>,
    pub maximum_age: Option<u64>,
    pub include_subdomains: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnforcementSettings {
    pub truncated_redirects: Option<String>,
    pub pipeline: Option<String>,
    pub unknown_method: Option<String>,
    pub max_header_count: Option<u64>,
    pub max_header_size: Option<u64>,
    pub max_requests: Option<u64>,
    pub known_methods: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SflowSettings {
    pub poll_interval: Option<u64>,
    pub poll_interval_global: Option<String>,
    pub sampling_rate: Option<u64>,
    pub sampling_rate_global: Option<String>,
}

// ── LTM: TCP profile ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpProfile {
    pub name: String,
    pub partition: Option<String>,
    pub defaults_from: Option<String>,
    pub idle_timeout: Option<u64>,
    pub time_wait_recycle: Option<String>,
    pub nagle: Option<String>,
    pub early_retransmit: Option<String>,
    pub proxy_options: Option<String>,
    #[serde(rename = "initCwnd")]
    pub init_cwnd: Option<u64>,
    #[serde(rename = "initRwnd")]
    pub init_rwnd: Option<u64>,
    pub syn_rto_base: Option<u64>,
}

// ── LTM: server-ssl profile ─────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSslProfile {
    pub name: String,
    pub partition: Option<String>,
    pub defaults_from: Option<String>,
    pub cert: Option<String>,
    pub key: Option<String>,
    pub chain: Option<String>,
    pub ciphers: Option<String>,
    pub ocsp: Option<String>,
    pub secure_renegotiation: Option<String>,
    pub server_name: Option<String>,
    pub sni_default: Option<String>,
    pub sni_require: Option<String>,
    pub peer_cert_mode: Option<String>,
}

// ── NET: VLAN ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vlan {
    pub name: String,
    pub partition: Option<String>,
    pub description: Option<String>,
    pub tag: Option<u16>,
    pub mtu: Option<u64>,
    pub cmp_hash: Option<String>,
    pub dag_tunnel: Option<String>,
    pub dag_round_robin: Option<String>,
    pub source_checking: Option<String>,
    pub failsafe: Option<String>,
    pub failsafe_action: Option<String>,
    pub failsafe_timeout: Option<u64>,
    pub sflow: Option<VlanSflow>,
    /// Present when the read expands subcollections.
    pub interfaces_reference: Option<VlanInterfacesReference>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VlanSflow {
    pub poll_interval: Option<u64>,
    pub sampling_rate: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VlanInterfacesReference {
    pub items: Option<Vec<VlanInterface>>,
}

/// One member of the VLAN interfaces subcollection. The device sets
/// exactly one of `tagged` / `untagged` to `true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VlanInterface {
    pub name: String,
    pub tagged: Option<bool>,
    pub untagged: Option<bool>,
}

// ── SYS: db variable ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbVariable {
    pub name: String,
    pub value: Option<String>,
    pub default_value: Option<String>,
}

// ── GTM: bigip monitor ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GtmBigipMonitor {
    pub name: String,
    pub partition: Option<String>,
    pub defaults_from: Option<String>,
    /// `"ip:port"`, with `*` wildcards allowed on either side.
    pub destination: Option<String>,
    pub interval: Option<u64>,
    pub timeout: Option<u64>,
    pub ignore_down_response: Option<String>,
    pub aggregate_dynamic_ratios: Option<String>,
}
