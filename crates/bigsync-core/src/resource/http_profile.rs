// ── LTM HTTP profile ──
//
// The widest schema of the bunch. Three settings groups (`hsts`,
// `enforcement`, `sflow`) are flat user-facing parameters but nested
// objects on the wire, and several numerics use device keywords
// (`"indefinite"`, `"default"`) that map to sentinel values in both
// directions. The parent profile is immutable once created.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use bigsync_api::rest::models::HttpProfile;

use crate::device::Device;
use crate::diff::{Changes, Outcome};
use crate::error::CoreError;
use crate::norm::{self, NumericOrKeyword};
use crate::resource::{Create, ResourceState};

const MAXIMUM_AGE_INDEFINITE: u64 = 4_294_967_295;
const MAX_HEADER_COUNT_DEFAULT: u64 = 64;
const MAX_HEADER_SIZE_DEFAULT: u64 = 32_768;
const MAX_REQUESTS_DEFAULT: u64 = 0;

/// The device's built-in known-methods set, expanded from the
/// `"default"` keyword.
const KNOWN_METHOD_DEFAULTS: [&str; 11] = [
    "CONNECT", "DELETE", "GET", "HEAD", "LOCK", "OPTIONS", "POST", "PROPFIND", "PUT", "TRACE",
    "UNLOCK",
];

/// When to (re)write the cookie encryption secret, which the device
/// never reports back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePassword {
    #[default]
    Always,
    OnCreate,
}

/// HSTS settings group.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HstsSpec {
    pub enabled: Option<bool>,
    /// Seconds (0-4294967295), or `"indefinite"`.
    pub maximum_age: Option<NumericOrKeyword>,
    pub include_subdomains: Option<bool>,
}

/// Protocol enforcement settings group.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnforcementSpec {
    pub truncated_redirects: Option<bool>,
    /// `allow`, `reject`, or `pass-through`.
    pub pipeline: Option<String>,
    /// `allow`, `reject`, or `pass-through`.
    pub unknown_method: Option<String>,
    /// 16-4096, or `"default"` (64).
    pub max_header_count: Option<NumericOrKeyword>,
    /// 0-4294967295, or `"default"` (32768).
    pub max_header_size: Option<NumericOrKeyword>,
    /// 0-4294967295, or `"default"` (0 = unlimited).
    pub max_requests: Option<NumericOrKeyword>,
    /// Accepted methods. `"default"` expands to the built-in set; a
    /// single `""` entry empties the list.
    pub known_methods: Option<Vec<String>>,
}

/// sFlow settings group.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SflowSpec {
    pub poll_interval: Option<u64>,
    pub poll_interval_global: Option<bool>,
    pub sampling_rate: Option<u64>,
    pub sampling_rate_global: Option<bool>,
}

/// Desired state for an LTM HTTP profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpProfileSpec {
    pub name: String,
    pub partition: Option<String>,
    #[serde(default)]
    pub state: ResourceState,
    /// Parent profile to inherit from. Immutable after creation.
    pub parent: Option<String>,
    pub description: Option<String>,
    pub insert_xforwarded_for: Option<bool>,
    /// `none`, `all`, `matching`, or `nodes`.
    pub redirect_rewrite: Option<String>,
    /// Cookie names to encrypt; `[""]` clears the list.
    pub encrypt_cookies: Option<Vec<String>>,
    /// Passphrase for cookie encryption. Write-only on the device.
    pub encrypt_cookie_secret: Option<String>,
    #[serde(default)]
    pub update_password: UpdatePassword,
    /// `reverse`, `explicit`, or `transparent`. `explicit` requires a
    /// DNS resolver.
    pub proxy_type: Option<String>,
    /// DNS resolver for explicit proxying; `""`/`"none"` clears.
    pub dns_resolver: Option<String>,
    pub accept_xff: Option<bool>,
    pub xff_alternative_names: Option<Vec<String>>,
    pub fallback_host: Option<String>,
    /// HTTP error codes (4xx: 400-417, 5xx: 500-505) that trigger the
    /// fallback host.
    pub fallback_status_codes: Option<Vec<String>>,
    pub oneconnect_transformations: Option<bool>,
    /// `rechunk`, `selective`, or `preserve`.
    pub request_chunking: Option<String>,
    pub response_chunking: Option<String>,
    /// Value for the `Server` header; `""`/`"none"` clears.
    pub server_agent_name: Option<String>,
    /// Header name to strip from requests.
    pub header_erase: Option<String>,
    /// `name:value` header to insert into requests.
    pub header_insert: Option<String>,
    pub hsts: Option<HstsSpec>,
    pub enforcement: Option<EnforcementSpec>,
    pub sflow: Option<SflowSpec>,
}

// ── Normalized form ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
struct Normalized {
    parent: Option<String>,
    description: Option<String>,
    insert_xforwarded_for: Option<bool>,
    redirect_rewrite: Option<String>,
    encrypt_cookies: Option<Vec<String>>,
    encrypt_cookie_secret: Option<String>,
    proxy_type: Option<String>,
    dns_resolver: Option<String>,
    accept_xff: Option<bool>,
    xff_alternative_names: Option<Vec<String>>,
    fallback_host: Option<String>,
    fallback_status_codes: Option<Vec<String>>,
    oneconnect_transformations: Option<bool>,
    request_chunking: Option<String>,
    response_chunking: Option<String>,
    server_agent_name: Option<String>,
    header_erase: Option<String>,
    header_insert: Option<String>,
    hsts_mode: Option<bool>,
    maximum_age: Option<u64>,
    include_subdomains: Option<bool>,
    truncated_redirects: Option<bool>,
    pipeline: Option<String>,
    unknown_method: Option<String>,
    max_header_count: Option<u64>,
    max_header_size: Option<u64>,
    max_requests: Option<u64>,
    known_methods: Option<Vec<String>>,
    sflow_poll_interval: Option<u64>,
    sflow_poll_interval_global: Option<bool>,
    sflow_sampling_rate: Option<u64>,
    sflow_sampling_rate_global: Option<bool>,
}

/// Reject header values containing control characters; inserted headers
/// must be in `name:value` form.
fn check_header(field: &str, raw: &str, requires_value: bool) -> Result<(), CoreError> {
    if raw.chars().any(|c| c == '\r' || c == '\n' || c == '\0') {
        return Err(CoreError::validation(
            field,
            "header contains prohibited control characters",
        ));
    }
    if requires_value && !raw.contains(':') {
        return Err(CoreError::validation(
            field,
            "header must be specified as 'name:value'",
        ));
    }
    Ok(())
}

/// Valid fallback trigger codes are 4xx (400-417) and 5xx (500-505).
fn check_status_code(raw: &str) -> Result<(), CoreError> {
    let parsed: Option<u16> = raw.parse().ok();
    match parsed {
        Some(code) if (400..=417).contains(&code) || (500..=505).contains(&code) => Ok(()),
        _ => Err(CoreError::validation(
            "fallback_status_codes",
            "Invalid HTTP error code or error code range specified",
        )),
    }
}

/// Expand the `"default"` keyword in a known-methods list.
fn expand_known_methods(raw: &[String]) -> Vec<String> {
    if raw.len() == 1 && raw[0].is_empty() {
        return Vec::new();
    }
    if raw.iter().any(|m| m == "default") {
        let mut result: Vec<String> = raw.iter().filter(|m| *m != "default").cloned().collect();
        result.extend(KNOWN_METHOD_DEFAULTS.iter().map(|m| (*m).to_owned()));
        return result;
    }
    raw.to_vec()
}

impl HttpProfileSpec {
    #[allow(clippy::too_many_lines)]
    fn normalize(&self, partition: &str) -> Result<Normalized, CoreError> {
        let dns_resolver = self.dns_resolver.as_deref().map(|raw| {
            if norm::is_none_marker(raw) {
                String::new()
            } else {
                norm::fq_name(partition, raw)
            }
        });

        if self.proxy_type.as_deref() == Some("explicit")
            && dns_resolver.as_deref().is_none_or(str::is_empty)
        {
            return Err(CoreError::validation(
                "proxy_type",
                "A proxy type cannot be set to explicit without providing DNS resolver",
            ));
        }

        if let Some(codes) = &self.fallback_status_codes {
            for code in codes {
                check_status_code(code)?;
            }
        }
        if let Some(raw) = self.header_erase.as_deref() {
            if !norm::is_none_marker(raw) {
                check_header("header_erase", raw, false)?;
            }
        }
        if let Some(raw) = self.header_insert.as_deref() {
            if !norm::is_none_marker(raw) {
                check_header("header_insert", raw, true)?;
            }
        }

        let encrypt_cookies = self.encrypt_cookies.as_ref().map(|list| {
            if list.len() == 1 && norm::is_none_marker(&list[0]) {
                Vec::new()
            } else {
                list.clone()
            }
        });

        let hsts = self.hsts.clone().unwrap_or_default();
        let enforcement = self.enforcement.clone().unwrap_or_default();
        let sflow = self.sflow.clone().unwrap_or_default();

        Ok(Normalized {
            parent: self.parent.as_deref().map(|p| norm::fq_name(partition, p)),
            description: self.description.clone(),
            insert_xforwarded_for: self.insert_xforwarded_for,
            redirect_rewrite: self.redirect_rewrite.clone(),
            encrypt_cookies,
            encrypt_cookie_secret: self.encrypt_cookie_secret.clone(),
            proxy_type: self.proxy_type.clone(),
            dns_resolver,
            accept_xff: self.accept_xff,
            xff_alternative_names: self.xff_alternative_names.clone(),
            fallback_host: self.fallback_host.clone(),
            fallback_status_codes: self.fallback_status_codes.clone(),
            oneconnect_transformations: self.oneconnect_transformations,
            request_chunking: self.request_chunking.clone(),
            response_chunking: self.response_chunking.clone(),
            server_agent_name: self.server_agent_name.clone(),
            header_erase: self.header_erase.clone(),
            header_insert: self.header_insert.clone(),
            hsts_mode: hsts.enabled,
            maximum_age: hsts
                .maximum_age
                .as_ref()
                .map(|v| {
                    v.resolve(
                        "maximum_age",
                        "indefinite",
                        MAXIMUM_AGE_INDEFINITE,
                        0..=MAXIMUM_AGE_INDEFINITE,
                    )
                })
                .transpose()?,
            include_subdomains: hsts.include_subdomains,
            truncated_redirects: enforcement.truncated_redirects,
            pipeline: enforcement.pipeline.clone(),
            unknown_method: enforcement.unknown_method.clone(),
            max_header_count: enforcement
                .max_header_count
                .as_ref()
                .map(|v| v.resolve("max_header_count", "default", MAX_HEADER_COUNT_DEFAULT, 16..=4096))
                .transpose()?,
            max_header_size: enforcement
                .max_header_size
                .as_ref()
                .map(|v| {
                    v.resolve(
                        "max_header_size",
                        "default",
                        MAX_HEADER_SIZE_DEFAULT,
                        0..=MAXIMUM_AGE_INDEFINITE,
                    )
                })
                .transpose()?,
            max_requests: enforcement
                .max_requests
                .as_ref()
                .map(|v| {
                    v.resolve(
                        "max_requests",
                        "default",
                        MAX_REQUESTS_DEFAULT,
                        0..=MAXIMUM_AGE_INDEFINITE,
                    )
                })
                .transpose()?,
            known_methods: enforcement
                .known_methods
                .as_deref()
                .map(expand_known_methods),
            sflow_poll_interval: sflow
                .poll_interval
                .map(|v| norm::check_range("poll_interval", v, 0..=MAXIMUM_AGE_INDEFINITE))
                .transpose()?,
            sflow_poll_interval_global: sflow.poll_interval_global,
            sflow_sampling_rate: sflow
                .sampling_rate
                .map(|v| norm::check_range("sampling_rate", v, 0..=MAXIMUM_AGE_INDEFINITE))
                .transpose()?,
            sflow_sampling_rate_global: sflow.sampling_rate_global,
        })
    }
}

impl Normalized {
    fn from_api(api: &HttpProfile) -> Self {
        let hsts = api.hsts.as_ref();
        let enforcement = api.enforcement.as_ref();
        let sflow = api.sflow.as_ref();

        Self {
            parent: api.defaults_from.clone(),
            description: api.description.clone(),
            insert_xforwarded_for: api
                .insert_xforwarded_for
                .as_deref()
                .and_then(norm::parse_flag),
            redirect_rewrite: api.redirect_rewrite.clone(),
            encrypt_cookies: api.encrypt_cookies.clone(),
            // Write-only: the device never reports the secret back.
            encrypt_cookie_secret: None,
            proxy_type: api.proxy_type.clone(),
            dns_resolver: api
                .explicit_proxy
                .as_ref()
                .and_then(|p| p.dns_resolver.clone()),
            accept_xff: api.accept_xff.as_deref().and_then(norm::parse_flag),
            xff_alternative_names: api.xff_alternative_names.clone(),
            fallback_host: api.fallback_host.clone(),
            fallback_status_codes: api.fallback_status_codes.clone(),
            oneconnect_transformations: api
                .oneconnect_transformations
                .as_deref()
                .and_then(norm::parse_flag),
            request_chunking: api.request_chunking.clone(),
            response_chunking: api.response_chunking.clone(),
            server_agent_name: api.server_agent_name.clone(),
            header_erase: api.header_erase.clone(),
            header_insert: api.header_insert.clone(),
            hsts_mode: hsts.and_then(|h| h.mode.as_deref()).and_then(norm::parse_flag),
            maximum_age: hsts.and_then(|h| h.maximum_age),
            include_subdomains: hsts
                .and_then(|h| h.include_subdomains.as_deref())
                .and_then(norm::parse_flag),
            truncated_redirects: enforcement
                .and_then(|e| e.truncated_redirects.as_deref())
                .and_then(norm::parse_flag),
            pipeline: enforcement.and_then(|e| e.pipeline.clone()),
            unknown_method: enforcement.and_then(|e| e.unknown_method.clone()),
            max_header_count: enforcement.and_then(|e| e.max_header_count),
            max_header_size: enforcement.and_then(|e| e.max_header_size),
            max_requests: enforcement.and_then(|e| e.max_requests),
            known_methods: enforcement.and_then(|e| e.known_methods.clone()),
            sflow_poll_interval: sflow.and_then(|s| s.poll_interval),
            sflow_poll_interval_global: sflow
                .and_then(|s| s.poll_interval_global.as_deref())
                .and_then(norm::parse_flag),
            sflow_sampling_rate: sflow.and_then(|s| s.sampling_rate),
            sflow_sampling_rate_global: sflow
                .and_then(|s| s.sampling_rate_global.as_deref())
                .and_then(norm::parse_flag),
        }
    }
}

// ── Patch body ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResolverReference {
    link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExplicitProxyPatch {
    dns_resolver: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dns_resolver_reference: Option<ResolverReference>,
}

#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HstsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    maximum_age: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_subdomains: Option<&'static str>,
}

#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EnforcementPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    truncated_redirects: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pipeline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unknown_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_header_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_header_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_requests: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    known_methods: Option<Vec<String>>,
}

#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SflowPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    poll_interval: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    poll_interval_global: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sampling_rate: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sampling_rate_global: Option<&'static str>,
}

#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HttpProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    defaults_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    insert_xforwarded_for: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_rewrite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    encrypt_cookies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    encrypt_cookie_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxy_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    explicit_proxy: Option<ExplicitProxyPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    accept_xff: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    xff_alternative_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback_status_codes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    oneconnect_transformations: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_chunking: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_chunking: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    server_agent_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    header_erase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    header_insert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hsts: Option<HstsPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enforcement: Option<EnforcementPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sflow: Option<SflowPatch>,
}

// ── Difference ──────────────────────────────────────────────────────

/// `https://localhost/mgmt/tm/net/dns-resolver/~Common~foo` -- the
/// reference link the explicit-proxy patch carries alongside the name.
fn resolver_link(fq: &str) -> String {
    format!(
        "https://localhost/mgmt/tm/net/dns-resolver/{}",
        fq.replace('/', "~")
    )
}

/// Desired `""`/`"none"` equals an unset/`"none"` device value;
/// otherwise a plain inequality check.
fn none_folded_changed(want: Option<&str>, have: Option<&str>) -> Option<String> {
    let want = want?;
    if norm::is_none_marker(want) && have.is_none_or(norm::is_none_marker) {
        return None;
    }
    if Some(want) == have {
        return None;
    }
    Some(want.to_owned())
}

/// Collapse a known-methods list back to its report form: the exact
/// built-in set renders as `["default"]`, a superset as the extras plus
/// `"default"`.
fn report_known_methods(methods: &[String]) -> Value {
    if methods.is_empty() {
        return json!([""]);
    }
    let set: BTreeSet<&str> = methods.iter().map(String::as_str).collect();
    let defaults: BTreeSet<&str> = KNOWN_METHOD_DEFAULTS.into_iter().collect();
    if set == defaults {
        return json!(["default"]);
    }
    if set.is_superset(&defaults) {
        let mut extras: Vec<&str> = set.difference(&defaults).copied().collect();
        extras.push("default");
        return json!(extras);
    }
    json!(methods)
}

struct DiffContext {
    update_password: UpdatePassword,
    creating: bool,
}

#[allow(clippy::too_many_lines, clippy::cognitive_complexity)]
fn diff(
    want: &Normalized,
    have: &Normalized,
    ctx: &DiffContext,
) -> Result<(HttpProfilePatch, Changes), CoreError> {
    let mut patch = HttpProfilePatch::default();
    let mut changes = Changes::new();

    // Parent is create-time only; a differing parent on update is an error.
    if let Some(wp) = &want.parent {
        match &have.parent {
            Some(hp) if wp == hp => {}
            Some(_) => {
                return Err(CoreError::validation(
                    "parent",
                    "The parent http profile cannot be changed",
                ));
            }
            None => {
                patch.defaults_from = Some(wp.clone());
                changes.record("parent", Value::Null, json!(wp));
            }
        }
    }

    if want.description.is_some() && want.description != have.description {
        patch.description = want.description.clone();
        changes.record(
            "description",
            norm::str_report(have.description.as_deref()),
            norm::str_report(want.description.as_deref()),
        );
    }
    if want.insert_xforwarded_for.is_some()
        && want.insert_xforwarded_for != have.insert_xforwarded_for
    {
        patch.insert_xforwarded_for = want.insert_xforwarded_for.map(norm::on_off);
        changes.record(
            "insert_xforwarded_for",
            norm::flag_report(have.insert_xforwarded_for),
            norm::flag_report(want.insert_xforwarded_for),
        );
    }
    if want.redirect_rewrite.is_some() && want.redirect_rewrite != have.redirect_rewrite {
        patch.redirect_rewrite = want.redirect_rewrite.clone();
        changes.record(
            "redirect_rewrite",
            norm::str_report(have.redirect_rewrite.as_deref()),
            norm::str_report(want.redirect_rewrite.as_deref()),
        );
    }

    if let Some(want_cookies) = &want.encrypt_cookies {
        let have_cookies = have.encrypt_cookies.as_deref().unwrap_or(&[]);
        let want_set: BTreeSet<&str> = want_cookies.iter().map(String::as_str).collect();
        let have_set: BTreeSet<&str> = have_cookies.iter().map(String::as_str).collect();
        if want_set != have_set {
            patch.encrypt_cookies = Some(want_cookies.clone());
            changes.record_cleared(
                "encrypt_cookies",
                json!(have_cookies),
                json!(want_cookies),
            );
        }
    }

    // The secret is write-only: it cannot be compared, only rewritten.
    if let Some(secret) = &want.encrypt_cookie_secret {
        if ctx.creating || ctx.update_password == UpdatePassword::Always {
            patch.encrypt_cookie_secret = Some(secret.clone());
            changes.record("encrypt_cookie_secret", Value::Null, json!("<redacted>"));
        }
    }

    if want.proxy_type.is_some() && want.proxy_type != have.proxy_type {
        patch.proxy_type = want.proxy_type.clone();
        changes.record(
            "proxy_type",
            norm::str_report(have.proxy_type.as_deref()),
            norm::str_report(want.proxy_type.as_deref()),
        );
    }

    match want.dns_resolver.as_deref() {
        None => {}
        Some("") => {
            let have_unset = have.dns_resolver.as_deref().is_none_or(norm::is_none_marker);
            if !have_unset {
                if have.proxy_type.as_deref() == Some("explicit") && want.proxy_type.is_none() {
                    return Err(CoreError::validation(
                        "dns_resolver",
                        "DNS resolver cannot be empty or 'none' if an existing profile proxy type is set to explicit",
                    ));
                }
                patch.explicit_proxy = Some(ExplicitProxyPatch {
                    dns_resolver: String::new(),
                    dns_resolver_reference: None,
                });
                changes.record_cleared(
                    "dns_resolver",
                    norm::str_report(have.dns_resolver.as_deref()),
                    json!(""),
                );
            }
        }
        Some(fq) => {
            if have.dns_resolver.as_deref() != Some(fq) {
                patch.explicit_proxy = Some(ExplicitProxyPatch {
                    dns_resolver: fq.to_owned(),
                    dns_resolver_reference: Some(ResolverReference {
                        link: resolver_link(fq),
                    }),
                });
                changes.record(
                    "dns_resolver",
                    norm::str_report(have.dns_resolver.as_deref()),
                    json!(fq),
                );
            }
        }
    }

    if want.accept_xff.is_some() && want.accept_xff != have.accept_xff {
        patch.accept_xff = want.accept_xff.map(norm::on_off);
        changes.record(
            "accept_xff",
            norm::flag_report(have.accept_xff),
            norm::flag_report(want.accept_xff),
        );
    }
    if let Some(v) = norm::cmp_simple_list(
        want.xff_alternative_names.as_deref(),
        have.xff_alternative_names.as_deref(),
    ) {
        changes.record_cleared(
            "xff_alternative_names",
            norm::list_report(have.xff_alternative_names.as_deref()),
            json!(v),
        );
        patch.xff_alternative_names = Some(v);
    }
    if want.fallback_host.is_some() && want.fallback_host != have.fallback_host {
        patch.fallback_host = want.fallback_host.clone();
        changes.record(
            "fallback_host",
            norm::str_report(have.fallback_host.as_deref()),
            norm::str_report(want.fallback_host.as_deref()),
        );
    }
    if let Some(v) = norm::cmp_simple_list(
        want.fallback_status_codes.as_deref(),
        have.fallback_status_codes.as_deref(),
    ) {
        changes.record_cleared(
            "fallback_status_codes",
            norm::list_report(have.fallback_status_codes.as_deref()),
            json!(v),
        );
        patch.fallback_status_codes = Some(v);
    }
    if want.oneconnect_transformations.is_some()
        && want.oneconnect_transformations != have.oneconnect_transformations
    {
        patch.oneconnect_transformations = want.oneconnect_transformations.map(norm::on_off);
        changes.record(
            "oneconnect_transformations",
            norm::flag_report(have.oneconnect_transformations),
            norm::flag_report(want.oneconnect_transformations),
        );
    }
    if want.request_chunking.is_some() && want.request_chunking != have.request_chunking {
        patch.request_chunking = want.request_chunking.clone();
        changes.record(
            "request_chunking",
            norm::str_report(have.request_chunking.as_deref()),
            norm::str_report(want.request_chunking.as_deref()),
        );
    }
    if want.response_chunking.is_some() && want.response_chunking != have.response_chunking {
        patch.response_chunking = want.response_chunking.clone();
        changes.record(
            "response_chunking",
            norm::str_report(have.response_chunking.as_deref()),
            norm::str_report(want.response_chunking.as_deref()),
        );
    }

    if let Some(v) = none_folded_changed(
        want.server_agent_name.as_deref(),
        have.server_agent_name.as_deref(),
    ) {
        changes.record_cleared(
            "server_agent_name",
            norm::str_report(have.server_agent_name.as_deref()),
            json!(v),
        );
        patch.server_agent_name = Some(v);
    }
    if let Some(v) =
        none_folded_changed(want.header_erase.as_deref(), have.header_erase.as_deref())
    {
        changes.record_cleared(
            "header_erase",
            norm::str_report(have.header_erase.as_deref()),
            json!(v),
        );
        patch.header_erase = Some(v);
    }
    if let Some(v) =
        none_folded_changed(want.header_insert.as_deref(), have.header_insert.as_deref())
    {
        changes.record_cleared(
            "header_insert",
            norm::str_report(have.header_insert.as_deref()),
            json!(v),
        );
        patch.header_insert = Some(v);
    }

    // ── HSTS group ──
    let mut hsts = HstsPatch::default();
    if want.hsts_mode.is_some() && want.hsts_mode != have.hsts_mode {
        hsts.mode = want.hsts_mode.map(norm::on_off);
        changes.record(
            "hsts_mode",
            norm::flag_report(have.hsts_mode),
            norm::flag_report(want.hsts_mode),
        );
    }
    if want.maximum_age.is_some() && want.maximum_age != have.maximum_age {
        hsts.maximum_age = want.maximum_age;
        changes.record(
            "maximum_age",
            norm::sentinel_report(have.maximum_age, MAXIMUM_AGE_INDEFINITE, "indefinite"),
            norm::sentinel_report(want.maximum_age, MAXIMUM_AGE_INDEFINITE, "indefinite"),
        );
    }
    if want.include_subdomains.is_some() && want.include_subdomains != have.include_subdomains {
        hsts.include_subdomains = want.include_subdomains.map(norm::on_off);
        changes.record(
            "include_subdomains",
            norm::flag_report(have.include_subdomains),
            norm::flag_report(want.include_subdomains),
        );
    }
    if hsts != HstsPatch::default() {
        patch.hsts = Some(hsts);
    }

    // ── Enforcement group ──
    let mut enforcement = EnforcementPatch::default();
    if want.truncated_redirects.is_some()
        && want.truncated_redirects != have.truncated_redirects
    {
        enforcement.truncated_redirects = want.truncated_redirects.map(norm::on_off);
        changes.record(
            "truncated_redirects",
            norm::flag_report(have.truncated_redirects),
            norm::flag_report(want.truncated_redirects),
        );
    }
    if want.pipeline.is_some() && want.pipeline != have.pipeline {
        enforcement.pipeline = want.pipeline.clone();
        changes.record(
            "pipeline",
            norm::str_report(have.pipeline.as_deref()),
            norm::str_report(want.pipeline.as_deref()),
        );
    }
    if want.unknown_method.is_some() && want.unknown_method != have.unknown_method {
        enforcement.unknown_method = want.unknown_method.clone();
        changes.record(
            "unknown_method",
            norm::str_report(have.unknown_method.as_deref()),
            norm::str_report(want.unknown_method.as_deref()),
        );
    }
    if want.max_header_count.is_some() && want.max_header_count != have.max_header_count {
        enforcement.max_header_count = want.max_header_count;
        changes.record(
            "max_header_count",
            norm::sentinel_report(have.max_header_count, MAX_HEADER_COUNT_DEFAULT, "default"),
            norm::sentinel_report(want.max_header_count, MAX_HEADER_COUNT_DEFAULT, "default"),
        );
    }
    if want.max_header_size.is_some() && want.max_header_size != have.max_header_size {
        enforcement.max_header_size = want.max_header_size;
        changes.record(
            "max_header_size",
            norm::sentinel_report(have.max_header_size, MAX_HEADER_SIZE_DEFAULT, "default"),
            norm::sentinel_report(want.max_header_size, MAX_HEADER_SIZE_DEFAULT, "default"),
        );
    }
    if want.max_requests.is_some() && want.max_requests != have.max_requests {
        enforcement.max_requests = want.max_requests;
        changes.record(
            "max_requests",
            norm::sentinel_report(have.max_requests, MAX_REQUESTS_DEFAULT, "default"),
            norm::sentinel_report(want.max_requests, MAX_REQUESTS_DEFAULT, "default"),
        );
    }
    if let Some(v) = norm::cmp_simple_list(
        want.known_methods.as_deref(),
        have.known_methods.as_deref(),
    ) {
        changes.record_cleared(
            "known_methods",
            have.known_methods
                .as_deref()
                .map_or(Value::Null, report_known_methods),
            report_known_methods(&v),
        );
        enforcement.known_methods = Some(v);
    }
    if enforcement != EnforcementPatch::default() {
        patch.enforcement = Some(enforcement);
    }

    // ── sFlow group ──
    let mut sflow = SflowPatch::default();
    if want.sflow_poll_interval.is_some()
        && want.sflow_poll_interval != have.sflow_poll_interval
    {
        sflow.poll_interval = want.sflow_poll_interval;
        changes.record(
            "poll_interval",
            norm::num_report(have.sflow_poll_interval),
            norm::num_report(want.sflow_poll_interval),
        );
    }
    if want.sflow_poll_interval_global.is_some()
        && want.sflow_poll_interval_global != have.sflow_poll_interval_global
    {
        sflow.poll_interval_global = want
            .sflow_poll_interval_global
            .map(|v| if v { "yes" } else { "no" });
        changes.record(
            "poll_interval_global",
            norm::flag_report(have.sflow_poll_interval_global),
            norm::flag_report(want.sflow_poll_interval_global),
        );
    }
    if want.sflow_sampling_rate.is_some()
        && want.sflow_sampling_rate != have.sflow_sampling_rate
    {
        sflow.sampling_rate = want.sflow_sampling_rate;
        changes.record(
            "sampling_rate",
            norm::num_report(have.sflow_sampling_rate),
            norm::num_report(want.sflow_sampling_rate),
        );
    }
    if want.sflow_sampling_rate_global.is_some()
        && want.sflow_sampling_rate_global != have.sflow_sampling_rate_global
    {
        sflow.sampling_rate_global = want
            .sflow_sampling_rate_global
            .map(|v| if v { "yes" } else { "no" });
        changes.record(
            "sampling_rate_global",
            norm::flag_report(have.sflow_sampling_rate_global),
            norm::flag_report(want.sflow_sampling_rate_global),
        );
    }
    if sflow != SflowPatch::default() {
        patch.sflow = Some(sflow);
    }

    Ok((patch, changes))
}

// ── Manager ─────────────────────────────────────────────────────────

/// Reconciles one HTTP profile against the device.
pub struct HttpProfileManager<'a> {
    device: &'a Device,
    spec: &'a HttpProfileSpec,
}

impl<'a> HttpProfileManager<'a> {
    pub fn new(device: &'a Device, spec: &'a HttpProfileSpec) -> Self {
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
            .http_profile_exists(self.partition(), &self.spec.name)
            .await?;
        if exists {
            self.update(check).await
        } else {
            self.create(check).await
        }
    }

    async fn create(&self, check: bool) -> Result<Outcome, CoreError> {
        let want = self.spec.normalize(self.partition())?;
        let ctx = DiffContext {
            update_password: self.spec.update_password,
            creating: true,
        };
        let (patch, changes) = diff(&want, &Normalized::default(), &ctx)?;
        if check {
            return Ok(Outcome::created(changes));
        }
        let body = Create {
            name: &self.spec.name,
            partition: self.partition(),
            attrs: &patch,
        };
        self.device.rest().create_http_profile(&body).await?;
        Ok(Outcome::created(changes))
    }

    async fn update(&self, check: bool) -> Result<Outcome, CoreError> {
        let current = self
            .device
            .rest()
            .read_http_profile(self.partition(), &self.spec.name)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                kind: "http profile".into(),
                name: self.spec.name.clone(),
            })?;
        let have = Normalized::from_api(&current);
        let want = self.spec.normalize(self.partition())?;
        let ctx = DiffContext {
            update_password: self.spec.update_password,
            creating: false,
        };
        let (patch, changes) = diff(&want, &have, &ctx)?;
        if changes.is_empty() {
            return Ok(Outcome::unchanged());
        }
        if check {
            return Ok(Outcome::updated(changes));
        }
        self.device
            .rest()
            .patch_http_profile(self.partition(), &self.spec.name, &patch)
            .await?;
        Ok(Outcome::updated(changes))
    }

    async fn absent(&self, check: bool) -> Result<Outcome, CoreError> {
        let exists = self
            .device
            .rest()
            .http_profile_exists(self.partition(), &self.spec.name)
            .await?;
        if !exists {
            return Ok(Outcome::unchanged());
        }
        if check {
            return Ok(Outcome::deleted());
        }
        self.device
            .rest()
            .delete_http_profile(self.partition(), &self.spec.name)
            .await?;
        if self
            .device
            .rest()
            .http_profile_exists(self.partition(), &self.spec.name)
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

    fn spec(value: Value) -> HttpProfileSpec {
        serde_json::from_value(value).expect("valid spec")
    }

    fn update_ctx() -> DiffContext {
        DiffContext {
            update_password: UpdatePassword::Always,
            creating: false,
        }
    }

    fn api_fixture() -> HttpProfile {
        serde_json::from_value(json!({
            "name": "app-http",
            "partition": "Common",
            "defaultsFrom": "/Common/http",
            "description": "web tier",
            "insertXforwardedFor": "enabled",
            "proxyType": "reverse",
            "acceptXff": "disabled",
            "hsts": {
                "mode": "disabled",
                "maximumAge": 16_070_400u64,
                "includeSubdomains": "enabled"
            },
            "enforcement": {
                "truncatedRedirects": "disabled",
                "pipeline": "allow",
                "unknownMethod": "allow",
                "maxHeaderCount": 64,
                "maxHeaderSize": 32_768,
                "maxRequests": 0,
                "knownMethods": [
                    "CONNECT", "DELETE", "GET", "HEAD", "LOCK", "OPTIONS",
                    "POST", "PROPFIND", "PUT", "TRACE", "UNLOCK"
                ]
            },
            "sflow": {
                "pollInterval": 10,
                "pollIntervalGlobal": "yes",
                "samplingRate": 0,
                "samplingRateGlobal": "yes"
            }
        }))
        .expect("valid fixture")
    }

    #[test]
    fn normalize_maps_keywords_and_qualifies_names() {
        let s = spec(json!({
            "name": "app-http",
            "parent": "http",
            "dns_resolver": "internal",
            "proxy_type": "explicit",
            "hsts": { "maximum_age": "indefinite" },
            "enforcement": { "max_header_count": "default" }
        }));
        let n = s.normalize("Common").expect("normalizes");
        assert_eq!(n.parent.as_deref(), Some("/Common/http"));
        assert_eq!(n.dns_resolver.as_deref(), Some("/Common/internal"));
        assert_eq!(n.maximum_age, Some(MAXIMUM_AGE_INDEFINITE));
        assert_eq!(n.max_header_count, Some(MAX_HEADER_COUNT_DEFAULT));
    }

    #[test]
    fn explicit_proxy_requires_resolver() {
        let s = spec(json!({ "name": "app-http", "proxy_type": "explicit" }));
        assert!(matches!(
            s.normalize("Common"),
            Err(CoreError::Validation { .. })
        ));

        let s = spec(json!({
            "name": "app-http",
            "proxy_type": "explicit",
            "dns_resolver": "none"
        }));
        assert!(s.normalize("Common").is_err());
    }

    #[test]
    fn fallback_status_codes_are_validated() {
        let s = spec(json!({ "name": "app-http", "fallback_status_codes": ["404", "503"] }));
        assert!(s.normalize("Common").is_ok());

        let s = spec(json!({ "name": "app-http", "fallback_status_codes": ["418"] }));
        assert!(s.normalize("Common").is_err());

        let s = spec(json!({ "name": "app-http", "fallback_status_codes": ["506"] }));
        assert!(s.normalize("Common").is_err());
    }

    #[test]
    fn header_insert_requires_name_value_form() {
        let s = spec(json!({ "name": "app-http", "header_insert": "X-Forwarded-Proto" }));
        assert!(s.normalize("Common").is_err());

        let s = spec(json!({ "name": "app-http", "header_insert": "X-Forwarded-Proto:https" }));
        assert!(s.normalize("Common").is_ok());
    }

    #[test]
    fn known_methods_expand_default_keyword() {
        let expanded = expand_known_methods(&["default".to_owned()]);
        assert_eq!(expanded.len(), 11);

        let expanded = expand_known_methods(&["default".to_owned(), "PATCH".to_owned()]);
        assert_eq!(expanded.len(), 12);
        assert!(expanded.contains(&"PATCH".to_owned()));

        assert!(expand_known_methods(&[String::new()]).is_empty());
    }

    #[test]
    fn diff_is_idempotent_against_matching_device_state() {
        let s = spec(json!({
            "name": "app-http",
            "parent": "http",
            "description": "web tier",
            "insert_xforwarded_for": true,
            "enforcement": { "known_methods": ["default"] },
            "sflow": { "poll_interval": 10 }
        }));
        let want = s.normalize("Common").expect("normalizes");
        let have = Normalized::from_api(&api_fixture());
        let (patch, changes) = diff(&want, &have, &update_ctx()).expect("diffs");
        assert!(changes.is_empty(), "unexpected changes: {changes:?}");
        assert_eq!(patch, HttpProfilePatch::default());
    }

    #[test]
    fn parent_change_is_rejected() {
        let s = spec(json!({ "name": "app-http", "parent": "other" }));
        let want = s.normalize("Common").expect("normalizes");
        let have = Normalized::from_api(&api_fixture());
        assert!(matches!(
            diff(&want, &have, &update_ctx()),
            Err(CoreError::Validation { .. })
        ));
    }

    #[test]
    fn clearing_resolver_under_explicit_proxy_is_rejected() {
        let s = spec(json!({ "name": "app-http", "dns_resolver": "none" }));
        let want = s.normalize("Common").expect("normalizes");
        let mut have = Normalized::from_api(&api_fixture());
        have.proxy_type = Some("explicit".into());
        have.dns_resolver = Some("/Common/internal".into());
        assert!(diff(&want, &have, &update_ctx()).is_err());

        // Clearing when the device has no resolver is a no-op.
        let have = Normalized::from_api(&api_fixture());
        let (_, changes) = diff(&want, &have, &update_ctx()).expect("diffs");
        assert!(changes.is_empty());
    }

    #[test]
    fn resolver_patch_carries_reference_link() {
        let s = spec(json!({ "name": "app-http", "dns_resolver": "internal" }));
        let want = s.normalize("Common").expect("normalizes");
        let have = Normalized::from_api(&api_fixture());
        let (patch, _) = diff(&want, &have, &update_ctx()).expect("diffs");
        let body = serde_json::to_value(&patch).expect("serializes");
        assert_eq!(
            body,
            json!({
                "explicitProxy": {
                    "dnsResolver": "/Common/internal",
                    "dnsResolverReference": {
                        "link": "https://localhost/mgmt/tm/net/dns-resolver/~Common~internal"
                    }
                }
            })
        );
    }

    #[test]
    fn settings_groups_nest_on_the_wire() {
        let s = spec(json!({
            "name": "app-http",
            "hsts": { "enabled": true, "maximum_age": 300 },
            "enforcement": { "max_header_count": 128 }
        }));
        let want = s.normalize("Common").expect("normalizes");
        let have = Normalized::from_api(&api_fixture());
        let (patch, changes) = diff(&want, &have, &update_ctx()).expect("diffs");
        assert_eq!(changes.len(), 3);
        let body = serde_json::to_value(&patch).expect("serializes");
        assert_eq!(
            body,
            json!({
                "hsts": { "mode": "enabled", "maximumAge": 300 },
                "enforcement": { "maxHeaderCount": 128 }
            })
        );
    }

    #[test]
    fn cookie_secret_respects_update_password_policy() {
        let s = spec(json!({
            "name": "app-http",
            "encrypt_cookie_secret": "hush",
            "update_password": "on_create"
        }));
        let want = s.normalize("Common").expect("normalizes");
        let have = Normalized::from_api(&api_fixture());

        let ctx = DiffContext {
            update_password: UpdatePassword::OnCreate,
            creating: false,
        };
        let (patch, changes) = diff(&want, &have, &ctx).expect("diffs");
        assert!(changes.is_empty());
        assert_eq!(patch.encrypt_cookie_secret, None);

        let ctx = DiffContext {
            update_password: UpdatePassword::OnCreate,
            creating: true,
        };
        let (patch, _) = diff(&want, &Normalized::default(), &ctx).expect("diffs");
        assert_eq!(patch.encrypt_cookie_secret.as_deref(), Some("hush"));
    }

    #[test]
    fn reports_collapse_sentinels_to_keywords() {
        let s = spec(json!({
            "name": "app-http",
            "hsts": { "maximum_age": "indefinite" },
            "enforcement": { "max_requests": "default", "known_methods": ["default", "PATCH"] }
        }));
        let want = s.normalize("Common").expect("normalizes");
        let mut have = Normalized::from_api(&api_fixture());
        have.max_requests = Some(10);
        have.known_methods = Some(vec!["GET".into()]);
        let (_, changes) = diff(&want, &have, &update_ctx()).expect("diffs");

        let by_field: std::collections::HashMap<&str, &crate::diff::FieldChange> =
            changes.iter().map(|c| (c.field, c)).collect();
        assert_eq!(by_field["maximum_age"].new, json!("indefinite"));
        assert_eq!(by_field["max_requests"].new, json!("default"));
        assert_eq!(by_field["known_methods"].new, json!(["PATCH", "default"]));
    }
}
