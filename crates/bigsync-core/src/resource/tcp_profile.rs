// ── LTM TCP profile ──
//
// Flags travel as `enabled`/`disabled` on the wire; `idle_timeout`
// accepts `"indefinite"` (sentinel 4294967295) and renders it back the
// same way in reports.

use serde::{Deserialize, Serialize};

use bigsync_api::rest::models::TcpProfile;

use crate::device::Device;
use crate::diff::{Changes, Outcome};
use crate::error::CoreError;
use crate::norm::{self, NumericOrKeyword};
use crate::resource::{Create, ResourceState};

const IDLE_TIMEOUT_INDEFINITE: u64 = 4_294_967_295;

/// Desired state for an LTM TCP profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TcpProfileSpec {
    pub name: String,
    /// Partition the profile lives in; falls back to the device default.
    pub partition: Option<String>,
    #[serde(default)]
    pub state: ResourceState,
    /// Parent profile to inherit from.
    pub parent: Option<String>,
    /// Idle timeout in seconds, or `"indefinite"`.
    pub idle_timeout: Option<NumericOrKeyword>,
    pub time_wait_recycle: Option<bool>,
    /// `enabled`, `disabled`, or `auto`.
    pub nagle: Option<String>,
    pub early_retransmit: Option<bool>,
    pub proxy_options: Option<bool>,
    /// Initial congestion window, in MSS units (0-16).
    pub initial_congestion_window_size: Option<u64>,
    /// Initial receive window, in MSS units (0-16).
    pub initial_receive_window_size: Option<u64>,
    /// SYN retransmission base timeout in milliseconds (0-5000).
    pub syn_rto_base: Option<u64>,
}

// ── Normalized form ─────────────────────────────────────────────────

/// Wire-value representation shared by the desired and current state.
#[derive(Debug, Clone, Default, PartialEq)]
struct Normalized {
    parent: Option<String>,
    idle_timeout: Option<u64>,
    time_wait_recycle: Option<bool>,
    nagle: Option<String>,
    early_retransmit: Option<bool>,
    proxy_options: Option<bool>,
    init_cwnd: Option<u64>,
    init_rwnd: Option<u64>,
    syn_rto_base: Option<u64>,
}

impl TcpProfileSpec {
    fn normalize(&self, partition: &str) -> Result<Normalized, CoreError> {
        Ok(Normalized {
            parent: self.parent.as_deref().map(|p| norm::fq_name(partition, p)),
            idle_timeout: self
                .idle_timeout
                .as_ref()
                .map(|v| {
                    v.resolve(
                        "idle_timeout",
                        "indefinite",
                        IDLE_TIMEOUT_INDEFINITE,
                        1..=IDLE_TIMEOUT_INDEFINITE,
                    )
                })
                .transpose()?,
            time_wait_recycle: self.time_wait_recycle,
            nagle: self.nagle.clone(),
            early_retransmit: self.early_retransmit,
            proxy_options: self.proxy_options,
            init_cwnd: self
                .initial_congestion_window_size
                .map(|v| norm::check_range("initial_congestion_window_size", v, 0..=16))
                .transpose()?,
            init_rwnd: self
                .initial_receive_window_size
                .map(|v| norm::check_range("initial_receive_window_size", v, 0..=16))
                .transpose()?,
            syn_rto_base: self
                .syn_rto_base
                .map(|v| norm::check_range("syn_rto_base", v, 0..=5000))
                .transpose()?,
        })
    }
}

impl Normalized {
    fn from_api(api: &TcpProfile) -> Self {
        Self {
            parent: api.defaults_from.clone(),
            idle_timeout: api.idle_timeout,
            time_wait_recycle: api.time_wait_recycle.as_deref().and_then(norm::parse_flag),
            nagle: api.nagle.clone(),
            early_retransmit: api.early_retransmit.as_deref().and_then(norm::parse_flag),
            proxy_options: api.proxy_options.as_deref().and_then(norm::parse_flag),
            init_cwnd: api.init_cwnd,
            init_rwnd: api.init_rwnd,
            syn_rto_base: api.syn_rto_base,
        }
    }
}

// ── Patch body ──────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TcpProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    defaults_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    idle_timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_wait_recycle: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nagle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    early_retransmit: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxy_options: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    init_cwnd: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    init_rwnd: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    syn_rto_base: Option<u64>,
}

/// Render the idle timeout for reports, folding the sentinel back to
/// its keyword.
fn idle_report(value: Option<u64>) -> serde_json::Value {
    norm::sentinel_report(value, IDLE_TIMEOUT_INDEFINITE, "indefinite")
}

/// Field-by-field difference. Only fields the user set participate;
/// equal values produce no patch entry.
fn diff(want: &Normalized, have: &Normalized) -> (TcpProfilePatch, Changes) {
    let mut patch = TcpProfilePatch::default();
    let mut changes = Changes::new();

    if want.parent.is_some() && want.parent != have.parent {
        patch.defaults_from = want.parent.clone();
        changes.record(
            "parent",
            norm::str_report(have.parent.as_deref()),
            norm::str_report(want.parent.as_deref()),
        );
    }
    if want.idle_timeout.is_some() && want.idle_timeout != have.idle_timeout {
        patch.idle_timeout = want.idle_timeout;
        changes.record(
            "idle_timeout",
            idle_report(have.idle_timeout),
            idle_report(want.idle_timeout),
        );
    }
    if want.time_wait_recycle.is_some() && want.time_wait_recycle != have.time_wait_recycle {
        patch.time_wait_recycle = want.time_wait_recycle.map(norm::on_off);
        changes.record(
            "time_wait_recycle",
            norm::flag_report(have.time_wait_recycle),
            norm::flag_report(want.time_wait_recycle),
        );
    }
    if want.nagle.is_some() && want.nagle != have.nagle {
        patch.nagle = want.nagle.clone();
        changes.record(
            "nagle",
            norm::str_report(have.nagle.as_deref()),
            norm::str_report(want.nagle.as_deref()),
        );
    }
    if want.early_retransmit.is_some() && want.early_retransmit != have.early_retransmit {
        patch.early_retransmit = want.early_retransmit.map(norm::on_off);
        changes.record(
            "early_retransmit",
            norm::flag_report(have.early_retransmit),
            norm::flag_report(want.early_retransmit),
        );
    }
    if want.proxy_options.is_some() && want.proxy_options != have.proxy_options {
        patch.proxy_options = want.proxy_options.map(norm::on_off);
        changes.record(
            "proxy_options",
            norm::flag_report(have.proxy_options),
            norm::flag_report(want.proxy_options),
        );
    }
    if want.init_cwnd.is_some() && want.init_cwnd != have.init_cwnd {
        patch.init_cwnd = want.init_cwnd;
        changes.record(
            "initial_congestion_window_size",
            norm::num_report(have.init_cwnd),
            norm::num_report(want.init_cwnd),
        );
    }
    if want.init_rwnd.is_some() && want.init_rwnd != have.init_rwnd {
        patch.init_rwnd = want.init_rwnd;
        changes.record(
            "initial_receive_window_size",
            norm::num_report(have.init_rwnd),
            norm::num_report(want.init_rwnd),
        );
    }
    if want.syn_rto_base.is_some() && want.syn_rto_base != have.syn_rto_base {
        patch.syn_rto_base = want.syn_rto_base;
        changes.record(
            "syn_rto_base",
            norm::num_report(have.syn_rto_base),
            norm::num_report(want.syn_rto_base),
        );
    }

    (patch, changes)
}

// ── Manager ─────────────────────────────────────────────────────────

/// Reconciles one TCP profile against the device.
pub struct TcpProfileManager<'a> {
    device: &'a Device,
    spec: &'a TcpProfileSpec,
}

impl<'a> TcpProfileManager<'a> {
    pub fn new(device: &'a Device, spec: &'a TcpProfileSpec) -> Self {
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
            .tcp_profile_exists(self.partition(), &self.spec.name)
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
        self.device.rest().create_tcp_profile(&body).await?;
        Ok(Outcome::created(changes))
    }

    async fn update(&self, check: bool) -> Result<Outcome, CoreError> {
        let current = self
            .device
            .rest()
            .read_tcp_profile(self.partition(), &self.spec.name)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                kind: "tcp profile".into(),
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
            .patch_tcp_profile(self.partition(), &self.spec.name, &patch)
            .await?;
        Ok(Outcome::updated(changes))
    }

    async fn absent(&self, check: bool) -> Result<Outcome, CoreError> {
        let exists = self
            .device
            .rest()
            .tcp_profile_exists(self.partition(), &self.spec.name)
            .await?;
        if !exists {
            return Ok(Outcome::unchanged());
        }
        if check {
            return Ok(Outcome::deleted());
        }
        self.device
            .rest()
            .delete_tcp_profile(self.partition(), &self.spec.name)
            .await?;
        if self
            .device
            .rest()
            .tcp_profile_exists(self.partition(), &self.spec.name)
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

    fn spec(overrides: serde_json::Value) -> TcpProfileSpec {
        let mut base = json!({ "name": "foo" });
        base.as_object_mut()
            .expect("object")
            .extend(overrides.as_object().expect("object").clone());
        serde_json::from_value(base).expect("valid spec")
    }

    #[test]
    fn normalize_qualifies_parent_and_resolves_indefinite() {
        let s = spec(json!({ "parent": "tcp", "idle_timeout": "indefinite" }));
        let n = s.normalize("Common").expect("normalizes");
        assert_eq!(n.parent.as_deref(), Some("/Common/tcp"));
        assert_eq!(n.idle_timeout, Some(IDLE_TIMEOUT_INDEFINITE));
    }

    #[test]
    fn normalize_rejects_out_of_range_windows() {
        let s = spec(json!({ "initial_congestion_window_size": 17 }));
        assert!(matches!(
            s.normalize("Common"),
            Err(CoreError::Validation { .. })
        ));

        let s = spec(json!({ "syn_rto_base": 5001 }));
        assert!(s.normalize("Common").is_err());
    }

    #[test]
    fn from_api_parses_wire_flags() {
        let api: TcpProfile = serde_json::from_value(json!({
            "name": "foo",
            "partition": "Common",
            "defaultsFrom": "/Common/tcp",
            "idleTimeout": 300,
            "timeWaitRecycle": "enabled",
            "nagle": "auto",
            "earlyRetransmit": "disabled",
            "proxyOptions": "disabled",
            "initCwnd": 10,
            "initRwnd": 10,
            "synRtoBase": 3000
        }))
        .expect("valid fixture");
        let have = Normalized::from_api(&api);
        assert_eq!(have.time_wait_recycle, Some(true));
        assert_eq!(have.early_retransmit, Some(false));
        assert_eq!(have.idle_timeout, Some(300));
    }

    #[test]
    fn diff_is_empty_when_states_match() {
        let s = spec(json!({ "idle_timeout": 300, "nagle": "auto" }));
        let want = s.normalize("Common").expect("normalizes");
        let have = Normalized {
            idle_timeout: Some(300),
            nagle: Some("auto".into()),
            ..Normalized::default()
        };
        let (patch, changes) = diff(&want, &have);
        assert!(changes.is_empty());
        assert_eq!(patch, TcpProfilePatch::default());
    }

    #[test]
    fn diff_patches_only_changed_fields() {
        let s = spec(json!({
            "idle_timeout": 600,
            "time_wait_recycle": false,
            "syn_rto_base": 3000
        }));
        let want = s.normalize("Common").expect("normalizes");
        let have = Normalized {
            idle_timeout: Some(300),
            time_wait_recycle: Some(true),
            syn_rto_base: Some(3000),
            ..Normalized::default()
        };
        let (patch, changes) = diff(&want, &have);
        assert_eq!(changes.len(), 2);
        assert_eq!(patch.idle_timeout, Some(600));
        assert_eq!(patch.time_wait_recycle, Some("disabled"));
        assert_eq!(patch.syn_rto_base, None);
        let body = serde_json::to_value(&patch).expect("serializes");
        assert_eq!(
            body,
            json!({ "idleTimeout": 600, "timeWaitRecycle": "disabled" })
        );
    }

    #[test]
    fn report_renders_indefinite_keyword() {
        let s = spec(json!({ "idle_timeout": "indefinite" }));
        let want = s.normalize("Common").expect("normalizes");
        let (_, changes) = diff(&want, &Normalized::default());
        let change = changes.iter().next().expect("one change");
        assert_eq!(change.new, json!("indefinite"));
    }
}
