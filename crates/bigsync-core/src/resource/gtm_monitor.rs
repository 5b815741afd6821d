// ── GTM bigip monitor ──
//
// The user declares `ip` and `port` separately; the wire carries a joined
// `destination` (`"ip:port"`, `*` wildcards allowed on either side).
// `parent` is only honored at create time -- the device does not allow
// re-parenting a monitor.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use bigsync_api::rest::models::GtmBigipMonitor;

use crate::device::Device;
use crate::diff::{Changes, Outcome};
use crate::error::CoreError;
use crate::norm;
use crate::resource::{Create, ResourceState};

/// A monitor port: a number or the `*` wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MonitorPort {
    Number(u16),
    Wildcard(String),
}

/// Desired state for a GTM bigip monitor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GtmMonitorSpec {
    pub name: String,
    pub partition: Option<String>,
    #[serde(default)]
    pub state: ResourceState,
    /// Parent monitor to inherit from (create-time only).
    pub parent: Option<String>,
    /// Destination address: an IP, or `*`/`0.0.0.0` for the wildcard.
    pub ip: Option<String>,
    /// Destination port: a number, or `*`.
    pub port: Option<MonitorPort>,
    /// Probe interval in seconds (1-86400).
    pub interval: Option<u64>,
    /// Probe timeout in seconds.
    pub timeout: Option<u64>,
    pub ignore_down_response: Option<bool>,
    /// `none`, `average-nodes`, `sum-nodes`, `average-members`,
    /// or `sum-members`.
    pub aggregate_dynamic_ratios: Option<String>,
}

// ── Normalized form ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
struct Normalized {
    parent: Option<String>,
    destination: Option<String>,
    interval: Option<u64>,
    timeout: Option<u64>,
    ignore_down_response: Option<bool>,
    aggregate_dynamic_ratios: Option<String>,
}

impl GtmMonitorSpec {
    fn normalize(&self, partition: &str) -> Result<Normalized, CoreError> {
        let ip = self
            .ip
            .as_deref()
            .map(|raw| normalize_ip(raw))
            .transpose()?;
        let port = self.port.as_ref().map(|p| match p {
            MonitorPort::Number(n) => n.to_string(),
            MonitorPort::Wildcard(s) => s.clone(),
        });
        if let Some(MonitorPort::Wildcard(s)) = &self.port {
            if s != "*" {
                return Err(CoreError::validation(
                    "port",
                    "must be a port number or '*'",
                ));
            }
        }
        let destination = match (ip, port) {
            (Some(ip), Some(port)) => Some(format!("{ip}:{port}")),
            (None, None) => None,
            _ => {
                return Err(CoreError::validation(
                    "destination",
                    "'ip' and 'port' must be supplied together",
                ));
            }
        };

        Ok(Normalized {
            parent: self.parent.as_deref().map(|p| norm::fq_name(partition, p)),
            destination,
            interval: self
                .interval
                .map(|v| norm::check_range("interval", v, 1..=86_400))
                .transpose()?,
            timeout: self.timeout,
            ignore_down_response: self.ignore_down_response,
            aggregate_dynamic_ratios: self.aggregate_dynamic_ratios.clone(),
        })
    }
}

/// `*` and `0.0.0.0` both mean "any address"; anything else must parse
/// as an IP address.
fn normalize_ip(raw: &str) -> Result<String, CoreError> {
    if raw == "*" || raw == "0.0.0.0" {
        return Ok("*".into());
    }
    raw.parse::<IpAddr>()
        .map(|_| raw.to_owned())
        .map_err(|_| CoreError::validation("ip", "The provided 'ip' parameter is not an IP address"))
}

impl Normalized {
    fn from_api(api: &GtmBigipMonitor) -> Self {
        Self {
            parent: api.defaults_from.clone(),
            destination: api.destination.clone(),
            interval: api.interval,
            timeout: api.timeout,
            ignore_down_response: api
                .ignore_down_response
                .as_deref()
                .and_then(norm::parse_flag),
            aggregate_dynamic_ratios: api.aggregate_dynamic_ratios.clone(),
        }
    }
}

// ── Patch body ──────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GtmMonitorPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    defaults_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interval: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ignore_down_response: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aggregate_dynamic_ratios: Option<String>,
}

/// Field-by-field difference. `parent` is deliberately absent -- it is
/// create-time only.
fn diff(want: &Normalized, have: &Normalized) -> (GtmMonitorPatch, Changes) {
    let mut patch = GtmMonitorPatch::default();
    let mut changes = Changes::new();

    if want.destination.is_some() && want.destination != have.destination {
        patch.destination = want.destination.clone();
        changes.record(
            "destination",
            norm::str_report(have.destination.as_deref()),
            norm::str_report(want.destination.as_deref()),
        );
    }
    if want.interval.is_some() && want.interval != have.interval {
        patch.interval = want.interval;
        changes.record(
            "interval",
            norm::num_report(have.interval),
            norm::num_report(want.interval),
        );
    }
    if want.timeout.is_some() && want.timeout != have.timeout {
        patch.timeout = want.timeout;
        changes.record(
            "timeout",
            norm::num_report(have.timeout),
            norm::num_report(want.timeout),
        );
    }
    if want.ignore_down_response.is_some()
        && want.ignore_down_response != have.ignore_down_response
    {
        patch.ignore_down_response = want.ignore_down_response.map(norm::on_off);
        changes.record(
            "ignore_down_response",
            norm::flag_report(have.ignore_down_response),
            norm::flag_report(want.ignore_down_response),
        );
    }
    if want.aggregate_dynamic_ratios.is_some()
        && want.aggregate_dynamic_ratios != have.aggregate_dynamic_ratios
    {
        patch.aggregate_dynamic_ratios = want.aggregate_dynamic_ratios.clone();
        changes.record(
            "aggregate_dynamic_ratios",
            norm::str_report(have.aggregate_dynamic_ratios.as_deref()),
            norm::str_report(want.aggregate_dynamic_ratios.as_deref()),
        );
    }

    (patch, changes)
}

/// Create sends every explicitly-set field, parent included.
fn create_body(want: &Normalized) -> (GtmMonitorPatch, Changes) {
    let (mut patch, mut changes) = diff(want, &Normalized::default());
    if want.parent.is_some() {
        patch.defaults_from = want.parent.clone();
        changes.record(
            "parent",
            serde_json::Value::Null,
            norm::str_report(want.parent.as_deref()),
        );
    }
    (patch, changes)
}

// ── Manager ─────────────────────────────────────────────────────────

/// Reconciles one GTM bigip monitor against the device.
pub struct GtmMonitorManager<'a> {
    device: &'a Device,
    spec: &'a GtmMonitorSpec,
}

impl<'a> GtmMonitorManager<'a> {
    pub fn new(device: &'a Device, spec: &'a GtmMonitorSpec) -> Self {
        Self { device, spec }
    }

    fn partition(&self) -> &str {
        self.spec
            .partition
            .as_deref()
            .unwrap_or_else(|| self.device.partition())
    }

    /// Drive the monitor to its declared state.
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
            .gtm_bigip_monitor_exists(self.partition(), &self.spec.name)
            .await?;
        if exists {
            self.update(check).await
        } else {
            self.create(check).await
        }
    }

    async fn create(&self, check: bool) -> Result<Outcome, CoreError> {
        let want = self.spec.normalize(self.partition())?;
        let (patch, changes) = create_body(&want);
        if check {
            return Ok(Outcome::created(changes));
        }
        let body = Create {
            name: &self.spec.name,
            partition: self.partition(),
            attrs: &patch,
        };
        self.device.rest().create_gtm_bigip_monitor(&body).await?;
        Ok(Outcome::created(changes))
    }

    async fn update(&self, check: bool) -> Result<Outcome, CoreError> {
        let current = self
            .device
            .rest()
            .read_gtm_bigip_monitor(self.partition(), &self.spec.name)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                kind: "gtm monitor".into(),
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
            .patch_gtm_bigip_monitor(self.partition(), &self.spec.name, &patch)
            .await?;
        Ok(Outcome::updated(changes))
    }

    async fn absent(&self, check: bool) -> Result<Outcome, CoreError> {
        let exists = self
            .device
            .rest()
            .gtm_bigip_monitor_exists(self.partition(), &self.spec.name)
            .await?;
        if !exists {
            return Ok(Outcome::unchanged());
        }
        if check {
            return Ok(Outcome::deleted());
        }
        self.device
            .rest()
            .delete_gtm_bigip_monitor(self.partition(), &self.spec.name)
            .await?;
        if self
            .device
            .rest()
            .gtm_bigip_monitor_exists(self.partition(), &self.spec.name)
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

    fn spec(value: serde_json::Value) -> GtmMonitorSpec {
        serde_json::from_value(value).expect("valid spec")
    }

    #[test]
    fn normalize_joins_destination() {
        let s = spec(json!({ "name": "foo", "ip": "10.10.10.10", "port": 80 }));
        let n = s.normalize("Common").expect("normalizes");
        assert_eq!(n.destination.as_deref(), Some("10.10.10.10:80"));
    }

    #[test]
    fn normalize_folds_wildcard_addresses() {
        let s = spec(json!({ "name": "foo", "ip": "0.0.0.0", "port": "*" }));
        let n = s.normalize("Common").expect("normalizes");
        assert_eq!(n.destination.as_deref(), Some("*:*"));
    }

    #[test]
    fn normalize_rejects_bad_ip_and_lone_port() {
        let s = spec(json!({ "name": "foo", "ip": "not-an-ip", "port": 80 }));
        assert!(s.normalize("Common").is_err());

        let s = spec(json!({ "name": "foo", "port": 80 }));
        assert!(s.normalize("Common").is_err());
    }

    #[test]
    fn normalize_checks_interval_range() {
        let s = spec(json!({ "name": "foo", "interval": 86_401 }));
        assert!(s.normalize("Common").is_err());
    }

    #[test]
    fn diff_splits_out_changed_fields_only() {
        let s = spec(json!({
            "name": "foo",
            "ip": "10.10.10.10",
            "port": 80,
            "interval": 30,
            "ignore_down_response": true
        }));
        let want = s.normalize("Common").expect("normalizes");
        let api: GtmBigipMonitor = serde_json::from_value(json!({
            "name": "foo",
            "partition": "Common",
            "defaultsFrom": "/Common/bigip",
            "destination": "10.10.10.10:80",
            "interval": 30,
            "timeout": 90,
            "ignoreDownResponse": "disabled",
            "aggregateDynamicRatios": "none"
        }))
        .expect("valid fixture");
        let have = Normalized::from_api(&api);
        let (patch, changes) = diff(&want, &have);
        assert_eq!(changes.len(), 1);
        assert_eq!(patch.ignore_down_response, Some("enabled"));
        assert_eq!(patch.destination, None);
    }

    #[test]
    fn create_body_includes_parent() {
        let s = spec(json!({ "name": "foo", "parent": "bigip", "interval": 15 }));
        let want = s.normalize("Common").expect("normalizes");
        let (patch, changes) = create_body(&want);
        assert_eq!(patch.defaults_from.as_deref(), Some("/Common/bigip"));
        assert_eq!(changes.len(), 2);
    }
}
