// ── NET VLAN ──
//
// Interface membership can be declared three ways: a full `interfaces`
// list with per-entry tagging, or the `tagged_interfaces` /
// `untagged_interfaces` name lists. The device reports membership as a
// subcollection, compared here as sorted name sets. Any difference
// patches the complete `interfaces` array -- the REST API replaces the
// membership wholesale.

use serde::{Deserialize, Serialize};

use bigsync_api::rest::models::Vlan;

use crate::device::Device;
use crate::diff::{Changes, Outcome};
use crate::error::CoreError;
use crate::norm;
use crate::resource::{Create, ResourceState};

/// One entry of a declared `interfaces` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VlanInterfaceSpec {
    pub interface: String,
    /// `tagged` or `untagged`.
    pub tagging: String,
}

/// Desired state for a VLAN.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VlanSpec {
    pub name: String,
    pub partition: Option<String>,
    #[serde(default)]
    pub state: ResourceState,
    pub description: Option<String>,
    /// 802.1Q tag number.
    pub tag: Option<u16>,
    /// Full interface membership. An empty list clears all members.
    /// Mutually exclusive with the name lists below.
    pub interfaces: Option<Vec<VlanInterfaceSpec>>,
    pub tagged_interfaces: Option<Vec<String>>,
    pub untagged_interfaces: Option<Vec<String>>,
    /// MTU in bytes (576-9198).
    pub mtu: Option<u64>,
    /// `default`, `src-ip`, or `dst-ip`; common aliases are accepted.
    pub cmp_hash: Option<String>,
    /// DAG tunnel mode: `inner` or `outer`.
    pub dag_tunnel: Option<String>,
    pub dag_round_robin: Option<bool>,
    pub source_check: Option<bool>,
    pub fail_safe: Option<bool>,
    /// `failover`, `failover-restart-tm`, `reboot`, or `restart-all`.
    pub fail_safe_action: Option<String>,
    pub fail_safe_timeout: Option<u64>,
    pub sflow_poll_interval: Option<u64>,
    pub sflow_sampling_rate: Option<u64>,
}

// ── Normalized form ─────────────────────────────────────────────────

/// One interface membership entry in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Member {
    name: String,
    tagged: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Normalized {
    description: Option<String>,
    tag: Option<u16>,
    mtu: Option<u64>,
    /// Sorted full membership; `Some(vec![])` means "no members".
    interfaces: Option<Vec<Member>>,
    /// Sorted tagged member names (derived on the device side).
    tagged_names: Option<Vec<String>>,
    /// Sorted untagged member names.
    untagged_names: Option<Vec<String>>,
    cmp_hash: Option<String>,
    dag_tunnel: Option<String>,
    dag_round_robin: Option<bool>,
    source_check: Option<bool>,
    fail_safe: Option<bool>,
    fail_safe_action: Option<String>,
    fail_safe_timeout: Option<u64>,
    sflow_poll_interval: Option<u64>,
    sflow_sampling_rate: Option<u64>,
}

/// Fold the accepted `cmp_hash` aliases into the device vocabulary.
fn normalize_cmp_hash(raw: &str) -> String {
    match raw {
        "source-address" | "src" | "src-ip" | "source" => "src-ip".into(),
        "destination-address" | "dest" | "dst-ip" | "destination" | "dst" => "dst-ip".into(),
        _ => "default".into(),
    }
}

impl VlanSpec {
    fn normalize(&self) -> Result<Normalized, CoreError> {
        if self.interfaces.is_some()
            && (self.tagged_interfaces.is_some() || self.untagged_interfaces.is_some())
        {
            return Err(CoreError::validation(
                "interfaces",
                "'interfaces' cannot be combined with 'tagged_interfaces' or 'untagged_interfaces'",
            ));
        }

        let interfaces = self
            .interfaces
            .as_ref()
            .map(|list| {
                let mut members = Vec::with_capacity(list.len());
                for item in list {
                    let tagged = match item.tagging.as_str() {
                        "tagged" => true,
                        "untagged" => false,
                        other => {
                            return Err(CoreError::validation(
                                "tagging",
                                format!("expected 'tagged' or 'untagged', got '{other}'"),
                            ));
                        }
                    };
                    members.push(Member {
                        name: item.interface.clone(),
                        tagged,
                    });
                }
                members.sort();
                Ok(members)
            })
            .transpose()?;

        Ok(Normalized {
            description: self.description.clone(),
            tag: self.tag,
            mtu: self
                .mtu
                .map(|v| norm::check_range("mtu", v, 576..=9198))
                .transpose()?,
            interfaces,
            tagged_names: self.tagged_interfaces.clone().map(sorted),
            untagged_names: self.untagged_interfaces.clone().map(sorted),
            cmp_hash: self.cmp_hash.as_deref().map(normalize_cmp_hash),
            dag_tunnel: self.dag_tunnel.clone(),
            dag_round_robin: self.dag_round_robin,
            source_check: self.source_check,
            fail_safe: self.fail_safe,
            fail_safe_action: self.fail_safe_action.clone(),
            fail_safe_timeout: self.fail_safe_timeout,
            sflow_poll_interval: self.sflow_poll_interval,
            sflow_sampling_rate: self.sflow_sampling_rate,
        })
    }
}

fn sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names
}

impl Normalized {
    fn from_api(api: &Vlan) -> Self {
        let mut members: Vec<Member> = api
            .interfaces_reference
            .as_ref()
            .and_then(|r| r.items.as_ref())
            .map(|items| {
                items
                    .iter()
                    .map(|i| Member {
                        name: i.name.clone(),
                        tagged: i.tagged.unwrap_or(false),
                    })
                    .collect()
            })
            .unwrap_or_default();
        members.sort();

        let tagged_names = members
            .iter()
            .filter(|m| m.tagged)
            .map(|m| m.name.clone())
            .collect();
        let untagged_names = members
            .iter()
            .filter(|m| !m.tagged)
            .map(|m| m.name.clone())
            .collect();

        Self {
            description: api.description.clone(),
            tag: api.tag,
            mtu: api.mtu,
            interfaces: Some(members),
            tagged_names: Some(tagged_names),
            untagged_names: Some(untagged_names),
            cmp_hash: api.cmp_hash.clone(),
            dag_tunnel: api.dag_tunnel.clone(),
            dag_round_robin: api.dag_round_robin.as_deref().and_then(norm::parse_flag),
            source_check: api.source_checking.as_deref().and_then(norm::parse_flag),
            fail_safe: api.failsafe.as_deref().and_then(norm::parse_flag),
            fail_safe_action: api.failsafe_action.clone(),
            fail_safe_timeout: api.failsafe_timeout,
            sflow_poll_interval: api.sflow.as_ref().and_then(|s| s.poll_interval),
            sflow_sampling_rate: api.sflow.as_ref().and_then(|s| s.sampling_rate),
        }
    }
}

// ── Patch body ──────────────────────────────────────────────────────

/// One membership entry on the wire; exactly one of `tagged` /
/// `untagged` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct InterfacePatch {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tagged: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    untagged: Option<bool>,
}

impl InterfacePatch {
    fn new(name: &str, tagged: bool) -> Self {
        Self {
            name: name.to_owned(),
            tagged: tagged.then_some(true),
            untagged: (!tagged).then_some(true),
        }
    }
}

#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VlanSflowPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    poll_interval: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sampling_rate: Option<u64>,
}

#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VlanPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mtu: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cmp_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dag_tunnel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dag_round_robin: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_checking: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failsafe: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failsafe_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failsafe_timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interfaces: Option<Vec<InterfacePatch>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sflow: Option<VlanSflowPatch>,
}

fn member_names(members: &[Member]) -> Vec<String> {
    members.iter().map(|m| m.name.clone()).collect()
}

#[allow(clippy::too_many_lines)]
fn diff(want: &Normalized, have: &Normalized) -> (VlanPatch, Changes) {
    let mut patch = VlanPatch::default();
    let mut changes = Changes::new();

    if want.description.is_some() && want.description != have.description {
        patch.description = want.description.clone();
        changes.record(
            "description",
            norm::str_report(have.description.as_deref()),
            norm::str_report(want.description.as_deref()),
        );
    }
    if want.tag.is_some() && want.tag != have.tag {
        patch.tag = want.tag;
        changes.record(
            "tag",
            have.tag.map_or(serde_json::Value::Null, Into::into),
            want.tag.map_or(serde_json::Value::Null, Into::into),
        );
    }
    if want.mtu.is_some() && want.mtu != have.mtu {
        patch.mtu = want.mtu;
        changes.record(
            "mtu",
            norm::num_report(have.mtu),
            norm::num_report(want.mtu),
        );
    }
    if want.cmp_hash.is_some() && want.cmp_hash != have.cmp_hash {
        patch.cmp_hash = want.cmp_hash.clone();
        changes.record(
            "cmp_hash",
            norm::str_report(have.cmp_hash.as_deref()),
            norm::str_report(want.cmp_hash.as_deref()),
        );
    }
    if want.dag_tunnel.is_some() && want.dag_tunnel != have.dag_tunnel {
        patch.dag_tunnel = want.dag_tunnel.clone();
        changes.record(
            "dag_tunnel",
            norm::str_report(have.dag_tunnel.as_deref()),
            norm::str_report(want.dag_tunnel.as_deref()),
        );
    }
    if want.dag_round_robin.is_some() && want.dag_round_robin != have.dag_round_robin {
        patch.dag_round_robin = want.dag_round_robin.map(norm::on_off);
        changes.record(
            "dag_round_robin",
            norm::flag_report(have.dag_round_robin),
            norm::flag_report(want.dag_round_robin),
        );
    }
    if want.source_check.is_some() && want.source_check != have.source_check {
        patch.source_checking = want.source_check.map(norm::on_off);
        changes.record(
            "source_check",
            norm::flag_report(have.source_check),
            norm::flag_report(want.source_check),
        );
    }
    if want.fail_safe.is_some() && want.fail_safe != have.fail_safe {
        patch.failsafe = want.fail_safe.map(norm::on_off);
        changes.record(
            "fail_safe",
            norm::flag_report(have.fail_safe),
            norm::flag_report(want.fail_safe),
        );
    }
    if want.fail_safe_action.is_some() && want.fail_safe_action != have.fail_safe_action {
        patch.failsafe_action = want.fail_safe_action.clone();
        changes.record(
            "fail_safe_action",
            norm::str_report(have.fail_safe_action.as_deref()),
            norm::str_report(want.fail_safe_action.as_deref()),
        );
    }
    if want.fail_safe_timeout.is_some() && want.fail_safe_timeout != have.fail_safe_timeout {
        patch.failsafe_timeout = want.fail_safe_timeout;
        changes.record(
            "fail_safe_timeout",
            norm::num_report(have.fail_safe_timeout),
            norm::num_report(want.fail_safe_timeout),
        );
    }

    diff_interfaces(want, have, &mut patch, &mut changes);

    let mut sflow = VlanSflowPatch::default();
    if want.sflow_poll_interval.is_some()
        && want.sflow_poll_interval != have.sflow_poll_interval
    {
        sflow.poll_interval = want.sflow_poll_interval;
        changes.record(
            "sflow_poll_interval",
            norm::num_report(have.sflow_poll_interval),
            norm::num_report(want.sflow_poll_interval),
        );
    }
    if want.sflow_sampling_rate.is_some()
        && want.sflow_sampling_rate != have.sflow_sampling_rate
    {
        sflow.sampling_rate = want.sflow_sampling_rate;
        changes.record(
            "sflow_sampling_rate",
            norm::num_report(have.sflow_sampling_rate),
            norm::num_report(want.sflow_sampling_rate),
        );
    }
    if sflow != VlanSflowPatch::default() {
        patch.sflow = Some(sflow);
    }

    (patch, changes)
}

/// Membership diffing. Any difference replaces the whole interface list;
/// the three declaration styles converge on the same patch shape.
fn diff_interfaces(want: &Normalized, have: &Normalized, patch: &mut VlanPatch, changes: &mut Changes) {
    let have_members = have.interfaces.as_deref().unwrap_or(&[]);

    if let Some(want_members) = want.interfaces.as_deref() {
        if want_members != have_members {
            patch.interfaces = Some(
                want_members
                    .iter()
                    .map(|m| InterfacePatch::new(&m.name, m.tagged))
                    .collect(),
            );
            changes.record_cleared(
                "interfaces",
                serde_json::json!(member_names(have_members)),
                serde_json::json!(member_names(want_members)),
            );
        }
        return;
    }

    if let Some(want_tagged) = want.tagged_names.as_deref() {
        let have_tagged: Vec<String> = have_members
            .iter()
            .filter(|m| m.tagged)
            .map(|m| m.name.clone())
            .collect();
        if want_tagged != have_tagged.as_slice() {
            patch.interfaces = Some(
                want_tagged
                    .iter()
                    .map(|n| InterfacePatch::new(n, true))
                    .collect(),
            );
            changes.record_cleared(
                "tagged_interfaces",
                serde_json::json!(have_tagged),
                serde_json::json!(want_tagged),
            );
        }
    }

    if let Some(want_untagged) = want.untagged_names.as_deref() {
        let have_untagged: Vec<String> = have_members
            .iter()
            .filter(|m| !m.tagged)
            .map(|m| m.name.clone())
            .collect();
        if want_untagged != have_untagged.as_slice() {
            patch.interfaces = Some(
                want_untagged
                    .iter()
                    .map(|n| InterfacePatch::new(n, false))
                    .collect(),
            );
            changes.record_cleared(
                "untagged_interfaces",
                serde_json::json!(have_untagged),
                serde_json::json!(want_untagged),
            );
        }
    }
}

// ── Manager ─────────────────────────────────────────────────────────

/// Reconciles one VLAN against the device.
pub struct VlanManager<'a> {
    device: &'a Device,
    spec: &'a VlanSpec,
}

impl<'a> VlanManager<'a> {
    pub fn new(device: &'a Device, spec: &'a VlanSpec) -> Self {
        Self { device, spec }
    }

    fn partition(&self) -> &str {
        self.spec
            .partition
            .as_deref()
            .unwrap_or_else(|| self.device.partition())
    }

    /// Drive the VLAN to its declared state.
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
            .vlan_exists(self.partition(), &self.spec.name)
            .await?;
        if exists {
            self.update(check).await
        } else {
            self.create(check).await
        }
    }

    async fn create(&self, check: bool) -> Result<Outcome, CoreError> {
        let want = self.spec.normalize()?;
        let (patch, changes) = diff(&want, &Normalized::default());
        if check {
            return Ok(Outcome::created(changes));
        }
        let body = Create {
            name: &self.spec.name,
            partition: self.partition(),
            attrs: &patch,
        };
        self.device.rest().create_vlan(&body).await?;
        Ok(Outcome::created(changes))
    }

    async fn update(&self, check: bool) -> Result<Outcome, CoreError> {
        let current = self
            .device
            .rest()
            .read_vlan(self.partition(), &self.spec.name)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                kind: "vlan".into(),
                name: self.spec.name.clone(),
            })?;
        let have = Normalized::from_api(&current);
        let want = self.spec.normalize()?;
        let (patch, changes) = diff(&want, &have);
        if changes.is_empty() {
            return Ok(Outcome::unchanged());
        }
        if check {
            return Ok(Outcome::updated(changes));
        }
        self.device
            .rest()
            .patch_vlan(self.partition(), &self.spec.name, &patch)
            .await?;
        Ok(Outcome::updated(changes))
    }

    async fn absent(&self, check: bool) -> Result<Outcome, CoreError> {
        let exists = self
            .device
            .rest()
            .vlan_exists(self.partition(), &self.spec.name)
            .await?;
        if !exists {
            return Ok(Outcome::unchanged());
        }
        if check {
            return Ok(Outcome::deleted());
        }
        self.device
            .rest()
            .delete_vlan(self.partition(), &self.spec.name)
            .await?;
        if self
            .device
            .rest()
            .vlan_exists(self.partition(), &self.spec.name)
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

    fn spec(value: serde_json::Value) -> VlanSpec {
        serde_json::from_value(value).expect("valid spec")
    }

    fn api_fixture() -> Vlan {
        serde_json::from_value(json!({
            "name": "vlan-a",
            "partition": "Common",
            "tag": 1234,
            "mtu": 1500,
            "cmpHash": "default",
            "failsafe": "disabled",
            "sourceChecking": "disabled",
            "sflow": { "pollInterval": 0, "samplingRate": 0 },
            "interfacesReference": {
                "items": [
                    { "name": "1.1", "tagged": true },
                    { "name": "1.2", "untagged": true }
                ]
            }
        }))
        .expect("valid fixture")
    }

    #[test]
    fn normalize_rejects_conflicting_interface_styles() {
        let s = spec(json!({
            "name": "vlan-a",
            "interfaces": [{ "interface": "1.1", "tagging": "tagged" }],
            "tagged_interfaces": ["1.1"]
        }));
        assert!(s.normalize().is_err());
    }

    #[test]
    fn normalize_validates_mtu_and_tagging() {
        let s = spec(json!({ "name": "vlan-a", "mtu": 575 }));
        assert!(s.normalize().is_err());

        let s = spec(json!({
            "name": "vlan-a",
            "interfaces": [{ "interface": "1.1", "tagging": "trunked" }]
        }));
        assert!(s.normalize().is_err());
    }

    #[test]
    fn cmp_hash_aliases_fold() {
        assert_eq!(normalize_cmp_hash("source-address"), "src-ip");
        assert_eq!(normalize_cmp_hash("dst"), "dst-ip");
        assert_eq!(normalize_cmp_hash("default"), "default");
    }

    #[test]
    fn matching_membership_is_idempotent() {
        let s = spec(json!({
            "name": "vlan-a",
            "tag": 1234,
            "interfaces": [
                { "interface": "1.2", "tagging": "untagged" },
                { "interface": "1.1", "tagging": "tagged" }
            ]
        }));
        let want = s.normalize().expect("normalizes");
        let have = Normalized::from_api(&api_fixture());
        let (patch, changes) = diff(&want, &have);
        assert!(changes.is_empty(), "unexpected changes: {changes:?}");
        assert_eq!(patch, VlanPatch::default());
    }

    #[test]
    fn tagged_name_list_difference_replaces_membership() {
        let s = spec(json!({ "name": "vlan-a", "tagged_interfaces": ["1.3", "1.1"] }));
        let want = s.normalize().expect("normalizes");
        let have = Normalized::from_api(&api_fixture());
        let (patch, changes) = diff(&want, &have);
        assert_eq!(changes.len(), 1);
        let body = serde_json::to_value(&patch).expect("serializes");
        assert_eq!(
            body,
            json!({
                "interfaces": [
                    { "name": "1.1", "tagged": true },
                    { "name": "1.3", "tagged": true }
                ]
            })
        );
    }

    #[test]
    fn empty_interface_list_clears_membership() {
        let s = spec(json!({ "name": "vlan-a", "interfaces": [] }));
        let want = s.normalize().expect("normalizes");
        let have = Normalized::from_api(&api_fixture());
        let (patch, changes) = diff(&want, &have);
        assert_eq!(changes.len(), 1);
        assert_eq!(patch.interfaces.as_deref(), Some(&[][..]));
    }

    #[test]
    fn sflow_patch_nests_only_changed_members() {
        let s = spec(json!({ "name": "vlan-a", "sflow_poll_interval": 30 }));
        let want = s.normalize().expect("normalizes");
        let have = Normalized::from_api(&api_fixture());
        let (patch, changes) = diff(&want, &have);
        assert_eq!(changes.len(), 1);
        let body = serde_json::to_value(&patch).expect("serializes");
        assert_eq!(body, json!({ "sflow": { "pollInterval": 30 } }));
    }
}
