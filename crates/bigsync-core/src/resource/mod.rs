// ── Resource modules ──
//
// One module per appliance resource type. Each follows the same shape --
// a desired-state spec, a normalized form shared with the device read, a
// field-by-field diff producing a minimal PATCH body, and a manager that
// drives exists → create/update/delete. The repetition is deliberate:
// resources are independent, there is no shared execution engine.

pub mod gtm_monitor;
pub mod http_profile;
pub mod server_ssl;
pub mod sys_db;
pub mod tcp_profile;
pub mod vlan;

use serde::{Deserialize, Serialize};

/// Target state for a resource: create/converge it, or remove it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    #[default]
    Present,
    Absent,
}

/// POST body for collection creates: `name` and `partition` ride along
/// with the attribute payload.
#[derive(Serialize)]
pub(crate) struct Create<'a, T: Serialize> {
    pub name: &'a str,
    pub partition: &'a str,
    #[serde(flatten)]
    pub attrs: &'a T,
}
