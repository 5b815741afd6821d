// bigsync-core: desired-state reconciliation between declarations and a
// BIG-IP appliance's iControl REST API.

pub mod config;
pub mod declaration;
pub mod device;
pub mod diff;
pub mod error;
pub mod norm;
pub mod resource;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ApplianceConfig, AuthCredentials, TlsVerification};
pub use declaration::Declaration;
pub use device::Device;
pub use diff::{Action, Changes, FieldChange, Outcome};
pub use error::CoreError;
pub use resource::ResourceState;

// Re-export resource spec types at the crate root for ergonomics.
pub use resource::{
    gtm_monitor::GtmMonitorSpec, http_profile::HttpProfileSpec, server_ssl::ServerSslSpec,
    sys_db::SysDbSpec, tcp_profile::TcpProfileSpec, vlan::VlanSpec,
};
