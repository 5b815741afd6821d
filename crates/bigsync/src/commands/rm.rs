//! `bigsync rm` -- drive one object to the absent state.

use bigsync_core::declaration::AppliedResource;
use bigsync_core::resource::ResourceState;
use bigsync_core::resource::gtm_monitor::{GtmMonitorManager, GtmMonitorSpec};
use bigsync_core::resource::http_profile::{HttpProfileManager, HttpProfileSpec};
use bigsync_core::resource::server_ssl::{ServerSslManager, ServerSslSpec};
use bigsync_core::resource::tcp_profile::{TcpProfileManager, TcpProfileSpec};
use bigsync_core::resource::vlan::{VlanManager, VlanSpec};
use bigsync_core::{Device, Outcome};

use crate::cli::{GlobalOpts, ResourceKind, RmArgs};
use crate::commands::apply::render_outcomes;
use crate::error::CliError;

pub async fn handle(device: &Device, args: &RmArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if args.kind == ResourceKind::SysDb {
        return Err(CliError::Validation {
            field: "kind".into(),
            reason: "db variables cannot be deleted; use a declaration with state = \"reset\""
                .into(),
        });
    }
    if !args.check && !global.yes {
        return Err(CliError::NonInteractiveRequiresYes {
            action: format!("rm {} {}", args.kind.as_str(), args.name),
        });
    }

    let outcome = ensure_absent(device, args).await?;
    let result = AppliedResource {
        kind: args.kind.as_str(),
        name: args.name.clone(),
        outcome,
    };
    render_outcomes(std::slice::from_ref(&result), args.check, global);
    Ok(())
}

async fn ensure_absent(device: &Device, args: &RmArgs) -> Result<Outcome, CliError> {
    let name = args.name.clone();
    let partition = None;
    let outcome = match args.kind {
        ResourceKind::HttpProfile => {
            let spec = HttpProfileSpec {
                name,
                partition,
                state: ResourceState::Absent,
                ..HttpProfileSpec::default()
            };
            HttpProfileManager::new(device, &spec).ensure(args.check).await?
        }
        ResourceKind::TcpProfile => {
            let spec = TcpProfileSpec {
                name,
                partition,
                state: ResourceState::Absent,
                ..TcpProfileSpec::default()
            };
            TcpProfileManager::new(device, &spec).ensure(args.check).await?
        }
        ResourceKind::ServerSslProfile => {
            let spec = ServerSslSpec {
                name,
                partition,
                state: ResourceState::Absent,
                ..ServerSslSpec::default()
            };
            ServerSslManager::new(device, &spec).ensure(args.check).await?
        }
        ResourceKind::Vlan => {
            let spec = VlanSpec {
                name,
                partition,
                state: ResourceState::Absent,
                ..VlanSpec::default()
            };
            VlanManager::new(device, &spec).ensure(args.check).await?
        }
        ResourceKind::GtmMonitor => {
            let spec = GtmMonitorSpec {
                name,
                partition,
                state: ResourceState::Absent,
                ..GtmMonitorSpec::default()
            };
            GtmMonitorManager::new(device, &spec).ensure(args.check).await?
        }
        ResourceKind::SysDb => unreachable!("rejected above"),
    };
    Ok(outcome)
}
