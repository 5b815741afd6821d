//! `bigsync show` -- fetch and render one object's current state.

use bigsync_core::Device;

use crate::cli::{GlobalOpts, ResourceKind, ShowArgs};
use crate::error::CliError;
use crate::output;

impl ResourceKind {
    /// Declaration-vocabulary name for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HttpProfile => "http-profile",
            Self::TcpProfile => "tcp-profile",
            Self::ServerSslProfile => "server-ssl-profile",
            Self::Vlan => "vlan",
            Self::SysDb => "sys-db",
            Self::GtmMonitor => "gtm-monitor",
        }
    }
}

pub async fn handle(device: &Device, args: &ShowArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let kind = args.kind.as_str();
    let object = device
        .read_object(kind, global.partition.as_deref(), &args.name)
        .await?
        .ok_or_else(|| CliError::NotFound {
            kind: kind.into(),
            name: args.name.clone(),
        })?;

    let rendered = output::render_single(
        &global.output,
        &object,
        output::render_json_pretty,
        |o| {
            o.get("name")
                .and_then(|n| n.as_str())
                .unwrap_or(&args.name)
                .to_owned()
        },
    );
    output::print_output(&rendered, global.quiet);
    Ok(())
}
