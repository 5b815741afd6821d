//! Command dispatch: bridges CLI args -> core reconcilers -> output formatting.

pub mod apply;
pub mod config_cmd;
pub mod rm;
pub mod show;

use bigsync_core::Device;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an appliance-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, device: &Device, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Apply(args) => apply::handle(device, &args.file, args.check, global).await,
        Command::Plan(args) => apply::handle(device, &args.file, true, global).await,
        Command::Show(args) => show::handle(device, &args, global).await,
        Command::Rm(args) => rm::handle(device, &args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
