mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bigsync_core::Device;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need an appliance connection
        Command::Config(args) => commands::config_cmd::handle(&args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "bigsync", &mut std::io::stdout());
            Ok(())
        }

        // All other commands require an appliance connection
        cmd => {
            let appliance_config = build_appliance_config(&cli.global)?;
            let device = Device::connect(&appliance_config).await?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &device, &cli.global).await;
            device.disconnect().await;
            result
        }
    }
}

/// Build an `ApplianceConfig` from the config file, profile, and CLI overrides.
fn build_appliance_config(global: &cli::GlobalOpts) -> Result<bigsync_core::ApplianceConfig, CliError> {
    let cfg = config::load_config_or_default();
    let profile_name = config::active_profile_name(global, &cfg);

    // If a profile exists, use it with CLI flag overrides
    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return config::resolve_profile(profile, &profile_name, global);
    }

    // No profile found -- try to build from CLI flags / env vars alone
    let url_str = global
        .appliance
        .as_deref()
        .ok_or_else(|| CliError::NoConfig {
            path: config::config_path().display().to_string(),
        })?;

    let url: url::Url = url_str.parse().map_err(|_| CliError::Validation {
        field: "appliance".into(),
        reason: format!("invalid URL: {url_str}"),
    })?;

    let username = std::env::var("BIGSYNC_USERNAME").map_err(|_| CliError::NoCredentials {
        profile: profile_name.clone(),
    })?;
    let password = std::env::var("BIGSYNC_PASSWORD").map_err(|_| CliError::NoCredentials {
        profile: profile_name.clone(),
    })?;

    let tls = if global.insecure {
        bigsync_core::TlsVerification::DangerAcceptInvalid
    } else {
        bigsync_core::TlsVerification::SystemDefaults
    };

    Ok(bigsync_core::ApplianceConfig {
        url,
        auth: bigsync_core::AuthCredentials {
            username,
            password: secrecy::SecretString::from(password),
            login_provider: "tmos".into(),
        },
        partition: global.partition.clone().unwrap_or_else(|| "Common".into()),
        tls,
        timeout: std::time::Duration::from_secs(global.timeout),
    })
}
