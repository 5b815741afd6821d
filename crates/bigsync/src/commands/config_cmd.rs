//! `bigsync config` -- profile management.

use std::io::Write;

use crate::cli::{ConfigAction, ConfigArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match &args.action {
        ConfigAction::Init => init(global),
        ConfigAction::List => list(global),
        ConfigAction::Show => show(global),
        ConfigAction::SetPassword { profile } => set_password(profile, global),
    }
}

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_path();
    if path.exists() {
        output::print_output(
            &format!("config already exists at {}", path.display()),
            global.quiet,
        );
        return Ok(());
    }

    let mut cfg = config::Config::default();
    cfg.profiles.insert(
        "default".into(),
        config::Profile {
            appliance: global
                .appliance
                .clone()
                .unwrap_or_else(|| "https://192.168.1.245".into()),
            partition: global.partition.clone().unwrap_or_else(|| "Common".into()),
            username: Some("admin".into()),
            password: None,
            password_env: Some("BIGSYNC_PASSWORD".into()),
            login_provider: "tmos".into(),
            ca_cert: None,
            insecure: Some(true),
            timeout: None,
        },
    );
    config::save_config(&cfg)?;
    output::print_output(&format!("wrote {}", path.display()), global.quiet);
    Ok(())
}

fn list(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let default = cfg.default_profile.clone().unwrap_or_default();

    let mut lines: Vec<String> = cfg
        .profiles
        .iter()
        .map(|(name, profile)| {
            let marker = if *name == default { "*" } else { " " };
            format!("{marker} {name}  {}", profile.appliance)
        })
        .collect();
    lines.sort();

    if lines.is_empty() {
        output::print_output("no profiles configured -- run: bigsync config init", global.quiet);
    } else {
        output::print_output(&lines.join("\n"), global.quiet);
    }
    Ok(())
}

fn show(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    // Never echo stored secrets.
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some("<redacted>".into());
        }
    }
    let rendered = toml::to_string_pretty(&cfg).map_err(|e| CliError::Validation {
        field: "config".into(),
        reason: e.to_string(),
    })?;
    output::print_output(
        &format!("# {}\n{rendered}", config::config_path().display()),
        global.quiet,
    );
    Ok(())
}

fn set_password(profile: &str, global: &GlobalOpts) -> Result<(), CliError> {
    eprint!("password for profile '{profile}': ");
    std::io::stderr().flush()?;
    let mut password = String::new();
    std::io::stdin().read_line(&mut password)?;
    let password = password.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    bigsync_config::store_password(profile, password)?;
    output::print_output("password stored in system keyring", global.quiet);
    Ok(())
}
