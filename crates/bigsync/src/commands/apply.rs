//! `bigsync apply` / `bigsync plan` -- reconcile a declaration file.

use std::path::Path;

use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::Tabled;

use bigsync_core::declaration::AppliedResource;
use bigsync_core::{Declaration, Device};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    device: &Device,
    file: &Path,
    check: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let declaration = Declaration::from_path(file)?;
    if declaration.is_empty() {
        output::print_output("declaration contains no resources", global.quiet);
        return Ok(());
    }

    let results = declaration.apply(device, check).await?;
    render_outcomes(&results, check, global);
    Ok(())
}

// ── Rendering ────────────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct OutcomeRow {
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "ACTION")]
    action: String,
    #[tabled(rename = "CHANGES")]
    changes: String,
}

/// `null` old values render as `-` (no previous value).
fn compact_value(value: &Value) -> String {
    match value {
        Value::Null => "-".into(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn to_row(result: &AppliedResource) -> OutcomeRow {
    let changes = result
        .outcome
        .changes
        .iter()
        .map(|c| {
            format!(
                "{}: {} -> {}",
                c.field,
                compact_value(&c.old),
                compact_value(&c.new)
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    OutcomeRow {
        kind: result.kind.to_owned(),
        name: result.name.clone(),
        action: serde_json::to_value(result.outcome.action)
            .ok()
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_default(),
        changes,
    }
}

pub(crate) fn render_outcomes(results: &[AppliedResource], check: bool, global: &GlobalOpts) {
    let rendered = output::render_list(&global.output, results, to_row, |r| {
        format!("{}/{}", r.kind, r.name)
    });
    output::print_output(&rendered, global.quiet);

    // Summary line for the interactive table view only.
    if matches!(global.output, OutputFormat::Table) && !global.quiet {
        let changed = results.iter().filter(|r| r.outcome.changed).count();
        let total = results.len();
        let verb = if check { "would change" } else { "changed" };
        let line = format!("{total} resources, {changed} {verb}");
        if output::should_color(&global.color) && changed > 0 {
            println!("{}", line.yellow());
        } else {
            println!("{line}");
        }
    }
}
