//! Command implementations for tidyctl

use crate::errors::{exit_code_for, EXIT_SUCCESS};
use anyhow::{Context, Result};
use std::path::Path;
use tidy_common::subscription::{StaticBilling, SubscriptionPolicy, SubscriptionState};
use tidy_common::ui::{self, Tone};
use tidy_common::{Config, OutcomeStatus, RunOutcome, ToolTable, VERSION};
use tidy_engine::{Dispatcher, OutputStream, SettingsOpener};
use tokio_stream::StreamExt;
use tracing::debug;

const KEY_WIDTH: usize = 18;

/// List every tool in menu order
pub fn list(table: &ToolTable) -> Result<i32> {
    ui::print_title("tidyctl", VERSION);
    ui::print_section("tools", "maintenance actions");
    for descriptor in table.iter() {
        let [short, long] = descriptor.tool.aliases();
        let kind = ui::paint(Tone::Dim, &format!("({})", descriptor.kind()));
        ui::print_kv(
            descriptor.tool.label(),
            &format!("{} / {} {}", short, long, kind),
            KEY_WIDTH,
        );
    }
    ui::print_rule();
    Ok(EXIT_SUCCESS)
}

/// Run one tool, streaming its stdout unless `json` is set
pub async fn run<O: SettingsOpener + 'static>(
    dispatcher: &Dispatcher<O>,
    identifier: &str,
    json: bool,
) -> Result<i32> {
    let known = dispatcher.table().resolve(identifier).is_ok();

    if json {
        let outcome = dispatcher.dispatch(identifier).await;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(exit_code_for(&outcome, known));
    }

    let printer = tokio::spawn(print_chunks(dispatcher.relay().subscribe()));
    let outcome = dispatcher.dispatch(identifier).await;
    dispatcher.relay().unsubscribe();
    let streamed = printer.await.context("output printer stopped")?;

    print_outcome(&outcome, streamed);
    Ok(exit_code_for(&outcome, known))
}

/// Echo live chunks; true when anything was printed
async fn print_chunks(mut stream: OutputStream) -> bool {
    let mut streamed = false;
    while let Some(chunk) = stream.next().await {
        ui::print_inline(&chunk.text);
        streamed = true;
    }
    streamed
}

fn print_outcome(outcome: &RunOutcome, streamed: bool) {
    let status = outcome.status();
    match status {
        OutcomeStatus::Success => {
            if let (false, Some(output)) = (streamed, outcome.output()) {
                ui::print_block(Tone::Ok, output);
            }
            ui::print_status(status.into(), outcome.message().unwrap_or("Done"));
        }
        OutcomeStatus::ElevationRequired => {
            ui::print_status(status.into(), outcome.error().unwrap_or("elevated privilege required"));
            ui::print_block(
                Tone::Dim,
                "Re-run tidyctl from an elevated prompt (Run as administrator).",
            );
        }
        OutcomeStatus::Failed => {
            ui::print_status(status.into(), outcome.error().unwrap_or("Tool failed"));
            if let Some(output) = outcome.output() {
                ui::print_block(Tone::Dim, output);
            }
        }
    }
}

/// Print the effective configuration as TOML
pub fn config(config: &Config) -> Result<i32> {
    print!("{}", config.to_toml()?);
    Ok(EXIT_SUCCESS)
}

/// Resolve the plan tier for `email`
pub fn plan(config: &Config, email: &str, billing_file: Option<&Path>, json: bool) -> Result<i32> {
    let billing = match billing_file {
        Some(path) => StaticBilling::load(path)
            .with_context(|| format!("loading billing file {}", path.display()))?,
        None => {
            debug!("No billing file, every non-bypass identity is FREE");
            StaticBilling::default()
        }
    };

    let policy = SubscriptionPolicy::from_config(&config.subscription);
    let state = policy.check(email, &billing)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        print_plan(email, &state);
    }
    Ok(EXIT_SUCCESS)
}

fn print_plan(email: &str, state: &SubscriptionState) {
    ui::print_section("plan", email);
    ui::print_kv("Plan", &state.plan.to_string(), KEY_WIDTH);
    ui::print_kv("Subscribed", if state.subscribed { "yes" } else { "no" }, KEY_WIDTH);
    if let Some(status) = &state.status {
        ui::print_kv("Status", status, KEY_WIDTH);
    }
    if let Some(end) = state.current_period_end {
        ui::print_kv("Renews", &end.format("%Y-%m-%d").to_string(), KEY_WIDTH);
    }
    if state.bypass {
        ui::print_kv("Source", "bypass list", KEY_WIDTH);
    }
}
