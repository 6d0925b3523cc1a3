//! Kill command - free a port by terminating its owners.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use freeport_core::{FreePortService, OperationStatus, PortNumber, Protocol};
use serde_json::json;

use super::{load_settings, print_record_table, print_results};

/// Command-line overrides on top of the config file.
pub struct KillOptions {
    pub protocol: Option<Protocol>,
    pub grace_ms: Option<u64>,
    pub force_timeout_ms: Option<u64>,
    pub exclude: Vec<String>,
    pub no_default_exclusions: bool,
    pub dry_run: bool,
}

pub async fn run(port: u32, options: KillOptions, json: bool) -> Result<ExitCode> {
    let port = PortNumber::try_from(port)?;

    let mut settings = load_settings().await?;
    settings.exclude_patterns.extend(options.exclude);
    if options.no_default_exclusions {
        settings.use_default_exclusions = false;
    }

    let mut policy = settings.termination_policy()?;
    if let Some(ms) = options.grace_ms {
        policy.grace_period = Duration::from_millis(ms);
    }
    if let Some(ms) = options.force_timeout_ms {
        policy.force_timeout = Duration::from_millis(ms);
    }

    let service = FreePortService::platform(policy, settings.exclusion_policy()?);

    if options.dry_run {
        let outcome = service.inspect(port, options.protocol).await?;
        if json {
            let value = json!({ "port": port, "dryRun": true, "kept": outcome.kept, "excluded": outcome.excluded });
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else if outcome.kept.is_empty() {
            println!("Nothing to free on port {}.", port);
        } else {
            println!("Would terminate:");
            print_record_table(&outcome.kept);
        }
        return Ok(crate::exit_code(OperationStatus::Success));
    }

    let report = service.free_port(port, options.protocol).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(crate::exit_code(report.status));
    }

    for held in &report.excluded {
        println!("Skipping {} ({})", held.record, held.reason);
    }
    if report.results.is_empty() {
        println!("Nothing to free on port {}.", port);
    } else {
        print_results(&report.results);
    }
    if report.status == OperationStatus::PartialFailure {
        eprintln!("Port {} may still be in use.", port);
    }

    Ok(crate::exit_code(report.status))
}
