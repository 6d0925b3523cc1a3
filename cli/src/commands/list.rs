//! List command - show the processes bound to a port.

use std::process::ExitCode;

use anyhow::Result;
use freeport_core::{FreePortService, OperationStatus, PortNumber, Protocol};
use serde_json::json;

use super::{load_settings, print_record_table};

pub async fn run(port: u32, protocol: Option<Protocol>, all: bool, json: bool) -> Result<ExitCode> {
    let port = PortNumber::try_from(port)?;
    let settings = load_settings().await?;
    let service = FreePortService::platform(settings.termination_policy()?, settings.exclusion_policy()?);

    let outcome = service.inspect(port, protocol).await?;

    if json {
        let value = if all {
            json!({ "port": port, "owners": outcome.kept, "excluded": outcome.excluded })
        } else {
            json!({ "port": port, "owners": outcome.kept })
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(crate::exit_code(OperationStatus::Success));
    }

    if outcome.kept.is_empty() && (outcome.excluded.is_empty() || !all) {
        println!("Nothing to free on port {}.", port);
    } else if !outcome.kept.is_empty() {
        print_record_table(&outcome.kept);
    }

    if all && !outcome.excluded.is_empty() {
        println!("\nLeft untouched:");
        for held in &outcome.excluded {
            println!("  {} ({})", held.record, held.reason);
        }
    } else if !outcome.excluded.is_empty() {
        println!("\n{} protected process(es) hidden, use --all to show", outcome.excluded.len());
    }

    Ok(crate::exit_code(OperationStatus::Success))
}
