//! Config command - show the effective configuration.

use std::process::ExitCode;

use anyhow::Result;
use freeport_core::{ConfigStore, OperationStatus};
use serde_json::json;

pub async fn show(json: bool) -> Result<ExitCode> {
    let store = ConfigStore::new()?;
    let settings = store.load().await?;
    let exclusions = settings.exclusion_policy()?;

    if json {
        let value = json!({
            "path": store.path(),
            "settings": settings,
            "effectivePatterns": exclusions.patterns(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(crate::exit_code(OperationStatus::Success));
    }

    println!("Config file: {}", store.path().display());
    println!("Grace period:      {} ms", settings.grace_period_ms);
    println!("Force timeout:     {} ms", settings.force_timeout_ms);
    println!("Poll interval:     {} ms", settings.poll_interval_ms);
    println!("Default exclusions: {}", if settings.use_default_exclusions { "on" } else { "off" });
    println!("Excluded owners:");
    for pattern in exclusions.patterns() {
        println!("  {}", pattern);
    }

    Ok(crate::exit_code(OperationStatus::Success))
}
