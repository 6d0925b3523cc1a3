//! Subcommand implementations.

pub mod config;
pub mod kill;
pub mod list;
pub mod terminate;

use freeport_core::{ConfigStore, ProcessRecord, Settings, TerminationResult};

/// Load settings from the default location.
pub(crate) async fn load_settings() -> anyhow::Result<Settings> {
    Ok(ConfigStore::new()?.load().await?)
}

pub(crate) fn print_record_table(records: &[ProcessRecord]) {
    println!(
        "{:<8} {:<6} {:<8} {:<20} {:<15} {:<10} COMMAND",
        "PROTO", "PORT", "PID", "PROCESS", "ADDRESS", "USER"
    );
    println!("{}", "-".repeat(90));

    for record in records {
        println!(
            "{:<8} {:<6} {:<8} {:<20} {:<15} {:<10} {}",
            record.protocol,
            record.port,
            record.pid,
            truncate(&record.owner_name, 20),
            truncate(&record.address, 15),
            truncate(&record.user, 10),
            truncate(record.display_command(), 40)
        );
    }
}

pub(crate) fn print_results(results: &[TerminationResult]) {
    for result in results {
        let marker = if result.outcome.is_success() { "✓" } else { "✗" };
        println!("{} PID {}: {}", marker, result.pid, result.outcome);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 1).collect();
        format!("{}…", head)
    }
}
