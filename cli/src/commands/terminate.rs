//! Terminate command - terminate processes by PID.

use std::process::ExitCode;

use anyhow::Result;
use freeport_core::{OperationStatus, ProcessController, ProcessTerminator};

use super::{load_settings, print_results};

pub async fn run(pids: Vec<u32>, json: bool) -> Result<ExitCode> {
    let settings = load_settings().await?;
    let terminator = ProcessTerminator::with_policy(ProcessController::new(), settings.termination_policy()?);

    let results = terminator.terminate(pids).await;
    let status = OperationStatus::from_results(&results);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_results(&results);
    }

    Ok(crate::exit_code(status))
}
