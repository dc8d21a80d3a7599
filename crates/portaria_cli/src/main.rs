//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `portaria_core` linkage and the configured backend.
//! - Print the front-desk summary as plain `key=value` lines.

use portaria_core::{Backend, PortariaConfig, SummaryService, DEFAULT_RECENT_LIMIT};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("portaria_core ping={}", portaria_core::ping());
    println!("portaria_core version={}", portaria_core::core_version());

    match print_summary() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("portaria_cli error={message}");
            ExitCode::FAILURE
        }
    }
}

fn print_summary() -> Result<(), String> {
    let config = PortariaConfig::from_env().map_err(|err| err.to_string())?;
    let backend = Backend::open(&config.backend).map_err(|err| err.to_string())?;
    println!("backend={}", backend.kind());

    let repo = backend.repository().map_err(|err| err.to_string())?;
    let summary = SummaryService::new(repo.as_dyn())
        .summary(DEFAULT_RECENT_LIMIT)
        .map_err(|err| err.to_string())?;

    println!("residents={}", summary.resident_count);
    println!("packages={}", summary.package_count);
    println!("picked_up={}", summary.picked_up_count);
    println!("pending={}", summary.pending_count());
    for package in &summary.recent_packages {
        let status = if package.picked_up {
            "picked_up"
        } else {
            "pending"
        };
        println!(
            "recent id={} origin={} status={}",
            package.id, package.origin, status
        );
    }
    Ok(())
}
