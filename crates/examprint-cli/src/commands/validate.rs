//! The `examprint validate` command.

use std::path::PathBuf;

use anyhow::Result;

use examprint_core::report::RunReport;
use examprint_report::{console_summary, write_missing_questions_report, write_validation_report};

use super::{save_run_report, ConsoleReporter, Setup};

pub async fn execute(output: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let setup = Setup::load(config_path, output)?;
    let controller = setup.controller();
    eprintln!(
        "examprint v{} — validating {}",
        env!("CARGO_PKG_VERSION"),
        controller.store_name()
    );

    let outcome = controller.validate(&ConsoleReporter).await?;

    println!(
        "Checked {} written and {} oral sign-ups, {} questions",
        outcome.counts.written, outcome.counts.oral, outcome.counts.questions
    );
    for line in console_summary(&outcome.validation) {
        println!("{line}");
    }
    if !outcome.undated.is_empty() {
        println!(
            "\n{} sign-ups have no day and belong to no print run",
            outcome.undated.len()
        );
    }

    let path = write_validation_report(&outcome.validation, &setup.output)?;
    println!("\nValidation report: {}", path.display());
    if !outcome.missing.is_empty() {
        let path = write_missing_questions_report(&outcome.missing, &setup.output)?;
        println!("Missing questions report: {}", path.display());
    }

    let report = RunReport::from_validate(&outcome, controller.store_name());
    let path = save_run_report(&report, &setup.output)?;
    eprintln!("Run report saved to: {}", path.display());
    Ok(())
}
