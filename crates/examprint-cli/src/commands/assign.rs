//! The `examprint assign` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examprint_core::engine::{AssignOutcome, DaySummary};
use examprint_core::report::RunReport;
use examprint_report::{
    console_summary, write_assignment_summary, write_missing_images_report,
    write_missing_questions_report, write_validation_report,
};

use super::{save_run_report, ConsoleReporter, Setup};

pub async fn execute(output: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let setup = Setup::load(config_path, output)?;
    let controller = setup.controller();
    eprintln!(
        "examprint v{} — assigning questions from {}",
        env!("CARGO_PKG_VERSION"),
        controller.store_name()
    );

    let outcome = controller.assign(&ConsoleReporter).await?;

    if outcome.all_assigned() {
        println!("All students already have question assignments!");
        println!(
            "{} assignments in store. To reassign, run `examprint clear --yes` first.",
            outcome.existing_assignments
        );
    } else {
        print_summary(&outcome);
        write_reports(&outcome, &setup)?;
    }

    let report = RunReport::from_assign(&outcome, controller.store_name());
    let path = save_run_report(&report, &setup.output)?;
    eprintln!("Run report saved to: {}", path.display());
    Ok(())
}

fn write_reports(outcome: &AssignOutcome, setup: &Setup) -> Result<()> {
    let output = &setup.output;

    let path = write_assignment_summary(outcome, output)?;
    println!("Assignment summary: {}", path.display());

    if !outcome.missing.is_empty() {
        let path = write_missing_questions_report(&outcome.missing, output)?;
        println!(
            "{} course-language combinations are missing questions, see {}",
            outcome.missing.len(),
            path.display()
        );
    }

    if outcome.images.has_errors() || outcome.images.has_warnings() {
        println!(
            "Image check: {} errors, {} warnings over {} questions",
            outcome.images.error_count(),
            outcome.images.warning_count(),
            outcome.images_checked
        );
        let images_dir = setup.config.images_dir.display().to_string();
        let path =
            write_missing_images_report(&outcome.images, outcome.images_checked, &images_dir, output)?;
        println!("Missing image files report: {}", path.display());
    } else {
        println!("Image check: all {} image files OK", outcome.images_checked);
    }

    if outcome.validation.has_errors() || outcome.validation.has_warnings() {
        println!();
        for line in console_summary(&outcome.validation) {
            println!("{line}");
        }
        let path = write_validation_report(&outcome.validation, output)?;
        println!("Validation report: {}", path.display());
    }
    Ok(())
}

fn print_summary(outcome: &AssignOutcome) {
    println!("\n{}", day_table(&outcome.days));
    println!(
        "Assigned {} questions, {} students still missing questions ({} assignments in store)",
        outcome.total_assigned(),
        outcome.total_skipped(),
        outcome.total_in_store()
    );
    if !outcome.undated.is_empty() {
        println!(
            "{} sign-ups have no day and were not assigned",
            outcome.undated.len()
        );
    }
    let ready = outcome.ready_days();
    if !ready.is_empty() {
        println!("Days ready for printing: {ready:?}");
    }
}

fn day_table(days: &[DaySummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Day",
        "Students",
        "Unassigned",
        "Assigned now",
        "Missing",
        "Total assigned",
        "Status",
    ]);
    for day in days {
        table.add_row(vec![
            Cell::new(day.day),
            Cell::new(day.total_students),
            Cell::new(day.unassigned_before),
            Cell::new(day.assigned),
            Cell::new(day.skipped),
            Cell::new(day.total_assigned),
            Cell::new(day.status()),
        ]);
    }
    table
}
