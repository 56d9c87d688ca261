//! The `examprint print` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examprint_core::engine::{DayPrint, DayStatus};
use examprint_core::report::RunReport;
use examprint_report::{
    console_summary, write_missing_questions_report, write_validation_report, ManifestRenderer,
};

use super::{parse_days, save_run_report, ConsoleReporter, Setup};

pub async fn execute(
    output: Option<PathBuf>,
    days: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let setup = Setup::load(config_path, output)?;
    let mut engine = setup.config.engine_config();
    if let Some(days) = &days {
        engine.days_to_print = parse_days(days)?.into_iter().collect();
    }
    let controller = setup.controller_with(engine);

    let selection = if controller.config().days_to_print.is_empty() {
        "all days".to_string()
    } else {
        format!("days {:?}", controller.config().days_to_print)
    };
    eprintln!(
        "examprint v{} — printing {selection} from {}",
        env!("CARGO_PKG_VERSION"),
        controller.store_name()
    );

    let renderer = ManifestRenderer::new(&setup.output);
    let outcome = controller.print(&renderer, &ConsoleReporter).await?;
    if outcome.needs_assignment() {
        anyhow::bail!("no question assignments found, run `examprint assign` first");
    }

    println!("\n{}", day_table(&outcome.days));

    let validation = outcome.validation();
    if validation.has_errors() || validation.has_warnings() {
        for line in console_summary(&validation) {
            println!("{line}");
        }
        let path = write_validation_report(&validation, &setup.output)?;
        println!("Validation report: {}", path.display());
    }
    if !outcome.missing.is_empty() {
        let path = write_missing_questions_report(&outcome.missing, &setup.output)?;
        println!("Missing questions report: {}", path.display());
    }

    let printed = outcome.printed_days();
    if printed.is_empty() {
        println!("No days printed.");
    } else {
        println!(
            "Printed days {printed:?} into {}",
            setup.output.display()
        );
    }

    let report = RunReport::from_print(&outcome, controller.store_name());
    let path = save_run_report(&report, &setup.output)?;
    eprintln!("Run report saved to: {}", path.display());
    Ok(())
}

fn day_table(days: &[DayPrint]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Day", "Status", "Papers", "Forms", "Errors", "Warnings"]);
    for day in days {
        let (status, papers, forms) = match &day.status {
            DayStatus::Printed { papers, forms } => {
                ("printed".to_string(), papers.to_string(), forms.to_string())
            }
            DayStatus::Skipped => ("skipped".to_string(), "-".into(), "-".into()),
            DayStatus::Failed { message } => (format!("failed: {message}"), "-".into(), "-".into()),
        };
        table.add_row(vec![
            Cell::new(day.day),
            Cell::new(status),
            Cell::new(papers),
            Cell::new(forms),
            Cell::new(day.validation.error_count()),
            Cell::new(day.validation.warning_count()),
        ]);
    }
    table
}
