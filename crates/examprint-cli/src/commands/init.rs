//! The `examprint init` command.

use std::path::Path;

use anyhow::Result;

use examprint_store::{load_config_from, ExamPrintConfig};

pub async fn execute() -> Result<()> {
    let config_path = Path::new("examprint.toml");
    if config_path.exists() {
        println!("examprint.toml already exists, skipping.");
    } else {
        std::fs::write(config_path, ExamPrintConfig::starter_toml()?)?;
        println!("Created examprint.toml");
    }

    let config = load_config_from(Some(config_path))?;
    let created = config.open_store().init().await?;
    for path in &created {
        println!("Created {}", path.display());
    }
    std::fs::create_dir_all(&config.images_dir)?;

    println!("\nNext steps:");
    println!(
        "  1. Fill {}/written.json, oral.json and questions.json",
        config.data_dir.display()
    );
    println!(
        "  2. Copy question images into {}",
        config.images_dir.display()
    );
    println!("  3. Run: examprint validate");
    println!("  4. Run: examprint assign");
    println!("  5. Run: examprint print --days 1");

    Ok(())
}
