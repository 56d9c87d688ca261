//! The `examprint clear` command.

use std::path::PathBuf;

use anyhow::Result;

use super::Setup;

pub async fn execute(yes: bool, config_path: Option<PathBuf>) -> Result<()> {
    anyhow::ensure!(
        yes,
        "refusing to delete assignments without --yes; this cannot be undone"
    );
    let setup = Setup::load(config_path, None)?;
    let controller = setup.controller();
    let removed = controller.clear().await?;
    println!(
        "Removed {removed} assignments from {}",
        controller.store_name()
    );
    Ok(())
}
