//! examprint configuration loading.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examprint_core::allocation::ReservePolicy;
use examprint_core::engine::EngineConfig;
use examprint_core::model::Day;
use examprint_core::papers::PaperLabels;

use crate::json::JsonStore;
use crate::probe::DirectoryProbe;

/// Top-level examprint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamPrintConfig {
    /// Directory holding the JSON store files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Directory holding question images.
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,
    /// Output directory for reports and print manifests.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Questions withheld from pools of three or more.
    #[serde(default = "default_reserve")]
    pub reserve_count: usize,
    /// Days the print workflow renders. Empty means every day.
    #[serde(default)]
    pub days_to_print: Vec<Day>,
    #[serde(default = "default_written_exam_name")]
    pub written_exam_name: String,
    #[serde(default = "default_oral_exam_name")]
    pub oral_exam_name: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_images_dir() -> PathBuf {
    PathBuf::from("./exam-images")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}
fn default_reserve() -> usize {
    1
}
fn default_written_exam_name() -> String {
    PaperLabels::default().written_exam_name
}
fn default_oral_exam_name() -> String {
    PaperLabels::default().oral_exam_name
}

impl Default for ExamPrintConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            images_dir: default_images_dir(),
            output_dir: default_output_dir(),
            reserve_count: default_reserve(),
            days_to_print: Vec::new(),
            written_exam_name: default_written_exam_name(),
            oral_exam_name: default_oral_exam_name(),
        }
    }
}

impl ExamPrintConfig {
    /// The immutable settings handed to the run controller.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            reserve: ReservePolicy::new(self.reserve_count),
            days_to_print: self.days_to_print.iter().copied().collect::<BTreeSet<_>>(),
            labels: PaperLabels {
                written_exam_name: self.written_exam_name.clone(),
                oral_exam_name: self.oral_exam_name.clone(),
            },
        }
    }

    /// Open the JSON store under `data_dir`.
    pub fn open_store(&self) -> JsonStore {
        JsonStore::new(&self.data_dir)
    }

    /// Probe question images under `images_dir`.
    pub fn open_probe(&self) -> DirectoryProbe {
        DirectoryProbe::new(&self.images_dir)
    }

    /// A commented starter file for `examprint init`.
    pub fn starter_toml() -> Result<String> {
        let body = toml::to_string_pretty(&Self::default())
            .context("failed to serialize default config")?;
        Ok(format!(
            "# examprint configuration\n# Paths may reference environment variables as ${{VAR}}.\n\n{body}"
        ))
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examprint.toml` in the current directory
/// 2. `~/.config/examprint/config.toml`
///
/// Environment variable overrides: `EXAMPRINT_DATA_DIR`, `EXAMPRINT_IMAGES_DIR`,
/// `EXAMPRINT_OUTPUT_DIR`, `EXAMPRINT_RESERVE`.
pub fn load_config() -> Result<ExamPrintConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamPrintConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examprint.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ExamPrintConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamPrintConfig::default(),
    };

    // Apply env var overrides
    if let Ok(dir) = std::env::var("EXAMPRINT_DATA_DIR") {
        config.data_dir = PathBuf::from(dir);
    }
    if let Ok(dir) = std::env::var("EXAMPRINT_IMAGES_DIR") {
        config.images_dir = PathBuf::from(dir);
    }
    if let Ok(dir) = std::env::var("EXAMPRINT_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }
    if let Ok(reserve) = std::env::var("EXAMPRINT_RESERVE") {
        config.reserve_count = reserve
            .trim()
            .parse()
            .with_context(|| format!("invalid EXAMPRINT_RESERVE value: {reserve}"))?;
    }

    config.data_dir = resolve_path(&config.data_dir);
    config.images_dir = resolve_path(&config.images_dir);
    config.output_dir = resolve_path(&config.output_dir);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examprint"))
}
