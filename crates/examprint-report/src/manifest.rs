//! JSON manifest renderer.
//!
//! Writes every prepared exam paper and signature form as a JSON document
//! under the output directory, keeping the folder layout the documents
//! carry. A typesetting step can consume the manifests later.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use examprint_core::papers::{DayDocuments, ExamPaper};
use examprint_core::traits::{DocumentRenderer, RenderSummary};

pub const SIGNATURE_FORM_FILE: &str = "signature_form.json";

/// Renders day documents as JSON files.
pub struct ManifestRenderer {
    output_dir: PathBuf,
}

impl ManifestRenderer {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// `seat-007.json`, falling back to the student id, then the placement id.
pub fn paper_file_name(paper: &ExamPaper, index: usize) -> String {
    if let Some(seat) = paper.seat_no {
        format!("seat-{seat:03}.json")
    } else if let Some(student) = paper.student_id {
        format!("student-{student}.json")
    } else if let Some(placement) = paper.placement_id {
        format!("placement-{placement}.json")
    } else {
        format!("paper-{}.json", index + 1)
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

#[async_trait]
impl DocumentRenderer for ManifestRenderer {
    fn name(&self) -> &str {
        "manifest"
    }

    async fn render_day(&self, documents: &DayDocuments) -> Result<RenderSummary> {
        let mut summary = RenderSummary::default();

        let mut paths = HashSet::new();
        let papers: Vec<(PathBuf, &ExamPaper)> = documents
            .papers
            .iter()
            .enumerate()
            .map(|(index, paper)| {
                let path = self
                    .output_dir
                    .join(&paper.folder)
                    .join(paper_file_name(paper, index));
                (path, paper)
            })
            .collect();
        for (path, paper) in &papers {
            if !paths.insert(path) {
                bail!(
                    "two papers on day {} map to {} (placement {})",
                    documents.day,
                    path.display(),
                    paper
                        .placement_id
                        .map_or_else(|| "unknown".to_string(), |id| id.to_string())
                );
            }
        }

        for (path, paper) in papers {
            write_json(&path, paper).await?;
            summary.papers += 1;
            summary.outputs.push(path.display().to_string());
        }

        for form in &documents.forms {
            let path = self.output_dir.join(&form.folder).join(SIGNATURE_FORM_FILE);
            write_json(&path, form).await?;
            summary.forms += 1;
            summary.outputs.push(path.display().to_string());
        }

        tracing::info!(
            day = documents.day,
            papers = summary.papers,
            forms = summary.forms,
            "manifests written to {}",
            self.output_dir.display()
        );
        Ok(summary)
    }
}
