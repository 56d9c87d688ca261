//! examprint-report — Text reports and document rendering for examprint.
//!
//! Produces the plain-text run reports (assignment summary, missing
//! questions, missing image files, validation) and renders prepared exam
//! papers and signature forms as JSON manifests.

pub mod images;
pub mod manifest;
pub mod missing;
pub mod summary;
mod text;
pub mod validation;

pub use images::write_missing_images_report;
pub use manifest::ManifestRenderer;
pub use missing::write_missing_questions_report;
pub use summary::write_assignment_summary;
pub use validation::{console_summary, write_validation_report};
