//! examprint-core — Question assignment and validation engine.
//!
//! Groups exam sign-ups into sessions, decides how many questions of a pool
//! may be handed out, maps students onto questions round-robin, and collects
//! every missing resource into diagnostics. Storage, rendering and file
//! checks sit behind the traits in [`traits`].

pub mod allocation;
pub mod engine;
pub mod error;
pub mod grouping;
pub mod missing;
pub mod model;
pub mod papers;
pub mod report;
pub mod traits;
pub mod validation;
