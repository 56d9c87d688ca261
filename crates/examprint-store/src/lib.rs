//! examprint-store — Data store, configuration and file probe implementations.
//!
//! Implements the `ExamStore` trait over a directory of JSON files and in
//! memory, and the `FileProbe` trait over an image directory.

pub mod config;
pub mod json;
pub mod memory;
pub mod probe;

pub use config::{load_config, load_config_from, ExamPrintConfig};
pub use json::JsonStore;
pub use memory::MemoryStore;
pub use probe::DirectoryProbe;
