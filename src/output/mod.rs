//! Report artifacts

pub mod schema;

pub use schema::{ModuleRecord, ScanReport};
