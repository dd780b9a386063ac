//! Shared utilities

pub mod logging;

pub use logging::{init, parse_level};
