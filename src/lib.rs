//! modsync - module dependency scanner and BUILD descriptor synchronizer
//!
//! Scans a source tree of C++20 module interface files (`.ixx`), rebuilds
//! the inter-module dependency graph (folding `parent:partition` units into
//! their parent module), and rewrites the `module_dependencies` field of
//! each `cc_module_library`/`cc_module_binary` target in the project's
//! BUILD file so the recorded dependencies match reality.
//!
//! # Core Concepts
//!
//! - **Module table**: every discovered module, built by a fork-join
//!   parallel scan of the interface files
//! - **Dependency graph**: per-module resolved dependency lists with
//!   partition imports qualified and partitions folded into parents
//! - **Descriptor patching**: bracket-balanced, format-preserving rewrite
//!   of the BUILD file that only touches the owned field and only writes
//!   when the content actually changed
//!
//! # Example Usage
//!
//! ```no_run
//! use modsync::{SyncOptions, SyncService};
//! use std::path::PathBuf;
//!
//! fn sync(project_root: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
//!     let service = SyncService::new(project_root, SyncOptions::default())?;
//!     let report = service.run()?;
//!
//!     println!("Modules: {}", report.table.len());
//!     println!("Descriptor rewritten: {}", report.outcome.written);
//!
//!     Ok(())
//! }
//! ```

pub mod build;
pub mod cli;
pub mod graph;
pub mod output;
pub mod parser;
pub mod scanner;
pub mod sync;
pub mod util;

pub use build::patcher::{PatchAction, PatchOutcome};
pub use build::{BuildTarget, TargetKind};
pub use graph::DependencyGraph;
pub use output::ScanReport;
pub use parser::{InterfaceParser, ModuleInfo};
pub use scanner::{ModuleScanner, ModuleTable};
pub use sync::{SyncError, SyncOptions, SyncReport, SyncService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
