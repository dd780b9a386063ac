//! Sync orchestration
//!
//! `SyncService` ties the phases together: locate the descriptor, read its
//! targets, scan the tree for interface files, resolve the dependency
//! graph, project it onto each target, and patch the descriptor. Only the
//! top-level inputs can fail the run; everything else degrades to logged
//! soft errors.

use crate::build::deps::calculate_target_dependencies;
use crate::build::patcher::{DescriptorPatcher, PatchOutcome};
use crate::build::reader::DescriptorReader;
use crate::build::{self, BuildTarget};
use crate::graph::DependencyGraph;
use crate::scanner::{ModuleScanner, ModuleTable};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::info;

/// Errors that abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Project root does not exist
    #[error("Project root not found: {0}")]
    PathNotFound(PathBuf),

    /// Project root is not a directory
    #[error("Project root is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Neither `src/BUILD` nor `BUILD` exists under the root
    #[error("No BUILD file found under {0} (tried src/BUILD and BUILD)")]
    DescriptorNotFound(PathBuf),

    /// Descriptor or scan I/O failure
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SyncError {
    /// Returns a user-friendly error message with troubleshooting hints
    pub fn help_message(&self) -> String {
        match self {
            SyncError::PathNotFound(path) => {
                format!(
                    "Error: Project root not found\nPath: {}\n\n\
                    Help: The specified path does not exist. Please check:\n\
                    - Is the path correct?\n\
                    - Does the path exist on your system?\n\
                    - Do you have permission to access it?",
                    path.display()
                )
            }
            SyncError::NotADirectory(path) => {
                format!(
                    "Error: Project root is not a directory\nPath: {}\n\n\
                    Help: The specified path is a file, not a directory.\n\
                    Please provide the path to the project root directory.",
                    path.display()
                )
            }
            SyncError::DescriptorNotFound(root) => {
                format!(
                    "Error: No BUILD file found\nProject root: {}\n\n\
                    Help: modsync looks for the build descriptor at:\n\
                    1. <root>/src/BUILD\n\
                    2. <root>/BUILD\n\
                    Neither exists. Is this the right project root?",
                    root.display()
                )
            }
            SyncError::Internal(err) => {
                format!("Error: {err}")
            }
        }
    }
}

/// Run-wide knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Forced scan worker count; `None` uses available parallelism.
    pub jobs: Option<usize>,
    /// Compute and report without rewriting the descriptor.
    pub check: bool,
}

/// Everything a run produced, for summaries and the JSON artifact.
#[derive(Debug)]
pub struct SyncReport {
    pub descriptor_path: PathBuf,
    pub interface_file_count: usize,
    pub table: ModuleTable,
    pub graph: DependencyGraph,
    pub targets: Vec<BuildTarget>,
    pub outcome: PatchOutcome,
    pub elapsed_ms: u64,
}

pub struct SyncService {
    project_root: PathBuf,
    options: SyncOptions,
}

impl SyncService {
    pub fn new(project_root: PathBuf, options: SyncOptions) -> Result<Self, SyncError> {
        if !project_root.exists() {
            return Err(SyncError::PathNotFound(project_root));
        }
        if !project_root.is_dir() {
            return Err(SyncError::NotADirectory(project_root));
        }
        Ok(Self {
            project_root,
            options,
        })
    }

    /// Runs the full scan-resolve-patch pipeline.
    pub fn run(&self) -> Result<SyncReport, SyncError> {
        let start = Instant::now();

        let descriptor_path = build::find_descriptor(&self.project_root)
            .ok_or_else(|| SyncError::DescriptorNotFound(self.project_root.clone()))?;
        info!(descriptor = %descriptor_path.display(), "Using build descriptor");

        let reader = DescriptorReader::new();
        let mut targets = reader.read(&descriptor_path)?;

        let scanner = ModuleScanner::new(self.project_root.clone())?;
        let files = scanner.collect_interface_files();
        let table = scanner.scan_files(&files, self.options.jobs)?;
        let graph = DependencyGraph::resolve(&table);
        info!(
            modules = table.len(),
            modules_with_deps = graph.len(),
            total_deps = graph.total_dependencies(),
            "Dependency graph resolved"
        );

        let descriptor_dir = descriptor_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        calculate_target_dependencies(&mut targets, &descriptor_dir, &graph);

        let patcher = DescriptorPatcher::new();
        let outcome =
            patcher.patch_file(&descriptor_path, &targets, &table, !self.options.check)?;

        Ok(SyncReport {
            descriptor_path,
            interface_file_count: files.len(),
            table,
            graph,
            targets,
            outcome,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }
}
