//! Machine-readable scan report
//!
//! Mirrors the module table and dependency graph as a JSON artifact with
//! stable key ordering.

use crate::graph::DependencyGraph;
use crate::scanner::ModuleTable;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub module_dependencies: BTreeMap<String, Vec<String>>,
    pub modules: BTreeMap<String, ModuleRecord>,
}

#[derive(Debug, Serialize)]
pub struct ModuleRecord {
    pub file_path: String,
    pub filename_valid: bool,
    /// Present only when the file name violates the naming convention.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_filename: Option<String>,
    pub imports: Vec<String>,
}

impl ScanReport {
    pub fn build(table: &ModuleTable, graph: &DependencyGraph) -> Self {
        let modules = table
            .iter()
            .map(|(name, info)| {
                (
                    name.clone(),
                    ModuleRecord {
                        file_path: info.source_path.display().to_string(),
                        filename_valid: info.filename_valid,
                        expected_filename: (!info.filename_valid)
                            .then(|| info.expected_filename.clone()),
                        imports: info.imports.clone(),
                    },
                )
            })
            .collect();

        Self {
            module_dependencies: graph.as_map().clone(),
            modules,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize scan report")
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut json = self.to_json()?;
        json.push('\n');
        fs::write(path, json)
            .with_context(|| format!("Failed to write scan report: {}", path.display()))
    }
}
