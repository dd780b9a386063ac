//! Per-target dependency calculation
//!
//! Joins each target's claimed interface files against the resolved
//! dependency graph. Files are re-parsed individually rather than looked up
//! in the scan results, keeping target resolution independent of scan
//! chunking and tolerant of targets that reference files outside the
//! recursive scan root.

use super::BuildTarget;
use crate::graph::DependencyGraph;
use crate::parser::InterfaceParser;
use std::path::Path;
use tracing::{debug, warn};

/// Fills in `module_dependencies` for every target.
///
/// Interface paths are resolved against the descriptor file's directory.
/// Missing files, files without a module declaration, and modules absent
/// from the graph are skipped; a target may end up with an empty
/// projection, which the patcher later ignores.
pub fn calculate_target_dependencies(
    targets: &mut [BuildTarget],
    descriptor_dir: &Path,
    graph: &DependencyGraph,
) {
    let parser = InterfaceParser::new();

    for target in targets.iter_mut() {
        for interface_file in &target.interface_files {
            let path = descriptor_dir.join(interface_file);
            if !path.is_file() {
                debug!(
                    target = %target.name,
                    file = %path.display(),
                    "Claimed interface file not found, skipping"
                );
                continue;
            }

            let info = match parser.parse(&path) {
                Ok(info) => info,
                Err(err) => {
                    warn!(
                        target = %target.name,
                        file = %path.display(),
                        error = %err,
                        "Failed to parse claimed interface file"
                    );
                    continue;
                }
            };
            if !info.is_module() {
                debug!(
                    target = %target.name,
                    file = %path.display(),
                    "Claimed file declares no module"
                );
                continue;
            }

            if let Some(deps) = graph.get(&info.name) {
                target
                    .module_dependencies
                    .insert(info.name.clone(), deps.to_vec());
            }
        }

        debug!(
            target = %target.name,
            modules = target.module_dependencies.len(),
            "Calculated target dependencies"
        );
    }
}
