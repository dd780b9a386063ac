//! Module dependency resolution
//!
//! Folds the per-file import lists of a [`ModuleTable`] into a canonical
//! module-to-dependencies map. Partition imports written as `:name` are
//! qualified with their parent module, and every parent module picks up all
//! of its discovered partitions as dependencies.

use crate::parser::PARTITION_SEPARATOR;
use crate::scanner::ModuleTable;
use std::collections::BTreeMap;

/// Resolved dependency lists, keyed by module name.
///
/// Invariants: no module depends on itself, every entry is sorted and
/// deduplicated, and modules without dependencies have no entry at all.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    deps: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Builds the graph from a scanned module table.
    ///
    /// Imports referring to modules that were never discovered are kept
    /// as-is; resolution does not require the target to exist.
    pub fn resolve(table: &ModuleTable) -> Self {
        let mut deps = BTreeMap::new();

        for (name, info) in table.iter() {
            let parent = parent_module(name);
            let mut clean = Vec::new();

            for import in &info.imports {
                if import.is_empty() || import == name {
                    continue;
                }
                let qualified = match import.strip_prefix(PARTITION_SEPARATOR) {
                    Some(partition) => format!("{parent}{PARTITION_SEPARATOR}{partition}"),
                    None => import.clone(),
                };
                // A bare partition alias can resolve back to the importing
                // module itself; that is still a self-reference.
                if qualified == *name {
                    continue;
                }
                clean.push(qualified);
            }

            // A parent module depends on every one of its partitions, even
            // when it never imports them explicitly.
            if !name.contains(PARTITION_SEPARATOR) {
                let prefix = format!("{name}{PARTITION_SEPARATOR}");
                for other in table.names() {
                    if other.starts_with(&prefix) {
                        clean.push(other.clone());
                    }
                }
            }

            clean.sort();
            clean.dedup();
            if !clean.is_empty() {
                deps.insert(name.clone(), clean);
            }
        }

        Self { deps }
    }

    pub fn get(&self, module: &str) -> Option<&[String]> {
        self.deps.get(module).map(|deps| deps.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.deps.iter()
    }

    /// Number of modules that have at least one dependency.
    pub fn len(&self) -> usize {
        self.deps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    /// Total number of edges across all modules.
    pub fn total_dependencies(&self) -> usize {
        self.deps.values().map(Vec::len).sum()
    }

    pub fn as_map(&self) -> &BTreeMap<String, Vec<String>> {
        &self.deps
    }
}

/// Strips a partition suffix; a parent module maps to itself.
fn parent_module(name: &str) -> &str {
    name.split(PARTITION_SEPARATOR).next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ModuleInfo;
    use std::path::PathBuf;

    fn module(name: &str, imports: &[&str]) -> ModuleInfo {
        ModuleInfo {
            name: name.to_string(),
            imports: imports.iter().map(|s| s.to_string()).collect(),
            source_path: PathBuf::from(format!("{}.ixx", name.replace(':', "-"))),
            filename_valid: true,
            expected_filename: format!("{}.ixx", name.replace(':', "-")),
        }
    }

    fn table(modules: Vec<ModuleInfo>) -> ModuleTable {
        let mut table = ModuleTable::default();
        for info in modules {
            table.insert(info);
        }
        table
    }

    #[test]
    fn test_partition_folding() {
        let table = table(vec![
            module("p", &[]),
            module("p:a", &[]),
            module("p:b", &[]),
        ]);

        let graph = DependencyGraph::resolve(&table);

        assert_eq!(graph.get("p").unwrap(), ["p:a", "p:b"]);
        assert!(graph.get("p:a").is_none());
        assert!(graph.get("p:b").is_none());
    }

    #[test]
    fn test_bare_partition_qualification() {
        let table = table(vec![module("p:a", &[":util"])]);

        let graph = DependencyGraph::resolve(&table);

        assert_eq!(graph.get("p:a").unwrap(), ["p:util"]);
    }

    #[test]
    fn test_bare_partition_from_parent_module() {
        let table = table(vec![module("p", &[":util"])]);

        let graph = DependencyGraph::resolve(&table);

        assert_eq!(graph.get("p").unwrap(), ["p:util"]);
    }

    #[test]
    fn test_direct_self_reference_dropped() {
        let table = table(vec![module("app", &["app"])]);

        let graph = DependencyGraph::resolve(&table);

        assert!(graph.get("app").is_none());
    }

    #[test]
    fn test_self_reference_via_partition_alias_dropped() {
        let table = table(vec![module("p:a", &[":a"])]);

        let graph = DependencyGraph::resolve(&table);

        assert!(graph.get("p:a").is_none());
    }

    #[test]
    fn test_dangling_imports_kept() {
        let table = table(vec![module("app", &["ghost"])]);

        let graph = DependencyGraph::resolve(&table);

        assert_eq!(graph.get("app").unwrap(), ["ghost"]);
    }

    #[test]
    fn test_explicit_partition_import_deduplicated() {
        let table = table(vec![module("p", &["p:a", "math"]), module("p:a", &[])]);

        let graph = DependencyGraph::resolve(&table);

        assert_eq!(graph.get("p").unwrap(), ["math", "p:a"]);
    }

    #[test]
    fn test_totals() {
        let table = table(vec![
            module("app", &["math", "util"]),
            module("math", &[]),
            module("util", &["math"]),
        ]);

        let graph = DependencyGraph::resolve(&table);

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.total_dependencies(), 3);
    }
}
