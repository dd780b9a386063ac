//! Parallel interface-file scanning
//!
//! Enumerates every module interface unit under a project root, then parses
//! them on a fixed pool of worker threads. The file list is split into
//! contiguous chunks, one per worker; results are merged only after every
//! worker has joined, so the module table itself is never shared.

use crate::parser::{InterfaceParser, ModuleInfo, INTERFACE_EXTENSION};
use anyhow::{anyhow, Context, Result};
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, info, warn};

/// All discovered modules, keyed by module name.
///
/// Backed by a `BTreeMap` so iteration order is stable regardless of how
/// the scan was chunked. On duplicate module names the last parsed file
/// wins; chunks merge in file order, so the outcome does not depend on the
/// worker count.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModuleTable {
    modules: BTreeMap<String, ModuleInfo>,
}

impl ModuleTable {
    pub fn insert(&mut self, info: ModuleInfo) {
        self.modules.insert(info.name.clone(), info);
    }

    pub fn get(&self, name: &str) -> Option<&ModuleInfo> {
        self.modules.get(name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ModuleInfo)> {
        self.modules.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.modules.keys()
    }

    /// Modules whose file name violates the naming convention.
    pub fn invalid_filenames(&self) -> Vec<&ModuleInfo> {
        self.modules
            .values()
            .filter(|info| !info.filename_valid)
            .collect()
    }
}

/// Discovers and parses module interface units under a project root.
pub struct ModuleScanner {
    project_root: PathBuf,
    parser: InterfaceParser,
}

impl ModuleScanner {
    pub fn new(project_root: PathBuf) -> Result<Self> {
        if !project_root.exists() {
            return Err(anyhow!(
                "Project root does not exist: {}",
                project_root.display()
            ));
        }
        if !project_root.is_dir() {
            return Err(anyhow!(
                "Project root is not a directory: {}",
                project_root.display()
            ));
        }

        let project_root = project_root
            .canonicalize()
            .context("Failed to canonicalize project root")?;

        debug!(project_root = %project_root.display(), "ModuleScanner initialized");

        Ok(Self {
            project_root,
            parser: InterfaceParser::new(),
        })
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Recursively enumerates interface files, sorted by path.
    pub fn collect_interface_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for result in WalkBuilder::new(&self.project_root)
            .hidden(false)
            .git_ignore(true)
            .build()
        {
            let entry = match result {
                Ok(e) => e,
                Err(err) => {
                    warn!(error = %err, "Failed to read directory entry");
                    continue;
                }
            };
            let path = entry.path();

            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) == Some(INTERFACE_EXTENSION) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        files
    }

    /// Enumerates and parses all interface files under the root.
    pub fn scan(&self, jobs: Option<usize>) -> Result<ModuleTable> {
        let files = self.collect_interface_files();
        info!(
            interface_files = files.len(),
            root = %self.project_root.display(),
            "Collected interface files"
        );
        self.scan_files(&files, jobs)
    }

    /// Parses the given file list on `jobs` workers (defaults to hardware
    /// parallelism, capped by the file count).
    pub fn scan_files(&self, files: &[PathBuf], jobs: Option<usize>) -> Result<ModuleTable> {
        let mut table = ModuleTable::default();
        if files.is_empty() {
            return Ok(table);
        }

        let workers = jobs
            .filter(|&n| n > 0)
            .unwrap_or_else(default_worker_count)
            .min(files.len());

        let chunk_results = thread::scope(|scope| -> Result<Vec<Vec<ModuleInfo>>> {
            let parser = &self.parser;
            let chunk_size = files.len() / workers;
            let remainder = files.len() % workers;

            let mut handles = Vec::with_capacity(workers);
            let mut start = 0;
            for index in 0..workers {
                let end = start + chunk_size + usize::from(index < remainder);
                let chunk = &files[start..end];
                handles.push(scope.spawn(move || parse_chunk(parser, chunk)));
                start = end;
            }

            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .map_err(|_| anyhow!("Interface scan worker panicked"))
                })
                .collect()
        })?;

        for results in chunk_results {
            for info in results {
                table.insert(info);
            }
        }

        info!(modules = table.len(), workers, "Module scan completed");
        Ok(table)
    }
}

fn parse_chunk(parser: &InterfaceParser, files: &[PathBuf]) -> Vec<ModuleInfo> {
    let mut results = Vec::new();
    for path in files {
        match parser.parse(path) {
            Ok(info) if info.is_module() => results.push(info),
            Ok(_) => debug!(file = %path.display(), "No module declaration, skipping"),
            Err(err) => {
                warn!(file = %path.display(), error = %err, "Skipping unreadable interface file")
            }
        }
    }
    results
}

fn default_worker_count() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let base = dir.path();

        fs::create_dir_all(base.join("src/core")).unwrap();
        fs::write(base.join("src/math.ixx"), "export module math;\n").unwrap();
        fs::write(
            base.join("src/app.ixx"),
            "export module app;\nimport math;\n",
        )
        .unwrap();
        fs::write(
            base.join("src/core/core-io.ixx"),
            "export module core:io;\nimport :util;\n",
        )
        .unwrap();
        fs::write(base.join("src/notes.txt"), "not an interface file\n").unwrap();
        fs::write(base.join("src/empty.ixx"), "// nothing exported\n").unwrap();

        dir
    }

    #[test]
    fn test_scanner_rejects_missing_root() {
        assert!(ModuleScanner::new(PathBuf::from("/nonexistent/project")).is_err());
    }

    #[test]
    fn test_collect_is_sorted_and_filtered() {
        let dir = create_project();
        let scanner = ModuleScanner::new(dir.path().to_path_buf()).unwrap();

        let files = scanner.collect_interface_files();

        assert_eq!(files.len(), 4);
        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
        assert!(files
            .iter()
            .all(|f| f.extension().unwrap() == INTERFACE_EXTENSION));
    }

    #[test]
    fn test_scan_discards_non_modules() {
        let dir = create_project();
        let scanner = ModuleScanner::new(dir.path().to_path_buf()).unwrap();

        let table = scanner.scan(None).unwrap();

        assert_eq!(table.len(), 3);
        assert!(table.get("math").is_some());
        assert!(table.get("app").is_some());
        assert!(table.get("core:io").is_some());
    }

    #[test]
    fn test_scan_worker_count_invariance() {
        let dir = create_project();
        let scanner = ModuleScanner::new(dir.path().to_path_buf()).unwrap();

        let single = scanner.scan(Some(1)).unwrap();
        let many = scanner.scan(Some(8)).unwrap();

        assert_eq!(single, many);
    }

    #[test]
    fn test_scan_empty_tree() {
        let dir = TempDir::new().unwrap();
        let scanner = ModuleScanner::new(dir.path().to_path_buf()).unwrap();

        let table = scanner.scan(None).unwrap();

        assert!(table.is_empty());
    }

    #[test]
    fn test_duplicate_module_last_file_wins() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.ixx"), "export module dup;\nimport one;\n").unwrap();
        fs::write(dir.path().join("b.ixx"), "export module dup;\nimport two;\n").unwrap();

        let scanner = ModuleScanner::new(dir.path().to_path_buf()).unwrap();
        let table = scanner.scan(Some(1)).unwrap();

        // Files are parsed in sorted path order, so b.ixx overwrites a.ixx.
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("dup").unwrap().imports, vec!["two"]);

        let parallel = scanner.scan(Some(2)).unwrap();
        assert_eq!(table, parallel);
    }

    #[test]
    fn test_invalid_filenames_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("coreconfig.ixx"),
            "export module core:config;\n",
        )
        .unwrap();

        let scanner = ModuleScanner::new(dir.path().to_path_buf()).unwrap();
        let table = scanner.scan(None).unwrap();

        let invalid = table.invalid_filenames();
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].expected_filename, "core-config.ixx");
    }
}
