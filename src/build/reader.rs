//! Build-descriptor reading
//!
//! Locates `cc_module_library` / `cc_module_binary` target blocks and
//! resolves each target's `module_interfaces` field, expanding single-level
//! (`dir/*.ixx`) and recursive (`dir/**/*.ixx`) glob patterns against the
//! descriptor file's directory.

use super::{block_extent, BuildTarget, TargetKind};
use crate::parser::INTERFACE_EXTENSION;
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

pub struct DescriptorReader {
    target: Regex,
    interfaces: Regex,
    quoted: Regex,
}

impl Default for DescriptorReader {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorReader {
    pub fn new() -> Self {
        Self {
            target: Regex::new(
                r#"(cc_module_library|cc_module_binary)\s*\(\s*name\s*=\s*"([^"]+)""#,
            )
            .expect("valid regex"),
            interfaces: Regex::new(r"module_interfaces\s*=\s*(\[[^\]]*\]|glob\([^)]*\))")
                .expect("valid regex"),
            quoted: Regex::new(r#""([^"]+)""#).expect("valid regex"),
        }
    }

    /// Reads the descriptor file and returns every declared target with its
    /// interface-file list resolved relative to the descriptor directory.
    pub fn read(&self, descriptor_path: &Path) -> Result<Vec<BuildTarget>> {
        let content = fs::read_to_string(descriptor_path).with_context(|| {
            format!("Failed to read descriptor: {}", descriptor_path.display())
        })?;
        let base = descriptor_path.parent().unwrap_or_else(|| Path::new("."));
        let targets = self.parse(&content, base);
        info!(
            descriptor = %descriptor_path.display(),
            targets = targets.len(),
            "Parsed build targets"
        );
        Ok(targets)
    }

    /// Parses descriptor text; `base` is the directory globs expand against.
    pub fn parse(&self, content: &str, base: &Path) -> Vec<BuildTarget> {
        let mut targets = Vec::new();

        for caps in self.target.captures_iter(content) {
            let Some(keyword_match) = caps.get(0) else {
                continue;
            };
            let Some(kind) = TargetKind::from_keyword(&caps[1]) else {
                continue;
            };
            let name = caps[2].to_string();

            let Some(extent) = block_extent(content, keyword_match.start()) else {
                warn!(target = %name, "Unbalanced target block, skipping");
                continue;
            };

            let mut target = BuildTarget::new(name, kind);
            target.interface_files = self.parse_interfaces(&content[extent], base);
            debug!(
                target = %target.name,
                kind = %target.kind,
                interface_files = target.interface_files.len(),
                "Found build target"
            );
            targets.push(target);
        }

        targets
    }

    /// Extracts the `module_interfaces` value from one target body.
    fn parse_interfaces(&self, target_body: &str, base: &Path) -> Vec<String> {
        let Some(caps) = self.interfaces.captures(target_body) else {
            return Vec::new();
        };
        let value = &caps[1];

        let mut files = Vec::new();
        if value.starts_with("glob(") {
            for quoted in self.quoted.captures_iter(value) {
                files.extend(self.expand_glob(&quoted[1], base));
            }
        } else {
            let literal_suffix = format!(".{INTERFACE_EXTENSION}");
            for quoted in self.quoted.captures_iter(value) {
                let file = &quoted[1];
                if file.ends_with(&literal_suffix) {
                    files.push(file.to_string());
                }
            }
        }

        files.sort();
        files.dedup();
        files
    }

    /// Expands one glob pattern. Patterns ending in `*.ixx` list immediate
    /// children of a directory; `**/*.ixx` recurses. Anything else is kept
    /// as a literal path. A missing directory yields no files.
    fn expand_glob(&self, pattern: &str, base: &Path) -> Vec<String> {
        let recursive_suffix = format!("**/*.{INTERFACE_EXTENSION}");
        let single_suffix = format!("*.{INTERFACE_EXTENSION}");

        if let Some(prefix) = pattern.strip_suffix(&recursive_suffix) {
            self.walk_glob_dir(base, prefix, None)
        } else if let Some(prefix) = pattern.strip_suffix(&single_suffix) {
            self.walk_glob_dir(base, prefix, Some(1))
        } else {
            vec![pattern.to_string()]
        }
    }

    fn walk_glob_dir(&self, base: &Path, dir_prefix: &str, max_depth: Option<usize>) -> Vec<String> {
        let dir = dir_prefix.trim_end_matches('/');
        let dir_path = if dir.is_empty() {
            base.to_path_buf()
        } else {
            base.join(dir)
        };
        if !dir_path.is_dir() {
            debug!(dir = %dir_path.display(), "Glob directory does not exist, no matches");
            return Vec::new();
        }

        let mut walk = WalkBuilder::new(&dir_path);
        // Globs enumerate exactly what is on disk.
        walk.standard_filters(false);
        if let Some(depth) = max_depth {
            walk.max_depth(Some(depth));
        }

        let mut files = Vec::new();
        for result in walk.build() {
            let entry = match result {
                Ok(e) => e,
                Err(err) => {
                    warn!(error = %err, "Failed to read directory entry during glob");
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(INTERFACE_EXTENSION) {
                continue;
            }
            let relative = path.strip_prefix(base).unwrap_or(path);
            files.push(relative.to_string_lossy().into_owned());
        }
        files
    }
}
