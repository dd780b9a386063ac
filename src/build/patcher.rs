//! Descriptor text patching
//!
//! Rewrites each target's `module_dependencies` field in place. Edits are
//! computed as byte-range replacements against one immutable snapshot of
//! the descriptor text and applied in descending position order, so earlier
//! edits never invalidate later offsets. The file is written back only when
//! the final text differs from the original.

use super::{block_extent, field_end, BuildTarget};
use crate::scanner::ModuleTable;
use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::ops::Range;
use std::path::Path;
use tracing::{debug, info};

const INTERFACES_FIELD: &str = "module_interfaces";

/// What happened to one target's dependency block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchAction {
    /// An existing block was replaced with freshly computed content.
    Replaced,
    /// No block existed; one was inserted after `module_interfaces`.
    Inserted,
}

/// Result of patching one descriptor file.
#[derive(Debug, Default)]
pub struct PatchOutcome {
    /// Whether the computed text differed from the original.
    pub changed: bool,
    /// Whether the descriptor was actually rewritten on disk.
    pub written: bool,
    /// Per-target actions, in descriptor order.
    pub updated: Vec<(String, PatchAction)>,
}

pub struct DescriptorPatcher {
    // Consumes an optional trailing same-line comment so the warning
    // annotation emitted below is re-absorbed on the next run. A block this
    // pattern cannot match is treated as absent and a fresh one inserted.
    existing_block: Regex,
}

impl Default for DescriptorPatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorPatcher {
    pub fn new() -> Self {
        Self {
            existing_block: Regex::new(
                r"module_dependencies\s*=\s*\{[^}]*\}\s*,?(?:[ \t]*#[^\n]*)?",
            )
            .expect("valid regex"),
        }
    }

    /// Computes the patched descriptor text and per-target actions.
    ///
    /// Targets with an empty projection are skipped, as are targets whose
    /// block or insertion point cannot be located; neither is an error.
    pub fn patch_text(
        &self,
        original: &str,
        targets: &[BuildTarget],
        table: &ModuleTable,
    ) -> (String, Vec<(String, PatchAction)>) {
        let mut edits: Vec<(Range<usize>, String)> = Vec::new();
        let mut updated = Vec::new();

        for target in targets {
            if target.module_dependencies.is_empty() {
                continue;
            }

            let block = render_dependency_block(target, table);
            match self.locate_edit(original, target, &block) {
                Some((range, replacement, action)) => {
                    if original[range.clone()] != replacement {
                        edits.push((range, replacement));
                        updated.push((target.name.clone(), action));
                    }
                }
                None => {
                    debug!(
                        target = %target.name,
                        "No patch location found, leaving target untouched"
                    );
                }
            }
        }

        // Right-to-left application keeps every recorded range valid.
        edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
        let mut text = original.to_string();
        for (range, replacement) in edits {
            text.replace_range(range, &replacement);
        }

        (text, updated)
    }

    /// Patches the descriptor on disk. With `write` false the change is
    /// computed and reported but the file is left alone.
    pub fn patch_file(
        &self,
        descriptor_path: &Path,
        targets: &[BuildTarget],
        table: &ModuleTable,
        write: bool,
    ) -> Result<PatchOutcome> {
        let original = fs::read_to_string(descriptor_path).with_context(|| {
            format!("Failed to read descriptor: {}", descriptor_path.display())
        })?;

        let (patched, updated) = self.patch_text(&original, targets, table);
        let changed = patched != original;

        if changed && write {
            fs::write(descriptor_path, &patched).with_context(|| {
                format!("Failed to write descriptor: {}", descriptor_path.display())
            })?;
            info!(
                descriptor = %descriptor_path.display(),
                targets_updated = updated.len(),
                "Descriptor updated"
            );
        } else if changed {
            info!(
                descriptor = %descriptor_path.display(),
                targets_updated = updated.len(),
                "Descriptor out of date, not written"
            );
        } else {
            info!(descriptor = %descriptor_path.display(), "Descriptor already up to date");
        }

        Ok(PatchOutcome {
            changed,
            written: changed && write,
            updated,
        })
    }

    /// Finds where a target's dependency block lives (or belongs) and what
    /// to put there. Returns the absolute byte range to replace, the
    /// replacement text, and the action taken.
    fn locate_edit(
        &self,
        text: &str,
        target: &BuildTarget,
        block: &str,
    ) -> Option<(Range<usize>, String, PatchAction)> {
        let pattern = format!(
            r#"{}\s*\(\s*name\s*=\s*"{}""#,
            target.kind.keyword(),
            regex::escape(&target.name)
        );
        let target_re = Regex::new(&pattern).ok()?;
        let keyword_match = target_re.find(text)?;
        let extent = block_extent(text, keyword_match.start())?;
        let body = &text[extent.clone()];

        if let Some(existing) = self.existing_block.find(body) {
            let range = extent.start + existing.start()..extent.start + existing.end();
            return Some((range, block.to_string(), PatchAction::Replaced));
        }

        // No block yet: insert right after the comma that terminates the
        // module_interfaces field. Its value may nest brackets (glob calls),
        // so the comma is found by depth counting, not by line scanning.
        let interfaces_pos = body.find(INTERFACES_FIELD)?;
        let equals = interfaces_pos + body[interfaces_pos..].find('=')?;
        let value_end = field_end(body, equals + 1)?;
        let insert_at = extent.start + value_end;

        Some((
            insert_at..insert_at,
            format!("\n    {block}"),
            PatchAction::Inserted,
        ))
    }
}

/// Renders the canonical dependency block for one target: stable key order,
/// list-of-strings values, and a trailing warning comment whenever a
/// realized module's file name violates the naming convention.
fn render_dependency_block(target: &BuildTarget, table: &ModuleTable) -> String {
    let mut block = String::from("module_dependencies = {\n");
    let mut invalid = Vec::new();

    for (module, deps) in &target.module_dependencies {
        if let Some(info) = table.get(module) {
            if !info.filename_valid {
                invalid.push(format!("{} (expected {})", module, info.expected_filename));
            }
        }

        let list = deps
            .iter()
            .map(|dep| format!("\"{dep}\""))
            .collect::<Vec<_>>()
            .join(", ");
        block.push_str(&format!("        \"{module}\": [{list}],\n"));
    }

    block.push_str("    },");
    if !invalid.is_empty() {
        block.push_str(&format!(
            " # warning: filename mismatch: {}",
            invalid.join(", ")
        ));
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::TargetKind;
    use crate::parser::ModuleInfo;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn target(name: &str, deps: &[(&str, &[&str])]) -> BuildTarget {
        let mut target = BuildTarget::new(name.to_string(), TargetKind::Library);
        target.module_dependencies = deps
            .iter()
            .map(|(module, list)| {
                (
                    module.to_string(),
                    list.iter().map(|d| d.to_string()).collect(),
                )
            })
            .collect::<BTreeMap<_, _>>();
        target
    }

    fn table_with(entries: &[(&str, bool)]) -> ModuleTable {
        let mut table = ModuleTable::default();
        for (name, valid) in entries {
            let expected = format!("{}.ixx", name.replace(':', "-"));
            table.insert(ModuleInfo {
                name: name.to_string(),
                imports: Vec::new(),
                source_path: PathBuf::from("src").join(&expected),
                filename_valid: *valid,
                expected_filename: expected,
            });
        }
        table
    }

    const DESCRIPTOR: &str = r#"cc_module_library(
    name = "applib",
    module_interfaces = ["app.ixx", "math.ixx"],
    srcs = [],
)
"#;

    #[test]
    fn test_insert_new_block() {
        let patcher = DescriptorPatcher::new();
        let targets = vec![target("applib", &[("app", &["math"])])];
        let table = table_with(&[("app", true), ("math", true)]);

        let (patched, updated) = patcher.patch_text(DESCRIPTOR, &targets, &table);

        assert_eq!(updated, vec![("applib".to_string(), PatchAction::Inserted)]);
        assert!(patched.contains(
            "module_interfaces = [\"app.ixx\", \"math.ixx\"],\n    module_dependencies = {\n        \"app\": [\"math\"],\n    },"
        ));
        // The rest of the target is untouched.
        assert!(patched.contains("srcs = [],"));
    }

    #[test]
    fn test_replace_existing_block() {
        let patcher = DescriptorPatcher::new();
        let original = r#"cc_module_library(
    name = "applib",
    module_interfaces = ["app.ixx"],
    module_dependencies = {
        "app": ["stale"],
    },
    srcs = [],
)
"#;
        let targets = vec![target("applib", &[("app", &["math", "util"])])];
        let table = table_with(&[("app", true)]);

        let (patched, updated) = patcher.patch_text(original, &targets, &table);

        assert_eq!(updated, vec![("applib".to_string(), PatchAction::Replaced)]);
        assert!(patched.contains("\"app\": [\"math\", \"util\"],"));
        assert!(!patched.contains("stale"));
    }

    #[test]
    fn test_patch_is_idempotent() {
        let patcher = DescriptorPatcher::new();
        let targets = vec![target("applib", &[("app", &["math"])])];
        let table = table_with(&[("app", true), ("math", true)]);

        let (first, updated_first) = patcher.patch_text(DESCRIPTOR, &targets, &table);
        let (second, updated_second) = patcher.patch_text(&first, &targets, &table);

        assert!(!updated_first.is_empty());
        assert!(updated_second.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_warning_comment_for_invalid_filenames() {
        let patcher = DescriptorPatcher::new();
        let targets = vec![target("applib", &[("core:config", &["math"])])];
        let table = table_with(&[("core:config", false)]);

        let (patched, _) = patcher.patch_text(DESCRIPTOR, &targets, &table);

        assert!(patched
            .contains("}, # warning: filename mismatch: core:config (expected core-config.ixx)"));
    }

    #[test]
    fn test_warning_comment_is_idempotent() {
        let patcher = DescriptorPatcher::new();
        let targets = vec![target("applib", &[("core:config", &["math"])])];
        let table = table_with(&[("core:config", false)]);

        let (first, _) = patcher.patch_text(DESCRIPTOR, &targets, &table);
        let (second, updated) = patcher.patch_text(&first, &targets, &table);

        assert_eq!(first, second);
        assert!(updated.is_empty());
    }

    #[test]
    fn test_empty_projection_skipped() {
        let patcher = DescriptorPatcher::new();
        let targets = vec![target("applib", &[])];
        let table = ModuleTable::default();

        let (patched, updated) = patcher.patch_text(DESCRIPTOR, &targets, &table);

        assert_eq!(patched, DESCRIPTOR);
        assert!(updated.is_empty());
    }

    #[test]
    fn test_unlocatable_target_is_noop() {
        let patcher = DescriptorPatcher::new();
        let targets = vec![target("missing", &[("app", &["math"])])];
        let table = table_with(&[("app", true)]);

        let (patched, updated) = patcher.patch_text(DESCRIPTOR, &targets, &table);

        assert_eq!(patched, DESCRIPTOR);
        assert!(updated.is_empty());
    }

    #[test]
    fn test_target_without_interfaces_field_is_noop() {
        let patcher = DescriptorPatcher::new();
        let original = "cc_module_library(\n    name = \"applib\",\n    srcs = [],\n)\n";
        let targets = vec![target("applib", &[("app", &["math"])])];
        let table = table_with(&[("app", true)]);

        let (patched, updated) = patcher.patch_text(original, &targets, &table);

        assert_eq!(patched, original);
        assert!(updated.is_empty());
    }

    #[test]
    fn test_multiple_targets_patched_in_one_pass() {
        let patcher = DescriptorPatcher::new();
        let original = r#"cc_module_library(
    name = "lib",
    module_interfaces = ["math.ixx"],
)

cc_module_binary(
    name = "bin",
    module_interfaces = glob(["app/*.ixx"]),
)
"#;
        let mut lib = target("lib", &[("math", &["math:impl"])]);
        lib.kind = TargetKind::Library;
        let mut bin = target("bin", &[("app", &["math"])]);
        bin.kind = TargetKind::Binary;
        let table = table_with(&[("math", true), ("app", true)]);

        let (patched, updated) = patcher.patch_text(original, &[lib, bin], &table);

        assert_eq!(updated.len(), 2);
        assert!(patched.contains("\"math\": [\"math:impl\"],"));
        assert!(patched.contains("\"app\": [\"math\"],"));
        // The glob value's nested brackets did not confuse the insertion.
        assert!(patched
            .contains("module_interfaces = glob([\"app/*.ixx\"]),\n    module_dependencies = {"));
    }

    #[test]
    fn test_patch_file_writes_only_on_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("BUILD");
        fs::write(&path, DESCRIPTOR).unwrap();

        let patcher = DescriptorPatcher::new();
        let targets = vec![target("applib", &[("app", &["math"])])];
        let table = table_with(&[("app", true), ("math", true)]);

        let first = patcher.patch_file(&path, &targets, &table, true).unwrap();
        assert!(first.changed);
        assert!(first.written);

        let second = patcher.patch_file(&path, &targets, &table, true).unwrap();
        assert!(!second.changed);
        assert!(!second.written);
    }

    #[test]
    fn test_patch_file_check_mode_leaves_file_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("BUILD");
        fs::write(&path, DESCRIPTOR).unwrap();

        let patcher = DescriptorPatcher::new();
        let targets = vec![target("applib", &[("app", &["math"])])];
        let table = table_with(&[("app", true), ("math", true)]);

        let outcome = patcher.patch_file(&path, &targets, &table, false).unwrap();

        assert!(outcome.changed);
        assert!(!outcome.written);
        assert_eq!(fs::read_to_string(&path).unwrap(), DESCRIPTOR);
    }
}
