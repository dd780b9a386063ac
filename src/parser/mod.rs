//! Interface-file parsing
//!
//! Extracts module metadata from C++20 module interface units (`.ixx`).
//! Only the leading bytes of a file are inspected since `export module`
//! and `import` declarations sit at the top of an interface unit.

use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::warn;

/// File extension of module interface units.
pub const INTERFACE_EXTENSION: &str = "ixx";

/// Separator between a parent module and a partition in module names.
pub const PARTITION_SEPARATOR: char = ':';

/// Separator that replaces [`PARTITION_SEPARATOR`] in file names.
pub const FILENAME_SEPARATOR: char = '-';

/// How many leading bytes of an interface file are scanned for declarations.
const MAX_READ_BYTES: usize = 8192;

/// Import names with these suffixes are header units, not modules.
const HEADER_SUFFIXES: [&str; 2] = [".h", ".hpp"];

/// Metadata extracted from one module interface unit.
///
/// An empty `name` means the file carried no `export module` declaration
/// and is not a module; callers discard such records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Declared module name, possibly in `parent:partition` form.
    pub name: String,
    /// Sorted, deduplicated module imports (plain and re-exported).
    pub imports: Vec<String>,
    /// Where the declaration was found.
    pub source_path: PathBuf,
    /// Whether the file name follows the name-derived convention.
    pub filename_valid: bool,
    /// The file name the convention prescribes for this module.
    pub expected_filename: String,
}

impl ModuleInfo {
    fn unnamed(path: &Path) -> Self {
        Self {
            name: String::new(),
            imports: Vec::new(),
            source_path: path.to_path_buf(),
            filename_valid: true,
            expected_filename: String::new(),
        }
    }

    /// True when the file declared a module.
    pub fn is_module(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Returns the file name the convention prescribes for a module name.
///
/// The partition separator maps to the filename separator:
/// `core:config` becomes `core-config.ixx`.
pub fn expected_filename(module_name: &str) -> String {
    format!(
        "{}.{}",
        module_name.replace(PARTITION_SEPARATOR, &FILENAME_SEPARATOR.to_string()),
        INTERFACE_EXTENSION
    )
}

/// Pattern-based extractor for module interface units.
pub struct InterfaceParser {
    export_module: Regex,
    import_module: Regex,
}

impl Default for InterfaceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl InterfaceParser {
    pub fn new() -> Self {
        Self {
            export_module: Regex::new(r"\bexport\s+module\s+([A-Za-z_][A-Za-z0-9_.:]*)\s*;")
                .expect("valid regex"),
            // A single pattern covers both `import x;` and `export import x;`.
            // Quoted header imports and angle includes never match the
            // identifier class and are excluded up front.
            import_module: Regex::new(r"\b(?:export\s+)?import\s+([A-Za-z_:][A-Za-z0-9_.:]*)\s*;")
                .expect("valid regex"),
        }
    }

    /// Extracts module metadata from the leading bytes of `path`.
    ///
    /// A file without an `export module` declaration yields a record with
    /// an empty name. Filename-convention violations are recorded on the
    /// result and logged, never treated as failures.
    pub fn parse(&self, path: &Path) -> Result<ModuleInfo> {
        let content = self.read_prefix(path)?;
        let mut info = ModuleInfo::unnamed(path);

        if let Some(caps) = self.export_module.captures(&content) {
            info.name = caps[1].to_string();
            info.expected_filename = expected_filename(&info.name);

            if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
                info.filename_valid = file_name == info.expected_filename;
                if !info.filename_valid {
                    warn!(
                        file = %path.display(),
                        module = %info.name,
                        expected = %info.expected_filename,
                        actual = %file_name,
                        "Interface file name does not match its module name"
                    );
                }
            }
        }

        for caps in self.import_module.captures_iter(&content) {
            let import = &caps[1];
            if !import.is_empty() && !is_header_import(import) {
                info.imports.push(import.to_string());
            }
        }

        info.imports.sort();
        info.imports.dedup();

        Ok(info)
    }

    fn read_prefix(&self, path: &Path) -> Result<String> {
        let file = fs::File::open(path)
            .with_context(|| format!("Failed to open interface file: {}", path.display()))?;

        let mut buf = Vec::with_capacity(MAX_READ_BYTES);
        file.take(MAX_READ_BYTES as u64)
            .read_to_end(&mut buf)
            .with_context(|| format!("Failed to read interface file: {}", path.display()))?;

        // Declarations are plain ASCII; a truncated multi-byte sequence at
        // the cap boundary must not abort the parse.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

fn is_header_import(name: &str) -> bool {
    HEADER_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}
