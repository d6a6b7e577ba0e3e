//! bigo core library - deterministic Big-O time and space analysis of algorithm snippets
//!
//! A snippet passes through ordered layers: hazard recognizers for canonical
//! algorithms, structural feature extraction feeding the time and space rule
//! engines, a safety layer of domain clamps, and a curated ground truth
//! database. `Engine` ties them together and reconciles their verdicts with
//! externally claimed complexities.

// Global invariants enforced in this crate:
// - The analyzed code is never executed or mutated
// - Every call yields exactly one time and one space verdict
// - No global mutable state; shared tables are immutable after first use
// - No randomness, clocks or I/O during analysis
// - Identical input yields byte-for-byte identical output

pub mod amortized;
pub mod complexity;
pub mod config;
pub mod consensus;
pub mod engine;
pub mod features;
pub mod ground_truth;
pub mod hazards;
pub mod language;
pub mod report;
pub mod result;
pub mod safety;
pub mod shapes;
pub mod source;
pub mod space;
pub mod time;

pub use complexity::ComplexityClass;
pub use config::ResolvedConfig;
pub use consensus::{ClaimedComplexity, ConsensusResult};
pub use engine::{ClaimCheck, Engine, EngineSettings};
pub use language::Language;
pub use report::{render_json, render_text, sort_reports, FileReport};
pub use result::{ApproachTriple, ComplexityResult, Correction};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Check if a file is a supported source file
fn is_supported_source_file(filename: &str) -> bool {
    // Skip TypeScript declaration files (.d.ts)
    if filename.ends_with(".d.ts") {
        return false;
    }

    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .and_then(Language::from_extension)
        .is_some()
}

/// Collect all supported source files from a path (file or directory)
///
/// An explicitly named file is always returned when its extension is
/// supported; directory entries are filtered through the config's
/// include/exclude patterns. Output is sorted for deterministic order.
pub fn collect_source_files(path: &Path, config: Option<&ResolvedConfig>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if path.is_file() {
        if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
            if is_supported_source_file(filename) {
                files.push(path.to_path_buf());
            }
        }
    } else if path.is_dir() {
        collect_source_files_recursive(path, &mut files)?;
        if let Some(config) = config {
            files.retain(|f| {
                let relative = f.strip_prefix(path).unwrap_or(f);
                config.should_include(relative)
            });
        }
    } else {
        anyhow::bail!("path does not exist: {}", path.display());
    }

    files.sort();
    Ok(files)
}

/// Returns true for directory names that should not be traversed
fn is_skipped_dir(name: &str) -> bool {
    name.starts_with('.')
        || name == "node_modules"
        || name == "dist"
        || name == "build"
        || name == "target"
        || name == "__pycache__"
}

/// Recursively collect supported source files from a directory
fn collect_source_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry_result in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let entry = entry_result?;
        let path = entry.path();
        let metadata = std::fs::symlink_metadata(&path)
            .with_context(|| format!("Failed to read metadata: {}", path.display()))?;

        if metadata.is_symlink() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if metadata.is_dir() {
            if !is_skipped_dir(name) {
                collect_source_files_recursive(&path, files)?;
            }
        } else if metadata.is_file() && is_supported_source_file(name) {
            files.push(path);
        }
    }

    Ok(())
}
