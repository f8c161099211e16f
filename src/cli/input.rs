//! Input discovery for the convert command
//!
//! Command-line inputs may be plain files, directories (walked recursively
//! for `.cnv` files) or glob patterns.

use crate::constants::CNV_EXTENSION;
use crate::{Error, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Resolve command-line inputs to a sorted, de-duplicated list of files
///
/// An input that names nothing on disk and matches no files is an error,
/// so typos are not silently ignored.
pub fn resolve_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();

    for input in inputs {
        let path = Path::new(input);
        let before = files.len();

        if path.is_dir() {
            files.extend(walk_cnv_files(path));
        } else if path.is_file() {
            files.insert(path.to_path_buf());
        } else if is_glob_pattern(input) {
            let matches = glob::glob(input).map_err(|e| {
                Error::configuration(format!("Invalid glob pattern '{}': {}", input, e))
            })?;
            files.extend(matches.filter_map(|entry| entry.ok()).filter(|p| p.is_file()));
        } else {
            return Err(Error::configuration(format!(
                "Input does not exist: {}",
                input
            )));
        }

        debug!("Input '{}' resolved to {} files", input, files.len() - before);
    }

    if files.is_empty() {
        return Err(Error::configuration(format!(
            "No .{} files found in: {}",
            CNV_EXTENSION,
            inputs.join(", ")
        )));
    }

    Ok(files.into_iter().collect())
}

fn walk_cnv_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_cnv_extension(path))
        .collect()
}

fn has_cnv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CNV_EXTENSION))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}
