//! Output path resolution.

use std::path::{Path, PathBuf};

use crate::config::InputSource;
use crate::types::FileInfo;

/// Resolve where the processed bytes for a file should end up.
///
/// - No output directory: the original path (in-place overwrite semantics;
///   the caller owns any backup policy).
/// - Output directory with a flat file list: `output/<name>.<ext>`.
/// - Output directory with a directory tree: the original's path relative
///   to the input root, re-rooted under the output directory.
pub fn resolve_output_path(
    input: &InputSource,
    output: Option<&Path>,
    original: &FileInfo,
) -> PathBuf {
    let Some(output) = output else {
        return original.path.clone();
    };

    match input {
        InputSource::FileList(_) => output.join(format!("{}.{}", original.name, original.ext)),
        InputSource::DirectoryTree(root) => match original.path.strip_prefix(root) {
            Ok(relative) => output.join(relative),
            // Shouldn't happen for a record discovered under root; fall
            // back to a flat layout rather than dropping the file
            Err(_) => output.join(format!("{}.{}", original.name, original.ext)),
        },
    }
}
