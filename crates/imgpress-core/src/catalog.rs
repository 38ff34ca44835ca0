//! File discovery: walks the input paths and filters by glob match rules.

use glob::Pattern;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::InputSource;
use crate::types::FileInfo;

/// Discovers candidate image files for a batch.
pub struct Catalog {
    rules: Vec<Pattern>,
}

impl Catalog {
    /// Compile the glob match rules.
    ///
    /// Rules that fail to compile are dropped with a warning rather than
    /// failing the batch.
    pub fn new(match_rules: &[String]) -> Self {
        let rules = match_rules
            .iter()
            .filter_map(|rule| match Pattern::new(rule) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!("Ignoring invalid match rule '{}': {}", rule, e);
                    None
                }
            })
            .collect();
        Self { rules }
    }

    /// Walk every input path and return the records matching any rule.
    ///
    /// Missing paths are skipped with a warning. Traversal order is
    /// directory-entry order; callers must not rely on it.
    pub fn discover(&self, input: &InputSource) -> Vec<FileInfo> {
        let paths: Vec<&Path> = match input {
            InputSource::FileList(paths) => paths.iter().map(|p| p.as_path()).collect(),
            InputSource::DirectoryTree(root) => vec![root.as_path()],
        };

        let mut files = Vec::new();
        for path in paths {
            if !path.exists() {
                tracing::warn!("{} doesn't exist, skipping", path.display());
                continue;
            }
            self.collect(path, &mut files);
        }

        files
            .into_iter()
            .filter(|info| self.matches(&info.path))
            .collect()
    }

    /// Recursively gather file records under a path.
    fn collect(&self, path: &Path, out: &mut Vec<FileInfo>) {
        for entry in WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let entry_path = entry.path();
            if !entry_path.is_file() {
                continue;
            }
            match FileInfo::from_path(entry_path) {
                Ok(info) => out.push(info),
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", entry_path.display(), e);
                }
            }
        }
    }

    /// A path passes when any rule matches it.
    ///
    /// Rules without a path separator match against the base name, so
    /// `*.png` matches at any directory depth.
    fn matches(&self, path: &Path) -> bool {
        self.rules.iter().any(|rule| {
            if rule.matches_path(path) {
                return true;
            }
            if !rule.as_str().contains(std::path::MAIN_SEPARATOR) {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    return rule.matches(name);
                }
            }
            false
        })
    }
}
