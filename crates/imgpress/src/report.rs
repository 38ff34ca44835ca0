//! Console reporting and result persistence.
//!
//! The reporter is the batch observer: it commits the processed bytes to
//! the resolved output path, prints a styled per-file line, and keeps the
//! per-file records around for an optional machine-readable report.

use console::style;
use imgpress_core::{BatchObserver, FileInfo};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Mutex;

/// One line of the batch report.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// Original file path
    pub path: PathBuf,

    /// Where the processed bytes were written
    pub output_path: PathBuf,

    /// Size before processing, in bytes
    pub original_size: u64,

    /// Size after processing, in bytes
    pub processed_size: u64,

    /// Percentage saved; negative when the result grew
    pub saved_percent: f64,
}

/// Observer that persists results and reports to the console.
pub struct ConsoleReporter {
    records: Mutex<Vec<FileReport>>,
    quiet: bool,
    force: bool,
    resize_requested: bool,
}

impl ConsoleReporter {
    /// `force` skips the in-place backup; `resize_requested` waives the
    /// grown-result guard, since a resize changes the bytes on purpose.
    pub fn new(quiet: bool, force: bool, resize_requested: bool) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            quiet,
            force,
            resize_requested,
        }
    }

    /// Take the collected per-file records, leaving the reporter empty.
    pub fn take_records(&self) -> Vec<FileReport> {
        std::mem::take(&mut *self.records.lock().unwrap())
    }
}

impl BatchObserver for ConsoleReporter {
    fn on_file_processed(&self, processed: &FileInfo, original: &FileInfo) {
        // A grown result is a failed optimization; keep the original
        if !self.resize_requested && processed.size > original.size {
            if !self.quiet {
                eprintln!(
                    "  {} {} -> {} {}",
                    original.path.display(),
                    format_size(original.size),
                    format_size(processed.size),
                    style("failed to optimize, keeping original").yellow()
                );
            }
            return;
        }

        if let Some(parent) = processed.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    tracing::warn!("Failed to create {}: {}", parent.display(), e);
                }
            }
        }

        // In-place mode keeps the original around as old-<name>.<ext>
        if processed.path == original.path && !self.force {
            let backup = original
                .dir
                .join(format!("old-{}.{}", original.name, original.ext));
            if let Err(e) = std::fs::copy(&original.path, &backup) {
                tracing::warn!("Failed to back up {}: {}", original.path.display(), e);
            }
        }

        // Commit: this is the only place the original can be overwritten
        // (in-place mode resolves the output path to the original path)
        if let Err(e) = std::fs::write(&processed.path, &processed.content) {
            tracing::warn!("Failed to write {}: {}", processed.path.display(), e);
            return;
        }

        let report = FileReport {
            path: original.path.clone(),
            output_path: processed.path.clone(),
            original_size: original.size,
            processed_size: processed.size,
            saved_percent: saved_percent(original.size, processed.size),
        };

        if !self.quiet {
            print_file_line(&report);
        }

        self.records.lock().unwrap().push(report);
    }

    fn on_complete(&self, count: usize) {
        if self.quiet {
            return;
        }
        let records = self.records.lock().unwrap();
        let original: u64 = records.iter().map(|r| r.original_size).sum();
        let processed: u64 = records.iter().map(|r| r.processed_size).sum();
        eprintln!();
        eprintln!(
            "  {} file(s) processed, {} -> {} ({})",
            style(count).bold(),
            format_size(original),
            format_size(processed),
            style(format!("{:.1}% saved", saved_percent(original, processed))).green()
        );
    }
}

fn print_file_line(report: &FileReport) {
    let delta = if report.processed_size < report.original_size {
        style(format!("-{:.1}%", report.saved_percent)).green()
    } else {
        style("no improvement".to_string()).yellow()
    };
    eprintln!(
        "  {} {} -> {} {}",
        report.path.display(),
        format_size(report.original_size),
        format_size(report.processed_size),
        delta
    );
}

/// Percentage saved relative to the original size.
fn saved_percent(original: u64, processed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - processed as f64) / original as f64 * 100.0
}

/// Human-readable byte size.
fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f >= MB {
        format!("{:.2} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.1} KB", bytes_f / KB)
    } else {
        format!("{} B", bytes)
    }
}
