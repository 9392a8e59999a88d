//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce lo spinner a terminale e le statistiche della run.
//!
//! ## Componenti principali:
//! - `ProgressManager`: spinner `indicatif` con il file in elaborazione
//! - `RunStats`: contatori cumulativi della run corrente
//!
//! ## Statistiche tracciate:
//! - **files_scanned**: Immagini prodotte dal walker
//! - **files_compressed**: Immagini riscritte dal tool esterno
//! - **files_skipped**: Immagini già presenti nel ledger
//! - **files_dry_run**: Immagini che verrebbero compresse (solo dry-run)
//! - **entries_excluded**: Entry scartate dal pattern `--exclude`
//! - **bytes_before / bytes_after**: Dimensioni dei file compressi
//! - **ledger_write_failures**: Digest non scritti sul ledger

use crate::reporter::format_size;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

/// Spinner shown while a run is in progress
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a spinner for indeterminate progress
    pub fn spinner() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} images {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Count one image and show its name
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Wrap an existing bar, e.g. one with a custom draw target.
    pub fn from_bar(bar: ProgressBar) -> Self {
        Self { bar }
    }

    /// Hide the spinner while `f` writes to the terminal.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.bar.suspend(f)
    }

    pub fn is_drawn(&self) -> bool {
        !self.bar.is_hidden()
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Statistics tracker for a single run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub files_scanned: usize,
    pub files_compressed: usize,
    pub files_skipped: usize,
    pub files_dry_run: usize,
    pub entries_excluded: usize,
    pub bytes_before: u64,
    pub bytes_after: u64,
    pub ledger_write_failures: usize,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_compressed(&mut self, prior_size: u64, new_size: u64, recorded: bool) {
        self.files_compressed += 1;
        self.bytes_before += prior_size;
        self.bytes_after += new_size;
        if !recorded {
            self.ledger_write_failures += 1;
        }
    }

    pub fn add_skipped(&mut self) {
        self.files_skipped += 1;
    }

    pub fn add_dry_run(&mut self) {
        self.files_dry_run += 1;
    }

    /// Bytes saved over compressed files; growth counts as zero.
    pub fn bytes_saved(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }

    pub fn reduction_percent(&self) -> f64 {
        if self.bytes_before > 0 {
            (self.bytes_saved() as f64 / self.bytes_before as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn format_summary(&self) -> String {
        let mut summary = format!(
            "Scanned: {} images | Compressed: {} | Already optimized: {} | Excluded: {} | Saved: {} ({:.1}%)",
            self.files_scanned,
            self.files_compressed,
            self.files_skipped,
            self.entries_excluded,
            format_size(self.bytes_saved()),
            self.reduction_percent()
        );
        if self.files_dry_run > 0 {
            summary.push_str(&format!(" | Would compress: {}", self.files_dry_run));
        }
        if self.ledger_write_failures > 0 {
            summary.push_str(&format!(
                " | Ledger write failures: {}",
                self.ledger_write_failures
            ));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_accumulate() {
        let mut stats = RunStats::new();
        stats.files_scanned = 3;
        stats.add_compressed(2048, 1024, true);
        stats.add_compressed(100, 150, false);
        stats.add_skipped();

        assert_eq!(stats.files_compressed, 2);
        assert_eq!(stats.files_skipped, 1);
        assert_eq!(stats.bytes_before, 2148);
        assert_eq!(stats.bytes_after, 1174);
        assert_eq!(stats.bytes_saved(), 974);
        assert_eq!(stats.ledger_write_failures, 1);
    }

    #[test]
    fn test_growth_is_not_negative_savings() {
        let mut stats = RunStats::new();
        stats.add_compressed(100, 200, true);
        assert_eq!(stats.bytes_saved(), 0);
        assert_eq!(stats.reduction_percent(), 0.0);
    }

    #[test]
    fn test_format_summary() {
        let mut stats = RunStats::new();
        stats.files_scanned = 2;
        stats.add_compressed(2048, 1024, true);
        stats.add_skipped();
        assert_eq!(
            stats.format_summary(),
            "Scanned: 2 images | Compressed: 1 | Already optimized: 1 | Excluded: 0 | Saved: 1.0 KiB (50.0%)"
        );

        stats.add_dry_run();
        stats.add_compressed(10, 10, false);
        let summary = stats.format_summary();
        assert!(summary.ends_with("| Would compress: 1 | Ledger write failures: 1"));
    }

    #[test]
    fn test_hidden_spinner_still_runs_suspended_work() {
        let progress = ProgressManager::from_bar(ProgressBar::hidden());
        assert!(!progress.is_drawn());
        assert_eq!(progress.suspend(|| 42), 42);
        progress.finish();
    }
}
