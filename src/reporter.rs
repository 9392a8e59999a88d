//! # Reporter Module
//!
//! Formatta l'avanzamento della run per l'operatore.
//!
//! ## Output testuale (stdout):
//! ```text
//! compressed: a.jpg from: 488.3 KiB to: 301.2 KiB
//! (dryrun) compressed: photos/b.png
//! ```
//!
//! ## Dimensioni (unità IEC):
//! - `< 1024` byte: intero senza decimali (`1023 B`)
//! - altrimenti una cifra decimale nell'unità scelta (`1.5 KiB`, `1.0 MiB`)
//!
//! Con `--json` gli stessi eventi diventano messaggi `JsonMessage`.
//! Lo spinner disegna solo su stderr: le righe di risultato restano su
//! stdout anche quando lo spinner è visibile.

use crate::config::Config;
use crate::dispatcher::{CompressionOutcome, Outcome, SkipReason};
use crate::error::OptimizeError;
use crate::json_output::{FileStatus, JsonMessage};
use crate::progress::{ProgressManager, RunStats};
use crate::walker::ImageFile;
use std::io::{self, IsTerminal, Write};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

const UNIT: u64 = 1024;

/// Convert a size in bytes to a human-readable IEC (binary) string.
pub fn format_size(bytes: u64) -> String {
    if bytes < UNIT {
        return format!("{} B", bytes);
    }
    let (mut div, mut exp) = (UNIT, 0usize);
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!(
        "{:.1} {}iB",
        bytes as f64 / div as f64,
        ['K', 'M', 'G', 'T', 'P', 'E'][exp]
    )
}

/// Before/after pair, both through [`format_size`].
pub fn format_transition(prior_size: u64, new_size: u64) -> (String, String) {
    (format_size(prior_size), format_size(new_size))
}

pub fn compressed_line(file: &ImageFile, outcome: &CompressionOutcome) -> String {
    let (from, to) = format_transition(outcome.prior_size, outcome.new_size);
    format!("compressed: {} from: {} to: {}", file.name(), from, to)
}

pub fn dry_run_line(file: &ImageFile) -> String {
    format!("(dryrun) compressed: {}", file.path.display())
}

type Sink = Mutex<Box<dyn Write + Send>>;

fn sink(writer: impl Write + Send + 'static) -> Sink {
    Mutex::new(Box::new(writer))
}

/// Sends run events to stdout, as text or JSON lines.
///
/// Result lines always reach `out`; the spinner only ever draws on stderr
/// and is suspended while a line is written.
pub struct Reporter {
    json: bool,
    verbose: bool,
    progress: Option<ProgressManager>,
    out: Sink,
    err: Sink,
    started: Instant,
}

impl Reporter {
    pub fn new(config: &Config) -> Self {
        let show_spinner =
            !config.json_output && !config.verbose && io::stderr().is_terminal();
        let mut reporter = Self::plain(config.json_output, config.verbose);
        reporter.progress = show_spinner.then(ProgressManager::spinner);
        reporter
    }

    /// Reporter that never draws a spinner.
    pub fn plain(json: bool, verbose: bool) -> Self {
        Self {
            json,
            verbose,
            progress: None,
            out: sink(io::stdout()),
            err: sink(io::stderr()),
            started: Instant::now(),
        }
    }

    /// Redirect result lines and diagnostics away from stdout/stderr.
    pub fn with_writers(
        mut self,
        out: impl Write + Send + 'static,
        err: impl Write + Send + 'static,
    ) -> Self {
        self.out = sink(out);
        self.err = sink(err);
        self
    }

    pub fn with_progress(mut self, progress: ProgressManager) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn start(&self, config: &Config) {
        if self.json {
            self.emit(&JsonMessage::Start {
                input_dir: &config.input_dir,
                config,
            });
        }
    }

    pub fn processing(&self, file: &ImageFile) {
        if let Some(ref progress) = self.progress {
            progress.update(&file.name());
        }
    }

    pub fn file_done(&self, file: &ImageFile, outcome: &Outcome) {
        if self.json {
            self.emit_file(file, outcome);
            return;
        }

        match outcome {
            Outcome::Compressed(compressed) => {
                if self.verbose && !compressed.tool_output.output.trim().is_empty() {
                    self.line(compressed.tool_output.output.trim_end());
                }
                self.line(&compressed_line(file, compressed));
            }
            Outcome::Skipped(SkipReason::DryRun) => self.line(&dry_run_line(file)),
            Outcome::Skipped(SkipReason::AlreadyOptimized) => {}
        }
    }

    pub fn finish(&self, stats: &RunStats) {
        if let Some(ref progress) = self.progress {
            progress.finish();
        }

        if self.json {
            self.emit(&JsonMessage::Complete {
                stats,
                bytes_saved: stats.bytes_saved(),
                duration_seconds: self.started.elapsed().as_secs_f64(),
            });
        } else if self.verbose {
            self.line(&stats.format_summary());
        }
    }

    /// Report a fatal error. Compressor output goes out first.
    pub fn fatal(&self, err: &OptimizeError) {
        if let Some(ref progress) = self.progress {
            progress.finish();
        }

        if self.json {
            self.emit(&JsonMessage::Error {
                message: err.to_string(),
                tool_output: err.tool_output(),
            });
            return;
        }

        let mut stderr = lock(&self.err);
        if let Some(output) = err.tool_output() {
            let _ = writeln!(stderr, "error: compressing image: {}", output.trim_end());
        }
        let _ = writeln!(stderr, "error: {}", err);
        let _ = stderr.flush();
    }

    fn emit_file(&self, file: &ImageFile, outcome: &Outcome) {
        let message = match outcome {
            Outcome::Compressed(compressed) => JsonMessage::File {
                path: &file.path,
                format: file.kind,
                status: FileStatus::Compressed,
                prior_size: compressed.prior_size,
                new_size: Some(compressed.new_size),
                digest: Some(compressed.new_digest.as_str()),
                tool_output: self
                    .verbose
                    .then_some(compressed.tool_output.output.as_str()),
            },
            Outcome::Skipped(reason) => JsonMessage::File {
                path: &file.path,
                format: file.kind,
                status: match reason {
                    SkipReason::AlreadyOptimized => FileStatus::Skipped,
                    SkipReason::DryRun => FileStatus::DryRun,
                },
                prior_size: file.size,
                new_size: None,
                digest: None,
                tool_output: None,
            },
        };
        self.emit(&message);
    }

    fn emit(&self, message: &JsonMessage) {
        let mut out = lock(&self.out);
        message.emit(&mut *out);
        let _ = out.flush();
    }

    fn line(&self, line: &str) {
        let write = || {
            let mut out = lock(&self.out);
            if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
                tracing::warn!("failed to write to stdout: {}", e);
            }
        };
        match self.progress {
            Some(ref progress) => progress.suspend(write),
            None => write(),
        }
    }
}

fn lock(sink: &Sink) -> MutexGuard<'_, Box<dyn Write + Send>> {
    sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
