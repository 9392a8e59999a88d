//! # Ledger Module
//!
//! Questo modulo gestisce il registro dei file già ottimizzati.
//!
//! ## Responsabilità:
//! - Carica all'avvio l'insieme dei digest già registrati
//! - Risponde in O(1) se un digest è già stato elaborato
//! - Appende ogni nuovo digest al file di testo, uno per riga
//!
//! ## Formato del file:
//! ```text
//! 5d41402abc4b2a76b9719d911017c592
//! 7d793037a0760186574b0282f2f435e7
//! ```
//!
//! ## Garanzie:
//! - File assente = registro vuoto (non è un errore)
//! - L'insieme in memoria non si riduce mai durante una run
//! - Un `record` andato a buon fine è visibile a qualunque `load` successivo

use crate::digest::ContentDigest;
use crate::error::OptimizeError;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Append-only set of digests of already optimized files.
#[derive(Debug, Default)]
pub struct Ledger {
    /// Backing file; `None` keeps the ledger purely in memory.
    path: Option<PathBuf>,
    digests: HashSet<ContentDigest>,
}

impl Ledger {
    /// Load the ledger backed by `path`. A missing file yields an empty ledger.
    pub async fn load(path: &Path) -> Result<Self, OptimizeError> {
        let mut ledger = Self {
            path: Some(path.to_path_buf()),
            digests: HashSet::new(),
        };

        let content = match fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No ledger at {}, starting empty", path.display());
                return Ok(ledger);
            }
            Err(source) => {
                return Err(OptimizeError::LedgerRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        // a corrupt line must not hide the valid digests around it
        for (line_no, raw) in content.split(|&b| b == b'\n').enumerate() {
            let line = match std::str::from_utf8(raw) {
                Ok(line) => line,
                Err(e) => {
                    warn!("{}:{}: ignoring line, {}", path.display(), line_no + 1, e);
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<ContentDigest>() {
                Ok(digest) => {
                    ledger.digests.insert(digest);
                }
                Err(e) => warn!("{}:{}: ignoring line, {}", path.display(), line_no + 1, e),
            }
        }

        debug!("Loaded {} digests from {}", ledger.digests.len(), path.display());
        Ok(ledger)
    }

    /// A ledger that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn contains(&self, digest: &ContentDigest) -> bool {
        self.digests.contains(digest)
    }

    /// Add `digest` to the set and append it to the backing file.
    ///
    /// The in-memory set is updated even when the append fails, so the
    /// rest of the run still treats the file as done.
    pub async fn record(&mut self, digest: ContentDigest) -> Result<(), OptimizeError> {
        let line = format!("{}\n", digest);
        self.digests.insert(digest);

        let Some(path) = &self.path else {
            return Ok(());
        };

        let write_err = |source| OptimizeError::LedgerWrite {
            path: path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(write_err)?;
        file.write_all(line.as_bytes()).await.map_err(write_err)?;
        file.flush().await.map_err(write_err)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
