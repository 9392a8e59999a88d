//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON (`--json`).
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio della run, con la configurazione risolta
//! - `file`: Esito di una singola immagine (compressa, saltata, dry-run)
//! - `complete`: Fine della run con le statistiche finali
//! - `error`: Errore fatale, con l'output del tool se disponibile
//!
//! Un oggetto JSON per riga su stdout.

use crate::config::Config;
use crate::progress::RunStats;
use crate::walker::ImageKind;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Compressed,
    Skipped,
    DryRun,
}

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage<'a> {
    Start {
        input_dir: &'a Path,
        config: &'a Config,
    },

    File {
        path: &'a Path,
        format: ImageKind,
        status: FileStatus,
        prior_size: u64,
        new_size: Option<u64>,
        digest: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_output: Option<&'a str>,
    },

    Complete {
        stats: &'a RunStats,
        bytes_saved: u64,
        duration_seconds: f64,
    },

    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_output: Option<&'a str>,
    },
}

impl JsonMessage<'_> {
    /// Emette il messaggio JSON come singola riga su `out`
    pub fn emit(&self, out: &mut dyn Write) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("failed to serialize {:?}: {}", self, e);
                return;
            }
        };
        if let Err(e) = writeln!(out, "{}", json) {
            tracing::warn!("failed to write JSON message: {}", e);
        }
    }
}
