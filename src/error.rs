//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore dell'applicazione.
//!
//! ## Categorie di errori:
//! - `Usage` / `Pattern`: input non valido, rilevato prima della traversata (exit code 2)
//! - `Traversal`, `Hash`, `Stat`, `LedgerRead`: errori di I/O, fatali
//! - `MissingDependency`, `Tool`: tool esterno mancante o terminato con errore;
//!   l'output catturato viaggia con l'errore
//! - `LedgerWrite`: fatale solo con `--strict-ledger`, altrimenti il
//!   dispatcher lo registra nel log e continua
//!
//! ## Esempio:
//! ```rust
//! use imgsqueeze::OptimizeError;
//!
//! let err = OptimizeError::Usage("path does not exist".to_string());
//! assert_eq!(err.exit_code(), 2);
//! ```

use std::path::PathBuf;

/// Custom error types for image compression runs
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("{0}")]
    Usage(String),

    #[error("invalid exclude pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("traversal failed: {0}")]
    Traversal(#[from] walkdir::Error),

    #[error("failed to get MD5 of file {}: {source}", path.display())]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to get size of compressed image {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read ledger {}: {source}", path.display())]
    LedgerRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to append to ledger {}: {source}", path.display())]
    LedgerWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("{tool} failed on {} ({status})", path.display())]
    Tool {
        tool: String,
        path: PathBuf,
        status: String,
        output: String,
    },
}

impl OptimizeError {
    /// Process exit code the binary should terminate with.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) | Self::Pattern(_) => 2,
            _ => 1,
        }
    }

    /// Combined stdout/stderr of a failed compressor, if any.
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            Self::Tool { output, .. } => Some(output),
            _ => None,
        }
    }
}
