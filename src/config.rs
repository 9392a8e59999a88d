//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione risolta di una run.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config`, costruita una sola volta in `main`
//! - Valida i parametri prima di qualunque traversata
//! - Deriva il path del ledger dal nome dell'eseguibile
//!
//! ## Parametri di configurazione:
//! - `input_dir`: Directory da scandire (obbligatoria)
//! - `exclude`: Pattern glob di file/directory da escludere
//! - `jpeg_quality`: Qualità guetzli (minimo e default: 84)
//! - `dry_run`: Riporta le azioni senza modificare nulla
//! - `verbose`: Log DEBUG e output dei tool
//! - `json_output`: Eventi JSON su stdout
//! - `ledger_path`: File dei digest (default: `<eseguibile>.txt`)
//! - `strict_ledger`: Errore di scrittura sul ledger = errore fatale
//!
//! ## Esempio:
//! ```rust
//! use imgsqueeze::Config;
//!
//! let mut config = Config::new(".");
//! config.jpeg_quality = 83;
//! assert!(config.validate().is_err());
//! ```

use crate::error::OptimizeError;
use serde::Serialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Lowest quality guetzli is allowed to run with.
pub const MIN_JPEG_QUALITY: u32 = 84;
pub const DEFAULT_JPEG_QUALITY: u32 = MIN_JPEG_QUALITY;

const FALLBACK_PROGRAM_NAME: &str = "imgsqueeze";

/// Configuration for a compression run
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory containing images to compress
    pub input_dir: PathBuf,
    /// Glob pattern of directories/images to exclude
    pub exclude: Option<String>,
    /// Visual quality to aim for, expressed as a JPEG quality value
    pub jpeg_quality: u32,
    /// Dry run - report without touching files or the ledger
    pub dry_run: bool,
    /// Verbose logging and tool output
    pub verbose: bool,
    /// Output progress and results as JSON lines
    pub json_output: bool,
    /// Ledger of already optimized digests
    pub ledger_path: PathBuf,
    /// Abort when a digest cannot be appended to the ledger
    pub strict_ledger: bool,
}

impl Config {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            exclude: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            dry_run: false,
            verbose: false,
            json_output: false,
            ledger_path: default_ledger_path(),
            strict_ledger: false,
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), OptimizeError> {
        let metadata = std::fs::metadata(&self.input_dir)
            .map_err(|_| OptimizeError::Usage("path does not exist".to_string()))?;

        if !metadata.is_dir() {
            return Err(OptimizeError::Usage(
                "specified path is not a directory".to_string(),
            ));
        }

        if self.jpeg_quality < MIN_JPEG_QUALITY {
            return Err(OptimizeError::Usage(format!(
                "jpeg-quality must be {} or greater",
                MIN_JPEG_QUALITY
            )));
        }

        Ok(())
    }
}

/// `<program name>.txt` in the working directory.
pub fn default_ledger_path() -> PathBuf {
    let program = std::env::args_os()
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(FALLBACK_PROGRAM_NAME));
    ledger_path_for(&program)
}

/// Ledger file name for a given program name.
pub fn ledger_path_for(program: &Path) -> PathBuf {
    let mut name = program
        .file_name()
        .unwrap_or_else(|| OsStr::new(FALLBACK_PROGRAM_NAME))
        .to_os_string();
    name.push(".txt");
    PathBuf::from(name)
}
