//! # imgsqueeze Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Architettura dei moduli:
//! - `config`: Configurazione risolta e validazione
//! - `error`: Tipi di errore e mappatura exit code
//! - `matcher`: Pattern `--exclude` compilato una volta
//! - `digest`: Digest MD5 del contenuto dei file
//! - `ledger`: Registro persistente dei digest già ottimizzati
//! - `walker`: Traversata lazy con potatura delle directory escluse
//! - `compressor`: Invocazione di guetzli / zopflipng
//! - `tool_resolver`: Ricerca dei tool esterni
//! - `dispatcher`: Decisione e lavoro per singolo file
//! - `reporter`, `progress`, `json_output`: Output per l'operatore
//! - `optimizer`: Orchestratore di una run
//!
//! ## Utilizzo:
//! ```rust,no_run
//! # async fn demo() -> Result<(), imgsqueeze::OptimizeError> {
//! use imgsqueeze::{Config, Optimizer};
//!
//! let mut config = Config::new("images");
//! config.exclude = Some("{.git,*/thumbs}".to_string());
//! Optimizer::new(config).await?.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod compressor;
pub mod config;
pub mod digest;
pub mod dispatcher;
pub mod error;
pub mod json_output;
pub mod ledger;
pub mod matcher;
pub mod optimizer;
pub mod progress;
pub mod reporter;
pub mod tool_resolver;
pub mod utils;
pub mod walker;

pub use config::Config;
pub use digest::ContentDigest;
pub use error::OptimizeError;
pub use ledger::Ledger;
pub use optimizer::Optimizer;
pub use progress::RunStats;
pub use reporter::{format_size, Reporter};
pub use walker::{ImageFile, ImageKind, Walker};
