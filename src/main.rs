//! # imgsqueeze - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Creazione della configurazione e avvio dell'optimizer
//! - Unico punto che decide l'exit code del processo
//!
//! ## Exit code:
//! - `0`: successo, `--help`, `--version`
//! - `1`: errore fatale durante la run
//! - `2`: errore di utilizzo (argomenti, directory, qualità)
//!
//! ## Esempi di utilizzo:
//! ```bash
//! imgsqueeze --input-dir images
//! imgsqueeze --input-dir images --dryrun
//! imgsqueeze --input-dir . --exclude .git
//! imgsqueeze --input-dir . --exclude '{.git,*.jpg}'
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use imgsqueeze::config::{default_ledger_path, DEFAULT_JPEG_QUALITY};
use imgsqueeze::{Config, OptimizeError, Optimizer, Reporter};

const EXAMPLES: &str = "\
EXAMPLES:
  imgsqueeze --input-dir images
  imgsqueeze --input-dir images --dryrun
  imgsqueeze --input-dir . --exclude .git
  imgsqueeze --input-dir . --exclude '{.git,*.jpg}'";

#[derive(Parser)]
#[command(name = "imgsqueeze", version)]
#[command(about = "Recompress JPEG and PNG images in place, skipping files already optimized")]
#[command(after_help = EXAMPLES)]
struct Args {
    /// Path to a directory containing images to compress
    #[arg(long = "input-dir")]
    input_dir: PathBuf,

    /// Run command without making changes
    #[arg(long, alias = "dry-run")]
    dryrun: bool,

    /// Print a verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Glob pattern of directories/images to exclude, e.g. '{.git,*.jpg}'
    #[arg(long)]
    exclude: Option<String>,

    /// Visual quality to aim for expressed as a JPEG quality value
    #[arg(long = "jpeg-quality", default_value_t = DEFAULT_JPEG_QUALITY)]
    jpeg_quality: u32,

    /// Ledger of already compressed digests (default: <program name>.txt)
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Abort when a digest cannot be written to the ledger
    #[arg(long)]
    strict_ledger: bool,

    /// Output progress and results as JSON lines
    #[arg(long)]
    json: bool,
}

impl Args {
    fn into_config(self) -> Config {
        Config {
            input_dir: self.input_dir,
            exclude: self.exclude,
            jpeg_quality: self.jpeg_quality,
            dry_run: self.dryrun,
            verbose: self.verbose,
            json_output: self.json,
            ledger_path: self.ledger.unwrap_or_else(default_ledger_path),
            strict_ledger: self.strict_ledger,
        }
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn fail(reporter: &Reporter, err: OptimizeError) -> ExitCode {
    reporter.fatal(&err);
    ExitCode::from(err.exit_code())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = Args::parse().into_config();

    if let Err(e) = init_logging(config.verbose) {
        eprintln!("error: {:#}", e);
        return ExitCode::FAILURE;
    }

    let mut optimizer = match Optimizer::new(config.clone()).await {
        Ok(optimizer) => optimizer,
        Err(e) => return fail(&Reporter::plain(config.json_output, config.verbose), e),
    };

    match optimizer.run().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => fail(optimizer.reporter(), e),
    }
}
