//! # Optimizer Orchestrator Module
//!
//! Questo modulo orchestra una run completa sulla directory di input.
//!
//! ## Flusso di esecuzione:
//! 1. **Validazione**: config, pattern `--exclude`, caricamento ledger
//! 2. **Traversata**: il `Walker` produce le immagini una alla volta
//! 3. **Dispatch**: ogni immagine passa dal `CompressionDispatcher`
//! 4. **Report**: una riga (o un evento JSON) per immagine
//! 5. **Statistiche**: `RunStats` restituite al chiamante
//!
//! ## Modello di esecuzione:
//! - Sequenziale: un file viene completato prima di passare al successivo
//! - Il primo errore fatale interrompe la run, nessun riepilogo parziale
//! - Una sola istanza per directory: due run concorrenti sugli stessi
//!   file e sullo stesso ledger non sono supportate
//!
//! ## Esempio:
//! ```rust,no_run
//! # async fn demo() -> Result<(), imgsqueeze::OptimizeError> {
//! use imgsqueeze::{Config, Optimizer};
//!
//! let mut optimizer = Optimizer::new(Config::new("images")).await?;
//! let stats = optimizer.run().await?;
//! println!("{}", stats.format_summary());
//! # Ok(())
//! # }
//! ```

use crate::{
    compressor::{Compressor, ExternalCompressor},
    config::Config,
    dispatcher::{CompressionDispatcher, DispatchOptions, Outcome, SkipReason},
    error::OptimizeError,
    ledger::Ledger,
    matcher::PathMatcher,
    progress::RunStats,
    reporter::Reporter,
    tool_resolver::ToolPathResolver,
    walker::Walker,
};
use tracing::{debug, info};

/// Drives one run: traversal, dispatch and reporting.
pub struct Optimizer<C = ExternalCompressor> {
    config: Config,
    matcher: PathMatcher,
    ledger: Ledger,
    dispatcher: CompressionDispatcher<C>,
    reporter: Reporter,
}

impl Optimizer<ExternalCompressor> {
    /// Optimizer backed by guetzli and zopflipng.
    pub async fn new(config: Config) -> Result<Self, OptimizeError> {
        let compressor =
            ExternalCompressor::new(config.jpeg_quality, ToolPathResolver::from_env());
        let reporter = Reporter::new(&config);
        Self::with_compressor(config, compressor, reporter).await
    }
}

impl<C: Compressor> Optimizer<C> {
    /// Validate `config`, compile the exclude pattern and load the ledger.
    ///
    /// Nothing under the input directory is touched before this returns.
    pub async fn with_compressor(
        config: Config,
        compressor: C,
        reporter: Reporter,
    ) -> Result<Self, OptimizeError> {
        config.validate()?;
        let matcher = PathMatcher::new(config.exclude.as_deref())?;
        let ledger = Ledger::load(&config.ledger_path).await?;

        let options = DispatchOptions {
            dry_run: config.dry_run,
            strict_ledger: config.strict_ledger,
        };

        Ok(Self {
            dispatcher: CompressionDispatcher::new(compressor, options),
            config,
            matcher,
            ledger,
            reporter,
        })
    }

    /// Esegue il processo di compressione
    pub async fn run(&mut self) -> Result<RunStats, OptimizeError> {
        info!(
            "Compressing images in {} (jpeg quality {}, {} known digests)",
            self.config.input_dir.display(),
            self.config.jpeg_quality,
            self.ledger.len()
        );
        if self.config.dry_run {
            info!("Dry run mode: no files will be modified");
        }
        self.reporter.start(&self.config);

        let mut stats = RunStats::new();
        let mut walker =
            Walker::new(&self.config.input_dir, &self.matcher).dry_run(self.config.dry_run);

        for file in walker.by_ref() {
            let file = file?;
            stats.files_scanned += 1;
            self.reporter.processing(&file);

            let outcome = self.dispatcher.process(&file, &mut self.ledger).await?;
            match &outcome {
                Outcome::Compressed(compressed) => stats.add_compressed(
                    compressed.prior_size,
                    compressed.new_size,
                    compressed.recorded,
                ),
                Outcome::Skipped(SkipReason::AlreadyOptimized) => stats.add_skipped(),
                Outcome::Skipped(SkipReason::DryRun) => stats.add_dry_run(),
            }
            self.reporter.file_done(&file, &outcome);
        }
        stats.entries_excluded = walker.excluded();

        debug!("{}", stats.format_summary());
        self.reporter.finish(&stats);
        Ok(stats)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compressor::fake::{FakeCompressor, Mode};
    use crate::digest::ContentDigest;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        images: PathBuf,
        ledger: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let images = dir.path().join("images");
            fs::create_dir(&images).unwrap();
            let ledger = dir.path().join("imgsqueeze.txt");
            Self {
                _dir: dir,
                images,
                ledger,
            }
        }

        fn image(&self, rel: &str, len: usize) -> PathBuf {
            let path = self.images.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            let seed = rel.len();
            let bytes: Vec<u8> = (0..len).map(|i| ((i + seed) % 253) as u8).collect();
            fs::write(&path, bytes).unwrap();
            path
        }

        fn config(&self) -> Config {
            let mut config = Config::new(&self.images);
            config.ledger_path = self.ledger.clone();
            config
        }
    }

    async fn optimizer(config: Config, compressor: FakeCompressor) -> Optimizer<FakeCompressor> {
        Optimizer::with_compressor(config, compressor, Reporter::plain(false, false))
            .await
            .unwrap()
    }

    fn ledger_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_second_run_compresses_nothing() {
        let fx = Fixture::new();
        let a = fx.image("a.jpg", 500_000);
        let b = fx.image("b.png", 200_000);

        let compressor = FakeCompressor::new(Mode::Shrink);
        let calls = compressor.calls();
        let stats = optimizer(fx.config(), compressor).await.run().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(stats.files_scanned, 2);
        assert_eq!(stats.files_compressed, 2);
        assert_eq!(stats.bytes_before, 700_000);
        assert_eq!(stats.bytes_after, 250_000 + 100_000 + 16);

        let lines = ledger_lines(&fx.ledger);
        assert_eq!(lines.len(), 2);
        assert!(lines.contains(&ContentDigest::of_file(&a).await.unwrap().to_string()));
        assert!(lines.contains(&ContentDigest::of_file(&b).await.unwrap().to_string()));

        let compressor = FakeCompressor::new(Mode::Shrink);
        let calls = compressor.calls();
        let stats = optimizer(fx.config(), compressor).await.run().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(stats.files_skipped, 2);
        assert_eq!(stats.files_compressed, 0);
        assert_eq!(ledger_lines(&fx.ledger).len(), 2);
    }

    #[tokio::test]
    async fn test_excluded_subtree_is_never_compressed() {
        let fx = Fixture::new();
        fx.image("keep/a.jpg", 100);
        let skipped = fx.image("vendor/b.jpg", 100);
        fx.image("vendor/deep/c.png", 100);
        fx.image("notes.txt", 100);
        let before = fs::read(&skipped).unwrap();

        let mut config = fx.config();
        config.exclude = Some("{*/vendor,*.txt}".to_string());
        let compressor = FakeCompressor::new(Mode::Shrink);
        let calls = compressor.calls();
        let stats = optimizer(config, compressor).await.run().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(stats.files_scanned, 1);
        assert_eq!(stats.entries_excluded, 2);
        assert_eq!(fs::read(&skipped).unwrap(), before);
    }

    #[tokio::test]
    async fn test_dry_run_is_pure() {
        let fx = Fixture::new();
        let a = fx.image("a.jpg", 1000);
        let b = fx.image("sub/b.PNG", 1000);
        let (before_a, before_b) = (fs::read(&a).unwrap(), fs::read(&b).unwrap());

        let mut config = fx.config();
        config.dry_run = true;
        let compressor = FakeCompressor::new(Mode::Shrink);
        let calls = compressor.calls();
        let mut optimizer = optimizer(config, compressor).await;
        let stats = optimizer.run().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(stats.files_dry_run, 2);
        assert_eq!(fs::read(&a).unwrap(), before_a);
        assert_eq!(fs::read(&b).unwrap(), before_b);
        assert!(optimizer.ledger().is_empty());
        assert!(!fx.ledger.exists());
    }

    #[tokio::test]
    async fn test_tool_failure_aborts_run() {
        let fx = Fixture::new();
        fx.image("a.jpg", 100);
        fx.image("b.png", 100);

        let compressor = FakeCompressor::new(Mode::Fail);
        let calls = compressor.calls();
        let err = optimizer(fx.config(), compressor)
            .await
            .run()
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!fx.ledger.exists());
    }

    #[tokio::test]
    async fn test_usage_errors_before_traversal() {
        let fx = Fixture::new();
        fx.image("a.jpg", 100);

        let mut config = fx.config();
        config.jpeg_quality = 83;
        let compressor = FakeCompressor::new(Mode::Shrink);
        let calls = compressor.calls();
        let err = Optimizer::with_compressor(config, compressor, Reporter::plain(false, false))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, OptimizeError::Usage(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let mut config = fx.config();
        config.exclude = Some("{broken".to_string());
        let err = Optimizer::with_compressor(
            config,
            FakeCompressor::new(Mode::Shrink),
            Reporter::plain(false, false),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_content_compressed_once_per_digest() {
        let fx = Fixture::new();
        let a = fx.image("a.jpg", 400);
        let copy = fx.images.join("copy.jpg");
        fs::copy(&a, &copy).unwrap();

        // the second file matches the first one's pre-compression bytes,
        // which are not in the ledger, so it is compressed too
        let compressor = FakeCompressor::new(Mode::Shrink);
        let calls = compressor.calls();
        optimizer(fx.config(), compressor).await.run().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(fs::read(&a).unwrap(), fs::read(&copy).unwrap());

        // both now share one recorded digest
        let lines = ledger_lines(&fx.ledger);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], lines[1]);
    }
}
