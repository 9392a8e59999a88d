//! # Compression Dispatcher Module
//!
//! Decide, per ogni immagine trovata dal walker, se serve lavoro e lo esegue.
//!
//! ## Pipeline per file:
//! 1. Digest del contenuto attuale (errore fatale se illeggibile)
//! 2. Digest già nel ledger: skip
//! 3. Dry-run: riporta l'azione, non tocca nulla
//! 4. Compressione sul posto con il tool del formato
//! 5. Nuovo digest e nuova dimensione, registrazione nel ledger
//!
//! Un file che dopo la compressione risulta più grande viene comunque
//! registrato: la dimensione influenza solo il report.

use crate::compressor::{Compressor, ToolOutput};
use crate::digest::ContentDigest;
use crate::error::OptimizeError;
use crate::ledger::Ledger;
use crate::walker::ImageFile;
use tracing::{debug, trace, warn};

/// Behaviour switches taken from the run configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchOptions {
    pub dry_run: bool,
    /// Treat a failed ledger append as fatal
    pub strict_ledger: bool,
}

/// Result of a successful compression.
#[derive(Debug, Clone)]
pub struct CompressionOutcome {
    pub prior_size: u64,
    pub new_size: u64,
    pub new_digest: ContentDigest,
    pub tool_output: ToolOutput,
    /// False when the ledger append failed and was tolerated
    pub recorded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyOptimized,
    DryRun,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Compressed(CompressionOutcome),
    Skipped(SkipReason),
}

pub struct CompressionDispatcher<C> {
    compressor: C,
    options: DispatchOptions,
}

impl<C: Compressor> CompressionDispatcher<C> {
    pub fn new(compressor: C, options: DispatchOptions) -> Self {
        Self {
            compressor,
            options,
        }
    }

    /// Process one image against `ledger`.
    pub async fn process(
        &self,
        file: &ImageFile,
        ledger: &mut Ledger,
    ) -> Result<Outcome, OptimizeError> {
        let digest = ContentDigest::of_file(&file.path).await?;

        if ledger.contains(&digest) {
            trace!("Skipping {}, digest {} already in ledger", file.path.display(), digest);
            return Ok(Outcome::Skipped(SkipReason::AlreadyOptimized));
        }

        if self.options.dry_run {
            return Ok(Outcome::Skipped(SkipReason::DryRun));
        }

        debug!("Compressing {} ({})", file.path.display(), file.kind);
        let tool_output = self.compressor.compress(file).await?;

        let new_digest = ContentDigest::of_file(&file.path).await?;
        let new_size = tokio::fs::metadata(&file.path)
            .await
            .map_err(|source| OptimizeError::Stat {
                path: file.path.clone(),
                source,
            })?
            .len();

        let recorded = match ledger.record(new_digest.clone()).await {
            Ok(()) => true,
            Err(e) if !self.options.strict_ledger => {
                warn!("{}", e);
                false
            }
            Err(e) => return Err(e),
        };

        Ok(Outcome::Compressed(CompressionOutcome {
            prior_size: file.size,
            new_size,
            new_digest,
            tool_output,
            recorded,
        }))
    }

    pub fn compressor(&self) -> &C {
        &self.compressor
    }
}
