use std::path::Path;
use std::time::Duration;

use tracing::instrument::WithSubscriber;

use replica_core::{PairError, SyncPair};
use replica_sync::MirrorError;

use crate::error::{io_err, DaemonError};
use crate::logging::Logger;
use crate::ticker::{IntervalTicker, Ticker};

/// Result of one mirror cycle, as reported to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed,
    /// Carries the message that was logged at ERROR.
    Failed(String),
}

impl CycleOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, CycleOutcome::Completed)
    }
}

/// Build a single-threaded runtime and mirror `pair` every `interval` until
/// the process is killed.
pub fn start_blocking(
    pair: SyncPair,
    interval: Duration,
    logger: Logger,
) -> Result<(), DaemonError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(Runner::new(pair, IntervalTicker::new(interval), logger).run());
    Ok(())
}

/// Owns the cycle loop: one initial sync, then bracketed cycles separated by ticks.
pub struct Runner<T> {
    pair: SyncPair,
    ticker: T,
    logger: Logger,
}

impl<T: Ticker> Runner<T> {
    pub fn new(pair: SyncPair, ticker: T, logger: Logger) -> Self {
        Self {
            pair,
            ticker,
            logger,
        }
    }

    /// Run until the ticker is exhausted. With an [`IntervalTicker`] that is never.
    pub async fn run(self) {
        let dispatch = self.logger.dispatch().clone();
        self.run_loop().with_subscriber(dispatch).await
    }

    async fn run_loop(mut self) {
        run_cycle(&self.pair, &self.logger).await;

        loop {
            tracing::info!("Starting periodic synchronization...");
            run_cycle(&self.pair, &self.logger).await;
            tracing::info!("Periodic synchronization complete.");

            if !self.ticker.tick().await {
                break;
            }
        }
    }
}

/// Mirror `pair` once on the blocking pool and log how it went.
///
/// Never fails: every problem, including a panic inside the mirror task, ends
/// up as [`CycleOutcome::Failed`] plus an ERROR line.
pub async fn run_cycle(pair: &SyncPair, logger: &Logger) -> CycleOutcome {
    run_job(pair, logger, replica_sync::mirror).await
}

/// [`run_cycle`] with the mirror function swapped out.
async fn run_job<F>(pair: &SyncPair, logger: &Logger, job: F) -> CycleOutcome
where
    F: FnOnce(&Path, &Path) -> Result<(), MirrorError> + Send + 'static,
{
    let job_pair = pair.clone();
    let job_logger = logger.clone();
    let joined = tokio::task::spawn_blocking(move || {
        job_logger.in_scope(|| job(job_pair.source(), job_pair.replica()))
    })
    .await;

    logger.in_scope(|| match joined {
        Ok(Ok(())) => {
            tracing::info!("Folder synchronization complete: {pair}");
            CycleOutcome::Completed
        }
        Ok(Err(MirrorError::Pair(PairError::SourceNotFound { path }))) => {
            let message = format!("Source Folder not Found: {}", path.display());
            tracing::error!("{message}");
            CycleOutcome::Failed(message)
        }
        Ok(Err(err)) => {
            let message = format!("Error during synchronization: {err}");
            tracing::error!("{message}");
            CycleOutcome::Failed(message)
        }
        Err(err) => {
            let message = format!("Error during synchronization: mirror task failed: {err}");
            tracing::error!("{message}");
            CycleOutcome::Failed(message)
        }
    })
}
