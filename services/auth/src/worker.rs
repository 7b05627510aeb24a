use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::domain::repository::{ResetTokenRepository, SessionRepository};
use crate::domain::types::SESSION_RETENTION_DAYS;
use crate::error::AuthServiceError;
use crate::infra::db::{DbResetTokenRepository, DbSessionRepository};

/// Rows removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub sessions: u64,
    pub reset_tokens: u64,
}

/// Periodic housekeeping: retires old sessions and drops expired reset tokens.
pub struct CleanupWorker<S, T>
where
    S: SessionRepository,
    T: ResetTokenRepository,
{
    pub sessions: S,
    pub reset_tokens: T,
    pub interval: Duration,
}

impl<S, T> CleanupWorker<S, T>
where
    S: SessionRepository,
    T: ResetTokenRepository,
{
    pub async fn sweep(&self) -> Result<SweepReport, AuthServiceError> {
        let cutoff = Utc::now() - chrono::Duration::days(SESSION_RETENTION_DAYS);
        let sessions = self.sessions.cleanup_expired(cutoff).await?;
        let reset_tokens = self.reset_tokens.cleanup_expired().await?;
        Ok(SweepReport {
            sessions,
            reset_tokens,
        })
    }

    /// Sweep on every tick until `shutdown` holds `true` or its sender is dropped.
    /// The first sweep runs immediately.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => match self.sweep().await {
                    Ok(report) => tracing::info!(
                        sessions = report.sessions,
                        reset_tokens = report.reset_tokens,
                        "cleanup sweep finished"
                    ),
                    Err(e) => tracing::error!(error = ?e, "cleanup sweep failed"),
                },
            }
        }
        tracing::info!("cleanup worker stopped");
    }
}

pub fn spawn_cleanup_worker(
    sessions: DbSessionRepository,
    reset_tokens: DbResetTokenRepository,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    let worker = CleanupWorker {
        sessions,
        reset_tokens,
        interval,
    };
    tokio::spawn(worker.run(shutdown))
}
