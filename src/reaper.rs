use std::time::Duration;

use futures_util::future::join_all;
use tokio::{
    sync::broadcast,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};

use crate::{
    clock,
    db::{Removal, Store},
    models::{Message, LEAVE_TEXT},
    presence::PresenceTracker,
    AppError, AppResult,
};

/// Outcome of one sweep, one entry per expired participant.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub evicted: Vec<String>,
    /// Expired at query time but deleted by someone else before we got to them.
    pub already_gone: Vec<String>,
    pub failed: Vec<(String, AppError)>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.evicted.is_empty() && self.already_gone.is_empty() && self.failed.is_empty()
    }
}

/// Periodically evicts participants that stopped sending heartbeats and
/// announces their departure.
#[derive(Clone)]
pub struct Reaper {
    store: Store,
    presence: PresenceTracker,
    inactivity: Duration,
    period: Duration,
}

impl Reaper {
    pub fn new(store: Store, inactivity: Duration, period: Duration) -> Self {
        Reaper {
            presence: PresenceTracker::new(store.clone()),
            store,
            inactivity,
            period,
        }
    }

    /// Runs a single sweep against the clock reading `now`.
    ///
    /// Fails only when the expiry query fails. Per-participant failures end up
    /// in [`SweepReport::failed`] and don't stop the others.
    pub async fn sweep(&self, now: i64) -> AppResult<SweepReport> {
        let expired = self.presence.list_expired(self.inactivity, now).await?;

        let outcomes = join_all(expired.into_iter().map(|participant| async move {
            let result = self.evict(&participant.name, now).await;
            (participant.name, result)
        }))
        .await;

        let mut report = SweepReport::default();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(Removal::Removed) => report.evicted.push(name),
                Ok(Removal::Gone) => report.already_gone.push(name),
                Err(e) => report.failed.push((name, e)),
            }
        }
        Ok(report)
    }

    async fn evict(&self, name: &str, now: i64) -> AppResult<Removal> {
        let notice = Message::status(name, LEAVE_TEXT, now)?;
        self.store.evict(name, &notice).await
    }

    /// Sweeps every `period` until `shutdown` fires. The first sweep happens one
    /// period after the call. A sweep already running when shutdown arrives is
    /// allowed to finish.
    pub fn spawn(self, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + self.period, self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(
                period_ms = self.period.as_millis() as u64,
                inactivity_ms = self.inactivity.as_millis() as u64,
                "reaper started"
            );

            loop {
                tokio::select! {
                    _ = interval.tick() => self.tick().await,
                    _ = shutdown.recv() => {
                        tracing::info!("reaper stopping");
                        break;
                    }
                }
            }
        })
    }

    async fn tick(&self) {
        let report = match self.sweep(clock::now_millis()).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "expiry query failed, skipping sweep");
                return;
            }
        };

        for name in &report.evicted {
            tracing::info!(participant = %name, "evicted idle participant");
        }
        for (name, e) in &report.failed {
            tracing::error!(participant = %name, error = %e, "failed to evict participant");
        }
        if !report.is_empty() {
            tracing::debug!(
                evicted = report.evicted.len(),
                already_gone = report.already_gone.len(),
                failed = report.failed.len(),
                "sweep finished"
            );
        }
    }
}
