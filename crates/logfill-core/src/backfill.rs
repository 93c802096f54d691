//! Back-fill Coordinator
//!
//! Replays history: a simulated clock starts at "now" and steps backward by
//! the scheduler's interval until it passes the horizon. One event is
//! synthesized per step and handed to the worker pool, so delivery order is
//! not timestamp order.

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::payload::{Dice, synthesize_payload};
use crate::pool::{DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS, WorkerPool};
use crate::scheduler::{Direction, RateState, to_delta};
use crate::sink::DeliverySink;
use crate::stats::{EmitterStats, StatsSnapshot};

pub const DEFAULT_HORIZON: Duration = Duration::from_secs(48 * 60 * 60);

#[derive(Debug, Clone)]
pub struct BackfillConfig {
    /// How far into the past to replay.
    pub horizon: Duration,
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Simulated instants for a back-fill run, newest first.
///
/// Each step moves the clock back by the current interval; the scheduler
/// is consulted after every step. Iteration stops right after the first
/// instant at or beyond the horizon.
pub struct BackfillTimeline<D: Dice> {
    clock: DateTime<Utc>,
    limit: DateTime<Utc>,
    rate: RateState,
    dice: D,
}

impl<D: Dice> BackfillTimeline<D> {
    pub fn new(now: DateTime<Utc>, horizon: Duration, mut dice: D) -> Self {
        let rate = RateState::start(Direction::Backward, now, &mut dice);
        Self {
            clock: now,
            limit: now
                .checked_sub_signed(to_delta(horizon))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            rate,
            dice,
        }
    }

    pub fn limit(&self) -> DateTime<Utc> {
        self.limit
    }

    pub fn clock(&self) -> DateTime<Utc> {
        self.clock
    }
}

impl<D: Dice> Iterator for BackfillTimeline<D> {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.clock <= self.limit {
            return None;
        }

        // Past the representable range there is nothing left to replay.
        let Some(at) = self.clock.checked_sub_signed(to_delta(self.rate.interval())) else {
            self.clock = self.limit;
            return None;
        };
        self.clock = at;
        self.rate.observe(at, &mut self.dice);
        Some(at)
    }
}

#[derive(Debug, Clone)]
pub struct BackfillReport {
    /// Oldest simulated instant reached.
    pub oldest: DateTime<Utc>,
    pub events: StatsSnapshot,
    pub elapsed: Duration,
    pub cancelled: bool,
}

pub struct BackfillCoordinator {
    sink: Arc<dyn DeliverySink>,
    config: BackfillConfig,
    stats: Arc<EmitterStats>,
}

impl BackfillCoordinator {
    pub fn new(sink: Arc<dyn DeliverySink>, config: BackfillConfig) -> Self {
        Self {
            sink,
            config,
            stats: Arc::new(EmitterStats::default()),
        }
    }

    /// Replay from `now` back to `now - horizon`, then close the queue and
    /// wait for the pool to drain. Returns early, still draining, when
    /// `cancel` fires.
    pub async fn run(&self, now: DateTime<Utc>, cancel: CancellationToken) -> BackfillReport {
        let started = Instant::now();
        let mut timeline = BackfillTimeline::new(now, self.config.horizon, StdRng::from_os_rng());
        let mut rng = StdRng::from_os_rng();

        info!(
            from = %now,
            to = %timeline.limit(),
            workers = self.config.workers,
            queue_capacity = self.config.queue_capacity,
            sink = self.sink.name(),
            "Starting back-fill"
        );

        let pool = WorkerPool::spawn(
            self.config.workers,
            self.config.queue_capacity,
            Arc::clone(&self.sink),
            Arc::clone(&self.stats),
        );

        let mut cancelled = false;
        for at in timeline.by_ref() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let payload = match synthesize_payload(&mut rng, at) {
                Ok(payload) => payload,
                Err(e) => {
                    EmitterStats::bump(&self.stats.skipped);
                    warn!(error = %e, at = %at, "Skipping back-fill event");
                    continue;
                }
            };
            EmitterStats::bump(&self.stats.generated);

            let accepted = tokio::select! {
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                accepted = pool.submit(payload) => accepted,
            };
            if !accepted {
                warn!("Back-fill workers are gone, stopping early");
                break;
            }
        }

        pool.close().await;

        let report = BackfillReport {
            oldest: timeline.clock(),
            events: self.stats.snapshot(),
            elapsed: started.elapsed(),
            cancelled,
        };
        info!(
            oldest = %report.oldest,
            generated = report.events.generated,
            delivered = report.events.delivered,
            failed = report.events.failed,
            skipped = report.events.skipped,
            elapsed = ?report.elapsed,
            cancelled = report.cancelled,
            "Back-fill finished"
        );
        report
    }
}
