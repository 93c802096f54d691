//! Live Emitter
//!
//! One event per scheduler tick, stamped with the wall clock and delivered
//! synchronously before the next tick. Runs until cancelled.

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::payload::synthesize_payload;
use crate::scheduler::{Direction, RateState};
use crate::sink::DeliverySink;
use crate::stats::{EmitterStats, StatsSnapshot};

pub struct LiveEmitter {
    sink: Arc<dyn DeliverySink>,
    stats: Arc<EmitterStats>,
}

impl LiveEmitter {
    pub fn new(sink: Arc<dyn DeliverySink>) -> Self {
        Self {
            sink,
            stats: Arc::new(EmitterStats::default()),
        }
    }

    pub async fn run(&self, cancel: CancellationToken) -> StatsSnapshot {
        let mut rng = StdRng::from_os_rng();
        let mut rate = RateState::start(Direction::Forward, Utc::now(), &mut rng);

        info!(
            sink = self.sink.name(),
            interval = ?rate.interval(),
            "Starting live fill"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(rate.interval()) => {}
            }

            match synthesize_payload(&mut rng, Utc::now()) {
                Ok(payload) => {
                    EmitterStats::bump(&self.stats.generated);
                    let delivered = tokio::select! {
                        _ = cancel.cancelled() => break,
                        delivered = self.sink.deliver(payload) => delivered,
                    };
                    match delivered {
                        Ok(()) => EmitterStats::bump(&self.stats.delivered),
                        Err(e) => {
                            EmitterStats::bump(&self.stats.failed);
                            warn!(sink = self.sink.name(), error = %e, "Live delivery failed");
                        }
                    }
                }
                Err(e) => {
                    EmitterStats::bump(&self.stats.skipped);
                    warn!(error = %e, "Skipping live event");
                }
            }

            rate.observe(Utc::now(), &mut rng);
        }

        let snapshot = self.stats.snapshot();
        info!(
            generated = snapshot.generated,
            delivered = snapshot.delivered,
            failed = snapshot.failed,
            "Live fill stopped"
        );
        snapshot
    }
}
