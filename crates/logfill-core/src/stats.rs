use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between an emitter and its delivery tasks.
#[derive(Debug, Default)]
pub struct EmitterStats {
    pub generated: AtomicU64,
    pub skipped: AtomicU64,
    pub enqueued: AtomicU64,
    pub delivered: AtomicU64,
    pub failed: AtomicU64,
}

impl EmitterStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            generated: self.generated.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub generated: u64,
    pub skipped: u64,
    pub enqueued: u64,
    pub delivered: u64,
    pub failed: u64,
}
