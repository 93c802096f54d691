//! Back-fill delivery pool
//!
//! A bounded work queue feeding a fixed set of worker tasks. The producer
//! suspends while the queue is full; workers share the receiving end and
//! exit once the queue is closed and drained.

use bytes::Bytes;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::sink::DeliverySink;
use crate::stats::EmitterStats;

pub const DEFAULT_WORKERS: usize = 8;
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

pub struct WorkerPool {
    tx: mpsc::Sender<Bytes>,
    handles: Vec<JoinHandle<()>>,
    stats: Arc<EmitterStats>,
}

impl WorkerPool {
    /// Start `workers` delivery tasks behind a queue holding at most
    /// `capacity` pending payloads. Both must be non-zero.
    pub fn spawn(
        workers: usize,
        capacity: usize,
        sink: Arc<dyn DeliverySink>,
        stats: Arc<EmitterStats>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let handles = (0..workers.max(1))
            .map(|worker_id| {
                let rx = Arc::clone(&rx);
                let sink = Arc::clone(&sink);
                let stats = Arc::clone(&stats);
                tokio::spawn(async move {
                    Self::worker(worker_id, rx, sink, stats).await;
                })
            })
            .collect();

        Self { tx, handles, stats }
    }

    pub fn workers(&self) -> usize {
        self.handles.len()
    }

    /// Enqueue one payload, waiting for room when the queue is full.
    /// Returns false once every worker has gone away.
    pub async fn submit(&self, payload: Bytes) -> bool {
        if self.tx.send(payload).await.is_err() {
            return false;
        }
        EmitterStats::bump(&self.stats.enqueued);
        true
    }

    /// Close the queue and wait until every worker has drained it and
    /// exited.
    pub async fn close(self) {
        let Self { tx, handles, .. } = self;
        drop(tx);

        for result in join_all(handles).await {
            if let Err(e) = result {
                warn!(error = %e, "Back-fill worker ended abnormally");
            }
        }
    }

    async fn worker(
        worker_id: usize,
        rx: Arc<Mutex<mpsc::Receiver<Bytes>>>,
        sink: Arc<dyn DeliverySink>,
        stats: Arc<EmitterStats>,
    ) {
        let mut handled = 0u64;

        loop {
            // Lock only for the receive so other workers can pick up items
            // while this one is delivering.
            let next = rx.lock().await.recv().await;
            let Some(payload) = next else { break };

            match sink.deliver(payload).await {
                Ok(()) => EmitterStats::bump(&stats.delivered),
                Err(e) => {
                    EmitterStats::bump(&stats.failed);
                    warn!(worker_id, sink = sink.name(), error = %e, "Back-fill delivery failed");
                }
            }
            handled += 1;
        }

        debug!(worker_id, handled, "Back-fill worker drained");
    }
}
