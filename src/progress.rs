//! Run progress: a single aggregator task fed by fetch tasks over a channel.
//!
//! Fetch tasks never touch the counters directly. Each sends its terminal
//! [`FetchOutcome`] on an mpsc channel; the aggregator is the only writer of
//! [`ProgressHandle`] and the only emitter of per-item events. The handle is
//! read-only for everyone else (typically a UI polling a progress bar).

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::types::{Event, FetchOutcome};

/// Buffer size for the fetch outcome channel
pub(crate) const OUTCOME_CHANNEL_BUFFER: usize = 256;

/// Read-only view of the current run's progress
#[derive(Clone, Debug, Default)]
pub struct ProgressHandle {
    completed: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
}

impl ProgressHandle {
    /// Items that reached a terminal outcome (success or exhaustion)
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Items that exhausted their attempts
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Catalog size of the current run (0 before the catalog is fetched)
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Completed fraction in `0.0..=1.0` (0.0 while the total is unknown)
    pub fn fraction(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.completed() as f64 / total as f64
        }
    }

    /// Zero all counters at the start of a run
    pub(crate) fn reset(&self) {
        self.completed.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
        self.total.store(0, Ordering::SeqCst);
    }

    pub(crate) fn set_total(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
    }

    /// Count one terminal outcome; returns the new completed count
    fn record(&self, outcome: &FetchOutcome) -> usize {
        if !outcome.succeeded {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Spawn the aggregator that consumes fetch outcomes until every sender is dropped.
///
/// Returns all outcomes in arrival order once the channel closes.
pub(crate) fn spawn_progress_aggregator(
    progress: ProgressHandle,
    event_tx: tokio::sync::broadcast::Sender<Event>,
    mut outcome_rx: tokio::sync::mpsc::Receiver<FetchOutcome>,
) -> tokio::task::JoinHandle<Vec<FetchOutcome>> {
    tokio::spawn(async move {
        let mut outcomes = Vec::with_capacity(progress.total());

        while let Some(outcome) = outcome_rx.recv().await {
            let completed = progress.record(&outcome);
            let total = progress.total();

            let event = if outcome.succeeded {
                Event::ItemCompleted {
                    id: outcome.item_id,
                    title: outcome.title.clone(),
                    completed,
                    total,
                }
            } else {
                Event::ItemFailed {
                    id: outcome.item_id,
                    title: outcome.title.clone(),
                    stage: outcome.failed_stage,
                    attempts: outcome.attempts,
                    completed,
                    total,
                }
            };
            // No subscribers is fine; the counters are still updated
            event_tx.send(event).ok();

            outcomes.push(outcome);
        }

        outcomes
    })
}
