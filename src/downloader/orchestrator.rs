//! Run orchestration: bounded fan-out of one fetch task per catalog item.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;

use crate::error::{Error, Result};
use crate::progress::{OUTCOME_CHANNEL_BUFFER, spawn_progress_aggregator};
use crate::types::{DownloadTarget, Event, FetchOutcome, ItemRecord, RunSummary};

use super::CatalogDownloader;
use super::catalog::fetch_catalog;
use super::fetch_task::{FetchTaskContext, fetch_item};

/// Clears the running flag when a run ends, however it ends.
struct RunGuard {
    running: Arc<AtomicBool>,
}

impl RunGuard {
    fn acquire(running: &Arc<AtomicBool>) -> Result<Self> {
        running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| Error::AlreadyRunning)?;
        Ok(Self {
            running: Arc::clone(running),
        })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Assign every item its own directory under `output_root`.
///
/// Titles that sanitize to the same name (compared case-insensitively, since
/// not every filesystem distinguishes case) would otherwise share a directory;
/// later items get `_<id>` appended.
pub(crate) fn plan_targets(items: &[ItemRecord], output_root: &Path) -> Vec<DownloadTarget> {
    let mut taken = HashSet::with_capacity(items.len());

    items
        .iter()
        .map(|item| {
            let target = DownloadTarget::for_item(item, output_root);
            let mut directory_name = target.directory_name.clone();
            while !taken.insert(directory_name.to_lowercase()) {
                directory_name = format!("{}_{}", directory_name, item.id);
            }
            if directory_name == target.directory_name {
                return target;
            }

            tracing::debug!(
                item_id = item.id.get(),
                original = %target.directory_name,
                renamed = %directory_name,
                "Directory name collision"
            );
            DownloadTarget {
                destination: output_root.join(&directory_name),
                directory_name,
            }
        })
        .collect()
}

impl CatalogDownloader {
    /// Download the whole catalog into `output_root`
    ///
    /// This is the single entry point for a presentation layer:
    /// 1. Fetches the catalog; on failure emits [`Event::CatalogUnavailable`]
    ///    and returns the error without attempting any item
    /// 2. Spawns one fetch task per item, never letting more than
    ///    `concurrency_limit` of them run at once
    /// 3. Waits until every item reached a terminal outcome
    ///
    /// Each item is written to `<output_root>/<sanitized title>`. When titles
    /// collide after sanitizing (compared case-insensitively), the later item
    /// in catalog order gets `<sanitized title>_<id>` instead.
    ///
    /// Per-item failures never abort the run; they show up as
    /// [`Event::ItemFailed`] and in [`RunSummary::failed`].
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `concurrency_limit` is zero
    /// - [`Error::AlreadyRunning`] if another run is in progress
    /// - [`Error::CatalogUnavailable`] if the catalog could not be fetched
    /// - [`Error::Io`] if the output root cannot be created
    pub async fn run(
        &self,
        output_root: impl AsRef<Path>,
        concurrency_limit: usize,
    ) -> Result<RunSummary> {
        if concurrency_limit == 0 {
            return Err(Error::config("must be at least 1", "concurrency_limit"));
        }
        let _guard = RunGuard::acquire(&self.running)?;

        let started_at = Utc::now();
        self.progress.reset();

        let items = match fetch_catalog(self.source.as_ref()).await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(error = %e, "Could not fetch catalog");
                let status = match &e {
                    Error::CatalogUnavailable { status, .. } => *status,
                    _ => None,
                };
                self.emit_event(Event::CatalogUnavailable {
                    status,
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        let output_root = output_root.as_ref().to_path_buf();
        create_output_root(&output_root).await?;

        let total = items.len();
        self.progress.set_total(total);
        self.emit_event(Event::Started { total });
        tracing::info!(
            total,
            concurrency_limit,
            output_root = %output_root.display(),
            "Starting catalog download"
        );

        let targets = plan_targets(&items, &output_root);
        let outcomes = self.fetch_all(items, targets, concurrency_limit).await?;

        let succeeded = outcomes.iter().filter(|o| o.succeeded).count();
        let failed: Vec<FetchOutcome> = outcomes.into_iter().filter(|o| !o.succeeded).collect();

        tracing::info!(
            total,
            succeeded,
            failed = failed.len(),
            "Catalog download finished"
        );
        self.emit_event(Event::Finished {
            succeeded,
            failed: failed.len(),
        });

        Ok(RunSummary {
            total,
            succeeded,
            failed,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Run with the output directory and concurrency limit from [`Config`](crate::Config)
    pub async fn run_configured(&self) -> Result<RunSummary> {
        self.run(
            self.config.download.output_dir.clone(),
            self.config.download.max_concurrent_downloads,
        )
        .await
    }

    /// Spawn one task per item behind a semaphore and collect every outcome.
    async fn fetch_all(
        &self,
        items: Vec<ItemRecord>,
        targets: Vec<DownloadTarget>,
        concurrency_limit: usize,
    ) -> Result<Vec<FetchOutcome>> {
        let (outcome_tx, outcome_rx) = tokio::sync::mpsc::channel(OUTCOME_CHANNEL_BUFFER);
        let aggregator =
            spawn_progress_aggregator(self.progress.clone(), self.event_tx.clone(), outcome_rx);

        let limiter = Arc::new(tokio::sync::Semaphore::new(concurrency_limit));
        let ctx = Arc::new(FetchTaskContext {
            source: Arc::clone(&self.source),
            retry: self.config.retry.clone(),
        });

        let mut handles = Vec::with_capacity(items.len());
        for (item, target) in items.into_iter().zip(targets) {
            // Acquire a permit from the semaphore (blocks if at the concurrency limit)
            let permit = match Arc::clone(&limiter).acquire_owned().await {
                Ok(p) => p,
                Err(_) => {
                    tracing::error!(item_id = item.id.get(), "Concurrency limiter closed");
                    outcome_tx.send(FetchOutcome::aborted(&item)).await.ok();
                    continue;
                }
            };

            let item = Arc::new(item);
            let task_item = Arc::clone(&item);
            let ctx = Arc::clone(&ctx);
            let outcome_tx = outcome_tx.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let outcome = fetch_item(&ctx, &task_item, &target).await;
                if outcome_tx.send(outcome).await.is_err() {
                    tracing::error!(
                        item_id = task_item.id.get(),
                        "Progress aggregator stopped before outcome was delivered"
                    );
                }
            });
            handles.push((item, handle));
        }

        let joined = futures::future::join_all(
            handles
                .into_iter()
                .map(|(item, handle)| async move { (item, handle.await) }),
        )
        .await;

        for (item, result) in joined {
            if let Err(e) = result {
                tracing::error!(
                    item_id = item.id.get(),
                    title = %item.title,
                    error = %e,
                    "Fetch task panicked"
                );
                outcome_tx.send(FetchOutcome::aborted(&item)).await.ok();
            }
        }

        // Closing the last sender lets the aggregator finish
        drop(outcome_tx);
        aggregator.await.map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "progress aggregator failed: {}",
                e
            )))
        })
    }
}

async fn create_output_root(output_root: &Path) -> Result<()> {
    tokio::fs::create_dir_all(output_root).await.map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!(
                "Failed to create output directory '{}': {}",
                output_root.display(),
                e
            ),
        ))
    })
}
