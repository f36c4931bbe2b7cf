//! Per-item fetch task: metadata, image and track, driven by [`AttemptState`].
//!
//! One attempt runs the three stages in order. A metadata failure ends the
//! attempt at once (there is nothing to put in a directory yet). Image and
//! track are both tried even if the other fails, so whatever the server does
//! deliver ends up on disk, but any stage failure still fails the attempt and
//! the next attempt starts over from metadata. An item only succeeds when all
//! three files were written by the same attempt.

use std::sync::Arc;

use crate::config::RetryConfig;
use crate::error::{AssetFetchError, AssetFetchErrorKind, Error};
use crate::retry::{AttemptState, backoff_delay};
use crate::source::AssetSource;
use crate::types::{AssetKind, DownloadTarget, FetchOutcome, ItemId, ItemRecord};

/// Shared state for all fetch tasks of one run.
pub(crate) struct FetchTaskContext {
    pub(crate) source: Arc<dyn AssetSource>,
    pub(crate) retry: RetryConfig,
}

/// Run the full retry sequence for one item and return its terminal outcome.
pub(crate) async fn fetch_item(
    ctx: &FetchTaskContext,
    item: &ItemRecord,
    target: &DownloadTarget,
) -> FetchOutcome {
    let max_attempts = ctx.retry.max_attempts;
    let mut state = AttemptState::start();

    loop {
        match state {
            AttemptState::Attempting(attempt) => {
                let delay = backoff_delay(&ctx.retry, attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }

                state = match run_attempt(ctx.source.as_ref(), item.id, target).await {
                    Ok(()) => state.on_success(),
                    Err(e) => {
                        tracing::warn!(
                            item_id = item.id.get(),
                            title = %item.title,
                            attempt = attempt + 1,
                            max_attempts,
                            stage = %e.stage,
                            error = %e,
                            "Attempt failed"
                        );
                        state.on_failure(e.stage, max_attempts)
                    }
                };
            }
            AttemptState::Succeeded { attempts } => {
                tracing::info!(
                    item_id = item.id.get(),
                    title = %item.title,
                    directory = %target.destination.display(),
                    attempts,
                    "Downloaded item"
                );
                return FetchOutcome::success(item, attempts);
            }
            AttemptState::Exhausted { stage, attempts } => {
                let err = Error::ItemExhausted {
                    id: item.id,
                    title: item.title.clone(),
                    stage,
                    attempts,
                };
                tracing::warn!(
                    item_id = item.id.get(),
                    title = %item.title,
                    stage = %stage,
                    error = %err,
                    "Giving up on item"
                );
                return FetchOutcome::exhausted(item, stage, attempts);
            }
        }
    }
}

/// One pass over the three stages.
///
/// Returns the first stage failure of this attempt, if any.
pub(crate) async fn run_attempt(
    source: &dyn AssetSource,
    id: ItemId,
    target: &DownloadTarget,
) -> Result<(), AssetFetchError> {
    let metadata = fetch_stage(source, AssetKind::Metadata, id).await?;

    tokio::fs::create_dir_all(&target.destination)
        .await
        .map_err(|err| {
            AssetFetchError::new(
                id,
                AssetKind::Metadata,
                AssetFetchErrorKind::Write {
                    path: target.destination.clone(),
                    source: err,
                },
            )
        })?;
    write_asset(target, AssetKind::Metadata, id, &metadata).await?;

    let mut first_failure = None;
    for kind in [AssetKind::Image, AssetKind::Track] {
        let result = match fetch_stage(source, kind, id).await {
            Ok(body) => write_asset(target, kind, id, &body).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::debug!(item_id = id.get(), stage = %kind, error = %e, "Stage failed");
            first_failure.get_or_insert(e);
        }
    }

    match first_failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// GET one asset and require a 200 with a non-empty body.
async fn fetch_stage(
    source: &dyn AssetSource,
    kind: AssetKind,
    id: ItemId,
) -> Result<Vec<u8>, AssetFetchError> {
    let fetched = source
        .fetch_asset(kind, id)
        .await
        .map_err(|e| AssetFetchError::new(id, kind, AssetFetchErrorKind::Transport(e.to_string())))?;

    if fetched.is_usable() {
        return Ok(fetched.body);
    }

    let reason = if fetched.status != 200 {
        AssetFetchErrorKind::BadStatus(fetched.status)
    } else {
        AssetFetchErrorKind::EmptyBody
    };
    Err(AssetFetchError::new(id, kind, reason))
}

async fn write_asset(
    target: &DownloadTarget,
    kind: AssetKind,
    id: ItemId,
    body: &[u8],
) -> Result<(), AssetFetchError> {
    let path = target.asset_path(kind);
    tokio::fs::write(&path, body).await.map_err(|source| {
        AssetFetchError::new(
            id,
            kind,
            AssetFetchErrorKind::Write {
                path: path.clone(),
                source,
            },
        )
    })?;
    tracing::trace!(item_id = id.get(), path = %path.display(), bytes = body.len(), "Asset written");
    Ok(())
}

