//! Batch worker: one session, one shard, one post at a time.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::client::{Session, SessionFactory};
use crate::error::{Error, FetchError, Result};
use crate::extract::{ExtractLimits, extract_thread};
use crate::types::{Event, ListingEntry, PostRecord, Shard};
use crate::utils::truncate_chars;

/// Per-post outcomes for one shard, in shard order; `None` marks a failed post
pub type ShardResults = Vec<Option<PostRecord>>;

/// Everything a worker needs besides its shard, shared read-only by all workers
pub(crate) struct WorkerContext {
    pub(crate) sessions: Arc<dyn SessionFactory>,
    pub(crate) limits: ExtractLimits,
    pub(crate) request_timeout: Duration,
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Cancelled by the dispatcher once any worker fails fatally
    pub(crate) cancel_token: CancellationToken,
}

/// Fetch every post of `shard` over a single session.
///
/// A post that fails to load is logged and recorded as `None`; the loop moves on.
/// The session is closed on every exit path: normal completion, cancellation,
/// and a panic in the loop, which is resumed after the close.
///
/// # Errors
/// Session creation failure is fatal. [`Error::Cancelled`] is returned when the
/// dispatcher cancelled the shard part-way.
pub(crate) async fn run_worker(ctx: &WorkerContext, shard: Shard) -> Result<ShardResults> {
    let worker = shard.index;
    let session = ctx.sessions.create().await.inspect_err(|e| {
        error!(worker, error = %e, "Worker could not create a session");
    })?;

    ctx.event_tx
        .send(Event::WorkerStarted {
            worker,
            assigned: shard.len(),
        })
        .ok();

    let outcome = AssertUnwindSafe(fetch_shard(ctx, session.as_ref(), &shard))
        .catch_unwind()
        .await;
    session.close().await;
    let results = match outcome {
        Ok(Some(results)) => results,
        Ok(None) => {
            warn!(worker, "Worker cancelled, session released");
            return Err(Error::Cancelled);
        }
        Err(panic) => std::panic::resume_unwind(panic),
    };

    let retrieved = results.iter().filter(|r| r.is_some()).count();
    let failed = results.len() - retrieved;
    info!(worker, retrieved, failed, "Worker finished shard");
    ctx.event_tx
        .send(Event::WorkerFinished {
            worker,
            retrieved,
            failed,
        })
        .ok();

    Ok(results)
}

/// `None` when cancelled before the shard was finished
async fn fetch_shard(
    ctx: &WorkerContext,
    session: &dyn Session,
    shard: &Shard,
) -> Option<ShardResults> {
    let mut results = Vec::with_capacity(shard.len());
    for entry in &shard.entries {
        tokio::select! {
            biased;
            _ = ctx.cancel_token.cancelled() => return None,
            record = fetch_post(ctx, session, shard.index, entry) => results.push(record),
        }
    }
    Some(results)
}

async fn fetch_post(
    ctx: &WorkerContext,
    session: &dyn Session,
    worker: usize,
    entry: &ListingEntry,
) -> Option<PostRecord> {
    let loaded = tokio::time::timeout(ctx.request_timeout, session.load_thread(&entry.id))
        .await
        .unwrap_or_else(|_| Err(FetchError::Timeout(ctx.request_timeout)));

    match loaded {
        Ok(thread) => {
            let record = extract_thread(&thread, ctx.limits);
            info!(
                worker,
                post_id = %entry.id,
                title = %truncate_chars(&entry.title, 60),
                comments = record.comments.len(),
                created = ?record.created_at(),
                "Fetched post"
            );
            ctx.event_tx
                .send(Event::PostFetched {
                    worker,
                    id: entry.id.clone(),
                    comments: record.comments.len(),
                })
                .ok();
            Some(record)
        }
        Err(e) => {
            warn!(
                worker,
                post_id = %entry.id,
                title = %truncate_chars(&entry.title, 40),
                error = %e,
                "Failed to fetch post"
            );
            ctx.event_tx
                .send(Event::PostFailed {
                    worker,
                    id: entry.id.clone(),
                    error: e.to_string(),
                })
                .ok();
            None
        }
    }
}
