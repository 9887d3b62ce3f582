//! Launching one worker per shard and joining them all.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error};

use super::worker::{ShardResults, WorkerContext, run_worker};
use crate::error::{Error, Result};
use crate::types::Shard;

/// Run every shard on its own task and return the results in shard order.
///
/// Waits for all workers; a slow worker is never cut short because another one
/// finished. The one exception is a worker that fails fatally (no session, or a
/// panic): the remaining workers are cancelled, each closes its own session on
/// the way out, and the first fatal error is returned once all have joined.
pub(crate) async fn dispatch(ctx: Arc<WorkerContext>, shards: Vec<Shard>) -> Result<Vec<ShardResults>> {
    let shard_count = shards.len();
    let mut workers = JoinSet::new();

    for (slot, shard) in shards.into_iter().enumerate() {
        let ctx = Arc::clone(&ctx);
        workers.spawn(async move { (slot, run_worker(&ctx, shard).await) });
    }
    debug!(workers = shard_count, "Spawned workers");

    let mut slots: Vec<Option<ShardResults>> = vec![None; shard_count];
    let mut fatal: Option<Error> = None;
    while let Some(joined) = workers.join_next().await {
        let outcome = match joined {
            Ok((slot, Ok(results))) => {
                slots[slot] = Some(results);
                continue;
            }
            Ok((slot, Err(e))) => {
                if fatal.is_none() {
                    error!(worker = slot, error = %e, "Cancelling dispatch after fatal worker error");
                }
                e
            }
            Err(e) => {
                error!(error = %e, "Worker task did not complete");
                Error::Worker(e.to_string())
            }
        };

        ctx.cancel_token.cancel();
        if fatal.is_none() {
            fatal = Some(outcome);
        }
    }

    if let Some(e) = fatal {
        return Err(e);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(slot, results)| {
            results.ok_or_else(|| Error::Worker(format!("worker {slot} returned no results")))
        })
        .collect()
}
