//! Splitting an identifier batch into contiguous per-worker shards.

use crate::types::{IdentifierBatch, Shard};

/// Split `batch` into at most `workers` contiguous shards of near-equal size.
///
/// The shard count is `min(workers, batch.len())`. Sizes differ by at most one,
/// with the larger shards first. Concatenating the shards in index order gives
/// back the batch exactly. An empty batch yields no shards.
pub fn partition(batch: &IdentifierBatch, workers: usize) -> Vec<Shard> {
    let entries = batch.entries();
    if entries.is_empty() {
        return Vec::new();
    }

    let shard_count = workers.clamp(1, entries.len());
    let base = entries.len() / shard_count;
    let remainder = entries.len() % shard_count;

    let mut shards = Vec::with_capacity(shard_count);
    let mut start = 0;
    for index in 0..shard_count {
        let len = base + usize::from(index < remainder);
        shards.push(Shard {
            index,
            entries: entries[start..start + len].to_vec(),
        });
        start += len;
    }
    shards
}
