//! Flattening worker results into the output collection.

use chrono::{DateTime, Utc};
use std::time::Instant;

use super::worker::ShardResults;
use crate::types::{HarvestReport, PostRecord};

/// Concatenate worker results in shard order and drop failed posts.
///
/// Survivors keep their relative order; nothing is deduplicated.
pub fn aggregate(worker_results: Vec<ShardResults>) -> Vec<PostRecord> {
    worker_results.into_iter().flatten().flatten().collect()
}

/// Counts for one dispatch
pub(crate) fn build_report(
    requested: usize,
    shards: usize,
    retrieved: usize,
    started_at: DateTime<Utc>,
    started: Instant,
) -> HarvestReport {
    HarvestReport {
        requested,
        retrieved,
        failed: requested.saturating_sub(retrieved),
        shards,
        started_at,
        elapsed: started.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str) -> PostRecord {
        PostRecord {
            source: "Reddit".into(),
            title: title.into(),
            ai_summary: String::new(),
            contents: "[Link post]".into(),
            url: format!("https://reddit.com/{title}"),
            score: 0,
            num_comments: 0,
            created_utc: 0.0,
            comments: vec![],
        }
    }

    fn titles(posts: &[PostRecord]) -> Vec<&str> {
        posts.iter().map(|p| p.title.as_str()).collect()
    }

    #[test]
    fn failures_are_dropped_and_order_kept() {
        let results = vec![
            vec![Some(record("A")), None],
            vec![Some(record("C")), Some(record("D"))],
        ];

        assert_eq!(titles(&aggregate(results)), ["A", "C", "D"]);
    }

    #[test]
    fn duplicates_are_kept() {
        let results = vec![vec![Some(record("A"))], vec![Some(record("A"))]];

        assert_eq!(aggregate(results).len(), 2);
    }

    #[test]
    fn all_failed_or_empty_gives_empty_collection() {
        assert!(aggregate(vec![vec![None, None], vec![]]).is_empty());
        assert!(aggregate(vec![]).is_empty());
    }

    #[test]
    fn report_counts_failures() {
        let report = build_report(12, 5, 9, Utc::now(), Instant::now());

        assert_eq!(report.requested, 12);
        assert_eq!(report.retrieved, 9);
        assert_eq!(report.failed, 3);
        assert_eq!(report.shards, 5);
    }
}
