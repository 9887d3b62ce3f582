//! Core types for thread-harvest

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opaque identifier of a post on the content API (base-36 id without the `t3_` prefix)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub String);

impl PostId {
    /// Create a new PostId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PostId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lightweight metadata for one search hit, captured before any per-post fetch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListingEntry {
    /// Post identifier
    pub id: PostId,
    /// Post title
    pub title: String,
    /// Score at listing time
    pub score: i64,
    /// Comment count at listing time
    pub num_comments: u64,
    /// Canonical URL of the post
    pub url: String,
}

/// Ordered, immutable list of posts to fetch, produced by one search call
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentifierBatch {
    entries: Vec<ListingEntry>,
}

impl IdentifierBatch {
    /// Wrap search results in their listing order
    pub fn new(entries: Vec<ListingEntry>) -> Self {
        Self { entries }
    }

    /// Entries in listing order
    pub fn entries(&self) -> &[ListingEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the search returned nothing
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<ListingEntry>> for IdentifierBatch {
    fn from(entries: Vec<ListingEntry>) -> Self {
        Self::new(entries)
    }
}

/// Contiguous slice of an [`IdentifierBatch`] owned by exactly one worker
#[derive(Clone, Debug, PartialEq)]
pub struct Shard {
    /// Position of this shard; also the worker number
    pub index: usize,
    /// Entries in batch order
    pub entries: Vec<ListingEntry>,
}

impl Shard {
    /// Number of posts assigned to this shard
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the shard has no posts
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One retained reply in a discussion tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommentNode {
    /// Canonical URL of the comment
    pub url: String,
    /// Comment body
    pub content: String,
    /// Author handle ("[deleted]" when the account is gone)
    pub author: String,
    /// Comment score
    pub score: i64,
    /// Retained replies, each one level deeper
    pub replies: Vec<CommentNode>,
    /// Nesting level, 0 for top-level comments
    pub depth: usize,
}

impl CommentNode {
    /// Number of nodes in this subtree, including this one
    pub fn subtree_len(&self) -> usize {
        1 + self.replies.iter().map(CommentNode::subtree_len).sum::<usize>()
    }
}

/// Normalized output for one successfully fetched post
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Origin label, always "Reddit"
    pub source: String,
    /// Post title
    pub title: String,
    /// Short synthetic summary built from the title and comment count
    pub ai_summary: String,
    /// Self-text, or "[Link post]" for posts without a body
    pub contents: String,
    /// Canonical URL of the post
    pub url: String,
    /// Post score
    pub score: i64,
    /// Comment count reported by the API, regardless of how many were retained
    pub num_comments: u64,
    /// Creation time as a Unix timestamp in seconds
    pub created_utc: f64,
    /// Retained top-level comments
    pub comments: Vec<CommentNode>,
}

impl PostRecord {
    /// Creation time as a UTC datetime, if the timestamp is representable
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let secs = self.created_utc.trunc() as i64;
        let nanos = (self.created_utc.fract() * 1e9) as u32;
        DateTime::from_timestamp(secs, nanos)
    }

    /// Total number of retained comments at every depth
    pub fn retained_comments(&self) -> usize {
        self.comments.iter().map(CommentNode::subtree_len).sum()
    }
}

/// Progress notifications emitted during a harvest
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The search produced the identifier batch
    SearchCompleted {
        /// Searched community
        subreddit: String,
        /// Number of posts found
        found: usize,
    },
    /// A worker acquired its session and started its shard
    WorkerStarted {
        /// Worker (shard) number
        worker: usize,
        /// Posts assigned to it
        assigned: usize,
    },
    /// A post was fetched and normalized
    PostFetched {
        /// Worker (shard) number
        worker: usize,
        /// Post identifier
        id: PostId,
        /// Retained top-level comments
        comments: usize,
    },
    /// A post could not be fetched and will be missing from the output
    PostFailed {
        /// Worker (shard) number
        worker: usize,
        /// Post identifier
        id: PostId,
        /// Failure description
        error: String,
    },
    /// A worker finished its shard and released its session
    WorkerFinished {
        /// Worker (shard) number
        worker: usize,
        /// Posts fetched
        retrieved: usize,
        /// Posts that failed
        failed: usize,
    },
    /// All workers joined and results were aggregated
    HarvestCompleted {
        /// Posts in the identifier batch
        requested: usize,
        /// Posts in the output collection
        retrieved: usize,
    },
}

/// Outcome counts for one dispatch
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HarvestReport {
    /// Posts in the identifier batch
    pub requested: usize,
    /// Posts that made it into the output collection
    pub retrieved: usize,
    /// Posts recorded as absent
    pub failed: usize,
    /// Number of shards (and workers) used
    pub shards: usize,
    /// When the dispatch started
    pub started_at: DateTime<Utc>,
    /// Wall-clock time from dispatch to aggregation
    pub elapsed: Duration,
}

impl HarvestReport {
    /// Retrieval throughput; zero when no time elapsed
    pub fn posts_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.retrieved as f64 / secs
        } else {
            0.0
        }
    }
}

/// Output collection plus its report
#[derive(Clone, Debug)]
pub struct Harvest {
    /// Retrieved posts in batch order, failures omitted
    pub posts: Vec<PostRecord>,
    /// Retrieved vs requested counts
    pub report: HarvestReport,
}
