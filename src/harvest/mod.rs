//! Concurrent batched retrieval.
//!
//! Split into focused submodules:
//! - [`partition`] - contiguous, near-equal shards of an identifier batch
//! - [`worker`] - one session per shard, sequential per-post fetching with failure isolation
//! - [`dispatch`] - one task per shard, join-all, fatal errors cancel the rest
//! - [`aggregate`] - shard-ordered flattening, failed posts dropped
//!
//! [`Harvester`] ties them together with the search call and event reporting.

pub mod aggregate;
mod dispatch;
pub mod partition;
pub(crate) mod worker;


use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::{RedditSessionFactory, SessionFactory};
use crate::config::Config;
use crate::error::Result;
use crate::types::{Event, Harvest, IdentifierBatch};

pub use aggregate::aggregate;
pub use partition::partition;
pub use worker::ShardResults;

use worker::WorkerContext;

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Searches a community and retrieves the matching threads with a pool of workers
///
/// # Example
///
/// ```no_run
/// use thread_harvest::{Config, Harvester};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::from_env("rent control")?;
///     let harvester = Harvester::new(config)?;
///
///     let harvest = harvester.harvest().await?;
///     let path = harvester.save(&harvest)?;
///     println!(
///         "Retrieved {}/{} posts into {}",
///         harvest.report.retrieved,
///         harvest.report.requested,
///         path.display()
///     );
///     Ok(())
/// }
/// ```
pub struct Harvester {
    config: Arc<Config>,
    sessions: Arc<dyn SessionFactory>,
    event_tx: broadcast::Sender<Event>,
}

impl Harvester {
    /// Create a harvester talking to the Reddit API.
    ///
    /// # Errors
    /// Returns [`Error::Config`](crate::Error::Config) if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        let sessions = Arc::new(RedditSessionFactory::new(&config));
        Self::with_session_factory(config, sessions)
    }

    /// Create a harvester over a custom session factory.
    ///
    /// # Errors
    /// Returns [`Error::Config`](crate::Error::Config) if the configuration is invalid.
    pub fn with_session_factory(config: Config, sessions: Arc<dyn SessionFactory>) -> Result<Self> {
        config.validate()?;
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            config: Arc::new(config),
            sessions,
            event_tx,
        })
    }

    /// The validated configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Subscribe to progress events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Search the configured community and return the identifier batch.
    ///
    /// Uses a dedicated session that is closed before returning.
    pub async fn search(&self) -> Result<IdentifierBatch> {
        let session = self.sessions.create().await?;
        let result = session.search(&self.config.search).await;
        session.close().await;
        let batch = result?;

        self.event_tx
            .send(Event::SearchCompleted {
                subreddit: self.config.search.subreddit.clone(),
                found: batch.len(),
            })
            .ok();
        Ok(batch)
    }

    /// Fetch every post in `batch` across the worker pool.
    ///
    /// # Errors
    /// Only fatal errors are returned (a worker could not create its session, or
    /// a worker task died). Individual post failures are left out of the output
    /// and counted in the report.
    pub async fn dispatch(&self, batch: &IdentifierBatch) -> Result<Harvest> {
        let started_at = Utc::now();
        let started = Instant::now();

        let shards = partition(batch, self.config.harvest.workers);
        let shard_count = shards.len();
        info!(
            posts = batch.len(),
            workers = shard_count,
            "Starting harvest"
        );

        let ctx = Arc::new(WorkerContext {
            sessions: Arc::clone(&self.sessions),
            limits: self.config.harvest.limits(),
            request_timeout: self.config.api.request_timeout,
            event_tx: self.event_tx.clone(),
            cancel_token: CancellationToken::new(),
        });
        let worker_results = dispatch::dispatch(ctx, shards).await?;

        let posts = aggregate(worker_results);
        let report = aggregate::build_report(batch.len(), shard_count, posts.len(), started_at, started);
        info!(
            requested = report.requested,
            retrieved = report.retrieved,
            failed = report.failed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Harvest complete"
        );
        self.event_tx
            .send(Event::HarvestCompleted {
                requested: report.requested,
                retrieved: report.retrieved,
            })
            .ok();

        Ok(Harvest { posts, report })
    }

    /// Search, then fetch every result.
    pub async fn harvest(&self) -> Result<Harvest> {
        let batch = self.search().await?;
        if batch.is_empty() {
            info!(
                subreddit = %self.config.search.subreddit,
                query = %self.config.search.query,
                "No results found"
            );
        }
        self.dispatch(&batch).await
    }

    /// Write the harvested posts to the configured output directory.
    ///
    /// Returns the path written.
    pub fn save(&self, harvest: &Harvest) -> Result<PathBuf> {
        crate::output::save(&self.config.output, &self.config.search.subreddit, &harvest.posts)
    }
}
