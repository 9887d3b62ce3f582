//! # thread-harvest
//!
//! Concurrent, batched retrieval of Reddit discussion threads into normalized,
//! bounded comment-tree records.
//!
//! ## Design Philosophy
//!
//! thread-harvest is designed to be:
//! - **Isolated** - Every worker owns its own session; nothing is shared
//! - **Failure tolerant** - A post that cannot be fetched is dropped, the batch goes on
//! - **Order preserving** - Output follows search order, minus the failures
//! - **Event-driven** - Consumers subscribe to progress events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use thread_harvest::{Config, Harvester};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::from_env("zoning reform")?;
//!     config.search.subreddit = "urbanplanning".to_string();
//!     config.harvest.workers = 8;
//!
//!     let harvester = Harvester::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = harvester.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let harvest = harvester.harvest().await?;
//!     harvester.save(&harvest)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Sessions against the Reddit API
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Comment-tree extraction and record building
pub mod extract;
/// Partitioning, worker pool and aggregation
pub mod harvest;
/// Writing the output collection
pub mod output;
/// Core types and events
pub mod types;
/// Helper functions
pub mod utils;

// Re-export commonly used types
pub use client::{RedditSessionFactory, Session, SessionFactory};
pub use config::{
    ApiConfig, Config, CredentialsConfig, FileCollisionAction, HarvestConfig, OutputConfig,
    SearchConfig, SearchSort,
};
pub use error::{Error, FetchError, Result};
pub use extract::{ExtractLimits, extract, extract_thread};
pub use harvest::{Harvester, aggregate, partition};
pub use types::{
    CommentNode, Event, Harvest, HarvestReport, IdentifierBatch, ListingEntry, PostId, PostRecord,
    Shard,
};
