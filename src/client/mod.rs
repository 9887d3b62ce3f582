//! Sessions against the remote content API.
//!
//! - [`SessionFactory`] - hands out independent, closable sessions
//! - [`Session`] - search and thread loading over one connection and token
//! - [`reddit`] - production implementation over the Reddit OAuth API
//! - [`raw`] - wire model decoded from API responses
//!
//! A session is owned by exactly one worker for its whole lifetime. Nothing is
//! shared between two sessions, so one worker's connection problems or rate
//! limiting never spill over into another worker.

use async_trait::async_trait;

use crate::config::SearchConfig;
use crate::error::{FetchError, Result};
use crate::types::{IdentifierBatch, PostId};

pub mod raw;
pub mod reddit;


pub use raw::{CommentFields, CommentShape, RawComment, RawPost, RawThread};
pub use reddit::{RedditSession, RedditSessionFactory};

/// One authenticated connection to the content API.
#[async_trait]
pub trait Session: Send + Sync {
    /// Run a search and collect up to `search.limit` listing entries in result order.
    async fn search(&self, search: &SearchConfig) -> Result<IdentifierBatch>;

    /// Load a post with its full top-level comment listing.
    async fn load_thread(&self, id: &PostId) -> std::result::Result<RawThread, FetchError>;

    /// Release the session. Never fails; problems are only logged.
    async fn close(&self);
}

/// Produces fresh, unshared sessions. Safe to call concurrently.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Establish a new session.
    ///
    /// # Errors
    /// [`Error::Config`](crate::Error::Config) when the credentials are rejected,
    /// [`Error::Session`](crate::Error::Session) for any other failure. Both are fatal.
    async fn create(&self) -> Result<Box<dyn Session>>;
}
