//! Wire model for the Reddit JSON API.
//!
//! Responses are decoded into [`RawThread`]s and [`RawComment`]s. Every comment
//! is classified when it is decoded: a reply, a "load more" continuation, or a
//! thing that could not be decoded. The extractor then only matches on
//! [`CommentShape`] and never inspects raw JSON.

use serde::Deserialize;
use serde_json::Value;

use crate::error::FetchError;
use crate::types::{ListingEntry, PostId};

/// Prefix for turning API permalinks into canonical URLs
pub const WEB_BASE_URL: &str = "https://reddit.com";

/// Author handle of the automated moderator bot (compared case-insensitively)
pub const AUTOMODERATOR: &str = "AutoModerator";

/// Canonical URL for an API permalink such as `/r/rust/comments/abc/title/`
pub fn permalink_url(permalink: &str) -> String {
    format!("{WEB_BASE_URL}{permalink}")
}

/// A post as returned by the thread endpoint
#[derive(Clone, Debug, PartialEq)]
pub struct RawPost {
    /// Post identifier
    pub id: PostId,
    /// Post title
    pub title: String,
    /// Self-text; `None` for link posts
    pub selftext: Option<String>,
    /// API permalink (path only)
    pub permalink: String,
    /// Post score
    pub score: i64,
    /// Comment count as reported by the API
    pub num_comments: u64,
    /// Creation time, Unix seconds
    pub created_utc: f64,
}

/// A post together with its fully loaded top-level comments
#[derive(Clone, Debug, PartialEq)]
pub struct RawThread {
    /// The post
    pub post: RawPost,
    /// Top-level comments in API order
    pub comments: Vec<RawComment>,
}

/// Fields shared by every real comment
#[derive(Clone, Debug, PartialEq)]
pub struct CommentFields {
    /// Author handle; `None` when the account was deleted
    pub author: Option<String>,
    /// Comment body
    pub body: String,
    /// API permalink (path only)
    pub permalink: String,
    /// Comment score
    pub score: i64,
}

impl CommentFields {
    /// Whether the automated moderator wrote this comment
    pub fn is_automoderator(&self) -> bool {
        self.author
            .as_deref()
            .is_some_and(|author| author.eq_ignore_ascii_case(AUTOMODERATOR))
    }
}

/// One entry of a comment listing
#[derive(Clone, Debug, PartialEq)]
pub enum RawComment {
    /// A real comment and its loaded replies
    Reply {
        /// Comment fields
        fields: CommentFields,
        /// Replies in API order
        replies: Vec<RawComment>,
    },
    /// Pagination continuation ("load more comments")
    More {
        /// Number of comments hidden behind the continuation
        count: u64,
    },
    /// An entry that could not be decoded
    Malformed {
        /// Decoding failure
        reason: String,
    },
}

/// How the extractor should treat a raw comment
#[derive(Debug, PartialEq)]
pub enum CommentShape<'a> {
    /// Continuation placeholder, never retained
    Placeholder,
    /// Written by the automated moderator, never retained
    AutoModerator,
    /// Undecodable entry, dropped with its subtree
    Malformed(&'a str),
    /// A comment without replies
    Leaf(&'a CommentFields),
    /// A comment with at least one reply entry
    Internal(&'a CommentFields, &'a [RawComment]),
}

impl RawComment {
    /// Classify this comment for tree extraction
    pub fn shape(&self) -> CommentShape<'_> {
        match self {
            RawComment::More { .. } => CommentShape::Placeholder,
            RawComment::Malformed { reason } => CommentShape::Malformed(reason),
            RawComment::Reply { fields, .. } if fields.is_automoderator() => {
                CommentShape::AutoModerator
            }
            RawComment::Reply { fields, replies } if replies.is_empty() => {
                CommentShape::Leaf(fields)
            }
            RawComment::Reply { fields, replies } => CommentShape::Internal(fields, replies),
        }
    }
}

#[derive(Deserialize)]
struct Thing {
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    after: Option<String>,
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Deserialize)]
struct PostData {
    id: String,
    title: String,
    #[serde(default)]
    selftext: Option<String>,
    permalink: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: u64,
    #[serde(default)]
    created_utc: f64,
}

#[derive(Deserialize)]
struct CommentData {
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    body: Option<String>,
    permalink: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    replies: Value,
}

#[derive(Deserialize)]
struct MoreData {
    #[serde(default)]
    count: u64,
}

fn listing(thing: Thing) -> Result<ListingData, String> {
    if thing.kind != "Listing" {
        return Err(format!("expected a Listing, found {:?}", thing.kind));
    }
    serde_json::from_value(thing.data).map_err(|e| e.to_string())
}

/// Decode one page of search results.
///
/// Returns the entries plus the `after` cursor for the next page. Children that
/// are not posts or fail to decode are skipped.
pub fn parse_search_page(body: &[u8]) -> Result<(Vec<ListingEntry>, Option<String>), serde_json::Error> {
    let thing: Thing = serde_json::from_slice(body)?;
    let data: ListingData = if thing.kind == "Listing" {
        serde_json::from_value(thing.data)?
    } else {
        ListingData {
            after: None,
            children: Vec::new(),
        }
    };

    let entries = data
        .children
        .into_iter()
        .filter(|child| child.kind == "t3")
        .filter_map(|child| match serde_json::from_value::<PostData>(child.data) {
            Ok(post) => Some(ListingEntry {
                id: PostId::new(post.id),
                url: permalink_url(&post.permalink),
                title: post.title,
                score: post.score,
                num_comments: post.num_comments,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping undecodable search result");
                None
            }
        })
        .collect();

    Ok((entries, data.after))
}

/// Decode a thread response: `[post listing, comment listing]`.
///
/// # Errors
/// Returns [`FetchError::Malformed`] when the post itself cannot be decoded.
/// Undecodable comments do not fail the thread; they become [`RawComment::Malformed`].
pub fn parse_thread(body: &[u8]) -> Result<RawThread, FetchError> {
    let mut parts: Vec<Thing> = serde_json::from_slice(body)?;
    if parts.len() != 2 {
        return Err(FetchError::Malformed(format!(
            "expected 2 listings, found {}",
            parts.len()
        )));
    }
    let comment_listing = parts.pop().map(listing).transpose().map_err(FetchError::Malformed)?;
    let post_listing = parts.pop().map(listing).transpose().map_err(FetchError::Malformed)?;

    let post_thing = post_listing
        .and_then(|l| l.children.into_iter().find(|c| c.kind == "t3"))
        .ok_or_else(|| FetchError::Malformed("post listing has no post".to_string()))?;
    let post: PostData = serde_json::from_value(post_thing.data)?;

    let comments = comment_listing
        .map(|l| l.children.into_iter().map(parse_comment).collect())
        .unwrap_or_default();

    Ok(RawThread {
        post: RawPost {
            id: PostId::new(post.id),
            title: post.title,
            selftext: post.selftext.filter(|s| !s.is_empty()),
            permalink: post.permalink,
            score: post.score,
            num_comments: post.num_comments,
            created_utc: post.created_utc,
        },
        comments,
    })
}

fn parse_comment(thing: Thing) -> RawComment {
    match thing.kind.as_str() {
        "t1" => match serde_json::from_value::<CommentData>(thing.data) {
            Ok(data) => RawComment::Reply {
                fields: CommentFields {
                    author: data.author,
                    body: data.body.unwrap_or_default(),
                    permalink: data.permalink,
                    score: data.score,
                },
                replies: parse_replies(data.replies),
            },
            Err(e) => RawComment::Malformed {
                reason: e.to_string(),
            },
        },
        "more" => RawComment::More {
            count: serde_json::from_value::<MoreData>(thing.data)
                .map(|m| m.count)
                .unwrap_or(0),
        },
        other => RawComment::Malformed {
            reason: format!("unexpected comment kind {other:?}"),
        },
    }
}

/// `replies` is an empty string when a comment has none, otherwise a Listing.
fn parse_replies(value: Value) -> Vec<RawComment> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) if s.is_empty() => Vec::new(),
        other => match serde_json::from_value::<Thing>(other).map_err(|e| e.to_string()).and_then(listing) {
            Ok(data) => data.children.into_iter().map(parse_comment).collect(),
            Err(reason) => vec![RawComment::Malformed { reason }],
        },
    }
}
