//! Tree extraction: turn a loaded post and its comment listing into a [`PostRecord`].
//!
//! Pure and deterministic. No I/O happens here, and the same input always
//! yields the same record.

use crate::client::raw::{CommentFields, CommentShape, RawComment, RawPost, RawThread, permalink_url};
use crate::types::{CommentNode, PostRecord};
use crate::utils::truncate_chars;

/// Origin label written into every record
pub const SOURCE_LABEL: &str = "Reddit";

/// Body placeholder for posts without self-text
pub const LINK_POST_MARKER: &str = "[Link post]";

/// Author placeholder for deleted accounts
pub const DELETED_AUTHOR: &str = "[deleted]";

/// Characters of the title quoted in the synthetic summary
const SUMMARY_TITLE_CHARS: usize = 50;

/// Depth and breadth caps for comment trees
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtractLimits {
    /// Deepest level retained; top-level comments are depth 0
    pub depth_limit: usize,
    /// Replies retained under any one comment
    pub replies_per_comment: usize,
    /// Top-level comments retained per post
    pub top_level_comments: usize,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            depth_limit: 2,
            replies_per_comment: 3,
            top_level_comments: 10,
        }
    }
}

/// Build the record for a loaded thread.
pub fn extract_thread(thread: &RawThread, limits: ExtractLimits) -> PostRecord {
    extract(&thread.post, &thread.comments, limits)
}

/// Build the record for `post` with at most `limits.top_level_comments` comments,
/// each carrying a reply tree bounded by the depth and per-comment caps.
pub fn extract(post: &RawPost, comments: &[RawComment], limits: ExtractLimits) -> PostRecord {
    let comments = retained(comments, limits.top_level_comments)
        .map(|(fields, replies)| build_node(fields, replies, 0, limits))
        .collect();

    PostRecord {
        source: SOURCE_LABEL.to_string(),
        title: post.title.clone(),
        ai_summary: format!(
            "Post about {}... with {} comments",
            truncate_chars(&post.title, SUMMARY_TITLE_CHARS),
            post.num_comments
        ),
        contents: post
            .selftext
            .clone()
            .unwrap_or_else(|| LINK_POST_MARKER.to_string()),
        url: permalink_url(&post.permalink),
        score: post.score,
        num_comments: post.num_comments,
        created_utc: post.created_utc,
        comments,
    }
}

/// Real comments in listing order, filtered first and then capped.
///
/// Placeholders, automated-moderator comments and undecodable entries are
/// skipped and do not count toward `cap`.
fn retained(
    comments: &[RawComment],
    cap: usize,
) -> impl Iterator<Item = (&CommentFields, &[RawComment])> {
    comments
        .iter()
        .filter_map(|comment| match comment.shape() {
            CommentShape::Leaf(fields) => Some((fields, &[][..])),
            CommentShape::Internal(fields, replies) => Some((fields, replies)),
            CommentShape::Malformed(reason) => {
                tracing::debug!(reason, "Dropping undecodable comment");
                None
            }
            CommentShape::Placeholder | CommentShape::AutoModerator => None,
        })
        .take(cap)
}

fn build_node(
    fields: &CommentFields,
    replies: &[RawComment],
    depth: usize,
    limits: ExtractLimits,
) -> CommentNode {
    let replies = if depth < limits.depth_limit {
        retained(replies, limits.replies_per_comment)
            .map(|(child, grandchildren)| build_node(child, grandchildren, depth + 1, limits))
            .collect()
    } else {
        Vec::new()
    };

    CommentNode {
        url: permalink_url(&fields.permalink),
        content: fields.body.clone(),
        author: fields
            .author
            .clone()
            .unwrap_or_else(|| DELETED_AUTHOR.to_string()),
        score: fields.score,
        replies,
        depth,
    }
}
