//! Utility functions for log-friendly text and output paths

use crate::config::FileCollisionAction;
use std::path::{Path, PathBuf};

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Return at most `max_chars` characters of `text`, cut on a character boundary.
///
/// # Examples
///
/// ```
/// use thread_harvest::utils::truncate_chars;
///
/// assert_eq!(truncate_chars("héllo world", 5), "héllo");
/// assert_eq!(truncate_chars("short", 60), "short");
/// ```
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Where to write `path` under the given collision policy.
///
/// A free path is always returned as-is. When `path` exists, `Overwrite` keeps it,
/// `Rename` picks the first free `name (n).ext`, and `Skip` yields `None`.
///
/// # Examples
///
/// ```
/// use thread_harvest::utils::unique_path;
/// use thread_harvest::config::FileCollisionAction;
/// use std::path::Path;
///
/// let path = Path::new("/tmp/selected_posts_rust_10.json");
/// assert_eq!(unique_path(path, FileCollisionAction::Overwrite).as_deref(), Some(path));
/// ```
pub fn unique_path(path: &Path, action: FileCollisionAction) -> Option<PathBuf> {
    if !path.exists() {
        return Some(path.to_path_buf());
    }
    match action {
        FileCollisionAction::Overwrite => Some(path.to_path_buf()),
        FileCollisionAction::Skip => None,
        FileCollisionAction::Rename => (1..=MAX_RENAME_ATTEMPTS)
            .map(|n| numbered(path, n))
            .find(|candidate| !candidate.exists()),
    }
}

/// `dir/name.ext` -> `dir/name (n).ext`
fn numbered(path: &Path, n: u32) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let name = match path.extension() {
        Some(ext) => format!("{stem} ({n}).{}", ext.to_string_lossy()),
        None => format!("{stem} ({n})"),
    };
    path.with_file_name(name)
}
