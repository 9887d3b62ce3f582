//! Persisting the output collection as a single JSON document.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::OutputConfig;
use crate::error::Result;
use crate::types::PostRecord;
use crate::utils::unique_path;

/// File name used for a harvest of `count` posts from `subreddit`
pub fn default_file_name(subreddit: &str, count: usize) -> String {
    format!("selected_posts_{subreddit}_{count}.json")
}

/// Write `posts` to `path` as one pretty-printed JSON array.
pub fn write_posts(path: &Path, posts: &[PostRecord]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, posts)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Write `posts` under `output.directory`, applying the collision policy.
///
/// Returns the path actually written.
///
/// # Errors
/// [`Error::Io`](crate::Error::Io) with `AlreadyExists` when the file exists and
/// the policy is `Skip`.
pub fn save(output: &OutputConfig, subreddit: &str, posts: &[PostRecord]) -> Result<PathBuf> {
    std::fs::create_dir_all(&output.directory)?;
    let target = output
        .directory
        .join(default_file_name(subreddit, posts.len()));
    let path = unique_path(&target, output.file_collision).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", target.display()),
        )
    })?;

    write_posts(&path, posts)?;
    info!(path = %path.display(), posts = posts.len(), "Saved harvested posts");
    Ok(path)
}
