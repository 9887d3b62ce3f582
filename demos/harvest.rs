//! Harvest example
//!
//! This example demonstrates the core functionality of thread-harvest:
//! - Loading OAuth credentials from the environment (or a .env file)
//! - Creating a harvester
//! - Subscribing to events
//! - Searching a community and fetching every result with a worker pool
//! - Saving the records as JSON
//!
//! ```bash
//! cargo run --example harvest -- "rent control" PoliticalDebate
//! ```

use thread_harvest::{Config, Event, Harvester};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("thread_harvest=info".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let query = args.next().unwrap_or_else(|| "rent control".to_string());

    let mut config = Config::from_env(query)?;
    if let Some(subreddit) = args.next() {
        config.search.subreddit = subreddit;
    }
    config.search.limit = 20;

    let harvester = Harvester::new(config)?;

    // Subscribe to events
    let mut events = harvester.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::SearchCompleted { subreddit, found } => {
                    println!("🔎 Found {} posts in r/{}", found, subreddit);
                }
                Event::WorkerStarted { worker, assigned } => {
                    println!("▶ Worker {} started with {} posts", worker, assigned);
                }
                Event::PostFailed { worker, id, error } => {
                    println!("✗ Worker {} failed on {}: {}", worker, id, error);
                }
                Event::WorkerFinished {
                    worker,
                    retrieved,
                    failed,
                } => {
                    println!("■ Worker {} done: {} ok, {} failed", worker, retrieved, failed);
                }
                _ => {}
            }
        }
    });

    let harvest = harvester.harvest().await?;
    let path = harvester.save(&harvest)?;

    if let Some(newest) = harvest.posts.iter().filter_map(|p| p.created_at()).max() {
        println!("Newest post: {}", newest.to_rfc3339());
    }

    println!(
        "Retrieved {}/{} posts ({:.1} posts/s) into {}",
        harvest.report.retrieved,
        harvest.report.requested,
        harvest.report.posts_per_second(),
        path.display()
    );
    Ok(())
}
