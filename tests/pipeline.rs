//! End-to-end harvest against a mock Reddit API
//!
//! Drives the public [`Harvester`] through token exchange, search, the worker
//! pool and the output file, with one post failing server-side.

use serde_json::{Value, json};
use std::time::Duration;
use thread_harvest::{
    ApiConfig, Config, CredentialsConfig, Event, FileCollisionAction, HarvestConfig, Harvester,
    OutputConfig, PostRecord, SearchConfig,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SUBREDDIT: &str = "PoliticalDebate";
const FAILING_POST: &str = "p05";

fn post_ids(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("p{i:02}")).collect()
}

fn search_listing(ids: &[String]) -> Value {
    let children: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({ "kind": "t3", "data": {
                "id": id,
                "title": format!("Thread {id}"),
                "score": 7,
                "num_comments": 3,
                "permalink": format!("/r/{SUBREDDIT}/comments/{id}/thread/")
            }})
        })
        .collect();
    json!({ "kind": "Listing", "data": { "after": null, "children": children } })
}

fn thread(id: &str) -> Value {
    let comment = |name: &str, author: &str, replies: Value| {
        json!({ "kind": "t1", "data": {
            "author": author,
            "body": format!("comment {name}"),
            "permalink": format!("/r/{SUBREDDIT}/comments/{id}/thread/{name}/"),
            "score": 2,
            "replies": replies
        }})
    };
    let listing = |children: Vec<Value>| json!({ "kind": "Listing", "data": { "children": children } });

    json!([
        listing(vec![json!({ "kind": "t3", "data": {
            "id": id,
            "title": format!("Thread {id}"),
            "selftext": "",
            "permalink": format!("/r/{SUBREDDIT}/comments/{id}/thread/"),
            "score": 7,
            "num_comments": 3,
            "created_utc": 1_700_000_000.0
        }})]),
        listing(vec![
            comment("c1", "alice", listing(vec![comment("c1r1", "bob", json!(""))])),
            comment("c2", "AutoModerator", json!("")),
            json!({ "kind": "more", "data": { "count": 9 } }),
        ]),
    ])
}

async fn mock_reddit(ids: &[String]) -> MockServer {
    let server = MockServer::start().await;

    // One token per session: the search session plus one per worker
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "token_type": "bearer",
            "expires_in": 86400
        })))
        .expect(6)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/r/{SUBREDDIT}/search")))
        .and(query_param("q", "rent control"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_listing(ids)))
        .expect(1)
        .mount(&server)
        .await;

    for id in ids {
        let response = if id == FAILING_POST {
            ResponseTemplate::new(500)
        } else {
            ResponseTemplate::new(200).set_body_json(thread(id))
        };
        Mock::given(method("GET"))
            .and(path(format!("/comments/{id}")))
            .respond_with(response)
            .expect(1)
            .mount(&server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path("/api/v1/revoke_token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(6)
        .mount(&server)
        .await;

    server
}

fn config(server: &MockServer, output_dir: &std::path::Path) -> Config {
    Config {
        credentials: CredentialsConfig {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            user_agent: None,
        },
        api: ApiConfig {
            auth_base_url: server.uri(),
            api_base_url: server.uri(),
            request_timeout: Duration::from_secs(10),
        },
        search: SearchConfig {
            limit: 12,
            ..SearchConfig::new("rent control")
        },
        harvest: HarvestConfig {
            workers: 5,
            ..HarvestConfig::default()
        },
        output: OutputConfig {
            directory: output_dir.to_path_buf(),
            file_collision: FileCollisionAction::Rename,
        },
    }
}

#[tokio::test]
async fn harvest_twelve_posts_over_five_workers() {
    let ids = post_ids(12);
    let server = mock_reddit(&ids).await;
    let output_dir = tempfile::tempdir().unwrap();
    let harvester = Harvester::new(config(&server, output_dir.path())).unwrap();
    let mut events = harvester.subscribe();

    let harvest = harvester.harvest().await.unwrap();

    // Output follows search order with the failed post left out
    let expected: Vec<String> = ids
        .iter()
        .filter(|id| id.as_str() != FAILING_POST)
        .map(|id| format!("Thread {id}"))
        .collect();
    let titles: Vec<&str> = harvest.posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, expected);
    assert_eq!(harvest.report.requested, 12);
    assert_eq!(harvest.report.retrieved, 11);
    assert_eq!(harvest.report.failed, 1);
    assert_eq!(harvest.report.shards, 5);

    let post = &harvest.posts[0];
    assert_eq!(post.source, "Reddit");
    assert_eq!(post.contents, "[Link post]");
    assert_eq!(post.url, format!("https://reddit.com/r/{SUBREDDIT}/comments/p00/thread/"));
    assert_eq!(post.comments.len(), 1, "AutoModerator and placeholders are dropped");
    assert_eq!(post.comments[0].author, "alice");
    assert_eq!(post.comments[0].depth, 0);
    assert_eq!(post.comments[0].replies[0].author, "bob");
    assert_eq!(post.comments[0].replies[0].depth, 1);

    let mut assigned = Vec::new();
    let mut failed = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            Event::WorkerStarted { worker, assigned: n } => assigned.push((worker, n)),
            Event::PostFailed { id, .. } => failed.push(id.to_string()),
            _ => {}
        }
    }
    assigned.sort();
    assert_eq!(assigned, [(0, 3), (1, 3), (2, 2), (3, 2), (4, 2)]);
    assert_eq!(failed, [FAILING_POST]);

    let saved = harvester.save(&harvest).unwrap();
    assert_eq!(
        saved,
        output_dir
            .path()
            .join(format!("selected_posts_{SUBREDDIT}_11.json"))
    );
    let reread: Vec<PostRecord> =
        serde_json::from_str(&std::fs::read_to_string(&saved).unwrap()).unwrap();
    assert_eq!(reread, harvest.posts);
}

#[tokio::test]
async fn rejected_credentials_abort_the_harvest() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let output_dir = tempfile::tempdir().unwrap();
    let harvester = Harvester::new(config(&server, output_dir.path())).unwrap();

    let err = harvester.harvest().await.unwrap_err();

    assert!(err.is_fatal());
    assert!(matches!(err, thread_harvest::Error::Config { .. }));
}
