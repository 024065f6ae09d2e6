use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use ytnet_core::ApiCredential;

use super::*;

fn test_config(base_url: &str, keys: &[&str]) -> AppConfig {
    AppConfig {
        api_keys: keys
            .iter()
            .map(|k| ApiCredential {
                label: Some((*k).to_owned()),
                secret: format!("secret-{k}"),
            })
            .collect(),
        api_base_url: base_url.to_owned(),
        region_code: None,
        relevance_language: None,
        log_level: "info".to_string(),
        request_timeout_secs: 5,
        user_agent: "ytnet/0.1 (test)".to_string(),
        max_retries: 0,
        retry_backoff_base_ms: 1,
        inter_request_delay_ms: 0,
    }
}

fn test_args(outdir: &std::path::Path) -> CollectArgs {
    CollectArgs {
        query: "cats".to_owned(),
        outdir: outdir.to_path_buf(),
        max_seeds: 10,
        collect_comments: true,
        comments_per_video: 50,
        build_similarity: true,
        similarity: SimilarityOpts {
            top_k: 1,
            min_sim: 0.1,
        },
        api_keys: Vec::new(),
        region_code: None,
        relevance_language: None,
        resume: false,
    }
}

fn thread(comment_id: &str, author: Option<&str>, video_id: &str) -> Value {
    let mut snippet = json!({
        "videoId": video_id,
        "authorDisplayName": author.map(|a| format!("name {a}")),
        "textDisplay": format!("text of {comment_id}"),
        "likeCount": 1,
        "publishedAt": "2024-01-02T03:04:05Z"
    });
    if let Some(a) = author {
        snippet["authorChannelId"] = json!({ "value": a });
    }
    json!({
        "id": comment_id,
        "snippet": {
            "videoId": video_id,
            "topLevelComment": { "id": comment_id, "snippet": snippet }
        }
    })
}

fn video_item(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "snippet": {
            "title": title,
            "description": "",
            "channelId": "UCx",
            "channelTitle": "Channel",
            "publishedAt": "2024-01-01T00:00:00Z"
        },
        "statistics": { "viewCount": "100", "likeCount": "5", "commentCount": "4" },
        "contentDetails": { "duration": "PT1M" }
    })
}

async fn mount_search_and_videos(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": { "kind": "youtube#video", "videoId": "V1" } },
                { "id": { "kind": "youtube#video", "videoId": "V2" } },
                { "id": { "kind": "youtube#video", "videoId": "V1" } },
                { "id": { "kind": "youtube#channel", "channelId": "UCz" } }
            ]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("id", "V1,V2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                video_item("V1", "cats and dogs"),
                video_item("V2", "dogs and cats are great")
            ]
        })))
        .mount(server)
        .await;
}

async fn mount_comments(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/commentThreads"))
        .and(query_param("videoId", "V1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                thread("c1", Some("U1"), "V1"),
                thread("c2", Some("U1"), "V1"),
                thread("c3", Some("U1"), "V1"),
                thread("c4", Some("U2"), "V1"),
                thread("c5", None, "V1")
            ]
        })))
        .mount(server)
        .await;
}

async fn mount_comments_disabled(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/commentThreads"))
        .and(query_param("videoId", "V2"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": 403,
                "message": "disabled",
                "errors": [{ "reason": "commentsDisabled" }]
            }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn full_run_writes_graphs_and_summary() {
    let server = MockServer::start().await;
    mount_search_and_videos(&server).await;
    mount_comments(&server).await;
    mount_comments_disabled(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let args = test_args(dir.path());
    let summary = run_collect(&args, test_config(&server.uri(), &["A"]))
        .await
        .expect("run should succeed");

    assert_eq!(summary.seeds, 2);
    assert_eq!(summary.videos, 2);
    assert_eq!(summary.users, 2);
    assert_eq!(summary.comments, 4);
    assert_eq!(summary.comment_edges, 2);
    assert_eq!(summary.similarity_edges, Some(1));
    // channel result in search + comment without author
    assert_eq!(summary.skipped_items, 2);
    assert_eq!(summary.skipped_pages.len(), 1);
    assert_eq!(summary.skipped_pages[0].endpoint, "comments_V2");

    let edges =
        std::fs::read_to_string(dir.path().join("edges_comments_user_video.csv")).unwrap();
    assert_eq!(
        edges,
        "user_id,video_id,weight,comment_ids\nU1,V1,3,c1;c2;c3\nU2,V1,1,c4\n"
    );
    let videos = std::fs::read_to_string(dir.path().join("nodes_videos.csv")).unwrap();
    assert_eq!(videos.lines().filter(|l| l.starts_with("V1,")).count(), 1);

    for name in [
        "nodes_users.csv",
        "comments.csv",
        "edges_similarity_video_video.csv",
        "graph_comment_bipartite.graphml",
        "graph_similarity.graphml",
        "run_summary.json",
        "raw/search_cats_page0000.json",
        "raw/videos_batch000_page0000.json",
        "raw/comments_V1_page0000.json",
    ] {
        assert!(dir.path().join(name).exists(), "{name} missing");
    }

    let summary_json: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("run_summary.json")).unwrap())
            .unwrap();
    assert_eq!(summary_json["comments"], 4);
    let raw = std::fs::read_to_string(dir.path().join("raw/search_cats_page0000.json")).unwrap();
    assert!(!raw.contains("secret-A"));
}

#[tokio::test]
async fn resumed_run_replays_archive_and_reproduces_outputs() {
    let first_server = MockServer::start().await;
    mount_search_and_videos(&first_server).await;
    mount_comments(&first_server).await;
    mount_comments_disabled(&first_server).await;

    let dir = tempfile::tempdir().unwrap();
    let args = test_args(dir.path());
    run_collect(&args, test_config(&first_server.uri(), &["A"]))
        .await
        .unwrap();
    let before = std::fs::read(dir.path().join("graph_comment_bipartite.graphml")).unwrap();

    // Only the page that was never archived is served the second time.
    let second_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/commentThreads"))
        .and(query_param("videoId", "V2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&second_server)
        .await;

    let resumed = CollectArgs {
        resume: true,
        ..test_args(dir.path())
    };
    let summary = run_collect(&resumed, test_config(&second_server.uri(), &["A"]))
        .await
        .unwrap();

    assert_eq!(summary.pages_resumed, 3);
    assert_eq!(summary.pages_fetched, 1);
    assert!(summary.skipped_pages.is_empty());
    let after = std::fs::read(dir.path().join("graph_comment_bipartite.graphml")).unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn missing_credentials_abort_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let err = run_collect(&test_args(dir.path()), test_config(&server.uri(), &[]))
        .await
        .unwrap_err();
    assert!(format!("{err}").contains("no API credentials"));
}

#[tokio::test]
async fn cli_keys_replace_environment_keys() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(header("x-goog-api-key", "from-cli"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let args = CollectArgs {
        api_keys: vec!["from-cli".to_owned()],
        collect_comments: false,
        build_similarity: false,
        ..test_args(dir.path())
    };
    let summary = run_collect(&args, test_config(&server.uri(), &["env"]))
        .await
        .unwrap();
    assert_eq!(summary.seeds, 0);
    assert!(dir.path().join("nodes_videos.csv").exists());
    assert!(!dir.path().join("nodes_users.csv").exists());
}

#[tokio::test]
async fn exhausting_all_keys_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": 403,
                "message": "quota",
                "errors": [{ "reason": "quotaExceeded" }]
            }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let err = run_collect(&test_args(dir.path()), test_config(&server.uri(), &["A", "B"]))
        .await
        .unwrap_err();
    assert!(format!("{err}").contains("exhausted"));
}

#[tokio::test]
async fn unreachable_seed_search_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let err = run_collect(&test_args(dir.path()), test_config(&server.uri(), &["A"]))
        .await
        .unwrap_err();
    assert!(format!("{err}").contains("seed search returned no page"));
}
