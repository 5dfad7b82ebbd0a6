//! The JSON API end to end, over a real socket.

use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::common::{TestServer, three_commit_repo};

async fn get_json(client: &reqwest::Client, url: &str) -> (StatusCode, Value) {
    let response = client.get(url).send().await.unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

async fn post_json(client: &reqwest::Client, url: &str, body: &Value) -> (StatusCode, Value) {
    let response = client.post(url).json(body).send().await.unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn read_endpoints_report_repository_state() {
    let history = three_commit_repo();
    history.fixture.write("notes.txt", "one\ntwo\nthree\nfour\nfive\n");
    let server = TestServer::start(history.fixture.service().await).await;
    let client = reqwest::Client::new();

    let (status, info) = get_json(&client, &server.url("/api/repo-info")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        info["path"],
        history.fixture.canonical_path().display().to_string()
    );

    let (status, diffs) = get_json(&client, &server.url("/api/diffs")).await;
    assert_eq!(status, StatusCode::OK);
    let diffs = diffs.as_array().unwrap();
    assert_eq!(diffs.len(), 4);
    assert_eq!(diffs[0]["id"], "working");
    assert_eq!(diffs[0]["filesCount"], 1);
    assert_eq!(diffs[1]["id"], history.c3.as_str());
    assert!(
        diffs[1]["timestamp"]
            .as_str()
            .unwrap()
            .starts_with("2023-11-14T")
    );

    let (status, files) =
        get_json(&client, &server.url("/api/diffs/working/files")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        files,
        json!([{"path": "notes.txt", "status": "modified", "additions": 1, "deletions": 0}])
    );

    let url = server.url(&format!("/api/diffs/{}/commits", history.c2));
    let (status, commits) = get_json(&client, &url).await;
    assert_eq!(status, StatusCode::OK);
    let commits = commits.as_array().unwrap();
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0]["isHead"], true);
    assert_eq!(commits[1]["isHead"], false);

    let (status, pair) =
        get_json(&client, &server.url("/api/file-diff/working/notes.txt")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pair["path"], "notes.txt");
    assert_eq!(pair["oldContent"], "one\ntwo\nthree\nfour\n");
    assert_eq!(pair["newContent"], "one\ntwo\nthree\nfour\nfive\n");

    let (status, pair) =
        get_json(&client, &server.url("/api/file-diff/working/src/lib.rs")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pair["path"], "src/lib.rs");
}

#[tokio::test]
async fn errors_are_json_with_mapped_status() {
    let history = three_commit_repo();
    history.fixture.write("untracked.txt", "x\n");
    let server = TestServer::start(history.fixture.service().await).await;
    let client = reqwest::Client::new();

    let (status, body) =
        get_json(&client, &server.url("/api/diffs/not-an-id/files")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("invalid diff id"));

    let (status, _) =
        get_json(&client, &server.url("/api/diffs/deadbeefdeadbeef/files")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) =
        get_json(&client, &server.url("/api/file-diff/working/untracked.txt")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    let (status, body) = get_json(
        &client,
        &server.url("/api/file-diff/working/..%2F..%2Fetc%2Fpasswd"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("escapes"));

    let (status, body) = get_json(&client, &server.url("/api/no-such-route")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not found");
}

#[tokio::test]
async fn save_endpoint_writes_tracked_files_only() {
    let history = three_commit_repo();
    history.fixture.write("untracked.txt", "original\n");
    let server = TestServer::start(history.fixture.service().await).await;
    let client = reqwest::Client::new();

    let (status, body) = post_json(
        &client,
        &server.url("/api/file-save/working/notes.txt"),
        &json!({"content": "from http\n"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "File saved successfully");
    assert_eq!(body["path"], "notes.txt");
    assert_eq!(history.fixture.read("notes.txt"), "from http\n");

    let (status, _) = post_json(
        &client,
        &server.url("/api/file-save/working/untracked.txt"),
        &json!({"content": "overwritten"}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(history.fixture.read("untracked.txt"), "original\n");

    let (status, body) = post_json(
        &client,
        &server.url("/api/file-save/working/notes.txt"),
        &json!({"content": "x", "extra": true}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid request body");
    assert_eq!(history.fixture.read("notes.txt"), "from http\n");

    let (status, _) = post_json(
        &client,
        &server.url("/api/file-save/working/notes.txt"),
        &json!({"contents": "typo"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn amend_endpoint_enforces_head_only() {
    let history = three_commit_repo();
    let server = TestServer::start(history.fixture.service().await).await;
    let client = reqwest::Client::new();

    let url = server.url(&format!("/api/commit/{}/amend-message", history.c2));
    let (status, _) = post_json(&client, &url, &json!({"message": "nope"})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(history.fixture.head(), history.c3);

    let url = server.url(&format!("/api/commit/{}/amend-message", history.c3));
    let (status, _) = post_json(&client, &url, &json!({"message": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) =
        post_json(&client, &url, &json!({"message": "Amended over HTTP"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Commit message amended successfully");
    let new_commit = body["newCommit"].as_str().unwrap();
    assert_ne!(new_commit, history.c3);
    assert_eq!(history.fixture.head(), new_commit);
    assert!(body.get("warning").is_none());
    assert_eq!(
        history.fixture.git(&["log", "-1", "--format=%s"]),
        "Amended over HTTP"
    );
}
