//! Integration tests for file listing and management.

mod helpers;

use axum::http::StatusCode;
use filedock_core::types::UserId;
use serde_json::json;

use helpers::{Caller, TestApp};

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let response = app
        .request("GET", "/api/health", None, Caller::anonymous())
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_list_requires_capability() {
    let app = TestApp::new();

    let response = app
        .request("GET", "/api/files", None, Caller::anonymous())
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "FORBIDDEN");
}

#[tokio::test]
async fn test_list_sorted() {
    let app = TestApp::new();
    let caller = Caller::with("list");
    app.upload_whole("zebra.txt", b"z", caller).await;
    app.upload_whole("apple.txt", b"apple apple", caller).await;
    app.upload_whole("mango.txt", b"mango", caller).await;

    let response = app.request("GET", "/api/files", None, caller).await;
    assert_eq!(response.status, StatusCode::OK);
    let names: Vec<&str> = response.body["data"]
        .as_array()
        .expect("file list")
        .iter()
        .filter_map(|f| f["display_name"].as_str())
        .collect();
    assert_eq!(names, ["apple.txt", "mango.txt", "zebra.txt"]);

    let response = app
        .request("GET", "/api/files?sort=size_bytes", None, caller)
        .await;
    let sizes: Vec<i64> = response.body["data"]
        .as_array()
        .expect("file list")
        .iter()
        .filter_map(|f| f["size_bytes"].as_i64())
        .collect();
    assert_eq!(sizes, [1, 5, 11]);

    let response = app
        .request("GET", "/api/files?sort=owner", None, caller)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_file_not_found() {
    let app = TestApp::new();

    let response = app
        .request(
            "GET",
            "/api/files/00000000-0000-0000-0000-999999999999",
            None,
            Caller::anonymous(),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "RECORD_NOT_FOUND");

    let response = app
        .request("GET", "/api/files/not-an-id", None, Caller::anonymous())
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rename_requires_manage() {
    let app = TestApp::new();
    let id = app
        .upload_whole("draft.txt", b"draft", Caller::anonymous())
        .await;
    let path = format!("/api/files/{id}");

    let response = app
        .request(
            "PUT",
            &path,
            Some(json!({ "display_name": "final.txt" })),
            Caller::with("list"),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request(
            "PUT",
            &path,
            Some(json!({ "display_name": "" })),
            Caller::with("manage"),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "PUT",
            &path,
            Some(json!({ "display_name": "final.txt" })),
            Caller::with("manage"),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["display_name"], "final.txt");
    assert_eq!(response.body["data"]["client_name"], "draft.txt");

    let storage_name = response.body["data"]["storage_name"]
        .as_str()
        .expect("storage_name");
    assert!(
        app.config
            .storage
            .storage_root
            .join(storage_name)
            .exists()
    );
}

#[tokio::test]
async fn test_delete_removes_record_and_bytes() {
    let app = TestApp::new();
    let id = app
        .upload_whole("old.txt", b"stale", Caller::anonymous())
        .await;
    let path = format!("/api/files/{id}");

    let response = app
        .request("DELETE", &path, None, Caller::anonymous())
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request("DELETE", &path, None, Caller::with("manage"))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let storage_name = response.body["data"]["storage_name"]
        .as_str()
        .expect("storage_name")
        .to_string();
    assert!(
        !app.config
            .storage
            .storage_root
            .join(&storage_name)
            .exists()
    );

    let response = app.request("GET", &path, None, Caller::anonymous()).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .request("DELETE", &path, None, Caller::with("manage"))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_listing_access() {
    let app = TestApp::new();
    let owner = UserId::new();
    app.upload_whole("mine.txt", b"mine", Caller::user(owner))
        .await;
    app.upload_whole("unowned.txt", b"nobody", Caller::anonymous())
        .await;
    let path = format!("/api/users/{owner}/files");

    let response = app.request("GET", &path, None, Caller::user(owner)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["access"], "manage");
    let files = response.body["data"]["files"].as_array().expect("files");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["display_name"], "mine.txt");

    let stranger = Caller::user(UserId::new());
    let response = app.request("GET", &path, None, stranger).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.request("GET", &path, None, Caller::with("list")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["access"], "display");

    let response = app
        .request("GET", &path, None, Caller::with("list,manage"))
        .await;
    assert_eq!(response.body["data"]["access"], "manage");
}

#[tokio::test]
async fn test_invalid_identity_headers() {
    let app = TestApp::new();

    let response = app
        .request("GET", "/api/files", None, Caller::with("superuser"))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
