//! Integration tests for the upload endpoint.

mod helpers;

use axum::http::StatusCode;
use filedock_core::types::UserId;

use helpers::{Caller, Part, TestApp};

fn report_chunks() -> Vec<Vec<u8>> {
    vec![vec![b'A'; 4096], vec![b'B'; 4096], vec![b'C'; 1024]]
}

#[tokio::test]
async fn test_chunked_upload_out_of_order() {
    let app = TestApp::new();
    let chunks = report_chunks();
    let caller = Caller::with("list,manage");

    let response = app
        .upload_chunk("sess-report", 2, 3, "report.pdf", &chunks[2], caller)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "pending");
    assert_eq!(response.body["data"]["received"], 1);
    assert_eq!(response.body["data"]["total"], 3);

    let response = app
        .upload_chunk("sess-report", 0, 3, "report.pdf", &chunks[0], caller)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["received"], 2);

    let response = app
        .upload_chunk("sess-report", 1, 3, "report.pdf", &chunks[1], caller)
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    assert_eq!(response.body["data"]["status"], "stored");

    let file = &response.body["data"]["file"];
    assert_eq!(file["display_name"], "report.pdf");
    assert_eq!(file["client_name"], "report.pdf");
    assert_eq!(file["size_bytes"], 9216);
    let storage_name = file["storage_name"].as_str().expect("storage_name");
    assert_ne!(storage_name, "report.pdf");
    assert!(storage_name.ends_with(".pdf"));

    let stored = std::fs::read(app.config.storage.storage_root.join(storage_name))
        .expect("stored bytes");
    assert_eq!(stored, chunks.concat());
    assert!(!app.config.storage.chunk_root.join("sess-report").exists());

    let id = file["id"].as_str().expect("id");
    let response = app
        .request("GET", &format!("/api/files/{id}"), None, caller)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["storage_name"], storage_name);
}

#[tokio::test]
async fn test_whole_file_upload() {
    let app = TestApp::new();
    let owner = UserId::new();

    let response = app
        .upload(&[Part::File("notes.txt", b"hello filedock\n")], Caller::user(owner))
        .await;

    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    let file = &response.body["data"]["file"];
    assert_eq!(file["display_name"], "notes.txt");
    assert_eq!(file["mime_type"], "text/plain");
    assert_eq!(file["size_bytes"], 15);
    assert!(file.get("thumbnail").is_none());

    let response = app
        .request(
            "GET",
            &format!("/api/users/{owner}/files"),
            None,
            Caller::user(owner),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["files"][0]["display_name"], "notes.txt");
}

#[tokio::test]
async fn test_same_name_uploads_stay_distinct() {
    let app = TestApp::new();
    let caller = Caller::with("list");

    let first = app.upload_whole("photo.jpg", b"first", caller).await;
    let second = app.upload_whole("photo.jpg", b"second", caller).await;
    assert_ne!(first, second);

    let response = app.request("GET", "/api/files", None, caller).await;
    let files = response.body["data"].as_array().expect("file list");
    assert_eq!(files.len(), 2);
    assert_ne!(files[0]["storage_name"], files[1]["storage_name"]);
}

#[tokio::test]
async fn test_image_upload_gets_thumbnail() {
    let app = TestApp::new();
    let caller = Caller::anonymous();
    let png = helpers::png_bytes(400, 100);

    let response = app.upload(&[Part::File("banner.png", &png)], caller).await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    let file = &response.body["data"]["file"];
    assert_eq!(file["mime_type"], "image/png");
    assert!(
        file["thumbnail"]
            .as_str()
            .expect("thumbnail")
            .starts_with("data:image/jpeg;base64,")
    );

    let id = file["id"].as_str().expect("id");
    let response = app
        .request("GET", &format!("/api/files/{id}/thumbnail"), None, caller)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(&response.bytes[..2], &[0xff, 0xd8]);
}

#[tokio::test]
async fn test_non_image_has_no_thumbnail() {
    let app = TestApp::new();
    let id = app
        .upload_whole("data.bin", &[0u8, 159, 146, 150], Caller::anonymous())
        .await;

    let response = app
        .request(
            "GET",
            &format!("/api/files/{id}/thumbnail"),
            None,
            Caller::anonymous(),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "RECORD_NOT_FOUND");
}

#[tokio::test]
async fn test_inconsistent_chunk_count_conflicts() {
    let app = TestApp::new();
    let caller = Caller::anonymous();

    let response = app
        .upload_chunk("sess-mixed", 0, 3, "a.bin", b"abc", caller)
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .upload_chunk("sess-mixed", 1, 4, "a.bin", b"def", caller)
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "INCONSISTENT_CHUNK_COUNT");
}

#[tokio::test]
async fn test_upload_form_validation() {
    let app = TestApp::new();
    let caller = Caller::anonymous();

    let response = app
        .upload(&[Part::Text("uuid", "sess-x".to_string())], caller)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION");

    let response = app
        .upload(
            &[
                Part::Text("chunkIndex", "0".to_string()),
                Part::Text("totalChunks", "2".to_string()),
                Part::File("a.bin", b"abc"),
            ],
            caller,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .upload(
            &[
                Part::Text("uuid", "sess-y".to_string()),
                Part::Text("chunkIndex", "first".to_string()),
                Part::Text("totalChunks", "2".to_string()),
                Part::File("a.bin", b"abc"),
            ],
            caller,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .upload_chunk("../escape", 0, 1, "a.bin", b"abc", caller)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
