//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use filedock_core::config::{AppConfig, DatabaseBackend, StorageConfig};
use filedock_core::traits::thumbnail::ThumbnailPipeline;
use filedock_core::types::UserId;
use filedock_database::{MemoryMetadataStore, MetadataStore};
use filedock_service::{FileRecordBuilder, FileService, UploadService};
use filedock_storage::{ChunkMerger, ChunkSink, ImageThumbnailer, SessionRegistry, StoragePaths};

const BOUNDARY: &str = "filedock-test-boundary";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Application config
    pub config: AppConfig,
    /// Backing directory of every storage root
    _tmp: TempDir,
}

/// Identity and capabilities a request is sent with
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub user_id: Option<UserId>,
    pub capabilities: &'static str,
}

impl Caller {
    /// No user, no capabilities.
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            capabilities: "",
        }
    }

    /// A user without capabilities.
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            capabilities: "",
        }
    }

    /// Caller granted `capabilities`.
    pub fn with(capabilities: &'static str) -> Self {
        Self {
            user_id: None,
            capabilities,
        }
    }
}

/// One part of a multipart form
pub enum Part<'a> {
    Text(&'a str, String),
    File(&'a str, &'a [u8]),
}

impl TestApp {
    /// Create a new test application over a temporary directory and the
    /// in-memory metadata store
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");

        let mut config = AppConfig::default();
        config.database.backend = DatabaseBackend::Memory;
        config.storage = StorageConfig::rooted_at(tmp.path());

        let store: Arc<dyn MetadataStore> = Arc::new(MemoryMetadataStore::new());
        let paths = StoragePaths::from_config(&config.storage);
        let registry = SessionRegistry::new();

        let thumbnails: Option<Arc<dyn ThumbnailPipeline>> = Some(Arc::new(
            ImageThumbnailer::from_config(&config.thumbnails),
        ));
        let builder = FileRecordBuilder::new(
            Arc::clone(&store),
            paths.clone(),
            thumbnails,
            &config.storage,
        );
        let upload_service = Arc::new(UploadService::new(
            ChunkSink::new(paths.clone(), registry.clone(), &config.storage),
            ChunkMerger::new(paths.clone(), registry, &config.storage),
            builder,
            paths.clone(),
            &config.storage,
        ));
        let file_service = Arc::new(FileService::new(store, paths));

        let app_state = filedock_api::state::AppState {
            config: Arc::new(config.clone()),
            upload_service,
            file_service,
        };

        Self {
            router: filedock_api::router::build_router(app_state),
            config,
            _tmp: tmp,
        }
    }

    /// Make a JSON HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        caller: Caller,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let req = Self::builder(method, path, caller)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body_str))
            .expect("Failed to build request");

        self.send(req).await
    }

    /// POST a multipart form to the upload endpoint
    pub async fn upload(&self, parts: &[Part<'_>], caller: Caller) -> TestResponse {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(file_name, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let req = Self::builder("POST", "/api/files/upload", caller)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("Failed to build request");

        self.send(req).await
    }

    /// Upload one chunk of a chunked upload
    pub async fn upload_chunk(
        &self,
        session: &str,
        index: u32,
        total: u32,
        file_name: &str,
        data: &[u8],
        caller: Caller,
    ) -> TestResponse {
        self.upload(
            &[
                Part::Text("uuid", session.to_string()),
                Part::Text("chunkIndex", index.to_string()),
                Part::Text("totalChunks", total.to_string()),
                Part::File(file_name, data),
            ],
            caller,
        )
        .await
    }

    /// Upload a whole file and return its id
    pub async fn upload_whole(&self, file_name: &str, data: &[u8], caller: Caller) -> String {
        let response = self.upload(&[Part::File(file_name, data)], caller).await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Upload failed: {:?}",
            response.body
        );
        response.body["data"]["file"]["id"]
            .as_str()
            .expect("No file id in upload response")
            .to_string()
    }

    fn builder(method: &str, path: &str, caller: Caller) -> axum::http::request::Builder {
        let mut req = Request::builder().method(method).uri(path);
        if let Some(user_id) = caller.user_id {
            req = req.header("x-user-id", user_id.to_string());
        }
        if !caller.capabilities.is_empty() {
            req = req.header("x-capabilities", caller.capabilities);
        }
        req
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
            .await
            .expect("Failed to read body")
            .to_vec();

        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            content_type,
            body,
            bytes,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header, if any
    pub content_type: Option<String>,
    /// Parsed JSON body (`Null` when the body is not JSON)
    pub body: Value,
    /// Raw body
    pub bytes: Vec<u8>,
}

/// Bytes of a small PNG image
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("Failed to encode png");
    buf.into_inner()
}
