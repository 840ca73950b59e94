//! Shared setup for the api router tests: the real router and core services
//! wired to the in-memory ports from `interview_test_utils`.

#![allow(dead_code)]

use api_lib::config::Config;
use api_lib::web::{build_router, state::{Adapters, AppState}};
use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use chrono::{Duration, Utc};
use interview_core::domain::User;
use interview_core::ports::DatabaseService;
use interview_test_utils::{
    InMemoryBlobs, InMemoryDb, StubAudioAnalyzer, StubGenerator, StubResumeParser, StubScorer,
    TEST_FALLBACK_POOL_SIZE, TEST_MAX_UPLOAD_BYTES,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::Level;

pub const TEST_TOKEN: &str = "test-token";
pub const BOUNDARY: &str = "test-boundary";

pub struct TestApp {
    pub router: Router,
    pub db: Arc<InMemoryDb>,
    pub generator: Arc<StubGenerator>,
    pub scorer: Arc<StubScorer>,
    pub blobs: Arc<InMemoryBlobs>,
    pub user: User,
}

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        log_level: Level::DEBUG,
        ml_service_url: "http://ml.test".to_string(),
        ml_timeout_secs: 1,
        storage_root: std::env::temp_dir().join("interview-api-tests"),
        storage_bucket: "voice-answers".to_string(),
        public_base_url: "http://localhost:3000".to_string(),
        fallback_pool_size: TEST_FALLBACK_POOL_SIZE,
        max_upload_bytes: TEST_MAX_UPLOAD_BYTES,
        cors_origin: "http://localhost:3000".to_string(),
        auth_session_ttl_days: 1,
    }
}

impl TestApp {
    /// Builds the app with a signed-in user whose token is `TEST_TOKEN`.
    pub async fn new(generator: StubGenerator, scorer: StubScorer) -> Self {
        let db = Arc::new(InMemoryDb::new());
        let generator = Arc::new(generator);
        let scorer = Arc::new(scorer);
        let blobs = Arc::new(InMemoryBlobs::default());

        let state = AppState::new(
            Arc::new(test_config()),
            Adapters {
                db: db.clone(),
                generator: generator.clone(),
                scorer: scorer.clone(),
                parser: Arc::new(StubResumeParser::default()),
                analyzer: Arc::new(StubAudioAnalyzer::default()),
                blobs: blobs.clone(),
            },
        );
        let router = build_router(Arc::new(state)).unwrap();

        let user = db.insert_user("candidate@example.com");
        db.create_auth_session(TEST_TOKEN, user.user_id, Utc::now() + Duration::days(1))
            .await
            .unwrap();

        Self {
            router,
            db,
            generator,
            scorer,
            blobs,
            user,
        }
    }
}

pub fn authed(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", TEST_TOKEN))
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    authed(method, uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    authed("GET", uri).body(Body::empty()).unwrap()
}

/// A single-file multipart body, optionally followed by plain text fields.
pub fn multipart_request(
    uri: &str,
    field: &str,
    filename: &str,
    content_type: &str,
    content: &[u8],
    text_fields: &[(&str, &str)],
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n");
    for (name, value) in text_fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    authed("POST", uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn extract_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
