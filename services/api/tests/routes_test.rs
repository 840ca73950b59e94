//! Router-level tests: real handlers, middleware and DTOs over in-memory ports.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::*;
use interview_core::DatabaseService;
use interview_test_utils::{evaluation, generated, StubGenerator, StubScorer};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

async fn start_session(app: &TestApp, body: Value) -> Value {
    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/interviews/start", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    extract_json(response).await
}

// =============================================================================
// Public Routes and Authentication
// =============================================================================

#[tokio::test]
async fn root_banner_needs_no_auth() {
    let app = TestApp::new(StubGenerator::unavailable(), StubScorer::unavailable()).await;

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("running"));
}

#[tokio::test]
async fn protected_routes_reject_missing_and_unknown_tokens() {
    let app = TestApp::new(StubGenerator::unavailable(), StubScorer::unavailable()).await;

    let request = Request::builder().uri("/dashboard/stats").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(extract_json(response).await["error"].is_string());

    let request = Request::builder()
        .uri("/dashboard/stats")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_login_and_logout_flow() {
    let app = TestApp::new(StubGenerator::unavailable(), StubScorer::unavailable()).await;
    let credentials = json!({ "email": "New@Example.com", "password": "hunter22" });

    let signup = Request::builder()
        .method("POST")
        .uri("/auth/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(credentials.to_string()))
        .unwrap();
    let response = app.router.clone().oneshot(signup).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().get(header::SET_COOKIE).is_some());
    let body = extract_json(response).await;
    assert_eq!(body["email"], "new@example.com");

    let wrong_password = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "email": "new@example.com", "password": "nope" }).to_string()))
        .unwrap();
    let response = app.router.clone().oneshot(wrong_password).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let login = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(credentials.to_string()))
        .unwrap();
    let response = app.router.clone().oneshot(login).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let token = extract_json(response).await["token"].as_str().unwrap().to_string();

    // The session cookie works as well as the bearer header.
    let with_cookie = Request::builder()
        .uri("/dashboard/stats")
        .header(header::COOKIE, format!("session={}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(with_cookie).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let logout = Request::builder()
        .method("POST")
        .uri("/auth/logout")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(logout).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let after_logout = Request::builder()
        .uri("/dashboard/stats")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(after_logout).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_signup_is_a_bad_request() {
    let app = TestApp::new(StubGenerator::unavailable(), StubScorer::unavailable()).await;

    let signup = || {
        Request::builder()
            .method("POST")
            .uri("/auth/signup")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "email": "candidate@example.com", "password": "pw" }).to_string(),
            ))
            .unwrap()
    };
    let response = app.router.clone().oneshot(signup()).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_login_body_is_a_json_bad_request() {
    let app = TestApp::new(StubGenerator::unavailable(), StubScorer::unavailable()).await;

    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "email": "candidate@example.com" }).to_string()))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(extract_json(response).await["error"].is_string());
}

// =============================================================================
// Interview Routes
// =============================================================================

#[tokio::test]
async fn start_with_topics_returns_sanitized_generated_questions() {
    let app = TestApp::new(
        StubGenerator::available(vec![
            generated("What is a LEFT JOIN?", "SQL", Some(9.0)),
            generated("What is an index?", "SQL", None),
        ]),
        StubScorer::unavailable(),
    )
    .await;

    let body = start_session(&app, json!({ "topics": ["SQL"], "skipResume": true })).await;

    assert_eq!(body["session"]["status"], "in_progress");
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0]["question_text"], "What is a LEFT JOIN?");
    assert_eq!(questions[0]["difficulty_level"], 5);
    assert_eq!(questions[1]["difficulty_level"], 1);
    assert!(questions[1]["ideal_answer_keywords"].is_array());
}

#[tokio::test]
async fn start_without_generator_uses_bounded_fallback_pool() {
    let app = TestApp::new(StubGenerator::unavailable(), StubScorer::unavailable()).await;
    app.db.seed_pool(25);

    let body = start_session(&app, json!({ "topics": ["SQL"], "skip_resume": true })).await;

    assert_eq!(body["questions"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new(StubGenerator::unavailable(), StubScorer::unavailable()).await;

    let request = authed("POST", "/interviews/start")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(extract_json(response).await["error"].is_string());
}

#[tokio::test]
async fn non_uuid_session_ids_are_json_bad_requests() {
    let app = TestApp::new(StubGenerator::unavailable(), StubScorer::unavailable()).await;

    for uri in ["/interviews/not-a-uuid", "/interviews/not-a-uuid/report"] {
        let response = app.router.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert!(extract_json(response).await["error"].is_string(), "{}", uri);
    }
}

#[tokio::test]
async fn answer_requires_session_and_question_ids() {
    let app = TestApp::new(StubGenerator::unavailable(), StubScorer::unavailable()).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/interviews/answer", json!({ "answerText": "hi" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scorer_outage_saves_answer_and_reports_pending() {
    let app = TestApp::new(StubGenerator::unavailable(), StubScorer::unavailable()).await;
    app.db.seed_pool(2);
    let started = start_session(&app, json!({ "skipResume": true })).await;
    let session_id = started["session"]["id"].as_str().unwrap().to_string();
    let question_id = started["questions"][0]["id"].as_str().unwrap().to_string();

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/interviews/answer",
            json!({ "sessionId": session_id, "questionId": question_id, "answerText": "A join combines rows." }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response).await;
    assert_eq!(body["answer"]["answer_text"], "A join combines rows.");
    assert!(body.get("evaluation").is_none());
    assert!(body["message"].as_str().unwrap().contains("pending"));

    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/interviews/{}/report", session_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = extract_json(response).await;
    let entries = report["questions"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["id"], question_id);
    assert!(entries[0]["answer"].is_object());
    assert!(entries[0]["score"].is_null());
    assert!(entries[1]["answer"].is_null());
}

#[tokio::test]
async fn full_interview_updates_the_dashboard() {
    let app = TestApp::new(
        StubGenerator::available(vec![generated("Explain ownership.", "Rust", Some(2.0))]),
        StubScorer::available(evaluation(80.0)),
    )
    .await;
    let started = start_session(&app, json!({ "topics": ["Rust"], "skipResume": true })).await;
    let session_id = started["session"]["id"].as_str().unwrap().to_string();
    let question_id = started["questions"][0]["id"].as_str().unwrap().to_string();

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/interviews/answer",
            json!({ "session_id": session_id, "question_id": question_id, "answer_text": "Each value has one owner." }),
        ))
        .await
        .unwrap();
    let body = extract_json(response).await;
    assert_eq!(body["evaluation"]["final_score"], 80.0);
    // No resume on this session, so there is nothing to continue from.
    assert!(body["next_question"].is_null());

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/interviews/end", json!({ "sessionId": session_id })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let ended = extract_json(response).await;
    assert_eq!(ended["session"]["status"], "completed");
    assert!(ended["session"]["end_time"].is_string());
    assert_eq!(ended["session"]["total_score"], 80.0);

    let response = app.router.clone().oneshot(get("/dashboard/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard = extract_json(response).await;
    assert_eq!(dashboard["stats"]["totalSessions"], 1);
    assert_eq!(dashboard["stats"]["avgScores"]["overall"], 80);
    assert_eq!(dashboard["recentSessions"][0]["topics"], json!(["Rust"]));
    assert_eq!(dashboard["progressHistory"].as_array().unwrap().len(), 1);
    assert_eq!(dashboard["topicMastery"][0]["topic"], "Rust");
    assert_eq!(dashboard["topicMastery"][0]["fullMark"], 100);
}

#[tokio::test]
async fn other_users_sessions_are_not_found() {
    let app = TestApp::new(StubGenerator::unavailable(), StubScorer::unavailable()).await;
    let stranger = app.db.insert_user("stranger@example.com");
    let foreign = app
        .db
        .create_interview_session(stranger.user_id, None)
        .await
        .unwrap();

    for uri in [
        format!("/interviews/{}", foreign.id),
        format!("/interviews/{}/report", foreign.id),
    ] {
        let response = app.router.clone().oneshot(get(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/interviews/end", json!({ "sessionId": foreign.id })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Upload Routes
// =============================================================================

#[tokio::test]
async fn resume_upload_stores_a_profile() {
    let app = TestApp::new(StubGenerator::unavailable(), StubScorer::unavailable()).await;

    let request = multipart_request(
        "/resume/upload",
        "resume",
        "cv.pdf",
        "application/pdf",
        b"Rust engineer, five years of SQL.",
        &[],
    );
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response).await;
    assert_eq!(body["profile"]["parsed_skills"], json!(["Rust", "SQL"]));
    assert_eq!(app.db.resume_profiles().len(), 1);
}

#[tokio::test]
async fn voice_upload_stores_audio_and_rejects_other_files() {
    let app = TestApp::new(StubGenerator::unavailable(), StubScorer::unavailable()).await;

    let request = multipart_request("/voice/upload", "audio", "notes.txt", "text/plain", b"hello", &[]);
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = multipart_request("/voice/upload", "audio", "answer.webm", "audio/webm", b"OggS", &[]);
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response).await;

    let filename = body["filename"].as_str().unwrap();
    assert!(filename.ends_with("answer.webm"));
    assert!(body["publicUrl"].as_str().unwrap().ends_with(filename));
    assert!(body["uploadId"].is_string());
    assert_eq!(body["analysis"]["wpm"], 120.0);
    assert!(app.blobs.get(&format!("answers/{}", filename)).is_some());
}

#[tokio::test]
async fn voice_status_is_public() {
    let app = TestApp::new(StubGenerator::unavailable(), StubScorer::unavailable()).await;

    let request = Request::builder().uri("/voice/status").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
