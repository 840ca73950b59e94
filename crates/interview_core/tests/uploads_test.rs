//! # Upload Intake Tests

use bytes::Bytes;
use interview_core::{PortError, StartSession, VoiceFile};
use interview_test_utils::{CoreHarness, StubGenerator, StubScorer, TEST_MAX_UPLOAD_BYTES};
use std::sync::atomic::Ordering;
use uuid::Uuid;

fn harness() -> CoreHarness {
    CoreHarness::new(StubGenerator::unavailable(), StubScorer::unavailable())
}

fn webm(bytes: &'static [u8]) -> VoiceFile {
    VoiceFile {
        original_name: "answer.webm".to_string(),
        mime_type: "audio/webm".to_string(),
        content: Bytes::from_static(bytes),
        session_id: None,
    }
}

#[tokio::test]
async fn voice_upload_stores_blob_logs_row_and_analyzes() {
    let h = harness();

    let outcome = h.voice.upload(webm(b"RIFF....")).await.unwrap();

    assert!(outcome.storage_path.starts_with("answers/"));
    assert!(outcome.filename.ends_with("-answer.webm"));
    assert_eq!(outcome.public_url, format!("http://blobs.test/media/{}", outcome.storage_path));
    let (stored, content_type) = h.blobs.get(&outcome.storage_path).expect("blob stored");
    assert_eq!(stored, Bytes::from_static(b"RIFF...."));
    assert_eq!(content_type, "audio/webm");

    let rows = h.db.voice_uploads();
    assert_eq!(rows.len(), 1);
    assert_eq!(outcome.upload_id, Some(rows[0].id));
    assert_eq!(rows[0].file_size_bytes, 8);
    assert!(outcome.analysis.is_some());
}

#[tokio::test]
async fn voice_upload_survives_logging_and_analysis_failures() {
    let h = harness();
    h.db.fail_voice_upload_writes.store(true, Ordering::SeqCst);
    h.analyzer.offline.store(true, Ordering::SeqCst);

    let outcome = h.voice.upload(webm(b"audio")).await.unwrap();

    assert_eq!(outcome.upload_id, None);
    assert!(outcome.analysis.is_none());
    assert!(h.blobs.get(&outcome.storage_path).is_some());
}

#[tokio::test]
async fn voice_upload_rejects_non_audio_and_oversize_files() {
    let h = harness();
    let mut video = webm(b"frames");
    video.mime_type = "video/mp4".to_string();
    assert!(matches!(h.voice.upload(video).await, Err(PortError::InvalidInput(_))));

    let big = VoiceFile {
        content: Bytes::from(vec![0u8; TEST_MAX_UPLOAD_BYTES + 1]),
        ..webm(b"")
    };
    assert!(matches!(h.voice.upload(big).await, Err(PortError::InvalidInput(_))));
    assert!(h.db.voice_uploads().is_empty());
}

#[tokio::test]
async fn uploaded_resume_feeds_the_next_session() {
    let h = harness();
    let user_id = Uuid::new_v4();

    let profile = h
        .resumes
        .upload(user_id, "cv.pdf", Bytes::from_static(b"Backend engineer, Rust and SQL."))
        .await
        .unwrap();
    assert_eq!(profile.parsed_skills, vec!["Rust", "SQL"]);

    let started = h
        .sessions
        .start_session(user_id, StartSession::default())
        .await
        .unwrap();
    assert_eq!(started.session.resume_profile_id, Some(profile.id));
}

#[tokio::test]
async fn resume_parser_outage_is_surfaced() {
    let h = harness();
    h.parser.offline.store(true, Ordering::SeqCst);

    let result = h
        .resumes
        .upload(Uuid::new_v4(), "cv.pdf", Bytes::from_static(b"text"))
        .await;

    assert!(matches!(result, Err(PortError::Unavailable(_))));
    assert!(h.db.resume_profiles().is_empty());
}
