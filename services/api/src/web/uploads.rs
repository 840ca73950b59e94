//! services/api/src/web/uploads.rs
//!
//! Multipart intake for resumes and recorded answers.

use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use bytes::Bytes;
use interview_core::domain::User;
use interview_core::VoiceFile;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::dto::{MessageResponse, ResumeUploadResponse, VoiceUploadResponse};
use crate::web::state::AppState;

const RESUME_FIELDS: [&str; 2] = ["resume", "file"];
const AUDIO_FIELDS: [&str; 2] = ["audio", "file"];

struct UploadedFile {
    name: String,
    mime_type: String,
    content: Bytes,
}

/// Upload a resume (PDF) to be parsed by the ML service.
#[utoipa::path(
    post,
    path = "/resume/upload",
    tag = "uploads",
    request_body(content_type = "multipart/form-data", description = "A `resume` file part."),
    responses(
        (status = 200, description = "Resume parsed and stored", body = ResumeUploadResponse),
        (status = 400, description = "No file uploaded"),
        (status = 401, description = "Not authenticated"),
        (status = 502, description = "Resume parser unavailable")
    ),
    security(("bearer" = []))
)]
pub async fn resume_upload_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    mut multipart: Multipart,
) -> Result<Json<ResumeUploadResponse>, ApiError> {
    let mut file = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name().is_some_and(|n| RESUME_FIELDS.contains(&n)) && file.is_none() {
            let name = field.file_name().unwrap_or("resume.pdf").to_string();
            file = Some((name, field.bytes().await?));
        }
    }
    let (name, content) = file.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    let profile = state.resumes.upload(user.user_id, &name, content).await?;
    info!("Stored resume profile {} for user {}", profile.id, user.user_id);

    Ok(Json(ResumeUploadResponse {
        message: "Resume uploaded and processed successfully".to_string(),
        profile: profile.into(),
    }))
}

/// Upload a recorded answer. Accepts an `audio` file part and an optional
/// `sessionId` text part.
#[utoipa::path(
    post,
    path = "/voice/upload",
    tag = "uploads",
    request_body(content_type = "multipart/form-data", description = "An `audio` file part and optional `sessionId`."),
    responses(
        (status = 200, description = "Audio stored", body = VoiceUploadResponse),
        (status = 400, description = "Missing, oversized or non-audio file"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = []))
)]
pub async fn voice_upload_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    mut multipart: Multipart,
) -> Result<Json<VoiceUploadResponse>, ApiError> {
    let mut file: Option<UploadedFile> = None;
    let mut session_id = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some(n) if AUDIO_FIELDS.contains(&n) && file.is_none() => {
                let name = field.file_name().unwrap_or("recording").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let content = field.bytes().await?;
                file = Some(UploadedFile {
                    name,
                    mime_type,
                    content,
                });
            }
            Some("sessionId") | Some("session_id") => {
                let raw = field.text().await?;
                let raw = raw.trim();
                if !raw.is_empty() {
                    let id = Uuid::parse_str(raw)
                        .map_err(|_| ApiError::BadRequest("Invalid sessionId".to_string()))?;
                    session_id = Some(id);
                }
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ApiError::BadRequest("No audio file uploaded".to_string()))?;
    if let Some(id) = session_id {
        state.sessions.owned_session(user.user_id, id).await?;
    }

    let outcome = state
        .voice
        .upload(VoiceFile {
            original_name: file.name,
            mime_type: file.mime_type,
            content: file.content,
            session_id,
        })
        .await?;
    info!("User {} uploaded audio to {}", user.user_id, outcome.storage_path);

    Ok(Json(outcome.into()))
}

/// Health check for the voice pipeline.
#[utoipa::path(
    get,
    path = "/voice/status",
    tag = "uploads",
    responses((status = 200, description = "Voice service operational", body = MessageResponse))
)]
pub async fn voice_status_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Voice service operational".to_string(),
    })
}
