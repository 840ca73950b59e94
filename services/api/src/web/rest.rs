//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the interview endpoints and the master
//! definition for the OpenAPI specification.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use interview_core::domain::User;
use interview_core::{StartSession, SubmitAnswer};
use std::sync::Arc;
use tracing::info;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::dto::*;
use crate::web::state::AppState;
use crate::web::{auth, dashboard, uploads};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        start_session_handler,
        get_session_handler,
        submit_answer_handler,
        end_session_handler,
        session_report_handler,
        dashboard::dashboard_stats_handler,
        uploads::resume_upload_handler,
        uploads::voice_upload_handler,
        uploads::voice_status_handler,
    ),
    components(
        schemas(
            auth::SignupRequest, auth::LoginRequest, auth::AuthResponse,
            StartSessionRequest, SubmitAnswerRequest, EndSessionRequest,
            SessionDto, QuestionDto, AnswerDto, EvaluationDto, ScoreDto, ResumeProfileDto,
            AudioAnalysisDto, SessionWithQuestionsResponse, SubmitAnswerResponse,
            EndSessionResponse, ReportQuestionDto, ReportResponse, AvgScoresDto, StatsDto,
            RecentSessionDto, ProgressPointDto, TopicMasteryDto, DashboardResponse,
            ResumeUploadResponse, VoiceUploadResponse, MessageResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Account signup and token issuance."),
        (name = "interviews", description = "Adaptive mock-interview sessions."),
        (name = "dashboard", description = "Progress aggregates."),
        (name = "uploads", description = "Resume and voice-answer intake.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

//=========================================================================================
// Interview Handlers
//=========================================================================================

/// Start a new interview session.
///
/// Uses the given resume, the user's latest resume, or none when `skipResume`
/// is set. Questions come from the generator when topics are given, otherwise
/// from the static fallback pool.
#[utoipa::path(
    post,
    path = "/interviews/start",
    tag = "interviews",
    request_body = StartSessionRequest,
    responses(
        (status = 201, description = "Session created", body = SessionWithQuestionsResponse),
        (status = 400, description = "Malformed request"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Resume not found")
    ),
    security(("bearer" = []))
)]
pub async fn start_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    payload: Result<Json<StartSessionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let params = StartSession {
        resume_id: req.resume_id,
        topics: req.topics.unwrap_or_default(),
        skip_resume: req.skip_resume.unwrap_or(false),
    };

    let started = state.sessions.start_session(user.user_id, params).await?;
    info!(
        "User {} started session {} with {} questions",
        user.user_id,
        started.session.id,
        started.questions.len()
    );
    Ok((StatusCode::CREATED, Json(SessionWithQuestionsResponse::from(started))))
}

/// Fetch a session and its questions in creation order.
#[utoipa::path(
    get,
    path = "/interviews/{id}",
    tag = "interviews",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session found", body = SessionWithQuestionsResponse),
        (status = 400, description = "Malformed session id"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Session not found")
    ),
    security(("bearer" = []))
)]
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SessionWithQuestionsResponse>, ApiError> {
    let Path(session_id) = path?;
    let session = state.sessions.get_session(user.user_id, session_id).await?;
    Ok(Json(session.into()))
}

/// Submit an answer, score it, and fetch the next adaptive question.
///
/// When the scorer is unavailable the answer is still saved and the response
/// carries a `message` instead of an `evaluation`.
#[utoipa::path(
    post,
    path = "/interviews/answer",
    tag = "interviews",
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Answer saved", body = SubmitAnswerResponse),
        (status = 400, description = "Missing session or question id"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Session not found")
    ),
    security(("bearer" = []))
)]
pub async fn submit_answer_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    payload: Result<Json<SubmitAnswerRequest>, JsonRejection>,
) -> Result<Json<SubmitAnswerResponse>, ApiError> {
    let Json(req) = payload?;
    let (session_id, question_id) = match (req.session_id, req.question_id) {
        (Some(s), Some(q)) => (s, q),
        _ => {
            return Err(ApiError::BadRequest(
                "sessionId and questionId are required".to_string(),
            ))
        }
    };

    let outcome = state
        .answers
        .submit_answer(
            user.user_id,
            SubmitAnswer {
                session_id,
                question_id,
                answer_text: req.answer_text,
                audio_url: req.audio_url,
            },
        )
        .await?;
    Ok(Json(outcome.into()))
}

/// Mark a session completed. Safe to call more than once.
#[utoipa::path(
    post,
    path = "/interviews/end",
    tag = "interviews",
    request_body = EndSessionRequest,
    responses(
        (status = 200, description = "Session completed", body = EndSessionResponse),
        (status = 400, description = "Missing session id"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Session not found")
    ),
    security(("bearer" = []))
)]
pub async fn end_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    payload: Result<Json<EndSessionRequest>, JsonRejection>,
) -> Result<Json<EndSessionResponse>, ApiError> {
    let Json(req) = payload?;
    let session_id = req
        .session_id
        .ok_or_else(|| ApiError::BadRequest("sessionId is required".to_string()))?;

    let session = state.sessions.end_session(user.user_id, session_id).await?;
    Ok(Json(EndSessionResponse {
        message: "Session completed".to_string(),
        session: session.into(),
    }))
}

/// The session with every question joined to its latest answer and score.
#[utoipa::path(
    get,
    path = "/interviews/{id}/report",
    tag = "interviews",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session report", body = ReportResponse),
        (status = 400, description = "Malformed session id"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Session not found")
    ),
    security(("bearer" = []))
)]
pub async fn session_report_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ReportResponse>, ApiError> {
    let Path(session_id) = path?;
    let report = state.aggregation.session_report(user.user_id, session_id).await?;
    Ok(Json(report.into()))
}
