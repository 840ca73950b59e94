//! crates/interview_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Answer, AudioAnalysis, Evaluation, GeneratedQuestion, InterviewSession, NewAnswer,
    NewQuestion, NewVoiceUpload, ParsedResume, Question, ResumeProfile, Score, ScoreRequest,
    User, UserCredentials, VoiceUpload,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Upstream service unavailable: {0}")]
    Unavailable(String),
    #[error("Upstream response failed validation: {0}")]
    InvalidResponse(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Auth Methods ---
    async fn create_user_with_email(&self, email: &str, hashed_password: &str)
        -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves a live (unexpired) token to its user.
    async fn validate_auth_session(&self, token: &str) -> PortResult<User>;

    async fn delete_auth_session(&self, token: &str) -> PortResult<()>;

    // --- Resume Profiles ---
    async fn create_resume_profile(
        &self,
        user_id: Uuid,
        resume_text: &str,
        parsed_skills: &[String],
    ) -> PortResult<ResumeProfile>;

    async fn get_resume_profile(&self, profile_id: Uuid) -> PortResult<ResumeProfile>;

    /// The most recently created profile for the user, if any.
    async fn get_latest_resume_profile(&self, user_id: Uuid) -> PortResult<Option<ResumeProfile>>;

    // --- Interview Sessions ---
    async fn create_interview_session(
        &self,
        user_id: Uuid,
        resume_profile_id: Option<Uuid>,
    ) -> PortResult<InterviewSession>;

    async fn get_interview_session(&self, session_id: Uuid) -> PortResult<InterviewSession>;

    /// Marks the session completed. Returns the updated row.
    async fn complete_interview_session(
        &self,
        session_id: Uuid,
        end_time: DateTime<Utc>,
        total_score: Option<f64>,
    ) -> PortResult<InterviewSession>;

    /// All of a user's sessions, most recent start time first.
    async fn list_sessions_for_user(&self, user_id: Uuid) -> PortResult<Vec<InterviewSession>>;

    // --- Questions ---
    async fn insert_questions(
        &self,
        session_id: Uuid,
        questions: &[NewQuestion],
    ) -> PortResult<Vec<Question>>;

    async fn get_question(&self, question_id: Uuid) -> PortResult<Question>;

    /// Questions of the given sessions ordered by creation time ascending.
    async fn list_questions_for_sessions(&self, session_ids: &[Uuid])
        -> PortResult<Vec<Question>>;

    /// A bounded, unpersonalized sample from the static fallback pool.
    async fn sample_question_pool(&self, limit: usize) -> PortResult<Vec<NewQuestion>>;

    // --- Answers and Scores ---
    async fn create_answer(&self, answer: NewAnswer) -> PortResult<Answer>;

    async fn list_answers_for_sessions(&self, session_ids: &[Uuid]) -> PortResult<Vec<Answer>>;

    async fn create_score(&self, answer_id: Uuid, evaluation: &Evaluation) -> PortResult<Score>;

    async fn list_scores_for_answers(&self, answer_ids: &[Uuid]) -> PortResult<Vec<Score>>;

    // --- Voice Uploads ---
    async fn create_voice_upload(&self, upload: NewVoiceUpload) -> PortResult<VoiceUpload>;
}

#[async_trait]
pub trait QuestionGenerationService: Send + Sync {
    /// Generates questions for the given resume text and topics.
    async fn generate_questions(
        &self,
        resume_text: &str,
        topics: &[String],
    ) -> PortResult<Vec<GeneratedQuestion>>;
}

#[async_trait]
pub trait ScoringService: Send + Sync {
    /// Scores a single answer. Called at most once per submission.
    async fn score_answer(&self, request: &ScoreRequest) -> PortResult<Evaluation>;
}

#[async_trait]
pub trait ResumeParsingService: Send + Sync {
    async fn parse_resume(&self, filename: &str, content: Bytes) -> PortResult<ParsedResume>;
}

#[async_trait]
pub trait AudioAnalysisService: Send + Sync {
    async fn analyze_audio(
        &self,
        filename: &str,
        mime_type: &str,
        content: Bytes,
    ) -> PortResult<AudioAnalysis>;
}

#[async_trait]
pub trait BlobStorageService: Send + Sync {
    /// Stores the bytes under `path` and returns their public URL.
    async fn upload(&self, path: &str, content: Bytes, content_type: &str) -> PortResult<String>;

    fn public_url(&self, path: &str) -> String;
}
