//! crates/interview_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

use crate::sanitize::Difficulty;

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents an issued bearer token
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A parsed resume uploaded by a user. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_text: String,
    pub parsed_skills: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of an interview session. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    InProgress,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in_progress" => Some(SessionStatus::InProgress),
            "completed" => Some(SessionStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One end-to-end interview attempt by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct InterviewSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_profile_id: Option<Uuid>,
    pub status: SessionStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_score: Option<f64>,
}

/// A question that has been bound to a session and persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: Uuid,
    pub session_id: Uuid,
    pub topic: String,
    pub question_text: String,
    pub ideal_answer_keywords: Vec<String>,
    pub ideal_answer_text: Option<String>,
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
}

/// A sanitized question that is not yet bound to any session.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub topic: String,
    pub question_text: String,
    pub ideal_answer_keywords: Vec<String>,
    pub ideal_answer_text: Option<String>,
    pub difficulty: Difficulty,
}

/// A question exactly as the generator returned it, after schema validation
/// but before sanitization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedQuestion {
    pub question_text: String,
    pub topic: Option<String>,
    pub difficulty_level: Option<f64>,
    pub ideal_answer_keywords: Option<Vec<String>>,
    pub ideal_answer_text: Option<String>,
}

/// A candidate's answer to one question. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub id: Uuid,
    pub session_id: Uuid,
    pub question_id: Uuid,
    pub answer_text: Option<String>,
    pub audio_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The data needed to persist an answer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnswer {
    pub session_id: Uuid,
    pub question_id: Uuid,
    pub answer_text: Option<String>,
    pub audio_url: Option<String>,
}

/// Everything the scorer needs to evaluate one answer. Question-derived fields
/// are `None` when the parent question could not be loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreRequest {
    pub answer_text: Option<String>,
    pub audio_url: Option<String>,
    pub question_text: Option<String>,
    pub ideal_keywords: Option<Vec<String>>,
    pub ideal_answer_text: Option<String>,
}

/// The scorer's verdict on one answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub semantic_score: Option<f64>,
    pub grammar_score: Option<f64>,
    pub keyword_score: Option<f64>,
    pub final_score: Option<f64>,
    pub feedback_text: Option<String>,
    pub transcript: Option<String>,
}

/// A persisted evaluation linked to exactly one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub id: Uuid,
    pub answer_id: Uuid,
    pub semantic_score: Option<f64>,
    pub grammar_score: Option<f64>,
    pub keyword_score: Option<f64>,
    pub final_score: Option<f64>,
    pub feedback_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Result of the ML service's resume parser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResume {
    pub skills: Vec<String>,
    pub extracted_text: String,
}

/// Optional delivery metrics for a recorded answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioAnalysis {
    pub transcript: Option<String>,
    pub wpm: Option<f64>,
    pub fluency_score: Option<f64>,
    pub confidence_score: Option<f64>,
    pub filler_words: Option<u32>,
    pub pause_duration: Option<f64>,
}

/// An uploaded audio file, logged independently of any answer.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceUpload {
    pub id: Uuid,
    pub session_id: Option<Uuid>,
    pub filename: String,
    pub storage_path: String,
    pub public_url: String,
    pub file_size_bytes: i64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewVoiceUpload {
    pub session_id: Option<Uuid>,
    pub filename: String,
    pub storage_path: String,
    pub public_url: String,
    pub file_size_bytes: i64,
    pub mime_type: String,
}
