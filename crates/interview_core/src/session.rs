//! crates/interview_core/src/session.rs
//!
//! Creates, reads and closes interview sessions.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::aggregation::AggregationEngine;
use crate::domain::{InterviewSession, NewQuestion, Question, ResumeProfile};
use crate::ports::{DatabaseService, PortError, PortResult};
use crate::question_source::QuestionSource;

/// Parameters for starting a session.
#[derive(Debug, Clone, Default)]
pub struct StartSession {
    /// An explicit resume profile. When absent, the user's latest one is used
    /// unless `skip_resume` is set.
    pub resume_id: Option<Uuid>,
    pub topics: Vec<String>,
    pub skip_resume: bool,
}

#[derive(Debug, Clone)]
pub struct SessionWithQuestions {
    pub session: InterviewSession,
    pub questions: Vec<Question>,
}

#[derive(Clone)]
pub struct SessionManager {
    db: Arc<dyn DatabaseService>,
    question_source: QuestionSource,
    aggregation: AggregationEngine,
}

impl SessionManager {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        question_source: QuestionSource,
        aggregation: AggregationEngine,
    ) -> Self {
        Self {
            db,
            question_source,
            aggregation,
        }
    }

    pub async fn start_session(&self, user_id: Uuid, params: StartSession) -> PortResult<SessionWithQuestions> {
        let profile = self.resolve_resume(user_id, &params).await?;

        let session = self
            .db
            .create_interview_session(user_id, profile.as_ref().map(|p| p.id))
            .await?;
        info!("Created interview session {} for user {}", session.id, user_id);

        let topics: Vec<String> = params
            .topics
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        let batch = self
            .question_source
            .initial_batch(profile.as_ref().map(|p| p.resume_text.as_str()), &topics)
            .await;

        let questions = self.bind_questions(session.id, batch).await;
        Ok(SessionWithQuestions { session, questions })
    }

    /// Persists the batch for the session. A failed save retries once with the
    /// fallback pool; if that fails too the session starts with no questions.
    async fn bind_questions(&self, session_id: Uuid, batch: Vec<NewQuestion>) -> Vec<Question> {
        if batch.is_empty() {
            warn!("No questions available for session {}", session_id);
            return Vec::new();
        }
        match self.db.insert_questions(session_id, &batch).await {
            Ok(questions) => return questions,
            Err(e) => warn!("Failed to save questions for session {}: {:?}", session_id, e),
        }

        let pool = self.question_source.fallback_batch().await;
        if pool.is_empty() {
            return Vec::new();
        }
        match self.db.insert_questions(session_id, &pool).await {
            Ok(questions) => {
                info!("Bound {} pool questions to session {}", questions.len(), session_id);
                questions
            }
            Err(e) => {
                warn!("Failed to save fallback questions for session {}: {:?}", session_id, e);
                Vec::new()
            }
        }
    }

    pub async fn get_session(&self, user_id: Uuid, session_id: Uuid) -> PortResult<SessionWithQuestions> {
        let session = self.owned_session(user_id, session_id).await?;
        let questions = self.db.list_questions_for_sessions(&[session_id]).await?;
        Ok(SessionWithQuestions { session, questions })
    }

    /// Marks the session completed. Calling it again simply moves `end_time`
    /// forward.
    pub async fn end_session(&self, user_id: Uuid, session_id: Uuid) -> PortResult<InterviewSession> {
        self.owned_session(user_id, session_id).await?;

        let total_score = match self.aggregation.session_total(session_id).await {
            Ok(total) => total,
            Err(e) => {
                warn!("Could not compute total score for session {}: {:?}", session_id, e);
                None
            }
        };

        let session = self
            .db
            .complete_interview_session(session_id, Utc::now(), total_score)
            .await?;
        info!("Session {} completed (total score: {:?})", session_id, session.total_score);
        Ok(session)
    }

    /// Loads a session, hiding sessions that belong to other users.
    pub async fn owned_session(&self, user_id: Uuid, session_id: Uuid) -> PortResult<InterviewSession> {
        let session = self.db.get_interview_session(session_id).await?;
        if session.user_id != user_id {
            warn!("Session {} does not belong to user {}", session_id, user_id);
            return Err(PortError::NotFound(format!("Session {} not found", session_id)));
        }
        Ok(session)
    }

    async fn resolve_resume(&self, user_id: Uuid, params: &StartSession) -> PortResult<Option<ResumeProfile>> {
        if let Some(resume_id) = params.resume_id {
            let profile = self.db.get_resume_profile(resume_id).await?;
            if profile.user_id != user_id {
                return Err(PortError::NotFound(format!("Resume profile {} not found", resume_id)));
            }
            return Ok(Some(profile));
        }
        if params.skip_resume {
            return Ok(None);
        }
        self.db.get_latest_resume_profile(user_id).await
    }
}
