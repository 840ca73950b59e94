//! crates/interview_core/src/continuation.rs
//!
//! Extends a live session by one freshly generated question after each scored
//! answer.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{InterviewSession, Question};
use crate::ports::{DatabaseService, PortError, PortResult, QuestionGenerationService};
use crate::sanitize::{sanitize_question, Difficulty, DEFAULT_TOPIC};

#[derive(Clone)]
pub struct QuestionContinuation {
    generator: Arc<dyn QuestionGenerationService>,
    db: Arc<dyn DatabaseService>,
}

impl QuestionContinuation {
    pub fn new(generator: Arc<dyn QuestionGenerationService>, db: Arc<dyn DatabaseService>) -> Self {
        Self { generator, db }
    }

    /// Generates, binds and persists one follow-up question.
    ///
    /// Returns `None` whenever anything along the way is missing or fails; the
    /// session then simply carries on with the questions it already has.
    pub async fn next_question(&self, session: &InterviewSession, answered: Option<&Question>) -> Option<Question> {
        match self.try_next_question(session, answered).await {
            Ok(Some(question)) => {
                info!("Appended question {} to session {}", question.id, session.id);
                Some(question)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to generate next question for session {}: {:?}", session.id, e);
                None
            }
        }
    }

    async fn try_next_question(
        &self,
        session: &InterviewSession,
        answered: Option<&Question>,
    ) -> PortResult<Option<Question>> {
        let Some(profile_id) = session.resume_profile_id else {
            return Ok(None);
        };
        let profile = self.db.get_resume_profile(profile_id).await?;
        if profile.resume_text.trim().is_empty() {
            return Ok(None);
        }

        let topic = answered
            .map(|q| q.topic.as_str())
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_TOPIC)
            .to_string();

        let generated = self
            .generator
            .generate_questions(&profile.resume_text, std::slice::from_ref(&topic))
            .await?;
        let Some(first) = generated.into_iter().find(|q| !q.question_text.trim().is_empty()) else {
            return Ok(None);
        };

        let next = sanitize_question(first, Some(&topic), Difficulty::CONTINUATION_DEFAULT);
        let inserted = self.db.insert_questions(session.id, std::slice::from_ref(&next)).await?;
        inserted
            .into_iter()
            .next()
            .map(Some)
            .ok_or_else(|| PortError::Unexpected("Question insert returned no rows".to_string()))
    }
}
