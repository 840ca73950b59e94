//! crates/interview_core/src/answer_pipeline.rs
//!
//! Accepts one answer, scores it best-effort and extends the session.
//!
//! Only persisting the answer itself can fail the request. The scorer is
//! called exactly once; when it is unavailable the answer stands alone with no
//! score and no follow-up question.

use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::continuation::QuestionContinuation;
use crate::domain::{Answer, Evaluation, NewAnswer, Question, ScoreRequest};
use crate::ports::{DatabaseService, PortResult, ScoringService};
use crate::session::SessionManager;

/// Message returned with an answer whose scoring is pending.
pub const SCORING_PENDING_MESSAGE: &str = "Answer saved, scoring pending (ML unavailable)";

#[derive(Debug, Clone, Default)]
pub struct SubmitAnswer {
    pub session_id: Uuid,
    pub question_id: Uuid,
    pub answer_text: Option<String>,
    pub audio_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub answer: Answer,
    pub evaluation: Option<Evaluation>,
    pub next_question: Option<Question>,
    pub message: Option<String>,
}

impl AnswerOutcome {
    pub fn is_pending(&self) -> bool {
        self.evaluation.is_none()
    }
}

#[derive(Clone)]
pub struct AnswerPipeline {
    db: Arc<dyn DatabaseService>,
    scorer: Arc<dyn ScoringService>,
    sessions: SessionManager,
    continuation: QuestionContinuation,
}

impl AnswerPipeline {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        scorer: Arc<dyn ScoringService>,
        sessions: SessionManager,
        continuation: QuestionContinuation,
    ) -> Self {
        Self {
            db,
            scorer,
            sessions,
            continuation,
        }
    }

    pub async fn submit_answer(&self, user_id: Uuid, submission: SubmitAnswer) -> PortResult<AnswerOutcome> {
        let session = self.sessions.owned_session(user_id, submission.session_id).await?;

        // --- 1. Persist the answer (critical path) ---
        let answer = self
            .db
            .create_answer(NewAnswer {
                session_id: submission.session_id,
                question_id: submission.question_id,
                answer_text: submission.answer_text.clone(),
                audio_url: submission.audio_url.clone(),
            })
            .await?;
        info!("Saved answer {} for question {}", answer.id, answer.question_id);

        // --- 2. Load the parent question for the scoring payload ---
        let question = match self.db.get_question(submission.question_id).await {
            Ok(question) => Some(question),
            Err(e) => {
                warn!("Question {} unavailable for scoring: {:?}", submission.question_id, e);
                None
            }
        };

        let request = ScoreRequest {
            answer_text: submission.answer_text,
            audio_url: submission.audio_url,
            question_text: question.as_ref().map(|q| q.question_text.clone()),
            ideal_keywords: question.as_ref().map(|q| q.ideal_answer_keywords.clone()),
            ideal_answer_text: question.as_ref().and_then(|q| q.ideal_answer_text.clone()),
        };

        // --- 3. Score once; an unavailable scorer leaves the answer pending ---
        let evaluation = match self.scorer.score_answer(&request).await {
            Ok(evaluation) => evaluation,
            Err(e) => {
                error!("Scoring service unavailable for answer {}: {:?}", answer.id, e);
                return Ok(AnswerOutcome {
                    answer,
                    evaluation: None,
                    next_question: None,
                    message: Some(SCORING_PENDING_MESSAGE.to_string()),
                });
            }
        };

        // --- 4. Persist the score; failures do not affect the response ---
        if let Err(e) = self.db.create_score(answer.id, &evaluation).await {
            error!("Error saving score for answer {}: {:?}", answer.id, e);
        }

        // --- 5. Adaptive continuation ---
        let next_question = self.continuation.next_question(&session, question.as_ref()).await;

        Ok(AnswerOutcome {
            answer,
            evaluation: Some(evaluation),
            next_question,
            message: None,
        })
    }
}
