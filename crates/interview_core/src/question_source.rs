//! crates/interview_core/src/question_source.rs
//!
//! Supplies the initial batch of questions for a new session, either from the
//! external generator or from the static fallback pool.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::NewQuestion;
use crate::ports::{DatabaseService, QuestionGenerationService};
use crate::sanitize::{sanitize_question, Difficulty};

/// Resume text sent to the generator when the candidate has none.
pub const NO_RESUME_PLACEHOLDER: &str =
    "No resume provided. Candidate is interviewing based on selected topics only.";

/// Default number of fallback questions handed out per session.
pub const DEFAULT_FALLBACK_POOL_SIZE: usize = 10;

#[derive(Clone)]
pub struct QuestionSource {
    generator: Arc<dyn QuestionGenerationService>,
    db: Arc<dyn DatabaseService>,
    fallback_limit: usize,
}

impl QuestionSource {
    pub fn new(
        generator: Arc<dyn QuestionGenerationService>,
        db: Arc<dyn DatabaseService>,
        fallback_limit: usize,
    ) -> Self {
        Self {
            generator,
            db,
            fallback_limit,
        }
    }

    /// Returns an unbound question batch. Never fails: generation problems fall
    /// through to the pool, and pool problems yield an empty list.
    pub async fn initial_batch(&self, resume_text: Option<&str>, topics: &[String]) -> Vec<NewQuestion> {
        if !topics.is_empty() {
            match self.generate(resume_text, topics).await {
                Some(batch) => return batch,
                None => info!("Falling back to the static question pool."),
            }
        }
        self.fallback_batch().await
    }

    /// Samples the static pool. Pool problems yield an empty list.
    pub async fn fallback_batch(&self) -> Vec<NewQuestion> {
        match self.db.sample_question_pool(self.fallback_limit).await {
            Ok(pool) => pool,
            Err(e) => {
                warn!("Failed to read the fallback question pool: {:?}", e);
                Vec::new()
            }
        }
    }

    async fn generate(&self, resume_text: Option<&str>, topics: &[String]) -> Option<Vec<NewQuestion>> {
        let resume_text = resume_text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(NO_RESUME_PLACEHOLDER);

        let generated = match self.generator.generate_questions(resume_text, topics).await {
            Ok(generated) => generated,
            Err(e) => {
                warn!("Question generation failed: {:?}", e);
                return None;
            }
        };
        info!("Received {} generated questions.", generated.len());

        let fallback_topic = topics.first().map(String::as_str);
        let batch: Vec<NewQuestion> = generated
            .into_iter()
            .filter(|q| !q.question_text.trim().is_empty())
            .map(|q| sanitize_question(q, fallback_topic, Difficulty::INITIAL_DEFAULT))
            .collect();

        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}
