//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use interview_core::ports::{
    AudioAnalysisService, BlobStorageService, DatabaseService, QuestionGenerationService,
    ResumeParsingService, ScoringService,
};
use interview_core::{
    AggregationEngine, AnswerPipeline, QuestionContinuation, QuestionSource, ResumeIntake,
    SessionManager, VoiceIntake,
};
use std::sync::Arc;

/// Every outbound port the service depends on. Built once in `main` (or by a
/// test) and wired into the core services by `AppState::new`.
#[derive(Clone)]
pub struct Adapters {
    pub db: Arc<dyn DatabaseService>,
    pub generator: Arc<dyn QuestionGenerationService>,
    pub scorer: Arc<dyn ScoringService>,
    pub parser: Arc<dyn ResumeParsingService>,
    pub analyzer: Arc<dyn AudioAnalysisService>,
    pub blobs: Arc<dyn BlobStorageService>,
}

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub sessions: SessionManager,
    pub answers: AnswerPipeline,
    pub aggregation: AggregationEngine,
    pub resumes: ResumeIntake,
    pub voice: VoiceIntake,
}

impl AppState {
    pub fn new(config: Arc<Config>, adapters: Adapters) -> Self {
        let Adapters {
            db,
            generator,
            scorer,
            parser,
            analyzer,
            blobs,
        } = adapters;

        let aggregation = AggregationEngine::new(db.clone());
        let source = QuestionSource::new(generator.clone(), db.clone(), config.fallback_pool_size);
        let sessions = SessionManager::new(db.clone(), source, aggregation.clone());
        let continuation = QuestionContinuation::new(generator, db.clone());
        let answers = AnswerPipeline::new(db.clone(), scorer, sessions.clone(), continuation);
        let resumes = ResumeIntake::new(db.clone(), parser);
        let voice = VoiceIntake::new(db.clone(), blobs, analyzer, config.max_upload_bytes);

        Self {
            db,
            config,
            sessions,
            answers,
            aggregation,
            resumes,
            voice,
        }
    }
}
