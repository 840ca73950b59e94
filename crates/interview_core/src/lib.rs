pub mod aggregation;
pub mod answer_pipeline;
pub mod continuation;
pub mod domain;
pub mod ports;
pub mod question_source;
pub mod sanitize;
pub mod session;
pub mod uploads;

pub use aggregation::{AggregationEngine, DashboardStats, ReportEntry, SessionReport};
pub use answer_pipeline::{AnswerOutcome, AnswerPipeline, SubmitAnswer};
pub use continuation::QuestionContinuation;
pub use domain::{
    Answer, AudioAnalysis, AuthSession, Evaluation, GeneratedQuestion, InterviewSession,
    NewAnswer, NewQuestion, NewVoiceUpload, ParsedResume, Question, ResumeProfile, Score,
    ScoreRequest, SessionStatus, User, UserCredentials, VoiceUpload,
};
pub use ports::{
    AudioAnalysisService, BlobStorageService, DatabaseService, PortError, PortResult,
    QuestionGenerationService, ResumeParsingService, ScoringService,
};
pub use question_source::QuestionSource;
pub use sanitize::Difficulty;
pub use session::{SessionManager, SessionWithQuestions, StartSession};
pub use uploads::{ResumeIntake, VoiceFile, VoiceIntake, VoiceUploadOutcome};
