//! # Interview Test Utilities
//!
//! In-memory implementations of every port in `interview_core`, plus a
//! `CoreHarness` that wires them into the real core services. Used by the
//! integration tests of both the core crate and the api service.

// Not every helper is used by every test binary.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use interview_core::{
    aggregation::AggregationEngine,
    domain::{
        Answer, AudioAnalysis, Evaluation, GeneratedQuestion, InterviewSession, NewAnswer,
        NewQuestion, NewVoiceUpload, ParsedResume, Question, ResumeProfile, Score, ScoreRequest,
        SessionStatus, User, UserCredentials, VoiceUpload,
    },
    ports::{
        AudioAnalysisService, BlobStorageService, DatabaseService, PortError, PortResult,
        QuestionGenerationService, ResumeParsingService, ScoringService,
    },
    AnswerPipeline, Difficulty, QuestionContinuation, QuestionSource, ResumeIntake,
    SessionManager, VoiceIntake,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

//=========================================================================================
// In-Memory Database
//=========================================================================================

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    auth_sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    resume_profiles: Vec<ResumeProfile>,
    sessions: Vec<InterviewSession>,
    questions: Vec<Question>,
    pool: Vec<NewQuestion>,
    answers: Vec<Answer>,
    scores: Vec<Score>,
    voice_uploads: Vec<VoiceUpload>,
    ticks: i64,
}

impl Tables {
    /// A strictly increasing timestamp so creation order is unambiguous.
    fn tick(&mut self, base: DateTime<Utc>) -> DateTime<Utc> {
        self.ticks += 1;
        base + Duration::milliseconds(self.ticks)
    }
}

/// A `DatabaseService` backed by plain vectors.
pub struct InMemoryDb {
    tables: Mutex<Tables>,
    base_time: DateTime<Utc>,
    pub resume_lookups: AtomicUsize,
    pub fail_answer_writes: AtomicBool,
    pub fail_score_writes: AtomicBool,
    pub fail_question_writes: AtomicBool,
    /// Fails this many question writes, then recovers.
    pub failing_question_writes: AtomicUsize,
    pub fail_voice_upload_writes: AtomicBool,
}

impl Default for InMemoryDb {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            base_time: Utc::now(),
            resume_lookups: AtomicUsize::new(0),
            fail_answer_writes: AtomicBool::new(false),
            fail_score_writes: AtomicBool::new(false),
            fail_question_writes: AtomicBool::new(false),
            failing_question_writes: AtomicUsize::new(0),
            fail_voice_upload_writes: AtomicBool::new(false),
        }
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("in-memory tables poisoned")
    }

    /// Seeds the static fallback pool with `count` generic questions.
    pub fn seed_pool(&self, count: usize) {
        let mut tables = self.tables();
        for i in 0..count {
            tables.pool.push(NewQuestion {
                topic: "General".to_string(),
                question_text: format!("Pool question #{}", i + 1),
                ideal_answer_keywords: vec!["pool".to_string()],
                ideal_answer_text: None,
                difficulty: Difficulty::default(),
            });
        }
    }

    pub fn seed_resume(&self, user_id: Uuid, resume_text: &str) -> ResumeProfile {
        let mut tables = self.tables();
        let created_at = tables.tick(self.base_time);
        let profile = ResumeProfile {
            id: Uuid::new_v4(),
            user_id,
            resume_text: resume_text.to_string(),
            parsed_skills: vec![],
            created_at,
        };
        tables.resume_profiles.push(profile.clone());
        profile
    }

    pub fn insert_user(&self, email: &str) -> User {
        let user = UserCredentials {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: String::new(),
        };
        self.tables().users.push(user.clone());
        User {
            user_id: user.user_id,
            email: user.email,
        }
    }

    pub fn answers(&self) -> Vec<Answer> {
        self.tables().answers.clone()
    }

    pub fn scores(&self) -> Vec<Score> {
        self.tables().scores.clone()
    }

    pub fn questions(&self) -> Vec<Question> {
        self.tables().questions.clone()
    }

    pub fn voice_uploads(&self) -> Vec<VoiceUpload> {
        self.tables().voice_uploads.clone()
    }

    pub fn resume_profiles(&self) -> Vec<ResumeProfile> {
        self.tables().resume_profiles.clone()
    }
}

fn injected(what: &str) -> PortError {
    PortError::Unexpected(format!("injected {} failure", what))
}

#[async_trait]
impl DatabaseService for InMemoryDb {
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User> {
        let mut tables = self.tables();
        if tables.users.iter().any(|u| u.email == email) {
            return Err(PortError::InvalidInput(format!("User {} already exists", email)));
        }
        let creds = UserCredentials {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
        };
        tables.users.push(creds.clone());
        Ok(User {
            user_id: creds.user_id,
            email: creds.email,
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.tables()
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn create_auth_session(&self, token: &str, user_id: Uuid, expires_at: DateTime<Utc>) -> PortResult<()> {
        self.tables()
            .auth_sessions
            .insert(token.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, token: &str) -> PortResult<User> {
        let tables = self.tables();
        let (user_id, expires_at) = tables
            .auth_sessions
            .get(token)
            .copied()
            .ok_or(PortError::Unauthorized)?;
        if expires_at <= Utc::now() {
            return Err(PortError::Unauthorized);
        }
        tables
            .users
            .iter()
            .find(|u| u.user_id == user_id)
            .map(|u| User {
                user_id: u.user_id,
                email: u.email.clone(),
            })
            .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, token: &str) -> PortResult<()> {
        self.tables().auth_sessions.remove(token);
        Ok(())
    }

    async fn create_resume_profile(
        &self,
        user_id: Uuid,
        resume_text: &str,
        parsed_skills: &[String],
    ) -> PortResult<ResumeProfile> {
        let mut tables = self.tables();
        let created_at = tables.tick(self.base_time);
        let profile = ResumeProfile {
            id: Uuid::new_v4(),
            user_id,
            resume_text: resume_text.to_string(),
            parsed_skills: parsed_skills.to_vec(),
            created_at,
        };
        tables.resume_profiles.push(profile.clone());
        Ok(profile)
    }

    async fn get_resume_profile(&self, profile_id: Uuid) -> PortResult<ResumeProfile> {
        self.resume_lookups.fetch_add(1, Ordering::SeqCst);
        self.tables()
            .resume_profiles
            .iter()
            .find(|p| p.id == profile_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Resume profile {} not found", profile_id)))
    }

    async fn get_latest_resume_profile(&self, user_id: Uuid) -> PortResult<Option<ResumeProfile>> {
        self.resume_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .tables()
            .resume_profiles
            .iter()
            .filter(|p| p.user_id == user_id)
            .max_by_key(|p| p.created_at)
            .cloned())
    }

    async fn create_interview_session(
        &self,
        user_id: Uuid,
        resume_profile_id: Option<Uuid>,
    ) -> PortResult<InterviewSession> {
        let mut tables = self.tables();
        let start_time = tables.tick(self.base_time);
        let session = InterviewSession {
            id: Uuid::new_v4(),
            user_id,
            resume_profile_id,
            status: SessionStatus::InProgress,
            start_time,
            end_time: None,
            total_score: None,
        };
        tables.sessions.push(session.clone());
        Ok(session)
    }

    async fn get_interview_session(&self, session_id: Uuid) -> PortResult<InterviewSession> {
        self.tables()
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))
    }

    async fn complete_interview_session(
        &self,
        session_id: Uuid,
        end_time: DateTime<Utc>,
        total_score: Option<f64>,
    ) -> PortResult<InterviewSession> {
        let mut tables = self.tables();
        let session = tables
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))?;
        session.status = SessionStatus::Completed;
        session.end_time = Some(end_time);
        session.total_score = total_score;
        Ok(session.clone())
    }

    async fn list_sessions_for_user(&self, user_id: Uuid) -> PortResult<Vec<InterviewSession>> {
        let mut sessions: Vec<InterviewSession> = self
            .tables()
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(sessions)
    }

    async fn insert_questions(&self, session_id: Uuid, questions: &[NewQuestion]) -> PortResult<Vec<Question>> {
        if self.fail_question_writes.load(Ordering::SeqCst) {
            return Err(injected("question write"));
        }
        if self
            .failing_question_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(injected("question write"));
        }
        let mut tables = self.tables();
        let mut inserted = Vec::with_capacity(questions.len());
        for q in questions {
            let created_at = tables.tick(self.base_time);
            let question = Question {
                id: Uuid::new_v4(),
                session_id,
                topic: q.topic.clone(),
                question_text: q.question_text.clone(),
                ideal_answer_keywords: q.ideal_answer_keywords.clone(),
                ideal_answer_text: q.ideal_answer_text.clone(),
                difficulty: q.difficulty,
                created_at,
            };
            tables.questions.push(question.clone());
            inserted.push(question);
        }
        Ok(inserted)
    }

    async fn get_question(&self, question_id: Uuid) -> PortResult<Question> {
        self.tables()
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Question {} not found", question_id)))
    }

    async fn list_questions_for_sessions(&self, session_ids: &[Uuid]) -> PortResult<Vec<Question>> {
        let mut questions: Vec<Question> = self
            .tables()
            .questions
            .iter()
            .filter(|q| session_ids.contains(&q.session_id))
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.created_at);
        Ok(questions)
    }

    async fn sample_question_pool(&self, limit: usize) -> PortResult<Vec<NewQuestion>> {
        Ok(self.tables().pool.iter().take(limit).cloned().collect())
    }

    async fn create_answer(&self, answer: NewAnswer) -> PortResult<Answer> {
        if self.fail_answer_writes.load(Ordering::SeqCst) {
            return Err(injected("answer write"));
        }
        let mut tables = self.tables();
        let created_at = tables.tick(self.base_time);
        let answer = Answer {
            id: Uuid::new_v4(),
            session_id: answer.session_id,
            question_id: answer.question_id,
            answer_text: answer.answer_text,
            audio_url: answer.audio_url,
            created_at,
        };
        tables.answers.push(answer.clone());
        Ok(answer)
    }

    async fn list_answers_for_sessions(&self, session_ids: &[Uuid]) -> PortResult<Vec<Answer>> {
        Ok(self
            .tables()
            .answers
            .iter()
            .filter(|a| session_ids.contains(&a.session_id))
            .cloned()
            .collect())
    }

    async fn create_score(&self, answer_id: Uuid, evaluation: &Evaluation) -> PortResult<Score> {
        if self.fail_score_writes.load(Ordering::SeqCst) {
            return Err(injected("score write"));
        }
        let mut tables = self.tables();
        let created_at = tables.tick(self.base_time);
        let score = Score {
            id: Uuid::new_v4(),
            answer_id,
            semantic_score: evaluation.semantic_score,
            grammar_score: evaluation.grammar_score,
            keyword_score: evaluation.keyword_score,
            final_score: evaluation.final_score,
            feedback_text: evaluation.feedback_text.clone(),
            created_at,
        };
        tables.scores.push(score.clone());
        Ok(score)
    }

    async fn list_scores_for_answers(&self, answer_ids: &[Uuid]) -> PortResult<Vec<Score>> {
        Ok(self
            .tables()
            .scores
            .iter()
            .filter(|s| answer_ids.contains(&s.answer_id))
            .cloned()
            .collect())
    }

    async fn create_voice_upload(&self, upload: NewVoiceUpload) -> PortResult<VoiceUpload> {
        if self.fail_voice_upload_writes.load(Ordering::SeqCst) {
            return Err(injected("voice upload write"));
        }
        let mut tables = self.tables();
        let created_at = tables.tick(self.base_time);
        let record = VoiceUpload {
            id: Uuid::new_v4(),
            session_id: upload.session_id,
            filename: upload.filename,
            storage_path: upload.storage_path,
            public_url: upload.public_url,
            file_size_bytes: upload.file_size_bytes,
            mime_type: upload.mime_type,
            created_at,
        };
        tables.voice_uploads.push(record.clone());
        Ok(record)
    }
}

//=========================================================================================
// ML Service Stubs
//=========================================================================================

/// A generator that either returns a fixed batch or is unreachable.
#[derive(Default)]
pub struct StubGenerator {
    batch: Mutex<Option<Vec<GeneratedQuestion>>>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl StubGenerator {
    pub fn available(batch: Vec<GeneratedQuestion>) -> Self {
        Self {
            batch: Mutex::new(Some(batch)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn set_batch(&self, batch: Option<Vec<GeneratedQuestion>>) {
        *self.batch.lock().expect("stub poisoned") = batch;
    }

    /// Every `(resume_text, topics)` pair the generator was called with.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().expect("stub poisoned").clone()
    }
}

#[async_trait]
impl QuestionGenerationService for StubGenerator {
    async fn generate_questions(&self, resume_text: &str, topics: &[String]) -> PortResult<Vec<GeneratedQuestion>> {
        self.calls
            .lock()
            .expect("stub poisoned")
            .push((resume_text.to_string(), topics.to_vec()));
        self.batch
            .lock()
            .expect("stub poisoned")
            .clone()
            .ok_or_else(|| PortError::Unavailable("generator offline".to_string()))
    }
}

/// A scorer that either returns a fixed evaluation or is unreachable.
#[derive(Default)]
pub struct StubScorer {
    evaluation: Mutex<Option<Evaluation>>,
    requests: Mutex<Vec<ScoreRequest>>,
}

impl StubScorer {
    pub fn available(evaluation: Evaluation) -> Self {
        Self {
            evaluation: Mutex::new(Some(evaluation)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn set_evaluation(&self, evaluation: Option<Evaluation>) {
        *self.evaluation.lock().expect("stub poisoned") = evaluation;
    }

    pub fn requests(&self) -> Vec<ScoreRequest> {
        self.requests.lock().expect("stub poisoned").clone()
    }
}

#[async_trait]
impl ScoringService for StubScorer {
    async fn score_answer(&self, request: &ScoreRequest) -> PortResult<Evaluation> {
        self.requests.lock().expect("stub poisoned").push(request.clone());
        self.evaluation
            .lock()
            .expect("stub poisoned")
            .clone()
            .ok_or_else(|| PortError::Unavailable("scorer offline".to_string()))
    }
}

/// A resume parser that echoes the upload back as text.
#[derive(Default)]
pub struct StubResumeParser {
    pub offline: AtomicBool,
}

#[async_trait]
impl ResumeParsingService for StubResumeParser {
    async fn parse_resume(&self, _filename: &str, content: Bytes) -> PortResult<ParsedResume> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("parser offline".to_string()));
        }
        Ok(ParsedResume {
            skills: vec!["Rust".to_string(), "SQL".to_string()],
            extracted_text: String::from_utf8_lossy(&content).into_owned(),
        })
    }
}

#[derive(Default)]
pub struct StubAudioAnalyzer {
    pub offline: AtomicBool,
}

#[async_trait]
impl AudioAnalysisService for StubAudioAnalyzer {
    async fn analyze_audio(&self, _filename: &str, _mime_type: &str, _content: Bytes) -> PortResult<AudioAnalysis> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("analyzer offline".to_string()));
        }
        Ok(AudioAnalysis {
            transcript: Some("Transcribed text...".to_string()),
            wpm: Some(120.0),
            filler_words: Some(2),
            ..Default::default()
        })
    }
}

/// Blob storage that keeps uploads in memory.
#[derive(Default)]
pub struct InMemoryBlobs {
    objects: Mutex<HashMap<String, (Bytes, String)>>,
}

impl InMemoryBlobs {
    pub fn get(&self, path: &str) -> Option<(Bytes, String)> {
        self.objects.lock().expect("blobs poisoned").get(path).cloned()
    }
}

#[async_trait]
impl BlobStorageService for InMemoryBlobs {
    async fn upload(&self, path: &str, content: Bytes, content_type: &str) -> PortResult<String> {
        self.objects
            .lock()
            .expect("blobs poisoned")
            .insert(path.to_string(), (content, content_type.to_string()));
        Ok(self.public_url(path))
    }

    fn public_url(&self, path: &str) -> String {
        format!("http://blobs.test/media/{}", path)
    }
}

//=========================================================================================
// Fixtures
//=========================================================================================

pub fn generated(text: &str, topic: &str, difficulty: Option<f64>) -> GeneratedQuestion {
    GeneratedQuestion {
        question_text: text.to_string(),
        topic: Some(topic.to_string()),
        difficulty_level: difficulty,
        ideal_answer_keywords: Some(vec![topic.to_lowercase()]),
        ideal_answer_text: Some(format!("An ideal answer about {}.", topic)),
    }
}

pub fn evaluation(final_score: f64) -> Evaluation {
    Evaluation {
        semantic_score: Some(final_score),
        grammar_score: Some(final_score),
        keyword_score: Some(final_score),
        final_score: Some(final_score),
        feedback_text: Some("Solid answer.".to_string()),
        transcript: None,
    }
}

//=========================================================================================
// Harness
//=========================================================================================

/// All core services wired to in-memory ports.
pub struct CoreHarness {
    pub db: Arc<InMemoryDb>,
    pub generator: Arc<StubGenerator>,
    pub scorer: Arc<StubScorer>,
    pub parser: Arc<StubResumeParser>,
    pub analyzer: Arc<StubAudioAnalyzer>,
    pub blobs: Arc<InMemoryBlobs>,
    pub sessions: SessionManager,
    pub answers: AnswerPipeline,
    pub aggregation: AggregationEngine,
    pub resumes: ResumeIntake,
    pub voice: VoiceIntake,
}

pub const TEST_FALLBACK_POOL_SIZE: usize = 10;
pub const TEST_MAX_UPLOAD_BYTES: usize = 1024;

impl CoreHarness {
    pub fn new(generator: StubGenerator, scorer: StubScorer) -> Self {
        let db = Arc::new(InMemoryDb::new());
        let generator = Arc::new(generator);
        let scorer = Arc::new(scorer);
        let parser = Arc::new(StubResumeParser::default());
        let analyzer = Arc::new(StubAudioAnalyzer::default());
        let blobs = Arc::new(InMemoryBlobs::default());

        let aggregation = AggregationEngine::new(db.clone());
        let source = QuestionSource::new(generator.clone(), db.clone(), TEST_FALLBACK_POOL_SIZE);
        let sessions = SessionManager::new(db.clone(), source, aggregation.clone());
        let continuation = QuestionContinuation::new(generator.clone(), db.clone());
        let answers = AnswerPipeline::new(db.clone(), scorer.clone(), sessions.clone(), continuation);
        let resumes = ResumeIntake::new(db.clone(), parser.clone());
        let voice = VoiceIntake::new(db.clone(), blobs.clone(), analyzer.clone(), TEST_MAX_UPLOAD_BYTES);

        Self {
            db,
            generator,
            scorer,
            parser,
            analyzer,
            blobs,
            sessions,
            answers,
            aggregation,
            resumes,
            voice,
        }
    }
}
