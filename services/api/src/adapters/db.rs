//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use interview_core::domain::{
    Answer, Evaluation, InterviewSession, NewAnswer, NewQuestion, NewVoiceUpload, Question,
    ResumeProfile, Score, SessionStatus, User, UserCredentials, VoiceUpload,
};
use interview_core::ports::{DatabaseService, PortError, PortResult};
use interview_core::Difficulty;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(what: String) -> impl FnOnce(sqlx::Error) -> PortError {
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
        }
    }

    fn to_credentials(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct ResumeProfileRecord {
    id: Uuid,
    user_id: Uuid,
    resume_text: String,
    parsed_skills: Vec<String>,
    created_at: DateTime<Utc>,
}
impl ResumeProfileRecord {
    fn to_domain(self) -> ResumeProfile {
        ResumeProfile {
            id: self.id,
            user_id: self.user_id,
            resume_text: self.resume_text,
            parsed_skills: self.parsed_skills,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: Uuid,
    user_id: Uuid,
    resume_profile_id: Option<Uuid>,
    status: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    total_score: Option<f64>,
}
impl SessionRecord {
    fn to_domain(self) -> PortResult<InterviewSession> {
        let status = SessionStatus::parse(&self.status).ok_or_else(|| {
            PortError::Unexpected(format!("Unknown session status '{}'", self.status))
        })?;
        Ok(InterviewSession {
            id: self.id,
            user_id: self.user_id,
            resume_profile_id: self.resume_profile_id,
            status,
            start_time: self.start_time,
            end_time: self.end_time,
            total_score: self.total_score,
        })
    }
}

#[derive(FromRow)]
struct QuestionRecord {
    id: Uuid,
    session_id: Uuid,
    topic: String,
    question_text: String,
    ideal_answer_keywords: Vec<String>,
    ideal_answer_text: Option<String>,
    difficulty_level: i16,
    created_at: DateTime<Utc>,
}
impl QuestionRecord {
    fn to_domain(self) -> Question {
        Question {
            id: self.id,
            session_id: self.session_id,
            topic: self.topic,
            question_text: self.question_text,
            ideal_answer_keywords: self.ideal_answer_keywords,
            ideal_answer_text: self.ideal_answer_text,
            difficulty: Difficulty::from_level(self.difficulty_level as i64),
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct PoolQuestionRecord {
    topic: String,
    question_text: String,
    ideal_answer_keywords: Vec<String>,
    ideal_answer_text: Option<String>,
    difficulty_level: i16,
}
impl PoolQuestionRecord {
    fn to_domain(self) -> NewQuestion {
        NewQuestion {
            topic: self.topic,
            question_text: self.question_text,
            ideal_answer_keywords: self.ideal_answer_keywords,
            ideal_answer_text: self.ideal_answer_text,
            difficulty: Difficulty::from_level(self.difficulty_level as i64),
        }
    }
}

#[derive(FromRow)]
struct AnswerRecord {
    id: Uuid,
    session_id: Uuid,
    question_id: Uuid,
    answer_text: Option<String>,
    audio_url: Option<String>,
    created_at: DateTime<Utc>,
}
impl AnswerRecord {
    fn to_domain(self) -> Answer {
        Answer {
            id: self.id,
            session_id: self.session_id,
            question_id: self.question_id,
            answer_text: self.answer_text,
            audio_url: self.audio_url,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ScoreRecord {
    id: Uuid,
    answer_id: Uuid,
    semantic_score: Option<f64>,
    grammar_score: Option<f64>,
    keyword_score: Option<f64>,
    final_score: Option<f64>,
    feedback_text: Option<String>,
    created_at: DateTime<Utc>,
}
impl ScoreRecord {
    fn to_domain(self) -> Score {
        Score {
            id: self.id,
            answer_id: self.answer_id,
            semantic_score: self.semantic_score,
            grammar_score: self.grammar_score,
            keyword_score: self.keyword_score,
            final_score: self.final_score,
            feedback_text: self.feedback_text,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct VoiceUploadRecord {
    id: Uuid,
    session_id: Option<Uuid>,
    filename: String,
    storage_path: String,
    public_url: String,
    file_size_bytes: i64,
    mime_type: String,
    created_at: DateTime<Utc>,
}
impl VoiceUploadRecord {
    fn to_domain(self) -> VoiceUpload {
        VoiceUpload {
            id: self.id,
            session_id: self.session_id,
            filename: self.filename,
            storage_path: self.storage_path,
            public_url: self.public_url,
            file_size_bytes: self.file_size_bytes,
            mime_type: self.mime_type,
            created_at: self.created_at,
        }
    }
}

const SESSION_COLUMNS: &str =
    "id, user_id, resume_profile_id, status, start_time, end_time, total_score";
const QUESTION_COLUMNS: &str = "id, session_id, topic, question_text, ideal_answer_keywords, \
     ideal_answer_text, difficulty_level, created_at";
const SCORE_COLUMNS: &str = "id, answer_id, semantic_score, grammar_score, keyword_score, \
     final_score, feedback_text, created_at";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) \
             RETURNING user_id, email, hashed_password",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                PortError::InvalidInput(format!("User {} already exists", email))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("User {} not found", email)))?;
        Ok(record.to_credentials())
    }

    async fn create_auth_session(&self, token: &str, user_id: Uuid, expires_at: DateTime<Utc>) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, token: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT u.user_id, u.email, u.hashed_password FROM auth_sessions s \
             JOIN users u ON u.user_id = s.user_id \
             WHERE s.token = $1 AND s.expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)?;
        Ok(record.to_domain())
    }

    async fn delete_auth_session(&self, token: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_resume_profile(
        &self,
        user_id: Uuid,
        resume_text: &str,
        parsed_skills: &[String],
    ) -> PortResult<ResumeProfile> {
        let record = sqlx::query_as::<_, ResumeProfileRecord>(
            "INSERT INTO resume_profiles (id, user_id, resume_text, parsed_skills) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, user_id, resume_text, parsed_skills, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(resume_text)
        .bind(parsed_skills)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_resume_profile(&self, profile_id: Uuid) -> PortResult<ResumeProfile> {
        let record = sqlx::query_as::<_, ResumeProfileRecord>(
            "SELECT id, user_id, resume_text, parsed_skills, created_at \
             FROM resume_profiles WHERE id = $1",
        )
        .bind(profile_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("Resume profile {} not found", profile_id)))?;
        Ok(record.to_domain())
    }

    async fn get_latest_resume_profile(&self, user_id: Uuid) -> PortResult<Option<ResumeProfile>> {
        let record = sqlx::query_as::<_, ResumeProfileRecord>(
            "SELECT id, user_id, resume_text, parsed_skills, created_at \
             FROM resume_profiles WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn create_interview_session(
        &self,
        user_id: Uuid,
        resume_profile_id: Option<Uuid>,
    ) -> PortResult<InterviewSession> {
        let sql = format!(
            "INSERT INTO interview_sessions (id, user_id, resume_profile_id, status) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            SESSION_COLUMNS
        );
        let record = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(resume_profile_id)
            .bind(SessionStatus::InProgress.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        record.to_domain()
    }

    async fn get_interview_session(&self, session_id: Uuid) -> PortResult<InterviewSession> {
        let sql = format!("SELECT {} FROM interview_sessions WHERE id = $1", SESSION_COLUMNS);
        let record = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(session_id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found_or_unexpected(format!("Session {} not found", session_id)))?;
        record.to_domain()
    }

    async fn complete_interview_session(
        &self,
        session_id: Uuid,
        end_time: DateTime<Utc>,
        total_score: Option<f64>,
    ) -> PortResult<InterviewSession> {
        let sql = format!(
            "UPDATE interview_sessions SET status = $1, end_time = $2, total_score = $3 \
             WHERE id = $4 RETURNING {}",
            SESSION_COLUMNS
        );
        let record = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(SessionStatus::Completed.as_str())
            .bind(end_time)
            .bind(total_score)
            .bind(session_id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found_or_unexpected(format!("Session {} not found", session_id)))?;
        record.to_domain()
    }

    async fn list_sessions_for_user(&self, user_id: Uuid) -> PortResult<Vec<InterviewSession>> {
        let sql = format!(
            "SELECT {} FROM interview_sessions WHERE user_id = $1 ORDER BY start_time DESC",
            SESSION_COLUMNS
        );
        let records = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn insert_questions(&self, session_id: Uuid, questions: &[NewQuestion]) -> PortResult<Vec<Question>> {
        let sql = format!(
            "INSERT INTO questions (id, session_id, topic, question_text, ideal_answer_keywords, \
             ideal_answer_text, difficulty_level) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            QUESTION_COLUMNS
        );

        // Inserted one by one inside a transaction so created_at follows batch order.
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let mut inserted = Vec::with_capacity(questions.len());
        for q in questions {
            let record = sqlx::query_as::<_, QuestionRecord>(&sql)
                .bind(Uuid::new_v4())
                .bind(session_id)
                .bind(&q.topic)
                .bind(&q.question_text)
                .bind(&q.ideal_answer_keywords)
                .bind(&q.ideal_answer_text)
                .bind(q.difficulty.level() as i16)
                .fetch_one(&mut *tx)
                .await
                .map_err(unexpected)?;
            inserted.push(record.to_domain());
        }
        tx.commit().await.map_err(unexpected)?;
        Ok(inserted)
    }

    async fn get_question(&self, question_id: Uuid) -> PortResult<Question> {
        let sql = format!("SELECT {} FROM questions WHERE id = $1", QUESTION_COLUMNS);
        let record = sqlx::query_as::<_, QuestionRecord>(&sql)
            .bind(question_id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found_or_unexpected(format!("Question {} not found", question_id)))?;
        Ok(record.to_domain())
    }

    async fn list_questions_for_sessions(&self, session_ids: &[Uuid]) -> PortResult<Vec<Question>> {
        let sql = format!(
            "SELECT {} FROM questions WHERE session_id = ANY($1) ORDER BY created_at ASC",
            QUESTION_COLUMNS
        );
        let records = sqlx::query_as::<_, QuestionRecord>(&sql)
            .bind(session_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn sample_question_pool(&self, limit: usize) -> PortResult<Vec<NewQuestion>> {
        let records = sqlx::query_as::<_, PoolQuestionRecord>(
            "SELECT topic, question_text, ideal_answer_keywords, ideal_answer_text, difficulty_level \
             FROM question_pool ORDER BY random() LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_answer(&self, answer: NewAnswer) -> PortResult<Answer> {
        let record = sqlx::query_as::<_, AnswerRecord>(
            "INSERT INTO answers (id, session_id, question_id, answer_text, audio_url) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, session_id, question_id, answer_text, audio_url, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(answer.session_id)
        .bind(answer.question_id)
        .bind(answer.answer_text)
        .bind(answer.audio_url)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_answers_for_sessions(&self, session_ids: &[Uuid]) -> PortResult<Vec<Answer>> {
        let records = sqlx::query_as::<_, AnswerRecord>(
            "SELECT id, session_id, question_id, answer_text, audio_url, created_at \
             FROM answers WHERE session_id = ANY($1) ORDER BY created_at ASC",
        )
        .bind(session_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_score(&self, answer_id: Uuid, evaluation: &Evaluation) -> PortResult<Score> {
        let sql = format!(
            "INSERT INTO ai_scores (id, answer_id, semantic_score, grammar_score, keyword_score, \
             final_score, feedback_text) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            SCORE_COLUMNS
        );
        let record = sqlx::query_as::<_, ScoreRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(answer_id)
            .bind(evaluation.semantic_score)
            .bind(evaluation.grammar_score)
            .bind(evaluation.keyword_score)
            .bind(evaluation.final_score)
            .bind(&evaluation.feedback_text)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_scores_for_answers(&self, answer_ids: &[Uuid]) -> PortResult<Vec<Score>> {
        let sql = format!(
            "SELECT {} FROM ai_scores WHERE answer_id = ANY($1) ORDER BY created_at ASC",
            SCORE_COLUMNS
        );
        let records = sqlx::query_as::<_, ScoreRecord>(&sql)
            .bind(answer_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_voice_upload(&self, upload: NewVoiceUpload) -> PortResult<VoiceUpload> {
        let record = sqlx::query_as::<_, VoiceUploadRecord>(
            "INSERT INTO voice_uploads (id, session_id, filename, storage_path, public_url, \
             file_size_bytes, mime_type) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, session_id, filename, storage_path, public_url, file_size_bytes, \
             mime_type, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(upload.session_id)
        .bind(upload.filename)
        .bind(upload.storage_path)
        .bind(upload.public_url)
        .bind(upload.file_size_bytes)
        .bind(upload.mime_type)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }
}
