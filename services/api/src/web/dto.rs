//! services/api/src/web/dto.rs
//!
//! JSON shapes of the REST API. Domain types stay serde-free; every response
//! body is built from them here.

use chrono::{DateTime, Utc};
use interview_core::aggregation::{
    AvgScores, DashboardStats, ProgressPoint, RecentSession, ReportEntry, SessionReport,
    TopicMastery,
};
use interview_core::domain::{
    Answer, AudioAnalysis, Evaluation, InterviewSession, Question, ResumeProfile, Score,
};
use interview_core::{AnswerOutcome, SessionWithQuestions, VoiceUploadOutcome};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Entities
//=========================================================================================

#[derive(Serialize, ToSchema, Debug)]
pub struct SessionDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_profile_id: Option<Uuid>,
    /// `in_progress` or `completed`.
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_score: Option<f64>,
}

impl From<InterviewSession> for SessionDto {
    fn from(s: InterviewSession) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            resume_profile_id: s.resume_profile_id,
            status: s.status.to_string(),
            start_time: s.start_time,
            end_time: s.end_time,
            total_score: s.total_score,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct QuestionDto {
    pub id: Uuid,
    pub session_id: Uuid,
    pub topic: String,
    pub question_text: String,
    pub ideal_answer_keywords: Vec<String>,
    pub ideal_answer_text: Option<String>,
    /// 1 (easiest) to 5.
    pub difficulty_level: u8,
    pub created_at: DateTime<Utc>,
}

impl From<Question> for QuestionDto {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            session_id: q.session_id,
            topic: q.topic,
            question_text: q.question_text,
            ideal_answer_keywords: q.ideal_answer_keywords,
            ideal_answer_text: q.ideal_answer_text,
            difficulty_level: q.difficulty.level(),
            created_at: q.created_at,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct AnswerDto {
    pub id: Uuid,
    pub session_id: Uuid,
    pub question_id: Uuid,
    pub answer_text: Option<String>,
    pub audio_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Answer> for AnswerDto {
    fn from(a: Answer) -> Self {
        Self {
            id: a.id,
            session_id: a.session_id,
            question_id: a.question_id,
            answer_text: a.answer_text,
            audio_url: a.audio_url,
            created_at: a.created_at,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct EvaluationDto {
    pub semantic_score: Option<f64>,
    pub grammar_score: Option<f64>,
    pub keyword_score: Option<f64>,
    pub final_score: Option<f64>,
    pub feedback_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

impl From<Evaluation> for EvaluationDto {
    fn from(e: Evaluation) -> Self {
        Self {
            semantic_score: e.semantic_score,
            grammar_score: e.grammar_score,
            keyword_score: e.keyword_score,
            final_score: e.final_score,
            feedback_text: e.feedback_text,
            transcript: e.transcript,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ScoreDto {
    pub id: Uuid,
    pub answer_id: Uuid,
    pub semantic_score: Option<f64>,
    pub grammar_score: Option<f64>,
    pub keyword_score: Option<f64>,
    pub final_score: Option<f64>,
    pub feedback_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Score> for ScoreDto {
    fn from(s: Score) -> Self {
        Self {
            id: s.id,
            answer_id: s.answer_id,
            semantic_score: s.semantic_score,
            grammar_score: s.grammar_score,
            keyword_score: s.keyword_score,
            final_score: s.final_score,
            feedback_text: s.feedback_text,
            created_at: s.created_at,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ResumeProfileDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_text: String,
    pub parsed_skills: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ResumeProfile> for ResumeProfileDto {
    fn from(p: ResumeProfile) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            resume_text: p.resume_text,
            parsed_skills: p.parsed_skills,
            created_at: p.created_at,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct AudioAnalysisDto {
    pub transcript: Option<String>,
    pub wpm: Option<f64>,
    pub fluency_score: Option<f64>,
    pub confidence_score: Option<f64>,
    pub filler_words: Option<u32>,
    pub pause_duration: Option<f64>,
}

impl From<AudioAnalysis> for AudioAnalysisDto {
    fn from(a: AudioAnalysis) -> Self {
        Self {
            transcript: a.transcript,
            wpm: a.wpm,
            fluency_score: a.fluency_score,
            confidence_score: a.confidence_score,
            filler_words: a.filler_words,
            pause_duration: a.pause_duration,
        }
    }
}

//=========================================================================================
// Interview Requests and Responses
//=========================================================================================

/// Accepts both camelCase and snake_case keys.
#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    #[serde(default, alias = "resume_id")]
    pub resume_id: Option<Uuid>,
    #[serde(default)]
    pub topics: Option<Vec<String>>,
    #[serde(default, alias = "skip_resume")]
    pub skip_resume: Option<bool>,
}

#[derive(Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    #[serde(default, alias = "session_id")]
    pub session_id: Option<Uuid>,
    #[serde(default, alias = "question_id")]
    pub question_id: Option<Uuid>,
    #[serde(default, alias = "answer_text")]
    pub answer_text: Option<String>,
    #[serde(default, alias = "audio_url")]
    pub audio_url: Option<String>,
}

#[derive(Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionRequest {
    #[serde(default, alias = "session_id")]
    pub session_id: Option<Uuid>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct SessionWithQuestionsResponse {
    pub session: SessionDto,
    pub questions: Vec<QuestionDto>,
}

impl From<SessionWithQuestions> for SessionWithQuestionsResponse {
    fn from(s: SessionWithQuestions) -> Self {
        Self {
            session: s.session.into(),
            questions: s.questions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct SubmitAnswerResponse {
    pub answer: AnswerDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationDto>,
    pub next_question: Option<QuestionDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<AnswerOutcome> for SubmitAnswerResponse {
    fn from(o: AnswerOutcome) -> Self {
        Self {
            answer: o.answer.into(),
            evaluation: o.evaluation.map(Into::into),
            next_question: o.next_question.map(Into::into),
            message: o.message,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct EndSessionResponse {
    pub message: String,
    pub session: SessionDto,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ReportQuestionDto {
    #[serde(flatten)]
    pub question: QuestionDto,
    pub answer: Option<AnswerDto>,
    pub score: Option<ScoreDto>,
}

impl From<ReportEntry> for ReportQuestionDto {
    fn from(e: ReportEntry) -> Self {
        Self {
            question: e.question.into(),
            answer: e.answer.map(Into::into),
            score: e.score.map(Into::into),
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ReportResponse {
    pub session: SessionDto,
    pub questions: Vec<ReportQuestionDto>,
}

impl From<SessionReport> for ReportResponse {
    fn from(r: SessionReport) -> Self {
        Self {
            session: r.session.into(),
            questions: r.entries.into_iter().map(Into::into).collect(),
        }
    }
}

//=========================================================================================
// Dashboard
//=========================================================================================

#[derive(Serialize, ToSchema, Debug)]
pub struct AvgScoresDto {
    pub semantic: i64,
    pub grammar: i64,
    pub keyword: i64,
    pub overall: i64,
}

impl From<AvgScores> for AvgScoresDto {
    fn from(a: AvgScores) -> Self {
        Self {
            semantic: a.semantic,
            grammar: a.grammar,
            keyword: a.keyword,
            overall: a.overall,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StatsDto {
    pub total_sessions: usize,
    pub avg_scores: AvgScoresDto,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct RecentSessionDto {
    #[serde(flatten)]
    pub session: SessionDto,
    pub topics: Vec<String>,
}

impl From<RecentSession> for RecentSessionDto {
    fn from(r: RecentSession) -> Self {
        Self {
            session: r.session.into(),
            topics: r.topics,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ProgressPointDto {
    /// Short weekday name, e.g. `Mon`.
    pub date: String,
    pub score: i64,
}

impl From<ProgressPoint> for ProgressPointDto {
    fn from(p: ProgressPoint) -> Self {
        Self {
            date: p.date,
            score: p.score,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TopicMasteryDto {
    pub topic: String,
    pub score: i64,
    pub full_mark: u32,
}

impl From<TopicMastery> for TopicMasteryDto {
    fn from(t: TopicMastery) -> Self {
        Self {
            topic: t.topic,
            score: t.score,
            full_mark: t.full_mark,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub stats: StatsDto,
    pub recent_sessions: Vec<RecentSessionDto>,
    pub progress_history: Vec<ProgressPointDto>,
    pub topic_mastery: Vec<TopicMasteryDto>,
}

impl From<DashboardStats> for DashboardResponse {
    fn from(d: DashboardStats) -> Self {
        Self {
            stats: StatsDto {
                total_sessions: d.total_sessions,
                avg_scores: d.avg_scores.into(),
            },
            recent_sessions: d.recent_sessions.into_iter().map(Into::into).collect(),
            progress_history: d.progress_history.into_iter().map(Into::into).collect(),
            topic_mastery: d.topic_mastery.into_iter().map(Into::into).collect(),
        }
    }
}

//=========================================================================================
// Uploads
//=========================================================================================

#[derive(Serialize, ToSchema, Debug)]
pub struct ResumeUploadResponse {
    pub message: String,
    pub profile: ResumeProfileDto,
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VoiceUploadResponse {
    pub message: String,
    pub filename: String,
    pub public_url: String,
    pub upload_id: Option<Uuid>,
    pub analysis: Option<AudioAnalysisDto>,
}

impl From<VoiceUploadOutcome> for VoiceUploadResponse {
    fn from(o: VoiceUploadOutcome) -> Self {
        Self {
            message: "Audio processed and uploaded successfully".to_string(),
            filename: o.filename,
            public_url: o.public_url,
            upload_id: o.upload_id,
            analysis: o.analysis.map(Into::into),
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct MessageResponse {
    pub message: String,
}
