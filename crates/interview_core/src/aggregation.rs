//! crates/interview_core/src/aggregation.rs
//!
//! Rolls persisted sessions, questions, answers and scores up into the
//! dashboard and per-session report views.
//!
//! Whenever a question has several answers, or an answer several scores, the
//! most recently created row is canonical. That rule lives here and nowhere
//! else; adapters return plain rows and never pre-select.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Answer, InterviewSession, Question, Score};
use crate::ports::{DatabaseService, PortError, PortResult};
use crate::sanitize::DEFAULT_TOPIC;

/// Number of sessions shown in the dashboard's recent activity list.
pub const RECENT_SESSION_COUNT: usize = 5;

/// Chart ceiling attached to every mastery entry.
pub const MASTERY_FULL_MARK: u32 = 100;

//=========================================================================================
// View Types
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvgScores {
    pub semantic: i64,
    pub grammar: i64,
    pub keyword: i64,
    pub overall: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecentSession {
    pub session: InterviewSession,
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressPoint {
    /// Short weekday name, e.g. `Mon`.
    pub date: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMastery {
    pub topic: String,
    pub score: i64,
    pub full_mark: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub total_sessions: usize,
    pub avg_scores: AvgScores,
    pub recent_sessions: Vec<RecentSession>,
    pub progress_history: Vec<ProgressPoint>,
    pub topic_mastery: Vec<TopicMastery>,
}

/// One question of a report joined with its canonical answer and score.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub question: Question,
    pub answer: Option<Answer>,
    pub score: Option<Score>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub session: InterviewSession,
    pub entries: Vec<ReportEntry>,
}

//=========================================================================================
// Engine
//=========================================================================================

#[derive(Clone)]
pub struct AggregationEngine {
    db: Arc<dyn DatabaseService>,
}

impl AggregationEngine {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn dashboard(&self, user_id: Uuid) -> PortResult<DashboardStats> {
        let sessions = self.db.list_sessions_for_user(user_id).await?;
        let session_ids: Vec<Uuid> = sessions.iter().map(|s| s.id).collect();
        if session_ids.is_empty() {
            return Ok(compute_dashboard(sessions, &[], &[], &[]));
        }

        let questions = self.db.list_questions_for_sessions(&session_ids).await?;
        let answers = self.db.list_answers_for_sessions(&session_ids).await?;
        let answer_ids: Vec<Uuid> = answers.iter().map(|a| a.id).collect();
        let scores = if answer_ids.is_empty() {
            Vec::new()
        } else {
            self.db.list_scores_for_answers(&answer_ids).await?
        };

        Ok(compute_dashboard(sessions, &questions, &answers, &scores))
    }

    /// The fully joined report for a session owned by `user_id`.
    pub async fn session_report(&self, user_id: Uuid, session_id: Uuid) -> PortResult<SessionReport> {
        let session = self.db.get_interview_session(session_id).await?;
        if session.user_id != user_id {
            return Err(PortError::NotFound(format!("Session {} not found", session_id)));
        }

        let (questions, answers, scores) = self.session_rows(session_id).await?;
        Ok(build_report(session, questions, &answers, &scores))
    }

    /// Mean canonical final score of a session, used when it is closed.
    pub async fn session_total(&self, session_id: Uuid) -> PortResult<Option<f64>> {
        let (questions, answers, scores) = self.session_rows(session_id).await?;
        Ok(session_total_score(&questions, &answers, &scores))
    }

    async fn session_rows(&self, session_id: Uuid) -> PortResult<(Vec<Question>, Vec<Answer>, Vec<Score>)> {
        let ids = [session_id];
        let questions = self.db.list_questions_for_sessions(&ids).await?;
        let answers = self.db.list_answers_for_sessions(&ids).await?;
        let answer_ids: Vec<Uuid> = answers.iter().map(|a| a.id).collect();
        let scores = if answer_ids.is_empty() {
            Vec::new()
        } else {
            self.db.list_scores_for_answers(&answer_ids).await?
        };
        Ok((questions, answers, scores))
    }
}

//=========================================================================================
// Pure Aggregation
//=========================================================================================

/// Running mean that ignores absent values instead of counting them as zero.
#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    total: f64,
    count: u32,
}

impl Mean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.total += v;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total / self.count as f64)
    }

    fn rounded(&self) -> i64 {
        self.value().map(|v| v.round() as i64).unwrap_or(0)
    }
}

/// Groups values by key, remembering the order in which keys first appeared.
#[derive(Default)]
struct OrderedGroups {
    index: HashMap<String, usize>,
    groups: Vec<(String, Mean)>,
}

impl OrderedGroups {
    fn push(&mut self, key: &str, value: Option<f64>) {
        let slot = match self.index.get(key) {
            Some(&i) => i,
            None => {
                self.groups.push((key.to_string(), Mean::default()));
                self.index.insert(key.to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        self.groups[slot].1.push(value);
    }

    fn into_rounded(self) -> impl Iterator<Item = (String, i64)> {
        self.groups
            .into_iter()
            .filter(|(_, mean)| mean.count > 0)
            .map(|(key, mean)| (key, mean.rounded()))
    }
}

fn newest<'a, T>(current: Option<&'a T>, candidate: &'a T, created_at: impl Fn(&T) -> DateTime<Utc>) -> &'a T {
    match current {
        Some(existing) if created_at(existing) > created_at(candidate) => existing,
        _ => candidate,
    }
}

/// The canonical answer for each question id.
pub fn canonical_answers(answers: &[Answer]) -> HashMap<Uuid, &Answer> {
    let mut by_question: HashMap<Uuid, &Answer> = HashMap::new();
    for answer in answers {
        let pick = newest(by_question.get(&answer.question_id).copied(), answer, |a| a.created_at);
        by_question.insert(answer.question_id, pick);
    }
    by_question
}

/// The canonical score for each answer id.
pub fn canonical_scores(scores: &[Score]) -> HashMap<Uuid, &Score> {
    let mut by_answer: HashMap<Uuid, &Score> = HashMap::new();
    for score in scores {
        let pick = newest(by_answer.get(&score.answer_id).copied(), score, |s| s.created_at);
        by_answer.insert(score.answer_id, pick);
    }
    by_answer
}

pub fn compute_dashboard(
    mut sessions: Vec<InterviewSession>,
    questions: &[Question],
    answers: &[Answer],
    scores: &[Score],
) -> DashboardStats {
    sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    let total_sessions = sessions.len();

    let mut ordered_questions: Vec<&Question> = questions.iter().collect();
    ordered_questions.sort_by_key(|q| q.created_at);

    let mut session_topics: HashMap<Uuid, Vec<String>> = HashMap::new();
    for q in &ordered_questions {
        let topics = session_topics.entry(q.session_id).or_default();
        if !topics.contains(&q.topic) {
            topics.push(q.topic.clone());
        }
    }

    let recent_sessions = sessions
        .into_iter()
        .take(RECENT_SESSION_COUNT)
        .map(|session| RecentSession {
            topics: session_topics.remove(&session.id).unwrap_or_default(),
            session,
        })
        .collect();

    let topic_by_question: HashMap<Uuid, &str> =
        questions.iter().map(|q| (q.id, q.topic.as_str())).collect();
    let score_by_answer = canonical_scores(scores);

    let mut ordered_answers: Vec<&Answer> = answers.iter().collect();
    ordered_answers.sort_by_key(|a| a.created_at);

    let (mut semantic, mut grammar, mut keyword, mut overall) =
        (Mean::default(), Mean::default(), Mean::default(), Mean::default());
    let mut by_day = OrderedGroups::default();
    let mut by_topic = OrderedGroups::default();

    for answer in ordered_answers {
        let Some(score) = score_by_answer.get(&answer.id) else {
            continue;
        };
        semantic.push(score.semantic_score);
        grammar.push(score.grammar_score);
        keyword.push(score.keyword_score);
        overall.push(score.final_score);

        let weekday = answer.created_at.format("%a").to_string();
        by_day.push(&weekday, score.final_score);

        let topic = topic_by_question
            .get(&answer.question_id)
            .copied()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TOPIC);
        by_topic.push(topic, score.final_score);
    }

    DashboardStats {
        total_sessions,
        avg_scores: AvgScores {
            semantic: semantic.rounded(),
            grammar: grammar.rounded(),
            keyword: keyword.rounded(),
            overall: overall.rounded(),
        },
        recent_sessions,
        progress_history: by_day
            .into_rounded()
            .map(|(date, score)| ProgressPoint { date, score })
            .collect(),
        topic_mastery: by_topic
            .into_rounded()
            .map(|(topic, score)| TopicMastery {
                topic,
                score,
                full_mark: MASTERY_FULL_MARK,
            })
            .collect(),
    }
}

pub fn build_report(
    session: InterviewSession,
    mut questions: Vec<Question>,
    answers: &[Answer],
    scores: &[Score],
) -> SessionReport {
    questions.sort_by_key(|q| q.created_at);
    let answer_by_question = canonical_answers(answers);
    let score_by_answer = canonical_scores(scores);

    let entries = questions
        .into_iter()
        .map(|question| {
            let answer = answer_by_question.get(&question.id).map(|a| (*a).clone());
            let score = answer
                .as_ref()
                .and_then(|a| score_by_answer.get(&a.id))
                .map(|s| (*s).clone());
            ReportEntry {
                question,
                answer,
                score,
            }
        })
        .collect();

    SessionReport { session, entries }
}

/// Rounded mean of the canonical final scores of a session's questions.
pub fn session_total_score(questions: &[Question], answers: &[Answer], scores: &[Score]) -> Option<f64> {
    let answer_by_question = canonical_answers(answers);
    let score_by_answer = canonical_scores(scores);

    let mut mean = Mean::default();
    for question in questions {
        let final_score = answer_by_question
            .get(&question.id)
            .and_then(|a| score_by_answer.get(&a.id))
            .and_then(|s| s.final_score);
        mean.push(final_score);
    }
    mean.value().map(f64::round)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SessionStatus;
    use crate::sanitize::Difficulty;
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        // 2024-01-01 was a Monday.
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn session(start: DateTime<Utc>) -> InterviewSession {
        InterviewSession {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            resume_profile_id: None,
            status: SessionStatus::InProgress,
            start_time: start,
            end_time: None,
            total_score: None,
        }
    }

    fn question(session_id: Uuid, topic: &str, created_at: DateTime<Utc>) -> Question {
        Question {
            id: Uuid::new_v4(),
            session_id,
            topic: topic.to_string(),
            question_text: format!("About {}?", topic),
            ideal_answer_keywords: vec![],
            ideal_answer_text: None,
            difficulty: Difficulty::default(),
            created_at,
        }
    }

    fn answer(q: &Question, created_at: DateTime<Utc>) -> Answer {
        Answer {
            id: Uuid::new_v4(),
            session_id: q.session_id,
            question_id: q.id,
            answer_text: Some("answer".to_string()),
            audio_url: None,
            created_at,
        }
    }

    fn score(a: &Answer, final_score: Option<f64>, created_at: DateTime<Utc>) -> Score {
        Score {
            id: Uuid::new_v4(),
            answer_id: a.id,
            semantic_score: final_score,
            grammar_score: final_score,
            keyword_score: final_score,
            final_score,
            feedback_text: None,
            created_at,
        }
    }

    #[test]
    fn unscored_answers_do_not_drag_the_average_down() {
        let s = session(at(1, 9));
        let q1 = question(s.id, "SQL", at(1, 9));
        let q2 = question(s.id, "SQL", at(1, 9) + Duration::minutes(1));
        let q3 = question(s.id, "SQL", at(1, 9) + Duration::minutes(2));
        let a1 = answer(&q1, at(1, 10));
        let a2 = answer(&q2, at(1, 11));
        let a3 = answer(&q3, at(1, 12));
        let scores = vec![score(&a1, Some(80.0), at(1, 10)), score(&a2, Some(60.0), at(1, 11))];

        let stats = compute_dashboard(vec![s], &[q1, q2, q3], &[a1, a2, a3], &scores);

        assert_eq!(stats.avg_scores.overall, 70);
        assert_eq!(stats.avg_scores.semantic, 70);
    }

    #[test]
    fn absent_score_fields_are_excluded_per_field() {
        let s = session(at(1, 9));
        let q1 = question(s.id, "Rust", at(1, 9));
        let q2 = question(s.id, "Rust", at(1, 9));
        let a1 = answer(&q1, at(1, 10));
        let a2 = answer(&q2, at(1, 11));
        let mut partial = score(&a2, Some(50.0), at(1, 11));
        partial.grammar_score = None;
        let scores = vec![score(&a1, Some(90.0), at(1, 10)), partial];

        let stats = compute_dashboard(vec![s], &[q1, q2], &[a1, a2], &scores);

        assert_eq!(stats.avg_scores.grammar, 90);
        assert_eq!(stats.avg_scores.overall, 70);
    }

    #[test]
    fn same_weekday_answers_share_one_progress_entry() {
        let s = session(at(1, 9));
        let q1 = question(s.id, "SQL", at(1, 9));
        let q2 = question(s.id, "Rust", at(1, 9));
        let a1 = answer(&q1, at(1, 10));
        let a2 = answer(&q2, at(8, 10));
        let scores = vec![score(&a1, Some(80.0), at(1, 10)), score(&a2, Some(60.0), at(8, 10))];

        let stats = compute_dashboard(vec![s], &[q1, q2], &[a1, a2], &scores);

        assert_eq!(
            stats.progress_history,
            vec![ProgressPoint {
                date: "Mon".to_string(),
                score: 70
            }]
        );
    }

    #[test]
    fn weekdays_and_topics_keep_first_encountered_order() {
        let s = session(at(1, 9));
        let q_sql = question(s.id, "SQL", at(1, 9));
        let q_rust = question(s.id, "Rust", at(1, 9));
        // Answer on Wednesday first, then Monday of the following week.
        let a_wed = answer(&q_rust, at(3, 10));
        let a_mon = answer(&q_sql, at(8, 10));
        let scores = vec![score(&a_wed, Some(40.0), at(3, 10)), score(&a_mon, Some(90.0), at(8, 10))];

        let stats = compute_dashboard(vec![s], &[q_sql, q_rust], &[a_mon, a_wed], &scores);

        let days: Vec<&str> = stats.progress_history.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(days, vec!["Wed", "Mon"]);
        let topics: Vec<&str> = stats.topic_mastery.iter().map(|t| t.topic.as_str()).collect();
        assert_eq!(topics, vec!["Rust", "SQL"]);
        assert!(stats.topic_mastery.iter().all(|t| t.full_mark == 100));
    }

    #[test]
    fn recent_sessions_are_capped_and_carry_distinct_topics() {
        let sessions: Vec<InterviewSession> = (1..=7).map(|d| session(at(d, 9))).collect();
        let newest = sessions[6].clone();
        let questions = vec![
            question(newest.id, "SQL", at(7, 9)),
            question(newest.id, "Rust", at(7, 9) + Duration::minutes(1)),
            question(newest.id, "SQL", at(7, 9) + Duration::minutes(2)),
        ];

        let stats = compute_dashboard(sessions, &questions, &[], &[]);

        assert_eq!(stats.total_sessions, 7);
        assert_eq!(stats.recent_sessions.len(), RECENT_SESSION_COUNT);
        assert_eq!(stats.recent_sessions[0].session.id, newest.id);
        assert_eq!(stats.recent_sessions[0].topics, vec!["SQL", "Rust"]);
        assert!(stats.recent_sessions[1].topics.is_empty());
        assert_eq!(stats.avg_scores, AvgScores::default());
        assert!(stats.progress_history.is_empty());
    }

    #[test]
    fn report_prefers_the_most_recent_answer_and_score() {
        let s = session(at(1, 9));
        let q = question(s.id, "SQL", at(1, 9));
        let old = answer(&q, at(1, 10));
        let new = answer(&q, at(1, 11));
        let scores = vec![
            score(&new, Some(50.0), at(1, 11)),
            score(&new, Some(75.0), at(1, 12)),
            score(&old, Some(10.0), at(1, 10)),
        ];

        let report = build_report(s, vec![q], &[new.clone(), old], &scores);

        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].answer.as_ref().map(|a| a.id), Some(new.id));
        assert_eq!(report.entries[0].score.as_ref().and_then(|s| s.final_score), Some(75.0));
    }

    #[test]
    fn session_total_uses_canonical_rows_only() {
        let s = session(at(1, 9));
        let q1 = question(s.id, "SQL", at(1, 9));
        let q2 = question(s.id, "SQL", at(1, 9));
        let q3 = question(s.id, "SQL", at(1, 9));
        let stale = answer(&q1, at(1, 10));
        let fresh = answer(&q1, at(1, 11));
        let other = answer(&q2, at(1, 12));
        let scores = vec![
            score(&stale, Some(10.0), at(1, 10)),
            score(&fresh, Some(90.0), at(1, 11)),
            score(&other, Some(71.0), at(1, 12)),
        ];

        let total = session_total_score(&[q1, q2, q3], &[stale, fresh, other], &scores);

        assert_eq!(total, Some(81.0));
        assert_eq!(session_total_score(&[], &[], &[]), None);
    }
}
