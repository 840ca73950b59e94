//! services/api/src/adapters/ml_schema.rs
//!
//! Version `v1` of the ML service wire format. Requests are plain serde structs;
//! responses are deserialized leniently and then validated into domain types,
//! so a malformed field degrades to `None` while a missing required field
//! rejects the whole payload.

use interview_core::domain::{AudioAnalysis, Evaluation, GeneratedQuestion, ParsedResume, ScoreRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SCHEMA_VERSION: &str = "v1";
pub const SCHEMA_VERSION_HEADER: &str = "x-schema-version";

//=========================================================================================
// Requests
//=========================================================================================

#[derive(Serialize, Debug)]
pub struct GenerateQuestionsRequestV1<'a> {
    pub resume_text: &'a str,
    pub topics: &'a [String],
}

#[derive(Serialize, Debug)]
pub struct ScoreAnswerRequestV1<'a> {
    pub answer_text: Option<&'a str>,
    pub audio_url: Option<&'a str>,
    pub question_text: Option<&'a str>,
    pub ideal_keywords: Option<&'a [String]>,
    pub ideal_answer_text: Option<&'a str>,
}

impl<'a> From<&'a ScoreRequest> for ScoreAnswerRequestV1<'a> {
    fn from(req: &'a ScoreRequest) -> Self {
        Self {
            answer_text: req.answer_text.as_deref(),
            audio_url: req.audio_url.as_deref(),
            question_text: req.question_text.as_deref(),
            ideal_keywords: req.ideal_keywords.as_deref(),
            ideal_answer_text: req.ideal_answer_text.as_deref(),
        }
    }
}

//=========================================================================================
// Responses
//=========================================================================================

#[derive(Deserialize, Debug)]
pub struct GenerateQuestionsResponseV1 {
    pub questions: Vec<Value>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ScoreAnswerResponseV1 {
    pub semantic_score: Value,
    pub grammar_score: Value,
    pub keyword_score: Value,
    pub final_score: Value,
    pub feedback_text: Option<String>,
    pub transcript: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ParseResumeResponseV1 {
    #[serde(default)]
    pub skills: Vec<Value>,
    pub extracted_text: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct AnalyzeAudioResponseV1 {
    pub transcript: Option<String>,
    pub wpm: Value,
    pub fluency_score: Value,
    pub confidence_score: Value,
    pub filler_words: Value,
    pub pause_duration: Value,
}

/// A payload that parsed as JSON but does not satisfy the `v1` contract.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct SchemaViolation(pub String);

//=========================================================================================
// Validation
//=========================================================================================

/// Accepts JSON numbers and numeric strings; anything else is treated as absent.
pub fn lenient_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Keeps the string items of an array; a non-array is treated as absent.
fn lenient_keywords(value: Option<&Value>) -> Option<Vec<String>> {
    let items = value?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
    )
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

/// Entries without a usable `question_text` are dropped here; everything else is
/// left to sanitization.
pub fn validate_generated(resp: GenerateQuestionsResponseV1) -> Vec<GeneratedQuestion> {
    resp.questions
        .iter()
        .filter_map(|q| {
            let obj = q.as_object()?;
            let question_text = obj.get("question_text")?.as_str()?.to_string();
            Some(GeneratedQuestion {
                question_text,
                topic: optional_text(obj.get("topic")),
                difficulty_level: obj.get("difficulty_level").and_then(lenient_number),
                ideal_answer_keywords: lenient_keywords(obj.get("ideal_answer_keywords")),
                ideal_answer_text: optional_text(obj.get("ideal_answer_text")),
            })
        })
        .collect()
}

pub fn validate_score(resp: ScoreAnswerResponseV1) -> Result<Evaluation, SchemaViolation> {
    let final_score = lenient_number(&resp.final_score)
        .ok_or_else(|| SchemaViolation("score response is missing a numeric final_score".into()))?;
    Ok(Evaluation {
        semantic_score: lenient_number(&resp.semantic_score),
        grammar_score: lenient_number(&resp.grammar_score),
        keyword_score: lenient_number(&resp.keyword_score),
        final_score: Some(final_score),
        feedback_text: resp.feedback_text,
        transcript: resp.transcript,
    })
}

pub fn validate_resume(resp: ParseResumeResponseV1) -> ParsedResume {
    ParsedResume {
        skills: resp
            .skills
            .iter()
            .filter_map(|s| s.as_str().map(str::to_string))
            .collect(),
        extracted_text: resp.extracted_text,
    }
}

pub fn validate_audio(resp: AnalyzeAudioResponseV1) -> AudioAnalysis {
    AudioAnalysis {
        transcript: resp.transcript,
        wpm: lenient_number(&resp.wpm),
        fluency_score: lenient_number(&resp.fluency_score),
        confidence_score: lenient_number(&resp.confidence_score),
        filler_words: lenient_number(&resp.filler_words)
            .filter(|n| *n >= 0.0)
            .map(|n| n.round() as u32),
        pause_duration: lenient_number(&resp.pause_duration),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_and_numeric_strings_are_accepted() {
        assert_eq!(lenient_number(&json!(3)), Some(3.0));
        assert_eq!(lenient_number(&json!("4.5")), Some(4.5));
        assert_eq!(lenient_number(&json!("hard")), None);
        assert_eq!(lenient_number(&json!(null)), None);
    }

    #[test]
    fn generated_questions_tolerate_malformed_fields() {
        let resp: GenerateQuestionsResponseV1 = serde_json::from_value(json!({
            "questions": [
                { "question_text": "What is a JOIN?", "topic": "SQL", "difficulty_level": "7",
                  "ideal_answer_keywords": "join" },
                { "topic": "SQL" },
                { "question_text": "Explain indexes", "ideal_answer_keywords": ["btree", "lookup"] }
            ]
        }))
        .unwrap();

        let questions = validate_generated(resp);

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].difficulty_level, Some(7.0));
        assert_eq!(questions[0].ideal_answer_keywords, None);
        assert_eq!(questions[1].topic, None);
        assert_eq!(
            questions[1].ideal_answer_keywords,
            Some(vec!["btree".to_string(), "lookup".to_string()])
        );
    }

    #[test]
    fn mixed_keyword_arrays_keep_their_strings() {
        let resp: GenerateQuestionsResponseV1 = serde_json::from_value(json!({
            "questions": [
                { "question_text": "What is MVCC?", "ideal_answer_keywords": ["snapshot", 3, null, "version"] }
            ]
        }))
        .unwrap();

        let questions = validate_generated(resp);

        assert_eq!(
            questions[0].ideal_answer_keywords,
            Some(vec!["snapshot".to_string(), "version".to_string()])
        );
    }

    #[test]
    fn score_without_final_score_is_rejected() {
        let resp: ScoreAnswerResponseV1 =
            serde_json::from_value(json!({ "semantic_score": 80, "feedback_text": "ok" })).unwrap();
        assert!(validate_score(resp).is_err());

        let resp: ScoreAnswerResponseV1 =
            serde_json::from_value(json!({ "final_score": 72.5, "grammar_score": "n/a" })).unwrap();
        let eval = validate_score(resp).unwrap();
        assert_eq!(eval.final_score, Some(72.5));
        assert_eq!(eval.grammar_score, None);
    }

    #[test]
    fn audio_metrics_are_optional() {
        let resp: AnalyzeAudioResponseV1 =
            serde_json::from_value(json!({ "transcript": "hi", "wpm": 120.4, "filler_words": 5 }))
                .unwrap();
        let analysis = validate_audio(resp);
        assert_eq!(analysis.filler_words, Some(5));
        assert_eq!(analysis.fluency_score, None);
    }
}
