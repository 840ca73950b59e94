//! crates/interview_core/src/sanitize.rs
//!
//! Normalizes generator output into persistable questions.

use crate::domain::{GeneratedQuestion, NewQuestion};

/// Topic used whenever neither the generator nor the caller names one.
pub const DEFAULT_TOPIC: &str = "General";

/// A question difficulty, always within `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: Difficulty = Difficulty(1);
    pub const MAX: Difficulty = Difficulty(5);
    /// Default for questions in the initial batch.
    pub const INITIAL_DEFAULT: Difficulty = Difficulty(1);
    /// Default for questions produced by adaptive continuation.
    pub const CONTINUATION_DEFAULT: Difficulty = Difficulty(3);

    /// Normalizes an arbitrary raw value.
    ///
    /// Missing, non-finite and zero values fall back to `default`; everything
    /// else is rounded and clamped into `1..=5`.
    pub fn from_raw(raw: Option<f64>, default: Difficulty) -> Self {
        match raw {
            Some(value) if value.is_finite() && value != 0.0 => {
                let clamped = value.round().clamp(Self::MIN.0 as f64, Self::MAX.0 as f64);
                Difficulty(clamped as u8)
            }
            _ => default,
        }
    }

    /// Builds a difficulty from a stored level, clamping anything out of range.
    pub fn from_level(level: i64) -> Self {
        Difficulty(level.clamp(Self::MIN.0 as i64, Self::MAX.0 as i64) as u8)
    }

    pub fn level(&self) -> u8 {
        self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::INITIAL_DEFAULT
    }
}

/// Turns one generated question into an unbound, persistable question.
///
/// `fallback_topic` is used when the generator left the topic blank.
pub fn sanitize_question(
    generated: GeneratedQuestion,
    fallback_topic: Option<&str>,
    default_difficulty: Difficulty,
) -> NewQuestion {
    let topic = generated
        .topic
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| fallback_topic.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_TOPIC.to_string());

    NewQuestion {
        topic,
        question_text: generated.question_text,
        ideal_answer_keywords: generated.ideal_answer_keywords.unwrap_or_default(),
        ideal_answer_text: generated.ideal_answer_text,
        difficulty: Difficulty::from_raw(generated.difficulty_level, default_difficulty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_clamps_and_defaults() {
        let d = Difficulty::INITIAL_DEFAULT;
        assert_eq!(Difficulty::from_raw(Some(3.0), d).level(), 3);
        assert_eq!(Difficulty::from_raw(Some(9.0), d).level(), 5);
        assert_eq!(Difficulty::from_raw(Some(-4.0), d).level(), 1);
        assert_eq!(Difficulty::from_raw(Some(2.6), d).level(), 3);
        assert_eq!(Difficulty::from_raw(Some(0.4), d).level(), 1);
        assert_eq!(Difficulty::from_raw(Some(0.0), d).level(), 1);
        assert_eq!(Difficulty::from_raw(Some(f64::NAN), d).level(), 1);
        assert_eq!(Difficulty::from_raw(None, d).level(), 1);
    }

    #[test]
    fn continuation_default_applies_to_missing_values_only() {
        let d = Difficulty::CONTINUATION_DEFAULT;
        assert_eq!(Difficulty::from_raw(None, d).level(), 3);
        assert_eq!(Difficulty::from_raw(Some(0.0), d).level(), 3);
        assert_eq!(Difficulty::from_raw(Some(f64::INFINITY), d).level(), 3);
        assert_eq!(Difficulty::from_raw(Some(-1.0), d).level(), 1);
        assert_eq!(Difficulty::from_raw(Some(5.0), d).level(), 5);
    }

    #[test]
    fn stored_levels_are_clamped() {
        assert_eq!(Difficulty::from_level(0).level(), 1);
        assert_eq!(Difficulty::from_level(7).level(), 5);
        assert_eq!(Difficulty::from_level(4).level(), 4);
    }

    #[test]
    fn sanitize_fills_missing_keywords_and_topic() {
        let generated = GeneratedQuestion {
            question_text: "Explain indexes.".to_string(),
            topic: Some("  ".to_string()),
            difficulty_level: None,
            ideal_answer_keywords: None,
            ideal_answer_text: None,
        };

        let q = sanitize_question(generated, Some("SQL"), Difficulty::INITIAL_DEFAULT);

        assert_eq!(q.topic, "SQL");
        assert!(q.ideal_answer_keywords.is_empty());
        assert_eq!(q.difficulty.level(), 1);
    }

    #[test]
    fn sanitize_keeps_generator_fields() {
        let generated = GeneratedQuestion {
            question_text: "What is a B-tree?".to_string(),
            topic: Some("Databases".to_string()),
            difficulty_level: Some(4.0),
            ideal_answer_keywords: Some(vec!["balanced".to_string(), "node".to_string()]),
            ideal_answer_text: Some("A self-balancing tree.".to_string()),
        };

        let q = sanitize_question(generated, None, Difficulty::CONTINUATION_DEFAULT);

        assert_eq!(q.topic, "Databases");
        assert_eq!(q.ideal_answer_keywords, vec!["balanced", "node"]);
        assert_eq!(q.difficulty.level(), 4);
        assert_eq!(q.ideal_answer_text.as_deref(), Some("A self-balancing tree."));
    }

    #[test]
    fn sanitize_without_any_topic_uses_general() {
        let q = sanitize_question(
            GeneratedQuestion {
                question_text: "Tell me about yourself.".to_string(),
                ..Default::default()
            },
            None,
            Difficulty::INITIAL_DEFAULT,
        );
        assert_eq!(q.topic, DEFAULT_TOPIC);
    }
}
