//! Canonical learning-module schema.
//!
//! [`QuizData`] is a struct of four `Vec`s, so every section is always
//! present once a value exists. The only route from an untrusted service
//! payload to a `QuizData` is [`crate::pipeline::normalize::normalize_quiz`].
//!
//! Item types deserialise leniently. Missing or null fields take their
//! default and non-string scalars are read as text. A true/false answer may
//! also arrive as `"true"`/`"false"`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A multiple-choice question. The prompt asks for exactly four options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MultipleChoiceQuestion {
    #[serde(deserialize_with = "lenient_string")]
    pub question: String,
    #[serde(deserialize_with = "lenient_strings")]
    pub options: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub correct_answer: String,
}

impl MultipleChoiceQuestion {
    /// Number of options a well-formed question carries.
    pub const OPTION_COUNT: usize = 4;

    /// True when the question has four options and the answer is one of them.
    pub fn is_well_formed(&self) -> bool {
        self.options.len() == Self::OPTION_COUNT && self.options.contains(&self.correct_answer)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrueFalseQuestion {
    #[serde(deserialize_with = "lenient_string")]
    pub question: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub correct_answer: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortAnswerQuestion {
    #[serde(deserialize_with = "lenient_string")]
    pub question: String,
    #[serde(deserialize_with = "lenient_string")]
    pub answer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicSummary {
    #[serde(deserialize_with = "lenient_string")]
    pub topic: String,
    #[serde(deserialize_with = "lenient_string")]
    pub summary: String,
}

// ── Lenient field readers ────────────────────────────────────────────────

fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_to_text(Value::deserialize(deserializer)?))
}

fn lenient_strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().map(value_to_text).collect(),
        Value::Null => Vec::new(),
        single => vec![value_to_text(single)],
    })
}

/// `true`, `"true"` (any case, surrounding whitespace ignored) and non-zero
/// numbers read as true; everything else as false.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    })
}

/// A generated learning module: four independent, ordered sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizData {
    pub multiple_choice: Vec<MultipleChoiceQuestion>,
    pub true_false: Vec<TrueFalseQuestion>,
    pub short_answer: Vec<ShortAnswerQuestion>,
    pub topic_summaries: Vec<TopicSummary>,
}

impl QuizData {
    /// True when all four sections are empty: nothing could be generated.
    pub fn is_empty(&self) -> bool {
        self.multiple_choice.is_empty()
            && self.true_false.is_empty()
            && self.short_answer.is_empty()
            && self.topic_summaries.is_empty()
    }

    /// Total number of items across the four sections.
    pub fn total_items(&self) -> usize {
        self.multiple_choice.len()
            + self.true_false.len()
            + self.short_answer.len()
            + self.topic_summaries.len()
    }

    /// Describe multiple-choice items that break the four-options /
    /// answer-among-options contract. Purely informational; generation does
    /// not reject data on these grounds.
    pub fn integrity_issues(&self) -> Vec<String> {
        self.multiple_choice
            .iter()
            .enumerate()
            .filter(|(_, q)| !q.is_well_formed())
            .map(|(i, q)| {
                if q.options.len() != MultipleChoiceQuestion::OPTION_COUNT {
                    format!(
                        "multiple-choice #{}: expected {} options, got {}",
                        i + 1,
                        MultipleChoiceQuestion::OPTION_COUNT,
                        q.options.len()
                    )
                } else {
                    format!(
                        "multiple-choice #{}: correct answer {:?} is not among the options",
                        i + 1,
                        q.correct_answer
                    )
                }
            })
            .collect()
    }
}
