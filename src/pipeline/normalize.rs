//! Normalisation: coerce an untrusted service payload into [`QuizData`].
//!
//! The response schema asks the service for four arrays, but the service is
//! not trusted to honour it. This module is the single place where the
//! "all four sections present" invariant is established:
//!
//! 1. Strip an outer code fence if the model wrapped its JSON in one
//! 2. Parse as an untyped `serde_json::Value` (failure → `GenerationFailed`)
//! 3. For each section key, a non-array value becomes an empty section
//! 4. Array elements that are not JSON objects are dropped; objects are kept
//!    as given, with missing fields defaulted (see [`crate::quiz`])
//!
//! No semantic checks happen here (e.g. whether `correctAnswer` is one of
//! the options); see [`QuizData::integrity_issues`].

use crate::error::QuizError;
use crate::quiz::QuizData;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*\n(.*)\n```\s*$").unwrap());

/// Remove one outer ```` ```json ```` fence pair, if present.
pub fn strip_code_fences(input: &str) -> String {
    let trimmed = input.trim();
    if let Some(caps) = RE_OUTER_FENCES.captures(trimmed) {
        caps[1].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse the service's textual payload and normalise it.
pub fn parse_quiz_payload(payload: &str) -> Result<QuizData, QuizError> {
    let cleaned = strip_code_fences(payload);
    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|e| QuizError::generation(format!("malformed response payload: {}", e)))?;
    Ok(normalize_quiz(value))
}

/// Coerce an arbitrary JSON value into the canonical schema.
///
/// A non-object root yields an empty `QuizData`.
pub fn normalize_quiz(value: Value) -> QuizData {
    let Value::Object(mut map) = value else {
        warn!("Response root is not an object; all sections empty");
        return QuizData::default();
    };

    QuizData {
        multiple_choice: section(map.remove("multipleChoice"), "multipleChoice"),
        true_false: section(map.remove("trueFalse"), "trueFalse"),
        short_answer: section(map.remove("shortAnswer"), "shortAnswer"),
        topic_summaries: section(map.remove("topicSummaries"), "topicSummaries"),
    }
}

fn section<T: DeserializeOwned>(value: Option<Value>, key: &str) -> Vec<T> {
    match value {
        Some(Value::Array(items)) => {
            let total = items.len();
            let kept: Vec<T> = items
                .into_iter()
                .filter(|item| item.is_object())
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect();
            if kept.len() < total {
                warn!(
                    "Section '{}': dropped {} of {} non-object items",
                    key,
                    total - kept.len(),
                    total
                );
            }
            kept
        }
        Some(other) => {
            warn!("Section '{}' is not an array ({}); using empty", key, kind_of(&other));
            Vec::new()
        }
        None => {
            warn!("Section '{}' missing; using empty", key);
            Vec::new()
        }
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
