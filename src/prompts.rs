//! Generation prompt and strict response schema.
//!
//! Centralising the prompt and schema here keeps them inspectable by unit
//! tests without a live service, and keeps wire handling in
//! [`crate::pipeline::generate`] free of prompt text.

use crate::config::GenerationConfig;
use serde_json::{json, Value};

/// Build the user prompt for a (pre-clipped) document text.
pub fn quiz_prompt(document_text: &str, config: &GenerationConfig) -> String {
    format!(
        r#"You are an expert educator's assistant. Based on the following text from an educational document, please generate a comprehensive learning module. It is absolutely critical that your response contains all four of the following sections: 'multipleChoice', 'trueFalse', 'shortAnswer', and 'topicSummaries'.

Create exactly {mc} multiple-choice questions (each with 4 options), {tf} true/false questions, {sa} short-answer questions, and a concise summary for each of the main topics covered in the text.

If you cannot generate content for a specific section for any reason, you MUST provide an empty array for it (e.g., "shortAnswer": []). DO NOT omit any keys from the final JSON object. Your adherence to this format is crucial.

Here is the document text:
---
{document_text}
---

Please generate the learning module now."#,
        mc = config.multiple_choice_count,
        tf = config.true_false_count,
        sa = config.short_answer_count,
    )
}

/// The response schema sent as `generationConfig.responseSchema`.
///
/// Uses the Gemini OpenAPI subset: upper-case type names, `required` lists.
pub fn quiz_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "multipleChoice": {
                "type": "ARRAY",
                "description": "A list of multiple-choice questions.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "question": { "type": "STRING", "description": "The question text." },
                        "options": {
                            "type": "ARRAY",
                            "description": "An array of 4 possible answers.",
                            "items": { "type": "STRING" }
                        },
                        "correctAnswer": { "type": "STRING", "description": "The correct answer from the options." }
                    },
                    "required": ["question", "options", "correctAnswer"]
                }
            },
            "trueFalse": {
                "type": "ARRAY",
                "description": "A list of true/false questions.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "question": { "type": "STRING", "description": "The question text." },
                        "correctAnswer": { "type": "BOOLEAN", "description": "The correct boolean answer." }
                    },
                    "required": ["question", "correctAnswer"]
                }
            },
            "shortAnswer": {
                "type": "ARRAY",
                "description": "A list of short-answer questions.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "question": { "type": "STRING", "description": "The question text." },
                        "answer": { "type": "STRING", "description": "The correct answer." }
                    },
                    "required": ["question", "answer"]
                }
            },
            "topicSummaries": {
                "type": "ARRAY",
                "description": "A list of summaries for key topics in the document.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "topic": { "type": "STRING", "description": "The name of the topic." },
                        "summary": { "type": "STRING", "description": "A concise summary of the topic." }
                    },
                    "required": ["topic", "summary"]
                }
            }
        },
        "required": ["multipleChoice", "trueFalse", "shortAnswer", "topicSummaries"]
    })
}
