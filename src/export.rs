//! Plain-text export of a generated quiz.
//!
//! ```text
//! Quiz & Summaries
//!
//! --- Multiple Choice ---
//!
//! 1. Which organelle produces ATP?
//! - Nucleus
//! - Mitochondria
//! - Ribosome
//! - Golgi body
//! Correct Answer: Mitochondria
//!
//! --- True/False ---
//!
//! 1. Cells are the basic unit of life.
//! Correct Answer: true
//! ```
//!
//! Empty sections are omitted. Numbering restarts at 1 in each section.

use crate::quiz::QuizData;
use std::fmt::Write;

const HEADER: &str = "Quiz & Summaries\n\n";

/// Render `quiz` as the downloadable text document.
pub fn format_quiz_for_export(quiz: &QuizData) -> String {
    let mut out = String::from(HEADER);

    if !quiz.multiple_choice.is_empty() {
        out.push_str("--- Multiple Choice ---\n\n");
        for (i, q) in quiz.multiple_choice.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, q.question);
            for option in &q.options {
                let _ = writeln!(out, "- {}", option);
            }
            let _ = write!(out, "Correct Answer: {}\n\n", q.correct_answer);
        }
    }

    if !quiz.true_false.is_empty() {
        out.push_str("--- True/False ---\n\n");
        for (i, q) in quiz.true_false.iter().enumerate() {
            let _ = write!(
                out,
                "{}. {}\nCorrect Answer: {}\n\n",
                i + 1,
                q.question,
                q.correct_answer
            );
        }
    }

    if !quiz.short_answer.is_empty() {
        out.push_str("--- Short Answer ---\n\n");
        for (i, q) in quiz.short_answer.iter().enumerate() {
            let _ = write!(out, "{}. {}\nAnswer: {}\n\n", i + 1, q.question, q.answer);
        }
    }

    if !quiz.topic_summaries.is_empty() {
        out.push_str("--- Topic Summaries ---\n\n");
        for s in &quiz.topic_summaries {
            let _ = write!(out, "Topic: {}\nSummary: {}\n\n", s.topic, s.summary);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::{
        MultipleChoiceQuestion, ShortAnswerQuestion, TopicSummary, TrueFalseQuestion,
    };

    #[test]
    fn empty_quiz_is_header_only() {
        assert_eq!(format_quiz_for_export(&QuizData::default()), HEADER);
    }

    #[test]
    fn all_sections_in_order() {
        let quiz = QuizData {
            multiple_choice: vec![MultipleChoiceQuestion {
                question: "2 + 2?".into(),
                options: vec!["3".into(), "4".into(), "5".into(), "22".into()],
                correct_answer: "4".into(),
            }],
            true_false: vec![
                TrueFalseQuestion {
                    question: "Ice is cold.".into(),
                    correct_answer: true,
                },
                TrueFalseQuestion {
                    question: "Fire is cold.".into(),
                    correct_answer: false,
                },
            ],
            short_answer: vec![ShortAnswerQuestion {
                question: "Name a prime.".into(),
                answer: "7".into(),
            }],
            topic_summaries: vec![TopicSummary {
                topic: "Arithmetic".into(),
                summary: "Adding numbers.".into(),
            }],
        };

        let expected = "Quiz & Summaries\n\n\
            --- Multiple Choice ---\n\n\
            1. 2 + 2?\n- 3\n- 4\n- 5\n- 22\nCorrect Answer: 4\n\n\
            --- True/False ---\n\n\
            1. Ice is cold.\nCorrect Answer: true\n\n\
            2. Fire is cold.\nCorrect Answer: false\n\n\
            --- Short Answer ---\n\n\
            1. Name a prime.\nAnswer: 7\n\n\
            --- Topic Summaries ---\n\n\
            Topic: Arithmetic\nSummary: Adding numbers.\n\n";
        assert_eq!(format_quiz_for_export(&quiz), expected);
    }

    #[test]
    fn empty_sections_are_skipped() {
        let quiz = QuizData {
            short_answer: vec![ShortAnswerQuestion {
                question: "Q".into(),
                answer: "A".into(),
            }],
            ..Default::default()
        };
        let text = format_quiz_for_export(&quiz);
        assert!(!text.contains("Multiple Choice"));
        assert!(!text.contains("True/False"));
        assert!(!text.contains("Topic Summaries"));
        assert!(text.ends_with("1. Q\nAnswer: A\n\n"));
    }
}
