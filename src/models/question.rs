// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'questions' table in the database.
/// This is the admin view: it includes the correct option.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// Owning subject.
    pub subject_id: i64,

    pub question_text: String,

    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,

    /// The correct option letter: 'A', 'B', 'C' or 'D'.
    pub correct_option: String,
}

/// DTO for creating or fully replacing a question.
#[derive(Debug, Deserialize, Validate)]
pub struct QuestionPayload {
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Question text length must be between 1 and 2000 characters."
    ))]
    pub question_text: String,
    #[validate(length(min = 1, max = 500))]
    pub option_a: String,
    #[validate(length(min = 1, max = 500))]
    pub option_b: String,
    #[validate(length(min = 1, max = 500))]
    pub option_c: String,
    #[validate(length(min = 1, max = 500))]
    pub option_d: String,
    #[validate(custom(function = validate_option_letter))]
    pub correct_option: String,
}

fn validate_option_letter(letter: &str) -> Result<(), validator::ValidationError> {
    match letter {
        "A" | "B" | "C" | "D" => Ok(()),
        _ => Err(validator::ValidationError::new(
            "correct_option_must_be_a_to_d",
        )),
    }
}

/// Student-facing view of a question, used by the exam start response.
/// Deliberately has no `correct_option` field, so the answer key can never
/// appear in a serialized exam paper.
#[derive(Debug, Serialize)]
pub struct ExamQuestion {
    pub id: i64,
    pub question_text: String,
    pub options: QuestionOptions,
}

#[derive(Debug, Serialize)]
pub struct QuestionOptions {
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "B")]
    pub b: String,
    #[serde(rename = "C")]
    pub c: String,
    #[serde(rename = "D")]
    pub d: String,
}

impl From<Question> for ExamQuestion {
    fn from(q: Question) -> Self {
        ExamQuestion {
            id: q.id,
            question_text: q.question_text,
            options: QuestionOptions {
                a: q.option_a,
                b: q.option_b,
                c: q.option_c,
                d: q.option_d,
            },
        }
    }
}
