// src/models/result.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'results' table in the database.
/// One immutable row per (student, subject) pair.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamResult {
    pub id: i64,
    pub student_id: i64,
    pub subject_id: i64,
    /// Number of correctly answered questions.
    pub score: i64,
    /// Question count for the subject at submission time.
    pub total: i64,
    pub percentage: f64,
    /// Letter grade A-F.
    pub grade: Option<String>,
    /// 'PASS' or 'FAIL'.
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A result row joined with the student and subject names, as returned by
/// the reporting endpoints.
#[derive(Debug, Serialize, FromRow)]
pub struct ResultView {
    pub id: i64,
    pub student_id: i64,
    pub subject_id: i64,
    pub student_name: String,
    pub subject_name: String,
    pub score: i64,
    pub total: i64,
    pub percentage: f64,
    pub grade: Option<String>,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// One answer in an exam submission.
#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    pub question_id: i64,
    /// Selected option letter: 'A' | 'B' | 'C' | 'D'.
    pub selected_option: String,
}

/// DTO for submitting a completed exam.
#[derive(Debug, Deserialize)]
pub struct SubmitExamRequest {
    pub subject_id: i64,
    pub answers: Vec<AnswerIn>,
}

/// DTO returned by exam start.
#[derive(Debug, Serialize)]
pub struct StartExamResponse {
    pub subject_id: i64,
    pub questions: Vec<crate::models::question::ExamQuestion>,
    /// Advisory time budget in seconds, communicated once. The server does
    /// not track a deadline.
    pub time_remaining: i64,
}

/// DTO returned by exam submission.
#[derive(Debug, Serialize)]
pub struct ResultOut {
    pub id: i64,
    pub score: i64,
    pub total: i64,
    pub percentage: f64,
    pub grade: Option<String>,
    pub status: String,
}

impl From<ExamResult> for ResultOut {
    fn from(r: ExamResult) -> Self {
        ResultOut {
            id: r.id,
            score: r.score,
            total: r.total,
            percentage: r.percentage,
            grade: r.grade,
            status: r.status,
        }
    }
}
