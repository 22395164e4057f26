// src/models/subject.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'subjects' table in the database.
/// Serialized in camelCase to match the public API.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: i64,

    /// Unique subject name (case-sensitive).
    pub name: String,

    pub description: String,

    /// Exam duration in minutes.
    pub duration: i64,

    /// Capacity cap on the question bank for this subject.
    pub total_questions: i64,

    /// Advisory passing threshold in percent. Stored and reported, but
    /// grading uses the fixed band table (see handlers::exams).
    pub passing_score: f64,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating or fully replacing a subject.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPayload {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Subject name length must be between 1 and 100 characters."
    ))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: String,
    #[validate(range(min = 1, message = "Duration must be at least 1 minute."))]
    pub duration: i64,
    #[validate(range(min = 1, message = "Total questions must be at least 1."))]
    pub total_questions: i64,
    #[validate(range(min = 0.0, max = 100.0, message = "Passing score must be a percentage."))]
    pub passing_score: f64,
}
