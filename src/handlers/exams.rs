// src/handlers/exams.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    guards::CurrentStudent,
    models::{
        question::{ExamQuestion, Question},
        result::{AnswerIn, ExamResult, ResultOut, StartExamResponse, SubmitExamRequest},
    },
};

/// Maps a percentage to its letter grade and pass/fail status.
///
/// The band table is fixed and universal; the subject's advisory
/// `passing_score` field is not consulted.
fn grade_for(percentage: f64) -> (&'static str, &'static str) {
    if percentage >= 70.0 {
        ("A", "PASS")
    } else if percentage >= 60.0 {
        ("B", "PASS")
    } else if percentage >= 50.0 {
        ("C", "PASS")
    } else if percentage >= 45.0 {
        ("D", "PASS")
    } else if percentage >= 40.0 {
        ("E", "PASS")
    } else {
        ("F", "FAIL")
    }
}

fn percentage_for(score: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    score as f64 / total as f64 * 100.0
}

/// Scores a submission against the subject's question set.
///
/// For each question, the first submitted answer with a matching question ID
/// and the correct option scores one point; further answers for the same
/// question are ignored. Answers referencing unknown or foreign question IDs
/// never match anything. Unanswered questions score zero.
fn score_answers(questions: &[Question], answers: &[AnswerIn]) -> i64 {
    let mut score = 0;
    for question in questions {
        for answer in answers {
            if answer.question_id == question.id && answer.selected_option == question.correct_option
            {
                score += 1;
                break;
            }
        }
    }
    score
}

/// Starts an exam for the calling student. Student only.
///
/// Rejected with 400 once a result exists for this (student, subject) pair;
/// there is no persisted in-progress state between start and submit. The
/// returned questions carry no answer key, and the time budget is advisory.
pub async fn start_exam(
    CurrentStudent(student): CurrentStudent,
    State(pool): State<SqlitePool>,
    Path(subject_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let completed = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM results WHERE student_id = ? AND subject_id = ?",
    )
    .bind(student.id)
    .bind(subject_id)
    .fetch_optional(&pool)
    .await?;

    if completed.is_some() {
        return Err(AppError::Conflict(
            "You have already completed this exam".to_string(),
        ));
    }

    let duration = sqlx::query_scalar::<_, i64>("SELECT duration FROM subjects WHERE id = ?")
        .bind(subject_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject not found".to_string()))?;

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, subject_id, question_text, option_a, option_b, option_c,
               option_d, correct_option
        FROM questions
        WHERE subject_id = ?
        ORDER BY id
        "#,
    )
    .bind(subject_id)
    .fetch_all(&pool)
    .await?;

    if questions.is_empty() {
        return Err(AppError::NotFound(
            "No questions found for this subject".to_string(),
        ));
    }

    let questions: Vec<ExamQuestion> = questions.into_iter().map(ExamQuestion::from).collect();

    Ok(Json(StartExamResponse {
        subject_id,
        questions,
        time_remaining: duration * 60,
    }))
}

/// Grades a submission and persists the permanent result row. Student only.
///
/// `total` is the subject's question count at submission time. The UNIQUE
/// (student_id, subject_id) constraint turns a duplicate submission, racing
/// or otherwise, into the same 400 the start check gives.
pub async fn submit_exam(
    CurrentStudent(student): CurrentStudent,
    State(pool): State<SqlitePool>,
    Json(payload): Json<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, subject_id, question_text, option_a, option_b, option_c,
               option_d, correct_option
        FROM questions
        WHERE subject_id = ?
        ORDER BY id
        "#,
    )
    .bind(payload.subject_id)
    .fetch_all(&pool)
    .await?;

    if questions.is_empty() {
        return Err(AppError::NotFound(
            "No questions for this subject".to_string(),
        ));
    }

    let total = questions.len() as i64;
    let score = score_answers(&questions, &payload.answers);
    let percentage = percentage_for(score, total);
    let (grade, status) = grade_for(percentage);

    let result = sqlx::query_as::<_, ExamResult>(
        r#"
        INSERT INTO results (student_id, subject_id, score, total, percentage, grade, status)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id, student_id, subject_id, score, total, percentage, grade, status, created_at
        "#,
    )
    .bind(student.id)
    .bind(payload.subject_id)
    .bind(score)
    .bind(total)
    .bind(percentage)
    .bind(grade)
    .bind(status)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            AppError::Conflict("You have already completed this exam".to_string())
        } else {
            tracing::error!("Failed to persist exam result: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!(
        "Student {} completed subject {}: {}/{} ({})",
        student.id,
        payload.subject_id,
        score,
        total,
        result.status
    );

    Ok(Json(ResultOut::from(result)))
}
