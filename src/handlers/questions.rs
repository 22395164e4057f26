// src/handlers/questions.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    guards::CurrentAdmin,
    models::question::{Question, QuestionPayload},
};

const QUESTION_COLUMNS: &str =
    "id, subject_id, question_text, option_a, option_b, option_c, option_d, correct_option";

/// Adds a question to a subject's bank. Admin only.
///
/// The capacity check (count < subject.total_questions) and the insert run
/// in one transaction, so concurrent adds cannot overshoot the cap.
pub async fn add_question(
    CurrentAdmin(_admin): CurrentAdmin,
    State(pool): State<SqlitePool>,
    Path(subject_id): Path<i64>,
    Json(payload): Json<QuestionPayload>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let mut tx = pool.begin().await?;

    let capacity = sqlx::query_scalar::<_, i64>("SELECT total_questions FROM subjects WHERE id = ?")
        .bind(subject_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject not found".to_string()))?;

    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions WHERE subject_id = ?")
        .bind(subject_id)
        .fetch_one(&mut *tx)
        .await?;

    if count >= capacity {
        return Err(AppError::Conflict(
            "Maximum number of questions reached for this subject".to_string(),
        ));
    }

    let question = sqlx::query_as::<_, Question>(&format!(
        r#"
        INSERT INTO questions
        (subject_id, question_text, option_a, option_b, option_c, option_d, correct_option)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING {QUESTION_COLUMNS}
        "#
    ))
    .bind(subject_id)
    .bind(&payload.question_text)
    .bind(&payload.option_a)
    .bind(&payload.option_b)
    .bind(&payload.option_c)
    .bind(&payload.option_d)
    .bind(&payload.correct_option)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::from(e)
    })?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// Lists all questions of a subject, in stable ID order. Public.
/// Includes the correct option (admin view, per the API contract).
pub async fn list_questions(
    State(pool): State<SqlitePool>,
    Path(subject_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let questions = sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE subject_id = ? ORDER BY id"
    ))
    .bind(subject_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list questions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(questions))
}

/// Fully replaces a question's content fields and correct option. Admin only.
pub async fn update_question(
    CurrentAdmin(_admin): CurrentAdmin,
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<QuestionPayload>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let question = sqlx::query_as::<_, Question>(&format!(
        r#"
        UPDATE questions
        SET question_text = ?, option_a = ?, option_b = ?, option_c = ?,
            option_d = ?, correct_option = ?
        WHERE id = ?
        RETURNING {QUESTION_COLUMNS}
        "#
    ))
    .bind(&payload.question_text)
    .bind(&payload.option_a)
    .bind(&payload.option_b)
    .bind(&payload.option_c)
    .bind(&payload.option_d)
    .bind(&payload.correct_option)
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update question {}: {:?}", id, e);
        AppError::from(e)
    })?
    .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    Ok(Json(question))
}

/// Deletes a question by ID. Admin only.
pub async fn delete_question(
    CurrentAdmin(_admin): CurrentAdmin,
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question {}: {:?}", id, e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(Json(json!({"message": "Question deleted successfully"})))
}
