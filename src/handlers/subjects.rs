// src/handlers/subjects.rs

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
    models::subject::{Subject, SubjectPayload},
};

const SUBJECT_COLUMNS: &str =
    "id, name, description, duration, total_questions, passing_score, created_at, updated_at";

/// Lists all subjects. Public.
pub async fn list_subjects(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let subjects = sqlx::query_as::<_, Subject>(&format!(
        "SELECT {SUBJECT_COLUMNS} FROM subjects ORDER BY id"
    ))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list subjects: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(subjects))
}

/// Fetches a single subject by ID. Public.
pub async fn get_subject(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let subject = sqlx::query_as::<_, Subject>(&format!(
        "SELECT {SUBJECT_COLUMNS} FROM subjects WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Subject not found".to_string()))?;

    Ok(Json(subject))
}

/// Creates a new subject. Admin only.
///
/// Subject names are unique (case-sensitive, exact match).
pub async fn create_subject(
    CurrentAdmin(_admin): CurrentAdmin,
    State(pool): State<SqlitePool>,
    Json(payload): Json<SubjectPayload>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let subject = sqlx::query_as::<_, Subject>(&format!(
        r#"
        INSERT INTO subjects (name, description, duration, total_questions, passing_score)
        VALUES (?, ?, ?, ?, ?)
        RETURNING {SUBJECT_COLUMNS}
        "#
    ))
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.duration)
    .bind(payload.total_questions)
    .bind(payload.passing_score)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            AppError::Conflict(format!("Subject '{}' already exists", payload.name))
        } else {
            tracing::error!("Failed to create subject: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(subject)))
}

/// Fully replaces a subject. Admin only.
///
/// The duplicate-name check excludes the subject's own ID, so renaming a
/// subject to its current name succeeds.
pub async fn update_subject(
    CurrentAdmin(_admin): CurrentAdmin,
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<SubjectPayload>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    sqlx::query_scalar::<_, i64>("SELECT id FROM subjects WHERE id = ?")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject not found".to_string()))?;

    let name_taken = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM subjects WHERE name = ? AND id <> ?",
    )
    .bind(&payload.name)
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    if name_taken.is_some() {
        return Err(AppError::Conflict(format!(
            "Subject '{}' already exists",
            payload.name
        )));
    }

    let subject = sqlx::query_as::<_, Subject>(&format!(
        r#"
        UPDATE subjects
        SET name = ?, description = ?, duration = ?, total_questions = ?,
            passing_score = ?, updated_at = datetime('now')
        WHERE id = ?
        RETURNING {SUBJECT_COLUMNS}
        "#
    ))
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.duration)
    .bind(payload.total_questions)
    .bind(payload.passing_score)
    .bind(id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update subject {}: {:?}", id, e);
        AppError::from(e)
    })?;

    Ok(Json(subject))
}

/// Deletes a subject. Admin only.
///
/// The schema cascades the delete to the subject's questions and results.
pub async fn delete_subject(
    CurrentAdmin(_admin): CurrentAdmin,
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM subjects WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete subject {}: {:?}", id, e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Subject not found".to_string()));
    }

    Ok(Json(json!({"message": "Subject deleted successfully"})))
}
