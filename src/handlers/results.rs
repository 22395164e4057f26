// src/handlers/results.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    guards::{CurrentAdmin, CurrentUser},
    models::{result::ResultView, user::ROLE_ADMIN},
};

/// Base projection for result rows enriched with student and subject names.
/// A single JOIN per request; no per-row lookups.
const RESULT_VIEW_SELECT: &str = r#"
    SELECT r.id, r.student_id, r.subject_id,
           u.name AS student_name, s.name AS subject_name,
           r.score, r.total, r.percentage, r.grade, r.status, r.created_at
    FROM results r
    JOIN users u ON u.id = r.student_id
    JOIN subjects s ON s.id = r.subject_id
"#;

/// Lists all results across all students, newest first. Admin only.
pub async fn list_all_results(
    CurrentAdmin(_admin): CurrentAdmin,
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, ResultView>(&format!("{RESULT_VIEW_SELECT} ORDER BY r.id DESC"))
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list results: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(rows))
}

/// Lists the calling account's own results, newest first.
pub async fn my_results(
    CurrentUser(user): CurrentUser,
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, ResultView>(&format!(
        "{RESULT_VIEW_SELECT} WHERE r.student_id = ? ORDER BY r.id DESC"
    ))
    .bind(user.id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list results for user {}: {:?}", user.id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(rows))
}

/// Fetches a single result by ID.
///
/// Students only see their own rows; a foreign row reads as 404 rather than
/// 403, so result IDs cannot be probed. Admins may fetch any row.
pub async fn get_result(
    CurrentUser(user): CurrentUser,
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let row = sqlx::query_as::<_, ResultView>(&format!("{RESULT_VIEW_SELECT} WHERE r.id = ?"))
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Result not found".to_string()))?;

    if row.student_id != user.id && user.role != ROLE_ADMIN {
        return Err(AppError::NotFound("Result not found".to_string()));
    }

    Ok(Json(row))
}
