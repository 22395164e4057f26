// src/guards.rs

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::{
    error::AppError,
    models::user::{ROLE_ADMIN, ROLE_STUDENT, User},
    state::AppState,
    utils::jwt::verify_jwt,
};

/// Extractor for any authenticated account.
///
/// Parses the 'Authorization: Bearer <token>' header, verifies the JWT and
/// loads the account row it refers to. Rejects with 401 on a missing,
/// malformed or expired credential, and 404 if the account no longer exists.
pub struct CurrentUser(pub User);

/// Extractor for admin-only routes. 403 for any other role.
pub struct CurrentAdmin(pub User);

/// Extractor for student-only routes (exam taking). 403 for any other role.
pub struct CurrentStudent(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::AuthError("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::AuthError("Invalid authorization header".to_string()))?;

        let claims = verify_jwt(token, &state.config.jwt_secret)?;

        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, role FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&state.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load account {}: {:?}", user_id, e);
            AppError::InternalServerError(e.to_string())
        })?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

        Ok(CurrentUser(user))
    }
}

impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.role != ROLE_ADMIN {
            return Err(AppError::Forbidden(
                "You don't have permission to perform this action".to_string(),
            ));
        }

        Ok(CurrentAdmin(user))
    }
}

impl FromRequestParts<AppState> for CurrentStudent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.role != ROLE_STUDENT {
            return Err(AppError::Forbidden(
                "Only students can take exams".to_string(),
            ));
        }

        Ok(CurrentStudent(user))
    }
}
