use std::str::FromStr;

use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{db::DbPool, error::AppError, models::Role, state::AppState};

/// Authenticated caller, resolved from the opaque session token sent as
/// `Authorization: Bearer <token>`. Sessions live in the database and are
/// looked up on every request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub session_token: Uuid,
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role == role {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Admin)
}

/// Ownership rule for brand/product mutation: the resource owner, or an
/// admin regardless of ownership.
pub fn ensure_owner_or_admin(user: &AuthUser, owner_id: Uuid) -> Result<(), AppError> {
    match user.role {
        Role::Admin => Ok(()),
        Role::Buyer | Role::Brand => {
            if user.user_id == owner_id {
                Ok(())
            } else {
                Err(AppError::Forbidden)
            }
        }
    }
}

#[derive(sqlx::FromRow)]
struct SessionUserRow {
    user_id: Uuid,
    username: String,
    role: String,
    expires_at: DateTime<Utc>,
}

pub async fn lookup_session(pool: &DbPool, token: Uuid) -> Result<AuthUser, AppError> {
    let row: Option<SessionUserRow> = sqlx::query_as(
        r#"
        SELECT u.id AS user_id, u.username, u.role, s.expires_at
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token = $1
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    let row = row.ok_or(AppError::Unauthorized)?;

    if row.expires_at <= Utc::now() {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(pool)
            .await?;
        return Err(AppError::Unauthorized);
    }

    // A role value outside the closed set means the store was tampered with.
    let role = Role::from_str(&row.role)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    Ok(AuthUser {
        user_id: row.user_id,
        username: row.username,
        role,
        session_token: token,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?;

        let auth_str = auth_header.to_str().map_err(|_| AppError::Unauthorized)?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?
            .trim();
        let token = Uuid::parse_str(token).map_err(|_| AppError::Unauthorized)?;

        lookup_session(&state.pool, token).await
    }
}
