use std::str::FromStr;

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use password_hash::rand_core::OsRng;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::auth::{LoginRequest, LoginResponse, RegisterRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Role, User},
    response::ApiResponse,
};

const MIN_PASSWORD_LEN: usize = 8;
const SESSION_TTL_HOURS: i64 = 24;

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    role: String,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct CredentialRow {
    id: Uuid,
    password_hash: String,
}

pub async fn register_user(
    pool: &DbPool,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest { username, password } = payload;
    let username = username.trim().to_string();
    validate_new_credentials(&username, &password)?;

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE username = $1")
        .bind(username.as_str())
        .fetch_optional(pool)
        .await?;

    if exist.is_some() {
        return Err(AppError::BadRequest("Username is already taken".to_string()));
    }

    let password_hash = hash_password(&password)?;

    // New accounts always start as buyers; only an admin can change a role.
    let row: UserRow = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, password_hash)
        VALUES ($1, $2, $3)
        RETURNING id, username, role, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username.as_str())
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    Ok(ApiResponse::success("User created", user_from_row(row)?))
}

pub async fn login_user(
    pool: &DbPool,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { username, password } = payload;

    let row: Option<CredentialRow> =
        sqlx::query_as("SELECT id, password_hash FROM users WHERE username = $1")
            .bind(username.as_str())
            .fetch_optional(pool)
            .await?;

    // Same message for unknown username and wrong password.
    let row = row.ok_or_else(|| AppError::BadRequest("Invalid username or password".into()))?;
    verify_password(&password, &row.password_hash)?;

    let token = Uuid::new_v4();
    let expires_at = Utc::now() + Duration::hours(SESSION_TTL_HOURS);
    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(token)
        .bind(row.id)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(ApiResponse::success("Logged in", LoginResponse { token }))
}

pub async fn logout_user(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(user.session_token)
        .execute(pool)
        .await?;

    Ok(ApiResponse::message("Logged out"))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, stored_hash: &str) -> AppResult<()> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::BadRequest("Invalid username or password".into()))?;
    Ok(())
}

fn validate_new_credentials(username: &str, password: &str) -> AppResult<()> {
    if username.is_empty() {
        return Err(AppError::BadRequest("username is required".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn user_from_row(row: UserRow) -> AppResult<User> {
    let role = Role::from_str(&row.role)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    Ok(User {
        id: row.id,
        username: row.username,
        role,
        created_at: row.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_passwords_are_rejected() {
        assert!(validate_new_credentials("alice", "1234567").is_err());
        assert!(validate_new_credentials("alice", "12345678").is_ok());
    }

    #[test]
    fn empty_username_is_rejected() {
        assert!(validate_new_credentials("", "longenough").is_err());
    }

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(verify_password("wrong horse", &hash).is_err());
    }
}
