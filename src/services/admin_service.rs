use std::str::FromStr;

use chrono::{DateTime, Utc};
use sea_orm::{EntityTrait, QueryOrder};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    dto::admin::{UpdateRoleRequest, UserList},
    dto::catalog::{BrandList, ProductList},
    entity::brands::{Column as BrandCol, Entity as Brands},
    entity::products::{Column as ProdCol, Entity as Products},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Role, User},
    response::ApiResponse,
    services::brand_service::brand_from_entity,
    services::product_service::product_from_entity,
    state::AppState,
};

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    role: String,
    created_at: DateTime<Utc>,
}

pub async fn list_users(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;

    let rows: Vec<UserRow> =
        sqlx::query_as("SELECT id, username, role, created_at FROM users ORDER BY created_at")
            .fetch_all(&state.pool)
            .await?;

    let items = rows
        .into_iter()
        .map(user_from_row)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success("Users", UserList { items }))
}

pub async fn update_user_role(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
    payload: UpdateRoleRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(admin)?;

    let role = Role::from_str(payload.role.trim()).map_err(|_| {
        AppError::BadRequest("role must be one of buyer, brand, admin".to_string())
    })?;

    let row: Option<UserRow> = sqlx::query_as(
        r#"
        UPDATE users
        SET role = $2
        WHERE id = $1
        RETURNING id, username, role, created_at
        "#,
    )
    .bind(id)
    .bind(role.as_str())
    .fetch_optional(&state.pool)
    .await?;

    let row = row.ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Role changed", user_from_row(row)?))
}

/// Every brand in the store, for the admin console.
pub async fn list_brands(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<BrandList>> {
    ensure_admin(user)?;

    let items = Brands::find()
        .order_by_asc(BrandCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(brand_from_entity)
        .collect();

    Ok(ApiResponse::success("Brands", BrandList { items }))
}

/// Every product, inactive ones included.
pub async fn list_products(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;

    let items = Products::find()
        .order_by_asc(ProdCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    Ok(ApiResponse::success("Products", ProductList { items }))
}

fn user_from_row(row: UserRow) -> AppResult<User> {
    let role =
        Role::from_str(&row.role).map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    Ok(User {
        id: row.id,
        username: row.username,
        role,
        created_at: row.created_at,
    })
}
