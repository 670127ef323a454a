use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::catalog::{
        BrandList, BrandWithProducts, CreateBrandForm, UpdateBrandForm,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Brand,
    response::ApiResponse,
    services::brand_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_brands).post(create_brand))
        .route("/mine", get(my_brands))
        .route(
            "/{id}",
            get(get_brand).put(update_brand).delete(delete_brand),
        )
}

#[utoipa::path(
    get,
    path = "/api/brands",
    responses(
        (status = 200, description = "Brand directory", body = ApiResponse<BrandList>)
    ),
    tag = "Brands"
)]
pub async fn list_brands(State(state): State<AppState>) -> AppResult<Json<ApiResponse<BrandList>>> {
    let resp = brand_service::list_brands(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand ID")),
    responses(
        (status = 200, description = "Brand with its products", body = ApiResponse<BrandWithProducts>),
        (status = 404, description = "Brand not found")
    ),
    tag = "Brands"
)]
pub async fn get_brand(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BrandWithProducts>>> {
    let resp = brand_service::get_brand(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/brands/mine",
    responses(
        (status = 200, description = "Brands owned by the caller", body = ApiResponse<BrandList>),
        (status = 403, description = "Caller is not a seller")
    ),
    security(("bearer_auth" = [])),
    tag = "Brands"
)]
pub async fn my_brands(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<BrandList>>> {
    let resp = brand_service::my_brands(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/brands",
    responses(
        (status = 200, description = "Brand created (multipart form: name, description, logo)", body = ApiResponse<Brand>),
        (status = 400, description = "Missing name"),
        (status = 403, description = "Caller is not a seller")
    ),
    security(("bearer_auth" = [])),
    tag = "Brands"
)]
pub async fn create_brand(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Brand>>> {
    let form = CreateBrandForm::from_multipart(multipart).await?;
    let resp = brand_service::create_brand(&state, &user, form).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand ID")),
    responses(
        (status = 200, description = "Brand updated (multipart form)", body = ApiResponse<Brand>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Brand not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Brands"
)]
pub async fn update_brand(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Brand>>> {
    let form = UpdateBrandForm::from_multipart(multipart).await?;
    let resp = brand_service::update_brand(&state, &user, id, form).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand ID")),
    responses(
        (status = 200, description = "Brand and its products deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Brand not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Brands"
)]
pub async fn delete_brand(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = brand_service::delete_brand(&state, &user, id).await?;
    Ok(Json(resp))
}
