use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::catalog::{BrandList, BrandWithProducts, CreateBrandForm, UpdateBrandForm},
    entity::brands::{ActiveModel, Column, Entity as Brands, Model as BrandModel},
    entity::products::{Column as ProdCol, Entity as Products},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner_or_admin, ensure_role},
    models::{Brand, Role},
    response::ApiResponse,
    services::product_service::product_from_entity,
    state::AppState,
};

pub async fn list_brands(state: &AppState) -> AppResult<ApiResponse<BrandList>> {
    let items = Brands::find()
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(brand_from_entity)
        .collect();

    Ok(ApiResponse::success("Brands", BrandList { items }))
}

/// Public brand page: the brand and everything it sells, inactive included.
pub async fn get_brand(state: &AppState, id: Uuid) -> AppResult<ApiResponse<BrandWithProducts>> {
    let brand = Brands::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let products = Products::find()
        .filter(ProdCol::BrandId.eq(brand.id))
        .order_by_asc(ProdCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let data = BrandWithProducts {
        brand: brand_from_entity(brand),
        products,
    };
    Ok(ApiResponse::success("Brand", data))
}

pub async fn my_brands(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<BrandList>> {
    ensure_role(user, Role::Brand)?;

    let items = Brands::find()
        .filter(Column::OwnerId.eq(user.user_id))
        .order_by_asc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(brand_from_entity)
        .collect();

    Ok(ApiResponse::success("My brands", BrandList { items }))
}

pub async fn create_brand(
    state: &AppState,
    user: &AuthUser,
    form: CreateBrandForm,
) -> AppResult<ApiResponse<Brand>> {
    ensure_role(user, Role::Brand)?;

    let staged = match &form.logo {
        Some(file) => Some(state.uploads.stage(&file.original_name, &file.data).await?),
        None => None,
    };

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(form.name),
        description: Set(form.description),
        logo: Set(staged.as_ref().map(|s| s.filename().to_string())),
        owner_id: Set(user.user_id),
        created_at: NotSet,
    };

    match active.insert(&state.orm).await {
        Ok(brand) => {
            if let Some(staged) = staged {
                state.uploads.commit(staged).await?;
            }
            Ok(ApiResponse::success(
                "Brand created",
                brand_from_entity(brand),
            ))
        }
        Err(err) => {
            if let Some(staged) = staged {
                state.uploads.discard(staged).await;
            }
            Err(err.into())
        }
    }
}

pub async fn update_brand(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    form: UpdateBrandForm,
) -> AppResult<ApiResponse<Brand>> {
    let existing = Brands::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner_or_admin(user, existing.owner_id)?;

    let staged = match &form.logo {
        Some(file) => Some(state.uploads.stage(&file.original_name, &file.data).await?),
        None => None,
    };

    let mut active: ActiveModel = existing.into();
    if let Some(name) = form.name {
        active.name = Set(name);
    }
    if let Some(description) = form.description {
        active.description = Set(Some(description));
    }
    if let Some(staged) = &staged {
        // The previous logo file stays on disk; only the reference moves.
        active.logo = Set(Some(staged.filename().to_string()));
    }

    match active.update(&state.orm).await {
        Ok(brand) => {
            if let Some(staged) = staged {
                state.uploads.commit(staged).await?;
            }
            Ok(ApiResponse::success("Brand updated", brand_from_entity(brand)))
        }
        Err(err) => {
            if let Some(staged) = staged {
                state.uploads.discard(staged).await;
            }
            Err(err.into())
        }
    }
}

/// Deleting a brand takes its products with it (`ON DELETE CASCADE`).
pub async fn delete_brand(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = Brands::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner_or_admin(user, existing.owner_id)?;

    Brands::delete_by_id(id).exec(&state.orm).await?;

    Ok(ApiResponse::message("Brand deleted"))
}

pub(crate) fn brand_from_entity(model: BrandModel) -> Brand {
    Brand {
        id: model.id,
        name: model.name,
        description: model.description,
        logo: model.logo,
        owner_id: model.owner_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
