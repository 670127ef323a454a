use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, Order, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    dto::catalog::{CreateProductForm, ProductList, UpdateProductForm},
    entity::brands::Entity as Brands,
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner_or_admin},
    models::{Product, Role},
    response::ApiResponse,
    routes::params::{PriceSort, ProductQuery},
    state::AppState,
};

/// Storefront listing. Filters compose independently; whatever price sort
/// is requested, sold-out products always sink to the end, with id as the
/// final tie-break.
pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let mut condition = Condition::all().add(Column::IsActive.eq(true));

    if let Some(brand) = query.brand {
        condition = condition.add(Column::BrandId.eq(brand));
    }

    if let Some(search) = query.search.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(Expr::col(Column::Title).ilike(pattern));
    }

    let mut finder = Products::find()
        .filter(condition)
        .order_by(Expr::col(Column::QuantityAvailable).eq(0), Order::Asc);

    finder = match query.sort_price {
        Some(PriceSort::Asc) => finder.order_by_asc(Column::Price),
        Some(PriceSort::Desc) => finder.order_by_desc(Column::Price),
        None => finder,
    };

    let items = finder
        .order_by_asc(Column::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    Ok(ApiResponse::success("Products", ProductList { items }))
}

/// Product page; still reachable by id when inactive, as on the storefront
/// it only disappears from the listing.
pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", product_from_entity(product)))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    form: CreateProductForm,
) -> AppResult<ApiResponse<Product>> {
    // Access control runs before anything else, payload included.
    match user.role {
        Role::Buyer => return Err(AppError::Forbidden),
        Role::Brand | Role::Admin => {}
    }

    let brand = Brands::find_by_id(form.brand_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    // Sellers post into their own brands; admins into any.
    ensure_owner_or_admin(user, brand.owner_id)?;

    validate_price(form.price)?;
    validate_quantity(form.quantity_available)?;

    let staged = match &form.image {
        Some(file) => Some(state.uploads.stage(&file.original_name, &file.data).await?),
        None => None,
    };

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(form.title),
        description: Set(form.description),
        price: Set(form.price),
        quantity_available: Set(form.quantity_available),
        is_active: Set(true),
        image: Set(staged.as_ref().map(|s| s.filename().to_string())),
        brand_id: Set(brand.id),
        created_at: NotSet,
    };

    match active.insert(&state.orm).await {
        Ok(product) => {
            if let Some(staged) = staged {
                state.uploads.commit(staged).await?;
            }
            Ok(ApiResponse::success(
                "Product created",
                product_from_entity(product),
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

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    form: UpdateProductForm,
) -> AppResult<ApiResponse<Product>> {
    let (existing, brand) = Products::find_by_id(id)
        .find_also_related(Brands)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let brand = brand.ok_or_else(|| AppError::Internal(anyhow::anyhow!("product without brand")))?;
    ensure_owner_or_admin(user, brand.owner_id)?;

    if let Some(price) = form.price {
        validate_price(price)?;
    }
    if let Some(quantity) = form.quantity_available {
        validate_quantity(quantity)?;
    }

    let staged = match &form.image {
        Some(file) => Some(state.uploads.stage(&file.original_name, &file.data).await?),
        None => None,
    };

    let mut active: ActiveModel = existing.into();
    if let Some(title) = form.title {
        active.title = Set(title);
    }
    if let Some(description) = form.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = form.price {
        active.price = Set(price);
    }
    if let Some(quantity) = form.quantity_available {
        active.quantity_available = Set(quantity);
    }
    if let Some(is_active) = form.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(staged) = &staged {
        active.image = Set(Some(staged.filename().to_string()));
    }

    match active.update(&state.orm).await {
        Ok(product) => {
            if let Some(staged) = staged {
                state.uploads.commit(staged).await?;
            }
            Ok(ApiResponse::success(
                "Product updated",
                product_from_entity(product),
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

/// Hard delete. Cart rows pointing at the product are left dangling and
/// filtered out of cart reads.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let (_, brand) = Products::find_by_id(id)
        .find_also_related(Brands)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let brand = brand.ok_or_else(|| AppError::Internal(anyhow::anyhow!("product without brand")))?;
    ensure_owner_or_admin(user, brand.owner_id)?;

    Products::delete_by_id(id).exec(&state.orm).await?;

    Ok(ApiResponse::message("Product deleted"))
}

fn validate_price(price: i64) -> AppResult<()> {
    if price < 0 {
        return Err(AppError::BadRequest("price must be non-negative".into()));
    }
    Ok(())
}

fn validate_quantity(quantity: i32) -> AppResult<()> {
    if quantity < 0 {
        return Err(AppError::BadRequest(
            "quantity_available must be non-negative".into(),
        ));
    }
    Ok(())
}

pub(crate) fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        title: model.title,
        description: model.description,
        price: model.price,
        quantity_available: model.quantity_available,
        is_active: model.is_active,
        image: model.image,
        brand_id: model.brand_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
