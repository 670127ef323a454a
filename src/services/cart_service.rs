use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartItemView, CartView},
    entity::cart_items::{ActiveModel, Column, Entity as CartItems, Model as CartItemModel},
    entity::products::Entity as Products,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_role},
    models::{CartItem, Role},
    response::ApiResponse,
    services::product_service::product_from_entity,
    state::AppState,
};

/// Upsert into the buyer's cart. The availability check and the write run
/// in one transaction with the product row locked, so two concurrent adds
/// serialize instead of both passing the check.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    ensure_role(user, Role::Buyer)?;

    if payload.quantity < 1 {
        return Err(AppError::BadRequest(
            "quantity must be at least 1".to_string(),
        ));
    }

    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(payload.product_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if payload.quantity > product.quantity_available {
        return Err(AppError::BadRequest(
            "quantity exceeds available stock".to_string(),
        ));
    }

    let existing = CartItems::find()
        .filter(Column::UserId.eq(user.user_id))
        .filter(Column::ProductId.eq(product.id))
        .one(&txn)
        .await?;

    let item = match existing {
        Some(entry) => {
            // Repeated adds merge into the single (user, product) row,
            // clamped to what is in stock rather than rejected.
            let merged =
                merged_quantity(entry.quantity, payload.quantity, product.quantity_available);
            let mut active: ActiveModel = entry.into();
            active.quantity = Set(merged);
            active.update(&txn).await?
        }
        None => {
            ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                product_id: Set(product.id),
                quantity: Set(payload.quantity),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?
        }
    };

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Added to cart",
        cart_item_from_entity(item),
    ))
}

/// The cart with its live total. Rows whose product has been hard-deleted
/// are skipped.
pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    ensure_role(user, Role::Buyer)?;

    let rows = CartItems::find()
        .filter(Column::UserId.eq(user.user_id))
        .order_by_asc(Column::CreatedAt)
        .find_also_related(Products)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    let mut total: i64 = 0;
    for (entry, product) in rows {
        let Some(product) = product else {
            continue;
        };
        total += product.price * i64::from(entry.quantity);
        items.push(CartItemView {
            id: entry.id,
            product: product_from_entity(product),
            quantity: entry.quantity,
        });
    }

    Ok(ApiResponse::success("Cart", CartView { items, total }))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    // Scoped to the caller: someone else's row is indistinguishable from a
    // missing one.
    let entry = CartItems::find_by_id(item_id)
        .filter(Column::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    entry.delete(&state.orm).await?;

    Ok(ApiResponse::message("Removed from cart"))
}

/// Clamp semantics for merging adds: never above the product's current
/// availability, never an error.
fn merged_quantity(existing: i32, requested: i32, available: i32) -> i32 {
    existing.saturating_add(requested).min(available)
}

fn cart_item_from_entity(model: CartItemModel) -> CartItem {
    CartItem {
        id: model.id,
        user_id: model.user_id,
        product_id: model.product_id,
        quantity: model.quantity,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_below_the_stock_bound() {
        assert_eq!(merged_quantity(2, 2, 5), 4);
    }

    #[test]
    fn merge_clamps_at_the_stock_bound() {
        // 3 in the cart, 4 more requested, 5 in stock: clamped to 5, not 7.
        assert_eq!(merged_quantity(3, 4, 5), 5);
    }

    #[test]
    fn merge_never_overflows() {
        assert_eq!(merged_quantity(i32::MAX, 1, i32::MAX), i32::MAX);
    }
}
