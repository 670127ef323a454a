use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod brands;
pub mod cart;
pub mod doc;
pub mod health;
pub mod params;
pub mod products;
pub mod uploads;

// Build the API router without binding state; it is provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/brands", brands::router())
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/admin", admin::router())
}
