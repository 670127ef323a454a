use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PriceSort {
    Asc,
    Desc,
}

/// Storefront listing filters; each one is optional and they compose.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductQuery {
    pub brand: Option<Uuid>,
    pub search: Option<String>,
    pub sort_price: Option<PriceSort>,
}
