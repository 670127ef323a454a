use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{UpdateRoleRequest, UserList},
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartItemView, CartView},
        catalog::{BrandList, BrandWithProducts, ProductList},
    },
    models::{Brand, CartItem, Product, Role, User},
    response::ApiResponse,
    routes::{admin, auth, brands, cart, health, params, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("Opaque")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::logout,
        brands::list_brands,
        brands::get_brand,
        brands::my_brands,
        brands::create_brand,
        brands::update_brand,
        brands::delete_brand,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        cart::list_cart,
        cart::add_to_cart,
        cart::remove_from_cart,
        admin::list_users,
        admin::update_user_role,
        admin::list_all_brands,
        admin::list_all_products,
    ),
    components(
        schemas(
            Role,
            User,
            Brand,
            Product,
            CartItem,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            AddToCartRequest,
            CartItemView,
            CartView,
            UpdateRoleRequest,
            UserList,
            BrandList,
            BrandWithProducts,
            ProductList,
            params::ProductQuery,
            params::PriceSort,
            health::HealthData,
            ApiResponse<User>,
            ApiResponse<Brand>,
            ApiResponse<Product>,
            ApiResponse<CartView>,
            ApiResponse<BrandList>,
            ApiResponse<ProductList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and sessions"),
        (name = "Brands", description = "Brand directory and seller mutations"),
        (name = "Products", description = "Storefront listing and product mutations"),
        (name = "Cart", description = "Buyer cart"),
        (name = "Admin", description = "User-role and catalog administration"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
