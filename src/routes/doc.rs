use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiDoc,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        orders::{
            CreateOrderRequest, OrderItemInput, OrderList, OrderWithItems,
            UpdateOrderStatusRequest,
        },
        products::{CreateProductRequest, FeaturedProducts, ProductList, UpdateProductRequest},
    },
    entity::orders::OrderStatus,
    models::{Category, Order, OrderItem, ProductDetail, ProductSummary, User},
    response::{ApiResponse, Meta},
    routes::{auth, categories, health, orders, products},
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
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::replace_category,
        categories::update_category,
        categories::delete_category,
        products::list_products,
        products::featured_products,
        products::get_product,
        products::create_product,
        products::replace_product,
        products::update_product,
        products::delete_product,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_order_status,
        orders::delete_order
    ),
    components(
        schemas(
            User,
            Category,
            ProductSummary,
            ProductDetail,
            Order,
            OrderItem,
            OrderStatus,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CreateProductRequest,
            UpdateProductRequest,
            CreateOrderRequest,
            OrderItemInput,
            UpdateOrderStatusRequest,
            CategoryList,
            ProductList,
            FeaturedProducts,
            OrderList,
            OrderWithItems,
            Meta,
            ApiResponse<Category>,
            ApiResponse<CategoryList>,
            ApiResponse<ProductDetail>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Categories", description = "Catalog categories, looked up by slug"),
        (name = "Products", description = "Catalog products, looked up by slug"),
        (name = "Orders", description = "Order records (staff only)"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiDoc> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
