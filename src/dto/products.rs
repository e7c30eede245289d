use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{SLUG_REGEX, validate_money};
use crate::models::{ProductDetail, ProductSummary};

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 200), regex(path = *SLUG_REGEX))]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[schema(value_type = String, example = "19.99")]
    #[validate(custom(function = "validate_money"))]
    pub price: Decimal,
    /// Category id.
    pub category: Uuid,
    #[validate(length(max = 255))]
    pub image: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock_quantity: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200), regex(path = *SLUG_REGEX))]
    pub slug: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "19.99")]
    #[validate(custom(function = "validate_money"))]
    pub price: Option<Decimal>,
    pub category: Option<Uuid>,
    /// An empty string clears the image.
    #[validate(length(max = 255))]
    pub image: Option<String>,
    #[validate(range(min = 0))]
    pub stock_quantity: Option<i32>,
    pub is_active: Option<bool>,
}

impl From<CreateProductRequest> for UpdateProductRequest {
    fn from(full: CreateProductRequest) -> Self {
        Self {
            name: Some(full.name),
            slug: Some(full.slug),
            description: Some(full.description),
            price: Some(full.price),
            category: Some(full.category),
            image: Some(full.image.unwrap_or_default()),
            stock_quantity: Some(full.stock_quantity),
            is_active: Some(full.is_active),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<ProductSummary>)]
    pub items: Vec<ProductSummary>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct FeaturedProducts {
    #[schema(value_type = Vec<ProductDetail>)]
    pub items: Vec<ProductDetail>,
}
