//! JSON representations of the persisted records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    categories::Model as CategoryModel, order_items::Model as OrderItemModel,
    orders::Model as OrderModel, orders::OrderStatus, products::Model as ProductModel,
    users::Model as UserModel,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        Self {
            id: model.id,
            email: model.email,
            is_staff: model.is_staff,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
}

impl From<CategoryModel> for Category {
    fn from(model: CategoryModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
        }
    }
}

/// Lightweight product shape used by list endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    pub category_name: Option<String>,
    pub image: Option<String>,
    pub is_in_stock: bool,
}

impl ProductSummary {
    pub fn from_entity(model: ProductModel, category: Option<CategoryModel>) -> Self {
        Self {
            is_in_stock: model.is_in_stock(),
            id: model.id,
            name: model.name,
            slug: model.slug,
            price: model.price,
            category_name: category.map(|c| c.name),
            image: model.image,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetail {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    /// Category id.
    pub category: Uuid,
    pub category_name: Option<String>,
    pub image: Option<String>,
    pub stock_quantity: i32,
    pub is_in_stock: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ProductDetail {
    pub fn from_entity(model: ProductModel, category: Option<CategoryModel>) -> Self {
        Self {
            is_in_stock: model.is_in_stock(),
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            price: model.price,
            category: model.category_id,
            category_name: category.map(|c| c.name),
            image: model.image,
            stock_quantity: model.stock_quantity,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    #[schema(value_type = String, example = "59.97")]
    pub total_amount: Decimal,
}

impl From<OrderModel> for Order {
    fn from(model: OrderModel) -> Self {
        Self {
            id: model.id,
            customer_name: model.customer_name,
            customer_email: model.customer_email,
            created_at: model.created_at.with_timezone(&Utc),
            status: model.status,
            total_amount: model.total_amount,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    #[schema(value_type = String, example = "59.97")]
    pub total_price: Decimal,
}

impl From<OrderItemModel> for OrderItem {
    fn from(model: OrderItemModel) -> Self {
        Self {
            total_price: model.total_price(),
            id: model.id,
            order_id: model.order_id,
            product_name: model.product_name,
            quantity: model.quantity,
            price: model.price,
        }
    }
}
