use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::validate_money;
use crate::{
    entity::orders::OrderStatus,
    models::{Order, OrderItem},
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct OrderItemInput {
    #[validate(length(min = 1, max = 200))]
    pub product_name: String,
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[schema(value_type = String, example = "12.00")]
    #[validate(custom(function = "validate_money"))]
    pub price: Decimal,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: String,
    #[serde(default)]
    pub status: OrderStatus,
    #[validate(nested)]
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
