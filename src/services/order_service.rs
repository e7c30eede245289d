use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::{
        orders::{
            CreateOrderRequest, OrderItemInput, OrderList, OrderWithItems,
            UpdateOrderStatusRequest,
        },
        validate_money,
    },
    entity::{
        OrderItems, Orders,
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol},
        orders::{ActiveModel as OrderActive, Column as OrderCol},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    state::AppState,
};

/// Sum of `quantity * price` over the lines.
pub fn order_total(items: &[OrderItemInput]) -> Decimal {
    items
        .iter()
        .map(|item| Decimal::from(item.quantity) * item.price)
        .sum()
}

/// Lines of one order in a stable order.
pub fn order_items_query(order_id: Uuid) -> Select<OrderItems> {
    OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::Id)
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt);

    let total = finder.clone().count(state.db()).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(state.db())
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_staff(user)?;
    let order = Orders::find_by_id(id).one(state.db()).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = order_items_query(order.id)
        .all(state.db())
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(ApiResponse::record(
        "Order found",
        OrderWithItems {
            order: order.into(),
            items,
        },
    ))
}

/// Records an order and its lines in one transaction.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_staff(user)?;
    payload.validate()?;

    let total_amount = order_total(&payload.items);
    if validate_money(&total_amount).is_err() {
        return Err(AppError::BadRequest(
            "total_amount does not fit in 10 digits".into(),
        ));
    }

    let txn = state.db().begin().await?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        customer_name: Set(payload.customer_name),
        customer_email: Set(payload.customer_email),
        created_at: NotSet,
        status: Set(payload.status),
        total_amount: Set(total_amount),
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(payload.items.len());
    for line in payload.items {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_name: Set(line.product_name),
            quantity: Set(line.quantity),
            price: Set(line.price),
        }
        .insert(&txn)
        .await?;
        items.push(OrderItem::from(item));
    }

    txn.commit().await?;
    tracing::info!(order_id = %order.id, items = items.len(), "order recorded");

    audit::record(
        state.db(),
        user.user_id,
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::record(
        "Order created",
        OrderWithItems {
            order: order.into(),
            items,
        },
    ))
}

/// Any status may follow any other; only membership in the enum is enforced.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_staff(user)?;

    let existing = Orders::find_by_id(id).one(state.db()).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let mut active: OrderActive = existing.into();
    active.status = Set(payload.status);
    let order = active.update(state.db()).await?;

    audit::record(
        state.db(),
        user.user_id,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status }),
    )
    .await;

    Ok(ApiResponse::record("Order updated", order.into()))
}

/// Items go with the order through the `ON DELETE CASCADE` foreign key.
pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;
    let result = Orders::delete_by_id(id).exec(state.db()).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        state.db(),
        user.user_id,
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::record("Deleted", serde_json::json!({})))
}
