use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait, Statement};
use storefront_api::{
    db::{create_orm_conn, run_migrations},
    dto::{
        auth::RegisterRequest,
        categories::CreateCategoryRequest,
        orders::{CreateOrderRequest, OrderItemInput, UpdateOrderStatusRequest},
        products::CreateProductRequest,
    },
    entity::{OrderItems, orders::OrderStatus},
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::ProductQuery,
    services::{auth_service, category_service, order_service, product_service},
    state::{AppState, AuthSettings},
};
use uuid::Uuid;

// Catalog visibility, featured listing, order totals and cascading deletes
// against a real Postgres database.
#[tokio::test]
async fn catalog_and_order_records_flow() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;
    let registered = auth_service::register_user(
        &state,
        RegisterRequest {
            email: "staff@example.com".into(),
            password: "staff12345".into(),
        },
    )
    .await?
    .data
    .expect("user");
    let staff = AuthUser {
        user_id: registered.id,
        is_staff: true,
    };

    let category = category_service::create_category(
        &state,
        Some(&staff),
        CreateCategoryRequest {
            name: "Desk".into(),
            slug: "desk".into(),
            description: "Desk accessories".into(),
        },
    )
    .await?
    .data
    .expect("category");

    // Ten active products plus one retired.
    for i in 0..10 {
        product_service::create_product(
            &state,
            Some(&staff),
            product(&format!("mug-{i}"), category.id, true),
        )
        .await?;
    }
    product_service::create_product(&state, Some(&staff), product("retired", category.id, false))
        .await?;

    let anonymous = product_service::list_products(
        &state,
        None,
        ProductQuery {
            per_page: Some(100),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(anonymous.data.expect("products").items.len(), 10);

    let staff_view = product_service::list_products(
        &state,
        Some(&staff),
        ProductQuery {
            per_page: Some(100),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(staff_view.data.expect("products").items.len(), 11);

    let err = product_service::get_product(&state, None, "retired")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let featured = product_service::featured_products(&state).await?;
    let featured = featured.data.expect("featured").items;
    assert_eq!(featured.len(), 8);
    assert!(featured.iter().all(|p| p.is_active));

    // A category with products cannot be removed.
    let err = category_service::delete_category(&state, Some(&staff), "desk")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let recorded = order_service::create_order(
        &state,
        &staff,
        CreateOrderRequest {
            customer_name: "Ada".into(),
            customer_email: "ada@example.com".into(),
            status: OrderStatus::default(),
            items: vec![
                OrderItemInput {
                    product_name: "Ferris Mug".into(),
                    quantity: 3,
                    price: Decimal::new(1999, 2),
                },
                OrderItemInput {
                    product_name: "Sticker".into(),
                    quantity: 1,
                    price: Decimal::new(50, 2),
                },
            ],
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(recorded.order.status, OrderStatus::Pending);
    assert_eq!(recorded.order.total_amount, Decimal::new(6047, 2));
    assert_eq!(recorded.items[0].total_price, Decimal::new(5997, 2));

    let order_id = recorded.order.id;
    let updated = order_service::update_order_status(
        &state,
        &staff,
        order_id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Shipped,
        },
    )
    .await?;
    assert_eq!(updated.data.expect("order").status, OrderStatus::Shipped);

    order_service::delete_order(&state, &staff, order_id).await?;
    assert_eq!(OrderItems::find().count(state.db()).await?, 0);

    let err = order_service::get_order(&state, &staff, order_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}

fn product(slug: &str, category: Uuid, is_active: bool) -> CreateProductRequest {
    CreateProductRequest {
        name: slug.replace('-', " "),
        slug: slug.into(),
        description: String::new(),
        price: Decimal::new(1200, 2),
        category,
        image: None,
        stock_quantity: 5,
        is_active,
    }
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, products, categories, audit_logs, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState::new(
        orm,
        AuthSettings {
            jwt_secret: "flow-test-secret".into(),
            token_ttl_hours: 1,
        },
    ))
}
