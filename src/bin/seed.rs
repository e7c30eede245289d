use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set};
use storefront_api::{
    config::AppConfig,
    db::{OrmConn, create_orm_conn, run_migrations},
    entity::{Categories, Products, Users, categories, products, users},
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let staff_id = ensure_user(&orm, "staff@example.com", "staff12345", true).await?;
    let customer_id = ensure_user(&orm, "customer@example.com", "customer123", false).await?;
    seed_catalog(&orm).await?;

    println!("Seed completed. Staff ID: {staff_id}, Customer ID: {customer_id}");
    Ok(())
}

async fn ensure_user(
    orm: &OrmConn,
    email: &str,
    password: &str,
    is_staff: bool,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        is_staff: Set(is_staff),
        created_at: NotSet,
    };
    Users::insert(user)
        .on_conflict(
            OnConflict::column(users::Column::Email)
                .update_column(users::Column::IsStaff)
                .to_owned(),
        )
        .exec_without_returning(orm)
        .await?;

    // The insert may have hit an existing row, so read the id back.
    let existing = Users::find()
        .filter(users::Column::Email.eq(email))
        .one(orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {email} missing after upsert"))?;

    println!("Ensured user {email} (staff={is_staff})");
    Ok(existing.id)
}

async fn seed_catalog(orm: &OrmConn) -> anyhow::Result<()> {
    let catalog = [
        (
            ("Apparel", "apparel", "Things to wear while compiling"),
            vec![
                ("Axum Hoodie", "axum-hoodie", "Warm hoodie for Rustaceans", 5500, 50, true),
                ("Ferris Socks", "ferris-socks", "Crab-patterned socks", 1200, 0, true),
            ],
        ),
        (
            ("Desk", "desk", "Desk accessories"),
            vec![
                ("Ferris Mug", "ferris-mug", "Coffee tastes better with Ferris", 1200, 100, true),
                ("Rust Sticker Pack", "rust-sticker-pack", "Decorate your laptop", 500, 200, true),
                ("Borrow Checker Plush", "borrow-checker-plush", "Retired design", 2500, 3, false),
            ],
        ),
        (
            ("Books", "books", "Reading material"),
            vec![("E-book: Async Rust", "ebook-async-rust", "Learn async Rust patterns", 2500, 75, true)],
        ),
    ];

    for ((name, slug, description), products) in catalog {
        Categories::insert(categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            description: Set(description.to_string()),
        })
        .on_conflict(OnConflict::column(categories::Column::Slug).do_nothing().to_owned())
        .exec_without_returning(orm)
        .await?;

        let category = Categories::find()
            .filter(categories::Column::Slug.eq(slug))
            .one(orm)
            .await?
            .ok_or_else(|| anyhow::anyhow!("category {slug} missing after insert"))?;

        for (name, slug, description, cents, stock, is_active) in products {
            Products::insert(products::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(name.to_string()),
                slug: Set(slug.to_string()),
                description: Set(description.to_string()),
                price: Set(Decimal::new(cents, 2)),
                category_id: Set(category.id),
                image: Set(None),
                stock_quantity: Set(stock),
                is_active: Set(is_active),
                created_at: NotSet,
            })
            .on_conflict(OnConflict::column(products::Column::Slug).do_nothing().to_owned())
            .exec_without_returning(orm)
            .await?;
        }
    }

    println!("Seeded catalog");
    Ok(())
}
