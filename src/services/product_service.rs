use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    db::OrmConn,
    dto::products::{CreateProductRequest, FeaturedProducts, ProductList, UpdateProductRequest},
    entity::{
        Categories, Products, categories,
        products::{ActiveModel, Column, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::{
        auth::AuthUser,
        permissions::{Action, Permission, Visibility, staff_for},
    },
    models::{ProductDetail, ProductSummary},
    response::{ApiResponse, Meta},
    routes::params::{ProductOrdering, ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

/// Size of the featured slice.
pub const FEATURED_LIMIT: u64 = 8;

/// Base product query for a caller: staff see everything, everyone else only
/// active products.
pub fn visible_products(visibility: Visibility) -> Select<Products> {
    match visibility {
        Visibility::All => Products::find(),
        Visibility::ActiveOnly => Products::find().filter(Column::IsActive.eq(true)),
    }
}

/// Applies the list filters, search and ordering of `query`.
pub fn product_listing(query: &ProductQuery, visibility: Visibility) -> Select<Products> {
    let mut condition = Condition::all();

    if let Some(category_id) = query.category {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    if let Some(slug) = query.category_slug.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(
            Column::CategoryId.in_subquery(
                Query::select()
                    .column(categories::Column::Id)
                    .from(Categories)
                    .and_where(categories::Column::Slug.eq(slug.as_str()))
                    .to_owned(),
            ),
        );
    }

    // non-staff are already pinned to active products
    if visibility == Visibility::All {
        if let Some(is_active) = query.is_active {
            condition = condition.add(Column::IsActive.eq(is_active));
        }
    }

    let terms = search_terms(query.search.as_deref().unwrap_or_default());
    for term in terms {
        let pattern = format!("%{}%", escape_like(term));
        condition = condition.add(
            Condition::any()
                .add(Expr::col((Products, Column::Name)).ilike(pattern.clone()))
                .add(Expr::col((Products, Column::Description)).ilike(pattern)),
        );
    }

    let mut finder = visible_products(visibility).filter(condition);
    for ordering in ProductOrdering::parse(query.ordering.as_deref()) {
        let sort_col = match ordering.sort_by {
            ProductSortBy::CreatedAt => Column::CreatedAt,
            ProductSortBy::Price => Column::Price,
            ProductSortBy::Name => Column::Name,
        };
        finder = match ordering.sort_order {
            SortOrder::Asc => finder.order_by_asc(sort_col),
            SortOrder::Desc => finder.order_by_desc(sort_col),
        };
    }
    finder
}

/// The active catalog, newest first, capped at [`FEATURED_LIMIT`].
pub fn featured_query() -> Select<Products> {
    visible_products(Visibility::ActiveOnly)
        .order_by_desc(Column::CreatedAt)
        .limit(FEATURED_LIMIT)
}

/// Search input split on whitespace and commas.
fn search_terms(raw: &str) -> Vec<&str> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|term| !term.is_empty())
        .collect()
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

pub async fn list_products(
    state: &AppState,
    caller: Option<&AuthUser>,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    Permission::for_action(Action::List).check(caller)?;
    let (page, limit, offset) = query.pagination().normalize();
    let finder = product_listing(&query, Visibility::for_caller(caller));

    let total = finder.clone().count(state.db()).await? as i64;

    let items = finder
        .find_also_related(Categories)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(state.db())
        .await?
        .into_iter()
        .map(|(product, category)| ProductSummary::from_entity(product, category))
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(
    state: &AppState,
    caller: Option<&AuthUser>,
    slug: &str,
) -> AppResult<ApiResponse<ProductDetail>> {
    Permission::for_action(Action::Retrieve).check(caller)?;
    let found = visible_products(Visibility::for_caller(caller))
        .filter(Column::Slug.eq(slug))
        .find_also_related(Categories)
        .one(state.db())
        .await?;
    let (product, category) = match found {
        Some(row) => row,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success(
        "Product",
        ProductDetail::from_entity(product, category),
        None,
    ))
}

/// First products of the active catalog in default order, whoever asks.
pub async fn featured_products(state: &AppState) -> AppResult<ApiResponse<FeaturedProducts>> {
    let items = featured_query()
        .find_also_related(Categories)
        .all(state.db())
        .await?
        .into_iter()
        .map(|(product, category)| ProductDetail::from_entity(product, category))
        .collect();

    Ok(ApiResponse::record("Featured products", FeaturedProducts { items }))
}

pub async fn create_product(
    state: &AppState,
    caller: Option<&AuthUser>,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<ProductDetail>> {
    let user = staff_for(Action::Create, caller)?;
    payload.validate()?;

    let category = find_category(state.db(), payload.category).await?;
    ensure_slug_free(state.db(), &payload.slug, None).await?;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        slug: Set(payload.slug),
        description: Set(payload.description),
        price: Set(payload.price),
        category_id: Set(category.id),
        image: Set(payload.image.filter(|img| !img.is_empty())),
        stock_quantity: Set(payload.stock_quantity),
        is_active: Set(payload.is_active),
        created_at: NotSet,
    };
    let product = active.insert(state.db()).await?;
    tracing::info!(product_id = %product.id, slug = %product.slug, "product created");

    audit::record(
        state.db(),
        user.user_id,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id, "slug": product.slug }),
    )
    .await;

    Ok(ApiResponse::record(
        "Product created",
        ProductDetail::from_entity(product, Some(category)),
    ))
}

/// Shared by PUT (`Action::Update`, every field present) and PATCH.
pub async fn update_product(
    state: &AppState,
    caller: Option<&AuthUser>,
    action: Action,
    slug: &str,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<ProductDetail>> {
    let user = staff_for(action, caller)?;
    payload.validate()?;

    let existing = find_by_slug(state.db(), slug).await?;
    let product_id = existing.id;
    let mut category_id = existing.category_id;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(new_slug) = payload.slug {
        if new_slug != slug {
            ensure_slug_free(state.db(), &new_slug, Some(product_id)).await?;
        }
        active.slug = Set(new_slug);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(new_category) = payload.category {
        category_id = find_category(state.db(), new_category).await?.id;
        active.category_id = Set(category_id);
    }
    if let Some(image) = payload.image {
        active.image = Set(Some(image).filter(|img| !img.is_empty()));
    }
    if let Some(stock_quantity) = payload.stock_quantity {
        active.stock_quantity = Set(stock_quantity);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }

    let product = if active.is_changed() {
        active.update(state.db()).await?
    } else {
        find_by_slug(state.db(), slug).await?
    };
    let category = Categories::find_by_id(category_id).one(state.db()).await?;
    tracing::info!(product_id = %product.id, "product updated");

    audit::record(
        state.db(),
        user.user_id,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::record(
        "Updated",
        ProductDetail::from_entity(product, category),
    ))
}

pub async fn delete_product(
    state: &AppState,
    caller: Option<&AuthUser>,
    slug: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let user = staff_for(Action::Destroy, caller)?;
    let result = Products::delete_many()
        .filter(Column::Slug.eq(slug))
        .exec(state.db())
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    tracing::info!(slug, "product deleted");

    audit::record(
        state.db(),
        user.user_id,
        "product_delete",
        "products",
        serde_json::json!({ "slug": slug }),
    )
    .await;

    Ok(ApiResponse::record("Deleted", serde_json::json!({})))
}

async fn find_by_slug(orm: &OrmConn, slug: &str) -> AppResult<ProductModel> {
    Products::find()
        .filter(Column::Slug.eq(slug))
        .one(orm)
        .await?
        .ok_or(AppError::NotFound)
}

async fn find_category(orm: &OrmConn, id: Uuid) -> AppResult<categories::Model> {
    Categories::find_by_id(id)
        .one(orm)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("Invalid category id {id}")))
}

async fn ensure_slug_free(orm: &OrmConn, slug: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut finder = Products::find().filter(Column::Slug.eq(slug));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.one(orm).await?.is_some() {
        return Err(AppError::BadRequest(format!(
            "product with slug '{slug}' already exists"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use rust_decimal::Decimal;
    use sea_orm::{DatabaseBackend, MockDatabase, QueryTrait};

    use crate::state::AuthSettings;

    /// Rendered SQL plus the debug form of its bound values.
    fn sql(select: Select<Products>) -> (String, String) {
        let stmt = select.build(DatabaseBackend::Postgres);
        (stmt.sql, format!("{:?}", stmt.values))
    }

    fn state_with(db: MockDatabase) -> AppState {
        AppState::new(
            db.into_connection(),
            AuthSettings {
                jwt_secret: "test-secret".into(),
                token_ttl_hours: 1,
            },
        )
    }

    fn staff() -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            is_staff: true,
        }
    }

    fn category() -> categories::Model {
        categories::Model {
            id: Uuid::new_v4(),
            name: "Apparel".into(),
            slug: "apparel".into(),
            description: String::new(),
        }
    }

    fn product(n: i64, category_id: Uuid) -> ProductModel {
        ProductModel {
            id: Uuid::new_v4(),
            name: format!("Product {n}"),
            slug: format!("product-{n}"),
            description: String::new(),
            price: Decimal::new(1000 + n, 2),
            category_id,
            image: None,
            stock_quantity: n as i32,
            is_active: true,
            created_at: FixedOffset::east_opt(0)
                .unwrap()
                .timestamp_opt(1_700_000_000 - n, 0)
                .unwrap(),
        }
    }

    #[test]
    fn anonymous_queries_are_pinned_to_active_products() {
        let (rendered, values) = sql(visible_products(Visibility::ActiveOnly));
        let (_, filter) = rendered.split_once("WHERE").expect("has a WHERE clause");
        assert!(filter.contains("\"products\".\"is_active\" = $1"));
        assert!(values.contains("Bool(Some(true))"));

        let (rendered, _) = sql(visible_products(Visibility::All));
        assert!(!rendered.contains("WHERE"));
    }

    #[test]
    fn is_active_filter_only_applies_for_staff() {
        let query = ProductQuery {
            is_active: Some(false),
            ..Default::default()
        };
        let (_, staff_values) = sql(product_listing(&query, Visibility::All));
        assert!(staff_values.contains("Bool(Some(false))"));

        let (_, public_values) = sql(product_listing(&query, Visibility::ActiveOnly));
        assert!(public_values.contains("Bool(Some(true))"));
        assert!(!public_values.contains("Bool(Some(false))"));
    }

    #[test]
    fn listing_defaults_to_newest_first() {
        let (rendered, _) = sql(product_listing(&ProductQuery::default(), Visibility::All));
        assert!(rendered.ends_with("ORDER BY \"products\".\"created_at\" DESC"));
    }

    #[test]
    fn listing_combines_search_category_and_ordering() {
        let query = ProductQuery {
            category_slug: Some("apparel".into()),
            search: Some("hoodie".into()),
            ordering: Some("price".into()),
            ..Default::default()
        };
        let (rendered, values) = sql(product_listing(&query, Visibility::ActiveOnly));
        assert!(rendered.contains("\"products\".\"name\" ILIKE"));
        assert!(rendered.contains("\"products\".\"description\" ILIKE"));
        assert!(rendered.contains("IN (SELECT"));
        assert!(rendered.contains("FROM \"categories\""));
        assert!(rendered.ends_with("ORDER BY \"products\".\"price\" ASC"));
        assert!(values.contains("%hoodie%"));
        assert!(values.contains("apparel"));
    }

    #[test]
    fn every_search_term_must_match_name_or_description() {
        let query = ProductQuery {
            search: Some("rust, hoodie".into()),
            ..Default::default()
        };
        let (rendered, values) = sql(product_listing(&query, Visibility::All));
        assert_eq!(rendered.matches("\"products\".\"name\" ILIKE").count(), 2);
        assert_eq!(rendered.matches("\"products\".\"description\" ILIKE").count(), 2);
        assert!(rendered.contains(") AND ("));
        assert!(values.contains("%rust%"));
        assert!(values.contains("%hoodie%"));
        assert!(!values.contains("%rust hoodie%"));
    }

    #[test]
    fn search_terms_split_on_spaces_and_commas() {
        assert_eq!(search_terms(" rust  hoodie,mug,"), vec!["rust", "hoodie", "mug"]);
        assert!(search_terms(" , ").is_empty());
    }

    #[test]
    fn listing_applies_each_ordering_term_in_turn() {
        let query = ProductQuery {
            ordering: Some("price,bogus,-name".into()),
            ..Default::default()
        };
        let (rendered, _) = sql(product_listing(&query, Visibility::All));
        assert!(rendered.ends_with(
            "ORDER BY \"products\".\"price\" ASC, \"products\".\"name\" DESC"
        ));
    }

    #[test]
    fn featured_query_is_active_newest_first_and_capped() {
        let (rendered, values) = sql(featured_query());
        let (_, filter) = rendered.split_once("WHERE").expect("has a WHERE clause");
        assert!(filter.contains("\"products\".\"is_active\" = $1"));
        assert!(filter.contains("ORDER BY \"products\".\"created_at\" DESC LIMIT $2"));
        assert!(values.contains("Bool(Some(true))"));
        assert!(values.contains(&format!("BigUnsigned(Some({FEATURED_LIMIT}))")));
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("hoodie"), "hoodie");
    }

    #[tokio::test]
    async fn featured_keeps_row_order_and_category_names() -> anyhow::Result<()> {
        let cat = category();
        let rows: Vec<(ProductModel, Option<categories::Model>)> = (0..FEATURED_LIMIT as i64)
            .map(|n| (product(n, cat.id), Some(cat.clone())))
            .collect();
        let state = state_with(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([rows]));

        let resp = featured_products(&state).await?;
        let items = resp.data.expect("featured data").items;
        assert_eq!(items.len(), 8);
        assert_eq!(items[0].slug, "product-0");
        assert_eq!(items[7].slug, "product-7");
        assert_eq!(items[0].category_name.as_deref(), Some("Apparel"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_slug_is_not_found() {
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([Vec::<(
                ProductModel,
                Option<categories::Model>,
            )>::new()]),
        );

        let err = get_product(&state, None, "nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn customers_cannot_delete_products() {
        let state = state_with(MockDatabase::new(DatabaseBackend::Postgres));
        let customer = AuthUser {
            user_id: Uuid::new_v4(),
            is_staff: false,
        };

        let err = delete_product(&state, Some(&customer), "product-1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let err = delete_product(&state, None, "product-1").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn create_rejects_unknown_category() {
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<categories::Model>::new()]),
        );
        let payload = CreateProductRequest {
            name: "Ferris Mug".into(),
            slug: "ferris-mug".into(),
            description: String::new(),
            price: Decimal::new(1200, 2),
            category: Uuid::new_v4(),
            image: None,
            stock_quantity: 3,
            is_active: true,
        };

        let err = create_product(&state, Some(&staff()), payload)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn staff_create_returns_detail_with_category_name() -> anyhow::Result<()> {
        let cat = category();
        let created = product(1, cat.id);
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![cat.clone()]])
                .append_query_results([Vec::<ProductModel>::new()])
                .append_query_results([vec![created.clone()]]),
        );
        let payload = CreateProductRequest {
            name: created.name.clone(),
            slug: created.slug.clone(),
            description: String::new(),
            price: created.price,
            category: cat.id,
            image: None,
            stock_quantity: created.stock_quantity,
            is_active: true,
        };

        let resp = create_product(&state, Some(&staff()), payload).await?;
        let detail = resp.data.expect("product detail");
        assert_eq!(detail.slug, created.slug);
        assert_eq!(detail.category, cat.id);
        assert_eq!(detail.category_name.as_deref(), Some("Apparel"));
        assert!(detail.is_in_stock);
        Ok(())
    }
}
