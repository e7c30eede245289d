use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    db::OrmConn,
    dto::categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
    entity::{
        Categories, Products,
        categories::{ActiveModel, Column, Model as CategoryModel},
        products::Column as ProdCol,
    },
    error::{AppError, AppResult},
    middleware::{
        auth::AuthUser,
        permissions::{Action, staff_for},
    },
    models::Category,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_categories(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<CategoryList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Categories::find().order_by_asc(Column::Name);

    let total = finder.clone().count(state.db()).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(state.db())
        .await?
        .into_iter()
        .map(Category::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Categories", CategoryList { items }, Some(meta)))
}

pub async fn get_category(state: &AppState, slug: &str) -> AppResult<ApiResponse<Category>> {
    let category = find_by_slug(state.db(), slug).await?;
    Ok(ApiResponse::success("Category", category.into(), None))
}

pub async fn create_category(
    state: &AppState,
    caller: Option<&AuthUser>,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    let user = staff_for(Action::Create, caller)?;
    payload.validate()?;
    ensure_slug_free(state.db(), &payload.slug, None).await?;

    let category = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        slug: Set(payload.slug),
        description: Set(payload.description),
    }
    .insert(state.db())
    .await?;
    tracing::info!(category_id = %category.id, slug = %category.slug, "category created");

    audit::record(
        state.db(),
        user.user_id,
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::record("Category created", category.into()))
}

pub async fn update_category(
    state: &AppState,
    caller: Option<&AuthUser>,
    action: Action,
    slug: &str,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    let user = staff_for(action, caller)?;
    payload.validate()?;

    let existing = find_by_slug(state.db(), slug).await?;
    let category_id = existing.id;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(new_slug) = payload.slug {
        if new_slug != slug {
            ensure_slug_free(state.db(), &new_slug, Some(category_id)).await?;
        }
        active.slug = Set(new_slug);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }

    let category = if active.is_changed() {
        active.update(state.db()).await?
    } else {
        find_by_slug(state.db(), slug).await?
    };

    audit::record(
        state.db(),
        user.user_id,
        "category_update",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::record("Updated", category.into()))
}

/// Categories that still have products are kept.
pub async fn delete_category(
    state: &AppState,
    caller: Option<&AuthUser>,
    slug: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let user = staff_for(Action::Destroy, caller)?;
    let category = find_by_slug(state.db(), slug).await?;

    let products = Products::find()
        .filter(ProdCol::CategoryId.eq(category.id))
        .count(state.db())
        .await?;
    if products > 0 {
        return Err(AppError::BadRequest(format!(
            "Category '{slug}' still has {products} product(s)"
        )));
    }

    Categories::delete_by_id(category.id).exec(state.db()).await?;
    tracing::info!(slug, "category deleted");

    audit::record(
        state.db(),
        user.user_id,
        "category_delete",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::record("Deleted", serde_json::json!({})))
}

async fn find_by_slug(orm: &OrmConn, slug: &str) -> AppResult<CategoryModel> {
    Categories::find()
        .filter(Column::Slug.eq(slug))
        .one(orm)
        .await?
        .ok_or(AppError::NotFound)
}

async fn ensure_slug_free(orm: &OrmConn, slug: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut finder = Categories::find().filter(Column::Slug.eq(slug));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.one(orm).await?.is_some() {
        return Err(AppError::BadRequest(format!(
            "category with slug '{slug}' already exists"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    use crate::state::AuthSettings;

    fn state_with(db: MockDatabase) -> AppState {
        AppState::new(
            db.into_connection(),
            AuthSettings {
                jwt_secret: "test-secret".into(),
                token_ttl_hours: 1,
            },
        )
    }

    fn apparel() -> CategoryModel {
        CategoryModel {
            id: Uuid::new_v4(),
            name: "Apparel".into(),
            slug: "apparel".into(),
            description: "Things to wear".into(),
        }
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }

    #[tokio::test]
    async fn lookup_by_slug_returns_the_record() -> anyhow::Result<()> {
        let category = apparel();
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![category.clone()]]),
        );

        let resp = get_category(&state, "apparel").await?;
        assert_eq!(resp.data, Some(Category::from(category)));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_slug_is_not_found() {
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<CategoryModel>::new()]),
        );

        let err = get_category(&state, "missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn list_reports_page_meta() -> anyhow::Result<()> {
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![count_row(1)]])
                .append_query_results([vec![apparel()]]),
        );

        let resp = list_categories(
            &state,
            Pagination {
                page: Some(1),
                per_page: Some(10),
            },
        )
        .await?;
        assert_eq!(resp.meta, Some(Meta::new(1, 10, 1)));
        assert_eq!(resp.data.expect("categories").items.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn writes_require_staff() {
        let state = state_with(MockDatabase::new(DatabaseBackend::Postgres));
        let customer = AuthUser {
            user_id: Uuid::new_v4(),
            is_staff: false,
        };
        let payload = || CreateCategoryRequest {
            name: "Apparel".into(),
            slug: "apparel".into(),
            description: String::new(),
        };

        let err = create_category(&state, Some(&customer), payload())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let err = create_category(&state, None, payload()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn duplicate_slug_is_rejected() {
        let staff = AuthUser {
            user_id: Uuid::new_v4(),
            is_staff: true,
        };
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![apparel()]]),
        );

        let err = create_category(
            &state,
            Some(&staff),
            CreateCategoryRequest {
                name: "Apparel".into(),
                slug: "apparel".into(),
                description: String::new(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn category_with_products_is_not_deleted() {
        let staff = AuthUser {
            user_id: Uuid::new_v4(),
            is_staff: true,
        };
        let state = state_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![apparel()]])
                .append_query_results([vec![count_row(2)]]),
        );

        let err = delete_category(&state, Some(&staff), "apparel")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
