use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entity::orders::OrderStatus;

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Page number, default 1.
    pub page: Option<i64>,
    /// Items per page, default 20, at most 100.
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSortBy {
    CreatedAt,
    Price,
    Name,
}

/// One term of the `ordering` parameter: a field name, `-` prefixed for
/// descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductOrdering {
    pub sort_by: ProductSortBy,
    pub sort_order: SortOrder,
}

impl Default for ProductOrdering {
    /// Newest first.
    fn default() -> Self {
        Self {
            sort_by: ProductSortBy::CreatedAt,
            sort_order: SortOrder::Desc,
        }
    }
}

impl ProductOrdering {
    /// Parses a comma-separated list such as `price,-name`. Unknown terms are
    /// dropped; the default ordering applies only when no term is left.
    pub fn parse(raw: Option<&str>) -> Vec<Self> {
        let terms: Vec<Self> = raw
            .unwrap_or_default()
            .split(',')
            .filter_map(Self::parse_term)
            .collect();
        if terms.is_empty() {
            vec![Self::default()]
        } else {
            terms
        }
    }

    fn parse_term(term: &str) -> Option<Self> {
        let term = term.trim();
        let (sort_order, field) = match term.strip_prefix('-') {
            Some(field) => (SortOrder::Desc, field),
            None => (SortOrder::Asc, term),
        };
        let sort_by = match field {
            "created_at" => ProductSortBy::CreatedAt,
            "price" => ProductSortBy::Price,
            "name" => ProductSortBy::Name,
            _ => return None,
        };
        Some(Self {
            sort_by,
            sort_order,
        })
    }
}

// Page fields stay inline: urlencoded `#[serde(flatten)]` cannot parse integers.
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Category id.
    pub category: Option<Uuid>,
    /// Category slug.
    #[serde(alias = "category__slug")]
    pub category_slug: Option<String>,
    /// Only honored for staff callers.
    pub is_active: Option<bool>,
    /// Terms separated by spaces or commas; each must match name or
    /// description, case-insensitively.
    pub search: Option<String>,
    /// Comma-separated `price`, `created_at` or `name`; prefix with `-` for
    /// descending.
    pub ordering: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<OrderStatus>,
}

impl ProductQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}
