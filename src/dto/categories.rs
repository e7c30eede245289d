use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::SLUG_REGEX;
use crate::models::Category;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100), regex(path = *SLUG_REGEX))]
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100), regex(path = *SLUG_REGEX))]
    pub slug: Option<String>,
    pub description: Option<String>,
}

impl From<CreateCategoryRequest> for UpdateCategoryRequest {
    fn from(full: CreateCategoryRequest) -> Self {
        Self {
            name: Some(full.name),
            slug: Some(full.slug),
            description: Some(full.description),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}
