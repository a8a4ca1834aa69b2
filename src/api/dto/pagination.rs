//! Page query parameters for list endpoints.

use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::repositories::PageRequest;

/// Query parameters for `GET /api/posts`.
///
/// Values are passed through to the store as given; no bounds are enforced.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct PageQuery {
    /// Page number (1-based)
    #[serde(default = "default_page_number")]
    #[param(example = 1)]
    pub page_number: i64,

    /// Number of items per page
    #[serde(default = "default_page_size")]
    #[param(example = 10)]
    pub page_size: i64,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page_number: default_page_number(),
            page_size: default_page_size(),
        }
    }
}

impl From<PageQuery> for PageRequest {
    fn from(query: PageQuery) -> Self {
        PageRequest::new(query.page_number, query.page_size)
    }
}

fn default_page_number() -> i64 {
    1
}

fn default_page_size() -> i64 {
    10
}
