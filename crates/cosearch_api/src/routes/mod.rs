//! Endpoint handlers grouped by resource.

use crate::ApiResult;
use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use axum::Json;
use cosearch_core::{core_version, Page};
use serde::{Deserialize, Serialize};

pub(crate) mod contributions;
pub(crate) mod contributors;
pub(crate) mod reviews;
pub(crate) mod tags;

/// `skip`/`limit` query parameters of list endpoints.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageParams {
    skip: Option<u32>,
    limit: Option<u32>,
}

impl From<PageParams> for Page {
    fn from(value: PageParams) -> Self {
        Page::new(value.skip, value.limit)
    }
}

/// Unwraps list paging, reporting a malformed query string as 422.
pub(crate) fn page_query(query: Result<Query<PageParams>, QueryRejection>) -> ApiResult<Page> {
    let Query(params) = query?;
    Ok(params.into())
}

#[derive(Debug, Serialize)]
pub(crate) struct Health {
    status: &'static str,
    version: &'static str,
}

pub(crate) async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: core_version(),
    })
}
