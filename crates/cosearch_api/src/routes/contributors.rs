use super::{page_query, PageParams};
use crate::{json_body, path_param, ApiResult, AppState};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use cosearch_core::service::contributor_service::ContributorService;
use cosearch_core::view::{
    ContributorReviewedContributions, ContributorViewPublic, ContributorWithAttributesPublic,
    ViewAssembler,
};
use cosearch_core::{ContributorId, ContributorUpsert};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/contributors",
            get(list_contributors).post(create_contributor),
        )
        .route(
            "/contributors/{contributor_id}",
            get(read_contributor).put(update_contributor),
        )
        .route(
            "/contributors/local_handle/{local_handle}",
            get(read_contributor_by_local_handle),
        )
        .route(
            "/contributors/{contributor_id}/reviewed_contributions",
            get(read_reviewed_contributions),
        )
}

async fn create_contributor(
    State(state): State<AppState>,
    payload: Result<Json<ContributorUpsert>, JsonRejection>,
) -> ApiResult<Json<ContributorWithAttributesPublic>> {
    let payload = json_body(payload)?;
    let view = state
        .with_conn(move |conn| {
            let created = ContributorService::new(conn).create_contributor(payload)?;
            Ok(ViewAssembler::new(conn).contributor(created)?)
        })
        .await?;
    Ok(Json(view))
}

async fn list_contributors(
    State(state): State<AppState>,
    page: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Json<Vec<ContributorWithAttributesPublic>>> {
    let page = page_query(page)?;
    let views = state
        .with_conn(move |conn| {
            let contributors = ContributorService::new(conn).list_contributors(page)?;
            let assembler = ViewAssembler::new(conn);
            let mut views = Vec::with_capacity(contributors.len());
            for contributor in contributors {
                views.push(assembler.contributor(contributor)?);
            }
            Ok(views)
        })
        .await?;
    Ok(Json(views))
}

async fn read_contributor(
    State(state): State<AppState>,
    contributor_id: Result<Path<ContributorId>, PathRejection>,
) -> ApiResult<Json<ContributorViewPublic>> {
    let contributor_id = path_param(contributor_id)?;
    let view = state
        .with_conn(move |conn| {
            let contributor = ContributorService::new(conn).get_contributor(contributor_id)?;
            Ok(ViewAssembler::new(conn).contributor_view(contributor)?)
        })
        .await?;
    Ok(Json(view))
}

async fn read_contributor_by_local_handle(
    State(state): State<AppState>,
    local_handle: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<ContributorViewPublic>> {
    let local_handle = path_param(local_handle)?;
    let view = state
        .with_conn(move |conn| {
            let contributor = ContributorService::new(conn).get_by_local_handle(&local_handle)?;
            Ok(ViewAssembler::new(conn).contributor_view(contributor)?)
        })
        .await?;
    Ok(Json(view))
}

async fn update_contributor(
    State(state): State<AppState>,
    contributor_id: Result<Path<ContributorId>, PathRejection>,
    payload: Result<Json<ContributorUpsert>, JsonRejection>,
) -> ApiResult<Json<ContributorWithAttributesPublic>> {
    let contributor_id = path_param(contributor_id)?;
    let payload = json_body(payload)?;
    let view = state
        .with_conn(move |conn| {
            let updated =
                ContributorService::new(conn).update_contributor(contributor_id, payload)?;
            Ok(ViewAssembler::new(conn).contributor(updated)?)
        })
        .await?;
    Ok(Json(view))
}

async fn read_reviewed_contributions(
    State(state): State<AppState>,
    contributor_id: Result<Path<ContributorId>, PathRejection>,
) -> ApiResult<Json<ContributorReviewedContributions>> {
    let contributor_id = path_param(contributor_id)?;
    let view = state
        .with_conn(move |conn| {
            ContributorService::new(conn).get_contributor(contributor_id)?;
            Ok(ViewAssembler::new(conn).reviewed_contributions(contributor_id)?)
        })
        .await?;
    Ok(Json(view))
}
