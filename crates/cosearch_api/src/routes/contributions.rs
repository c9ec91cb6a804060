use super::{page_query, PageParams};
use crate::{json_body, path_param, ApiResult, AppState};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use cosearch_core::service::contribution_service::ContributionService;
use cosearch_core::view::{
    ContributionShort, ContributionWithAttributesPublic, ContributorShort, ViewAssembler,
};
use cosearch_core::ContributionUpsert;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/contributions",
            get(list_contributions).post(create_contribution),
        )
        .route(
            "/contributions/{contribution_id}",
            get(read_contribution).put(update_contribution),
        )
        .route(
            "/contributions/{contribution_id}/children",
            get(read_children),
        )
        .route(
            "/contributions/{contribution_id}/contributors",
            get(read_contributors),
        )
}

async fn create_contribution(
    State(state): State<AppState>,
    payload: Result<Json<ContributionUpsert>, JsonRejection>,
) -> ApiResult<Json<ContributionWithAttributesPublic>> {
    let payload = json_body(payload)?;
    let (created, view) = state
        .with_conn(move |conn| {
            let (contribution, contributors) =
                ContributionService::new(conn).create_contribution(payload)?;
            let view = ViewAssembler::new(conn)
                .contribution(contribution.clone(), Some(contributors.as_slice()))?;
            Ok((contribution, view))
        })
        .await?;
    state.announce_contribution(created);
    Ok(Json(view))
}

async fn list_contributions(
    State(state): State<AppState>,
    page: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Json<Vec<ContributionWithAttributesPublic>>> {
    let page = page_query(page)?;
    let views = state
        .with_conn(move |conn| {
            let contributions =
                ContributionService::new(conn).list_contributions(page)?;
            let assembler = ViewAssembler::new(conn);
            let mut views = Vec::with_capacity(contributions.len());
            for contribution in contributions {
                views.push(assembler.contribution(contribution, None)?);
            }
            Ok(views)
        })
        .await?;
    Ok(Json(views))
}

async fn read_contribution(
    State(state): State<AppState>,
    contribution_id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<ContributionWithAttributesPublic>> {
    let contribution_id = path_param(contribution_id)?;
    let view = state
        .with_conn(move |conn| {
            let contribution =
                ContributionService::new(conn).get_contribution(&contribution_id)?;
            Ok(ViewAssembler::new(conn).contribution(contribution, None)?)
        })
        .await?;
    Ok(Json(view))
}

async fn update_contribution(
    State(state): State<AppState>,
    contribution_id: Result<Path<String>, PathRejection>,
    payload: Result<Json<ContributionUpsert>, JsonRejection>,
) -> ApiResult<Json<ContributionWithAttributesPublic>> {
    let contribution_id = path_param(contribution_id)?;
    let payload = json_body(payload)?;
    let view = state
        .with_conn(move |conn| {
            let (contribution, contributors) = ContributionService::new(conn)
                .update_contribution(&contribution_id, payload)?;
            let view = ViewAssembler::new(conn)
                .contribution(contribution, Some(contributors.as_slice()))?;
            Ok(view)
        })
        .await?;
    Ok(Json(view))
}

/// Contributions that depend on this one, one level deep.
async fn read_children(
    State(state): State<AppState>,
    contribution_id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Vec<ContributionShort>>> {
    let contribution_id = path_param(contribution_id)?;
    let views = state
        .with_conn(move |conn| {
            let children = ContributionService::new(conn).children(&contribution_id)?;
            Ok(ViewAssembler::new(conn).contribution_shorts(&children)?)
        })
        .await?;
    Ok(Json(views))
}

async fn read_contributors(
    State(state): State<AppState>,
    contribution_id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Vec<ContributorShort>>> {
    let contribution_id = path_param(contribution_id)?;
    let contributors = state
        .with_conn(move |conn| {
            Ok(ContributionService::new(conn).contributors(&contribution_id)?)
        })
        .await?;
    Ok(Json(contributors.iter().map(ContributorShort::from).collect()))
}
