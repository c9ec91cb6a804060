use super::{page_query, PageParams};
use crate::{json_body, path_param, ApiResult, AppState};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use cosearch_core::service::tag_service::TagService;
use cosearch_core::view::{Message, TagPublic, TagViewPublic, ViewAssembler};
use cosearch_core::{TagId, TagUpsert};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/tags", get(list_tags).post(create_tag))
        .route(
            "/tags/{tag_id}",
            get(read_tag).put(update_tag).delete(delete_tag),
        )
}

async fn create_tag(
    State(state): State<AppState>,
    payload: Result<Json<TagUpsert>, JsonRejection>,
) -> ApiResult<Json<TagPublic>> {
    let payload = json_body(payload)?;
    let tag = state
        .with_conn(move |conn| Ok(TagService::new(conn).create_tag(payload)?))
        .await?;
    Ok(Json(TagPublic::from(&tag)))
}

async fn list_tags(
    State(state): State<AppState>,
    page: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Json<Vec<TagPublic>>> {
    let page = page_query(page)?;
    let tags = state
        .with_conn(move |conn| Ok(TagService::new(conn).list_tags(page)?))
        .await?;
    Ok(Json(tags.iter().map(TagPublic::from).collect()))
}

async fn read_tag(
    State(state): State<AppState>,
    tag_id: Result<Path<TagId>, PathRejection>,
) -> ApiResult<Json<TagViewPublic>> {
    let tag_id = path_param(tag_id)?;
    let view = state
        .with_conn(move |conn| {
            let tag = TagService::new(conn).get_tag(tag_id)?;
            Ok(ViewAssembler::new(conn).tag_view(&tag)?)
        })
        .await?;
    Ok(Json(view))
}

async fn update_tag(
    State(state): State<AppState>,
    tag_id: Result<Path<TagId>, PathRejection>,
    payload: Result<Json<TagUpsert>, JsonRejection>,
) -> ApiResult<Json<TagPublic>> {
    let tag_id = path_param(tag_id)?;
    let payload = json_body(payload)?;
    let tag = state
        .with_conn(move |conn| Ok(TagService::new(conn).update_tag(tag_id, payload)?))
        .await?;
    Ok(Json(TagPublic::from(&tag)))
}

async fn delete_tag(
    State(state): State<AppState>,
    tag_id: Result<Path<TagId>, PathRejection>,
) -> ApiResult<Json<Message>> {
    let tag_id = path_param(tag_id)?;
    state
        .with_conn(move |conn| Ok(TagService::new(conn).delete_tag(tag_id)?))
        .await?;
    Ok(Json(Message::new("Tag deleted successfully")))
}
