use super::{page_query, PageParams};
use crate::{json_body, path_param, ApiResult, AppState};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use cosearch_core::service::review_service::ReviewService;
use cosearch_core::view::{Message, ReviewPublic};
use cosearch_core::{ReviewId, ReviewUpsert};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(list_reviews).post(create_review))
        .route(
            "/reviews/{review_id}",
            get(read_review).put(update_review).delete(delete_review),
        )
}

async fn create_review(
    State(state): State<AppState>,
    payload: Result<Json<ReviewUpsert>, JsonRejection>,
) -> ApiResult<Json<ReviewPublic>> {
    let payload = json_body(payload)?;
    let (review, reviewers) = state
        .with_conn(move |conn| Ok(ReviewService::new(conn).create_review(payload)?))
        .await?;
    Ok(Json(ReviewPublic::new(review, &reviewers)))
}

async fn list_reviews(
    State(state): State<AppState>,
    page: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Json<Vec<ReviewPublic>>> {
    let page = page_query(page)?;
    let reviews = state
        .with_conn(move |conn| Ok(ReviewService::new(conn).list_reviews(page)?))
        .await?;
    Ok(Json(
        reviews
            .into_iter()
            .map(|(review, reviewers)| ReviewPublic::new(review, &reviewers))
            .collect(),
    ))
}

async fn read_review(
    State(state): State<AppState>,
    review_id: Result<Path<ReviewId>, PathRejection>,
) -> ApiResult<Json<ReviewPublic>> {
    let review_id = path_param(review_id)?;
    let (review, reviewers) = state
        .with_conn(move |conn| Ok(ReviewService::new(conn).get_review(review_id)?))
        .await?;
    Ok(Json(ReviewPublic::new(review, &reviewers)))
}

async fn update_review(
    State(state): State<AppState>,
    review_id: Result<Path<ReviewId>, PathRejection>,
    payload: Result<Json<ReviewUpsert>, JsonRejection>,
) -> ApiResult<Json<ReviewPublic>> {
    let review_id = path_param(review_id)?;
    let payload = json_body(payload)?;
    let (review, reviewers) = state
        .with_conn(move |conn| Ok(ReviewService::new(conn).update_review(review_id, payload)?))
        .await?;
    Ok(Json(ReviewPublic::new(review, &reviewers)))
}

async fn delete_review(
    State(state): State<AppState>,
    review_id: Result<Path<ReviewId>, PathRejection>,
) -> ApiResult<Json<Message>> {
    let review_id = path_param(review_id)?;
    state
        .with_conn(move |conn| Ok(ReviewService::new(conn).delete_review(review_id)?))
        .await?;
    Ok(Json(Message::new("Review deleted successfully")))
}
