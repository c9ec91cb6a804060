//! HTTP API for the cosearch contribution catalog.
//!
//! # Responsibility
//! - Map REST endpoints onto core services and view projections.
//! - Translate the core error taxonomy into status codes and JSON bodies.
//!
//! # Invariants
//! - Each request opens its own connection on the blocking pool and drops it
//!   on every exit path.
//! - Notification failures never affect the HTTP response.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::routing::get;
use axum::{Json, Router};
use cosearch_core::db::open_db;
use cosearch_core::{Contribution, Notifier, Settings};
use log::{error, info};
use rusqlite::Connection;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod error;
mod routes;

pub use error::ApiError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    settings: Arc<Settings>,
    notifier: Notifier,
}

impl AppState {
    pub fn new(settings: Settings, notifier: Notifier) -> Self {
        Self {
            settings: Arc::new(settings),
            notifier,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runs `work` against a fresh connection on the blocking pool.
    pub(crate) async fn with_conn<T, F>(&self, work: F) -> ApiResult<T>
    where
        F: FnOnce(&Connection) -> ApiResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db_path = self.settings.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = open_db(&db_path)?;
            work(&conn)
        })
        .await
        .map_err(|err| ApiError::Internal(format!("blocking task failed: {err}")))?
    }

    /// Posts the creation notice in the background.
    pub(crate) fn announce_contribution(&self, contribution: Contribution) {
        if !self.notifier.is_enabled() {
            return;
        }
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            match notifier.contribution_created(&contribution).await {
                Ok(()) => info!(
                    "event=notify module=api status=ok contribution_id={}",
                    contribution.id
                ),
                Err(err) => error!(
                    "event=notify module=api status=error contribution_id={} error={}",
                    contribution.id, err
                ),
            }
        });
    }
}

/// Unwraps a JSON body, reporting malformed payloads as 422.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(value)| value).map_err(ApiError::from)
}

/// Unwraps a path parameter, reporting an unparsable id as 422.
pub(crate) fn path_param<T>(param: Result<Path<T>, PathRejection>) -> ApiResult<T> {
    param.map(|Path(value)| value).map_err(ApiError::from)
}

/// Builds the full application router with permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .merge(routes::contributions::router())
        .merge(routes::contributors::router())
        .merge(routes::tags::router())
        .merge(routes::reviews::router())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Binds the configured address and serves until the process stops.
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let bind_addr = state.settings().bind_addr.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(
        "event=server_start module=api status=ok bind_addr={} environment={} notifications={}",
        bind_addr,
        state.settings().environment,
        state.notifier.is_enabled()
    );
    axum::serve(listener, router(state)).await
}
