use crate::{
    error::AppError,
    telemetry::{
        ds::{AppState, Document},
        gateway,
        legacy::{clamp_limit, parse_limit},
    },
    time::{iso_millis, TimeProvider},
};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_server::Handle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HealthResponse {
    pub ok: bool,
    pub time: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SavedResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

/// The feeds route keeps the old opaque error body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FeedsErrorResponse {
    pub error: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct FeedsQuery {
    pub limit: Option<String>,
}

fn failure(route: &'static str, e: AppError) -> Response {
    error!(error = ?e, route, "Request failed.");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { ok: false, error: e.to_string() })).into_response()
}

/// Request bodies are parsed here rather than by the `Json` extractor so a
/// bad body reports through the same 500 shape as a store failure.
pub fn parse_body(body: &[u8]) -> Result<Document, AppError> {
    match serde_json::from_slice(body)? {
        Value::Object(doc) => Ok(doc),
        other => Err(AppError::InvalidDocument(format!("expected a JSON object, got {}", other))),
    }
}

pub async fn health(State(app_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse { ok: true, time: iso_millis(app_state.time_provider.now_utc()) })
}

pub async fn get_feeds(State(app_state): State<Arc<AppState>>, query: Option<Query<FeedsQuery>>) -> Response {
    let raw = query.as_ref().and_then(|Query(q)| q.limit.as_deref());
    let limit = clamp_limit(parse_limit(raw));

    let res = async {
        let db = app_state.db().await?;
        gateway::list_recent(db.as_ref(), app_state.time_provider.as_ref(), limit).await
    }
    .await;
    match res {
        Ok(feed) => Json(feed).into_response(),
        Err(e) => {
            error!(error = ?e, route = "GET /api/feeds", "Request failed.");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(FeedsErrorResponse { error: "Server error".to_owned() }))
                .into_response()
        }
    }
}

pub async fn get_latest(State(app_state): State<Arc<AppState>>) -> Response {
    let res = async { gateway::latest(app_state.db().await?.as_ref()).await }.await;
    match res {
        Ok(doc) => Json(doc).into_response(),
        Err(e) => failure("GET /api/latest", e),
    }
}

pub async fn get_settings(State(app_state): State<Arc<AppState>>) -> Response {
    let res = async { gateway::current_settings(app_state.db().await?.as_ref()).await }.await;
    match res {
        Ok(settings) => Json(settings).into_response(),
        Err(e) => failure("GET /api/settings", e),
    }
}

pub async fn post_settings(State(app_state): State<Arc<AppState>>, body: Bytes) -> Response {
    let res = async {
        let partial = parse_body(&body)?;
        gateway::update_settings(app_state.db().await?.as_ref(), partial).await
    }
    .await;
    match res {
        Ok(()) => Json(SavedResponse { ok: true, message: None }).into_response(),
        Err(e) => failure("POST /api/settings", e),
    }
}

/// Telemetry from the device.
pub async fn post_update(State(app_state): State<Arc<AppState>>, body: Bytes) -> Response {
    let res = async {
        let payload = parse_body(&body)?;
        let db = app_state.db().await?;
        gateway::ingest(db.as_ref(), app_state.time_provider.as_ref(), payload).await
    }
    .await;
    match res {
        Ok(()) => Json(SavedResponse { ok: true, message: Some("saved".to_owned()) }).into_response(),
        Err(e) => failure("POST /api/update", e),
    }
}

pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/feeds", get(get_feeds))
        .route("/api/latest", get(get_latest))
        .route("/api/settings", get(get_settings).post(post_settings))
        .route("/api/update", post(post_update))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Serves until `shutdown_rx` turns `true` (or its sender is dropped), then
/// drains in-flight requests.
pub async fn run_web_server(
    app_state: Arc<AppState>, addr: SocketAddr, mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), AppError> {
    let handle = Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        let _ = shutdown_rx.wait_for(|stop| *stop).await;
        info!("Stopping HTTP server");
        shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    info!("Starting HTTP server on http://{}", addr);
    axum_server::bind(addr).handle(handle).serve(router(app_state).into_make_service()).await?;
    Ok(())
}
