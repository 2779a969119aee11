//! # HTTP API
//!
//! Read-only endpoints the UI surfaces call for levels and points.
//!
//! | Method | Path                    | Auth |
//! |--------|-------------------------|------|
//! | GET    | `/health`               | no   |
//! | GET    | `/levels`               | yes  |
//! | GET    | `/levels/resolve`       | yes  |
//! | GET    | `/levels/{name}/color`  | yes  |
//! | POST   | `/levels/refresh`       | yes  |
//! | POST   | `/points`               | yes  |
//! | POST   | `/points/tally`         | yes  |
//!
//! Auth applies only when an API key is configured.

use crate::config::ServeArgs;
use crate::error::AppError;
use crate::source::{LevelSource, load_levels};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, Request, State};
use axum::http::{Method, StatusCode, header::AUTHORIZATION};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use questpoints_core::{
    ActivityTally, LevelDefinition, LevelName, LevelProgress, PointAction, PointsError,
    ResolvedLevels, format_points, points_for,
};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

// =============================================================================
// STATE
// =============================================================================

/// Shared server state.
pub struct AppState {
    levels: RwLock<ResolvedLevels>,
    source: LevelSource,
    api_key: Option<String>,
    limiter: DefaultDirectRateLimiter,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        levels: ResolvedLevels,
        source: LevelSource,
        api_key: Option<String>,
        requests_per_second: u32,
    ) -> SharedState {
        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Arc::new(Self {
            levels: RwLock::new(levels),
            source,
            api_key,
            limiter: RateLimiter::direct(Quota::per_second(rate)),
        })
    }

    /// Refetch the level table from the source and swap it in.
    pub async fn refresh(&self) -> ResolvedLevels {
        let fresh = load_levels(&self.source).await;
        *self.levels.write().await = fresh.clone();
        fresh
    }

    pub async fn snapshot(&self) -> ResolvedLevels {
        self.levels.read().await.clone()
    }
}

// =============================================================================
// REQUEST / RESPONSE TYPES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveParams {
    pub points: u64,
}

/// Owned view of `LevelProgress` for responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressView {
    pub next_level: Option<LevelName>,
    pub points_into_level: u64,
    pub points_to_next: Option<u64>,
    pub percent: u8,
}

impl From<&LevelProgress<'_>> for ProgressView {
    fn from(progress: &LevelProgress<'_>) -> Self {
        Self {
            next_level: progress.next.map(|next| next.name),
            points_into_level: progress.points_into_level,
            points_to_next: progress.points_to_next,
            percent: progress.percent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub points: u64,
    pub formatted: String,
    pub level: Option<LevelDefinition>,
    pub progress: Option<ProgressView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorResponse {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsRequest {
    pub action: String,
    /// Defaults to 1.
    #[serde(default)]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsResponse {
    pub action: PointAction,
    pub count: u32,
    pub points: u64,
    pub formatted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TallyResponse {
    pub tally: ActivityTally,
    pub points: u64,
    pub formatted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error returned by handlers and middleware.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn list_levels(State(state): State<SharedState>) -> Json<ResolvedLevels> {
    Json(state.snapshot().await)
}

async fn refresh_levels(State(state): State<SharedState>) -> Json<ResolvedLevels> {
    Json(state.refresh().await)
}

async fn resolve(
    State(state): State<SharedState>,
    params: Result<Query<ResolveParams>, QueryRejection>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let Query(params) = params?;
    let levels = state.levels.read().await;
    let points = params.points;

    Ok(Json(ResolveResponse {
        points,
        formatted: format_points(points),
        level: levels.resolve(points).cloned(),
        progress: levels.progress(points).as_ref().map(ProgressView::from),
    }))
}

async fn level_color(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Json<ColorResponse> {
    let levels = state.levels.read().await;
    let color = levels.color(&name).to_string();
    Json(ColorResponse { name, color })
}

async fn compute_points(
    request: Result<Json<PointsRequest>, JsonRejection>,
) -> Result<Json<PointsResponse>, ApiError> {
    let Json(request) = request?;
    let action: PointAction = request
        .action
        .parse()
        .map_err(|e: PointsError| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?;
    let count = request.count.unwrap_or(1);
    let points = points_for(action, count);

    Ok(Json(PointsResponse {
        action,
        count,
        points,
        formatted: format_points(points),
    }))
}

async fn tally_points(
    tally: Result<Json<ActivityTally>, JsonRejection>,
) -> Result<Json<TallyResponse>, ApiError> {
    let Json(tally) = tally?;
    let points = tally.total();
    Ok(Json(TallyResponse {
        tally,
        points,
        formatted: format_points(points),
    }))
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

async fn require_api_key(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = &state.api_key {
        let provided = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let authorized =
            provided.is_some_and(|key| bool::from(key.as_bytes().ct_eq(expected.as_bytes())));
        if !authorized {
            debug!(path = %request.uri().path(), "rejected request without valid API key");
            return Err(ApiError::new(
                StatusCode::UNAUTHORIZED,
                "missing or invalid API key",
            ));
        }
    }
    Ok(next.run(request).await)
}

async fn rate_limit(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.limiter.check().is_err() {
        return Err(ApiError::new(
            StatusCode::TOO_MANY_REQUESTS,
            "rate limit exceeded",
        ));
    }
    Ok(next.run(request).await)
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the API router.
pub fn create_router(state: SharedState) -> Router {
    let protected = Router::new()
        .route("/levels", get(list_levels))
        .route("/levels/resolve", get(resolve))
        .route("/levels/refresh", post(refresh_levels))
        .route("/levels/{name}/color", get(level_color))
        .route("/points", post(compute_points))
        .route("/points/tally", post(tally_points))
        .route_layer(from_fn_with_state(state.clone(), require_api_key));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(from_fn_with_state(state.clone(), rate_limit)),
        )
        .with_state(state)
}

/// Refresh the level table every `interval`.
pub fn spawn_refresh(state: SharedState, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; the table was just loaded.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let levels = state.refresh().await;
            debug!(origin = %levels.origin, "periodic level refresh");
        }
    })
}

/// Load the level table and serve the API until Ctrl-C.
pub async fn run_server(args: &ServeArgs, source: LevelSource) -> Result<(), AppError> {
    let levels = load_levels(&source).await;
    let state = AppState::new(
        levels,
        source,
        args.api_key().map(str::to_string),
        args.rate_limit,
    );

    let refresher = args
        .refresh_interval()
        .map(|interval| spawn_refresh(state.clone(), interval));

    let app = create_router(state);
    let addr = args.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Server(format!("failed to bind {}: {}", addr, e)))?;

    info!(%addr, auth = args.api_key().is_some(), "questpoints API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Server(e.to_string()))?;

    if let Some(handle) = refresher {
        handle.abort();
    }
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
