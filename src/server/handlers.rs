use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::geo::resolver::CacheStats;
use crate::geo::{Coordinate, Granularity, ResolutionSource};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

// ─── GET /api/geo/resolve ────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub location: Option<String>,
    pub granularity: Option<Granularity>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub location: String,
    pub coordinates: Coordinate,
    pub source: ResolutionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub processing_time_ms: u64,
    pub cache_stats: CacheStats,
}

pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveQuery>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let start = Instant::now();

    let location = params.location.as_deref().unwrap_or("").trim().to_string();
    if location.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'location' parameter"));
    }
    let granularity = params.granularity.unwrap_or(Granularity::Street);

    // The tier chain blocks (HTTP client, limiter waits); keep it off the
    // async executor.
    let resolved = {
        let state = state.clone();
        let location = location.clone();
        tokio::task::spawn_blocking(move || state.resolver.resolve(&location, granularity))
            .await
            .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
    };

    let elapsed_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        route = "/api/geo/resolve",
        location = %location,
        granularity = %granularity,
        source = %resolved.source,
        elapsed_ms,
        "resolved"
    );

    Ok(Json(ResolveResponse {
        location,
        coordinates: resolved.coordinate,
        source: resolved.source,
        region: resolved.region,
        display_name: resolved.display_name,
        processing_time_ms: elapsed_ms,
        cache_stats: state.resolver.cache_stats(),
    }))
}

// ─── POST /api/geo/resolve/batch ─────────────────────────────────

#[derive(Deserialize)]
pub struct BatchRequest {
    pub locations: Vec<String>,
    pub granularity: Option<Granularity>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatistics {
    pub total: usize,
    pub resolved: usize,
    pub by_source: HashMap<String, usize>,
    pub processing_time_ms: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub coordinates_map: HashMap<String, Coordinate>,
    pub statistics: BatchStatistics,
}

pub async fn resolve_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    let start = Instant::now();

    if request.locations.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Empty 'locations' list"));
    }
    let granularity = request.granularity.unwrap_or(Granularity::Street);
    let total = request.locations.len();

    // Sequential on purpose: batch items queue through the shared rate
    // limiter in order instead of fanning out against it.
    let (coordinates_map, by_source) = {
        let state = state.clone();
        tokio::task::spawn_blocking(move || {
            let mut map = HashMap::new();
            let mut by_source: HashMap<String, usize> = HashMap::new();
            for location in &request.locations {
                if location.trim().is_empty() {
                    continue;
                }
                let result = state.resolver.resolve(location, granularity);
                *by_source.entry(result.source.to_string()).or_insert(0) += 1;
                map.insert(location.clone(), result.coordinate);
            }
            (map, by_source)
        })
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
    };

    let elapsed_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        route = "/api/geo/resolve/batch",
        total,
        resolved = coordinates_map.len(),
        elapsed_ms,
        "batch resolved"
    );

    Ok(Json(BatchResponse {
        statistics: BatchStatistics {
            total,
            resolved: coordinates_map.len(),
            by_source,
            processing_time_ms: elapsed_ms,
        },
        coordinates_map,
    }))
}

// ─── GET /api/geo/cache ──────────────────────────────────────────

#[derive(Serialize)]
pub struct CacheInfoResponse {
    pub size: usize,
    pub keys: Vec<String>,
}

pub async fn cache_info(State(state): State<Arc<AppState>>) -> Json<CacheInfoResponse> {
    let keys = state.resolver.cache_keys();
    Json(CacheInfoResponse {
        size: keys.len(),
        keys,
    })
}

// ─── POST /api/geo/cache/clear ───────────────────────────────────

#[derive(Serialize)]
pub struct CacheClearResponse {
    pub cleared: bool,
    pub size: usize,
}

pub async fn cache_clear(State(state): State<Arc<AppState>>) -> Json<CacheClearResponse> {
    state.resolver.clear_caches();
    tracing::info!(route = "/api/geo/cache/clear", "caches cleared");
    Json(CacheClearResponse {
        cleared: true,
        size: 0,
    })
}
