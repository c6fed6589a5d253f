//! HTTP request handlers
//!
//! Every handler delegates to the facade; domain errors map to status codes in
//! [`reject`].

use super::AppContext;
use crate::entertainment::facade::root_document;
use crate::entertainment::resource::{check_tuner, parse_connection, parse_id, TrackRangeQuery};
use crate::entertainment::{
    AudioStatus, MethodDesc, PlayerId, PlayerSnapshot, RpcCall, TunerSnapshot,
};
use crate::error::Error;
use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    Json,
};
use ivi_common::{Album, Artist, Station, Track};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

type Rejection = (StatusCode, Json<StatusResponse>);
type ApiResult<T> = Result<Json<T>, Rejection>;

/// Map a domain error onto an HTTP status and error body
pub fn reject(error: Error) -> Rejection {
    let status = match &error {
        Error::InvalidTransition(_) => StatusCode::CONFLICT,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::IllegalArgument(_) => StatusCode::BAD_REQUEST,
        Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!("Request failed: {}", error);
    }
    (
        status,
        Json(StatusResponse {
            status: format!("error: {}", error),
        }),
    )
}

fn player_id(name: &str) -> Result<PlayerId, Rejection> {
    name.parse().map_err(reject)
}

// ============================================================================
// Service Endpoints
// ============================================================================

/// GET / - Top-level resource links
pub async fn root() -> Json<Value> {
    Json(root_document())
}

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "entertainment".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Any unrouted URI
pub async fn not_handled(uri: Uri) -> Rejection {
    reject(Error::NotFound(format!("{} cannot be handled", uri)))
}

// ============================================================================
// Player Endpoints
// ============================================================================

/// GET /players
pub async fn list_players(State(ctx): State<AppContext>) -> ApiResult<Vec<PlayerSnapshot>> {
    ctx.facade.players().await.map(Json).map_err(reject)
}

/// GET /players/:name
pub async fn get_player(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
) -> ApiResult<PlayerSnapshot> {
    let id = player_id(&name)?;
    ctx.facade.player_snapshot(id).await.map(Json).map_err(reject)
}

/// GET /players/:name/tracks?from=&to=
pub async fn list_tracks(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
    Query(range): Query<TrackRangeQuery>,
) -> ApiResult<Vec<Track>> {
    let id = player_id(&name)?;
    Ok(Json(ctx.facade.tracks(id, range.from, range.to).await))
}

/// GET /players/:name/rpc
pub async fn player_methods(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
) -> ApiResult<Vec<MethodDesc>> {
    let id = player_id(&name)?;
    Ok(Json(ctx.facade.player_methods(id)))
}

/// POST /players/:name/rpc
pub async fn invoke_player(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
    Json(call): Json<RpcCall>,
) -> ApiResult<PlayerSnapshot> {
    let id = player_id(&name)?;
    info!("Player '{}' RPC: {}", id, call.method);
    ctx.facade
        .invoke_player(id, &call)
        .await
        .map(Json)
        .map_err(reject)
}

// ============================================================================
// Tuner Endpoints
// ============================================================================

/// GET /tuners
pub async fn list_tuners(State(ctx): State<AppContext>) -> ApiResult<Vec<TunerSnapshot>> {
    let snapshot = ctx.facade.tuner_snapshot().await.map_err(reject)?;
    Ok(Json(vec![snapshot]))
}

/// GET /tuners/:name
pub async fn get_tuner(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
) -> ApiResult<TunerSnapshot> {
    check_tuner(&name).map_err(reject)?;
    ctx.facade.tuner_snapshot().await.map(Json).map_err(reject)
}

/// GET /tuners/:name/stations
pub async fn list_stations(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
) -> ApiResult<Vec<Station>> {
    check_tuner(&name).map_err(reject)?;
    Ok(Json(ctx.facade.stations().await))
}

/// GET /tuners/:name/rpc
pub async fn tuner_methods(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
) -> ApiResult<Vec<MethodDesc>> {
    check_tuner(&name).map_err(reject)?;
    Ok(Json(ctx.facade.tuner_methods()))
}

/// POST /tuners/:name/rpc
pub async fn invoke_tuner(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
    Json(call): Json<RpcCall>,
) -> ApiResult<TunerSnapshot> {
    check_tuner(&name).map_err(reject)?;
    info!("Tuner '{}' RPC: {}", name, call.method);
    ctx.facade.invoke_tuner(&call).await.map(Json).map_err(reject)
}

// ============================================================================
// Catalog Endpoints
// ============================================================================

/// GET /artists
pub async fn list_artists(State(ctx): State<AppContext>) -> Json<Vec<Artist>> {
    Json(ctx.facade.artists().await)
}

/// GET /artists/:id
pub async fn get_artist(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<Artist> {
    let id = parse_id(&id).map_err(reject)?;
    ctx.facade.artist(id).await.map(Json).map_err(reject)
}

/// GET /albums
pub async fn list_albums(State(ctx): State<AppContext>) -> Json<Vec<Album>> {
    Json(ctx.facade.albums().await)
}

/// GET /albums/:id
pub async fn get_album(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<Album> {
    let id = parse_id(&id).map_err(reject)?;
    ctx.facade.album(id).await.map(Json).map_err(reject)
}

// ============================================================================
// Audio Endpoints
// ============================================================================

/// GET /audio
pub async fn list_audio(State(ctx): State<AppContext>) -> Json<Vec<AudioStatus>> {
    Json(ctx.facade.audio_statuses())
}

/// GET /audio/:connection
pub async fn get_audio(
    State(ctx): State<AppContext>,
    Path(connection): Path<String>,
) -> ApiResult<AudioStatus> {
    let connection = parse_connection(&connection).map_err(reject)?;
    Ok(Json(ctx.facade.audio_status(connection)))
}

/// GET /audio/:connection/rpc
pub async fn audio_methods(
    State(ctx): State<AppContext>,
    Path(connection): Path<String>,
) -> ApiResult<Vec<MethodDesc>> {
    let connection = parse_connection(&connection).map_err(reject)?;
    Ok(Json(ctx.facade.audio_methods(connection)))
}

/// POST /audio/:connection/rpc
pub async fn invoke_audio(
    State(ctx): State<AppContext>,
    Path(connection): Path<String>,
    Json(call): Json<RpcCall>,
) -> ApiResult<AudioStatus> {
    let connection = parse_connection(&connection).map_err(reject)?;
    info!("Audio {} RPC: {}", connection, call.method);
    ctx.facade
        .invoke_audio(connection, &call)
        .await
        .map(Json)
        .map_err(reject)
}
