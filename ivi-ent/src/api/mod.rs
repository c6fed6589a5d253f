//! HTTP/WebSocket gateway
//!
//! Thin adapter over [`EntertainmentFacade`]: REST resources for single-shot
//! queries and RPC commands, and a WebSocket endpoint for live subscriptions.

pub mod handlers;
pub mod ws;

use crate::entertainment::EntertainmentFacade;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub facade: Arc<EntertainmentFacade>,
}

impl AppContext {
    pub fn new(facade: EntertainmentFacade) -> Self {
        Self {
            facade: Arc::new(facade),
        }
    }
}

/// Create the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // Players
        .route("/players", get(handlers::list_players))
        .route("/players/:name", get(handlers::get_player))
        .route("/players/:name/tracks", get(handlers::list_tracks))
        .route(
            "/players/:name/rpc",
            get(handlers::player_methods).post(handlers::invoke_player),
        )
        // Tuner
        .route("/tuners", get(handlers::list_tuners))
        .route("/tuners/:name", get(handlers::get_tuner))
        .route("/tuners/:name/stations", get(handlers::list_stations))
        .route(
            "/tuners/:name/rpc",
            get(handlers::tuner_methods).post(handlers::invoke_tuner),
        )
        // Catalog
        .route("/artists", get(handlers::list_artists))
        .route("/artists/:id", get(handlers::get_artist))
        .route("/albums", get(handlers::list_albums))
        .route("/albums/:id", get(handlers::get_album))
        // Audio routing
        .route("/audio", get(handlers::list_audio))
        .route("/audio/:connection", get(handlers::get_audio))
        .route(
            "/audio/:connection/rpc",
            get(handlers::audio_methods).post(handlers::invoke_audio),
        )
        // Live subscriptions
        .route("/ws", get(ws::ws_handler))
        .fallback(handlers::not_handled)
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
