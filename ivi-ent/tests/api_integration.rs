//! Integration tests for the entertainment HTTP API
//!
//! Drives the router through `tower::ServiceExt::oneshot`; no socket is bound.

mod helpers;

use axum::http::StatusCode;
use helpers::{catalog, make_request};
use http::Method;
use ivi_ent::api::{create_router, AppContext};
use ivi_ent::config::EntertainmentConfig;
use ivi_ent::EntertainmentFacade;
use serde_json::json;
use std::time::Duration;

fn setup_test_server() -> axum::Router {
    let facade = EntertainmentFacade::new(&catalog(), &EntertainmentConfig::default());
    create_router(AppContext::new(facade))
}

#[tokio::test(start_paused = true)]
async fn test_health_endpoint() {
    let app = setup_test_server();
    let (status, body) = make_request(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    let body = body.expect("Expected response body");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "entertainment");
    assert!(body["version"].is_string());
}

#[tokio::test(start_paused = true)]
async fn test_root_lists_resources() {
    let app = setup_test_server();
    let (status, body) = make_request(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    let resources = body.unwrap()["resources"].clone();
    assert!(resources.as_array().unwrap().contains(&json!("/players")));
}

#[tokio::test(start_paused = true)]
async fn test_player_endpoints() {
    let app = setup_test_server();

    let (status, body) = make_request(&app, Method::GET, "/players", None).await;
    assert_eq!(status, StatusCode::OK);
    let players = body.unwrap();
    assert_eq!(players[0]["name"], "usb");
    assert_eq!(players[1]["name"], "cd");
    assert_eq!(players[1]["currentTrack"]["id"], 400);

    let (status, body) = make_request(&app, Method::GET, "/players/usb", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["isPlaying"], false);

    let (status, body) =
        make_request(&app, Method::GET, "/players/usb/tracks?from=2&to=4", None).await;
    assert_eq!(status, StatusCode::OK);
    let tracks = body.unwrap();
    assert_eq!(tracks.as_array().unwrap().len(), 2);
    assert_eq!(tracks[0]["id"], 2);

    // Percent-encoded query decodes the same as over WebSocket
    let (status, body) =
        make_request(&app, Method::GET, "/players/usb/tracks?from=%32&to=4", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()[0]["id"], 2);

    let (status, body) = make_request(&app, Method::GET, "/players/cd/rpc", None).await;
    assert_eq!(status, StatusCode::OK);
    let methods = body.unwrap();
    assert_eq!(methods[0]["name"], "select");
    assert_eq!(methods[0]["uri"], "/players/cd/rpc");
    assert_eq!(methods[0]["verb"], "POST");

    let (status, _) = make_request(&app, Method::GET, "/players/tape", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn test_player_rpc() {
    let app = setup_test_server();

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/players/usb/rpc",
        Some(json!({"method": "select", "params": {"index": 450}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let snapshot = body.unwrap();
    assert_eq!(snapshot["nowPlayingIndex"], 450);
    assert_eq!(snapshot["currentTrack"]["id"], 450);

    // Audio not started
    let (status, body) = make_request(
        &app,
        Method::POST,
        "/players/usb/rpc",
        Some(json!({"method": "play"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.unwrap()["status"].as_str().unwrap().starts_with("error:"));

    let (status, _) = make_request(
        &app,
        Method::POST,
        "/players/usb/rpc",
        Some(json!({"method": "shuffle", "params": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn test_audio_then_play() {
    let app = setup_test_server();

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/audio/usb/rpc",
        Some(json!({"method": "start"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["state"], "STARTING");

    let (status, _) = make_request(
        &app,
        Method::POST,
        "/audio/cd/rpc",
        Some(json!({"method": "start"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let (_, body) = make_request(&app, Method::GET, "/audio/usb", None).await;
    assert_eq!(body.unwrap()["state"], "STARTED");

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/players/usb/rpc",
        Some(json!({"method": "play"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["isPlaying"], true);

    let (_, body) = make_request(&app, Method::GET, "/audio", None).await;
    let states = body.unwrap();
    assert_eq!(states.as_array().unwrap().len(), 3);
    assert_eq!(states[1], json!({"connection": "CD", "state": "STOPPED"}));
}

#[tokio::test(start_paused = true)]
async fn test_tuner_endpoints() {
    let app = setup_test_server();

    let (status, body) = make_request(&app, Method::GET, "/tuners", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()[0]["name"], "fm");

    let (status, body) = make_request(&app, Method::GET, "/tuners/fm/stations", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()[2]["name"], "Radio Gong");

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/tuners/fm/rpc",
        Some(json!({"method": "select", "params": {"index": 1}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let tuner = body.unwrap();
    assert_eq!(tuner["stationIndex"], 1);
    assert_eq!(tuner["currentStation"]["name"], "Antenne Bayern");

    let (status, _) = make_request(&app, Method::GET, "/tuners/am", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn test_catalog_endpoints() {
    let app = setup_test_server();

    let (status, body) = make_request(&app, Method::GET, "/artists", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()[0]["id"], 10);

    let (status, body) = make_request(&app, Method::GET, "/albums/102", None).await;
    assert_eq!(status, StatusCode::OK);
    let album = body.unwrap();
    assert_eq!(album["artistId"], 12);
    assert!(album["coverXl"].is_string());

    let (status, _) = make_request(&app, Method::GET, "/artists/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = make_request(&app, Method::GET, "/albums/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_uri() {
    let app = setup_test_server();
    let (status, body) = make_request(&app, Method::GET, "/videos", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.unwrap()["status"]
        .as_str()
        .unwrap()
        .contains("/videos cannot be handled"));
}
