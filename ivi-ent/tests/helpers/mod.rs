//! Shared fixtures for ivi-ent integration tests
//!
//! - `catalog()`: 600 tracks, 4 artists, 3 albums, 3 stations
//! - `make_request()`: drive an axum router without a socket

#![allow(dead_code)]

use axum::body::Body;
use axum::http::StatusCode;
use http::{Method, Request};
use ivi_common::{Album, Artist, Catalog, Station, Track};
use serde_json::Value;
use tower::ServiceExt;

pub const TRACK_COUNT: u32 = 600;

pub fn track(id: u32) -> Track {
    Track {
        id,
        album_id: 100 + id % 3,
        artist_id: 10 + id % 4,
        title: format!("Track {}", id),
        duration_seconds: 120 + id % 200,
    }
}

pub fn artist(id: u32) -> Artist {
    Artist {
        id,
        name: format!("Artist {}", id),
    }
}

pub fn album(id: u32, artist_id: u32) -> Album {
    let cover = format!("https://covers.example/{}.jpg", id);
    Album {
        id,
        name: format!("Album {}", id),
        artist_id,
        cover: cover.clone(),
        cover_small: cover.replace(".jpg", "-s.jpg"),
        cover_medium: cover.replace(".jpg", "-m.jpg"),
        cover_big: cover.replace(".jpg", "-b.jpg"),
        cover_xl: cover.replace(".jpg", "-xl.jpg"),
    }
}

pub fn stations() -> Vec<Station> {
    ["Bayern 3", "Antenne Bayern", "Radio Gong"]
        .iter()
        .map(|name| Station {
            name: name.to_string(),
            logo: format!("https://logos.example/{}.png", name.to_lowercase().replace(' ', "-")),
        })
        .collect()
}

pub fn catalog() -> Catalog {
    Catalog::new(
        (0..TRACK_COUNT).map(track).collect(),
        [13, 10, 12, 11].into_iter().map(artist),
        vec![album(102, 12), album(100, 10), album(101, 11)],
        stations(),
    )
}

/// Send one request to `app` and decode the JSON body, if any
pub async fn make_request(
    app: &axum::Router,
    method: Method,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Option<Value>) {
    let mut request = Request::builder().method(method).uri(path);
    if body.is_some() {
        request = request.header("content-type", "application/json");
    }
    let request = match body {
        Some(json_body) => request.body(Body::from(json_body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json_body = if body.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&body).unwrap())
    };

    (status, json_body)
}
