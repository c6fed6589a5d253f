//! WebSocket live subscriptions
//!
//! Clients send `{"uri": "/players/usb", "id": "p1", "subscribe": true}` to open a
//! subscription and the same id with `"subscribe": false` to close it. Updates
//! are pushed as `{"id": "p1", "payload": {...}}` text frames. Closing the socket
//! closes every subscription of the session.

use super::AppContext;
use crate::entertainment::{Envelope, Resource};
use crate::error::Error;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Client frame
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WsRequest {
    pub uri: String,
    pub id: String,
    #[serde(default = "default_subscribe")]
    pub subscribe: bool,
}

fn default_subscribe() -> bool {
    true
}

/// GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(ctx): State<AppContext>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, ctx))
}

async fn handle_socket(socket: WebSocket, ctx: AppContext) {
    let session = Uuid::new_v4();
    info!("WebSocket session {} opened", session);

    let (mut sink, mut incoming) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Envelope>();

    let writer = tokio::spawn(async move {
        while let Some(envelope) = out_rx.recv().await {
            let text = match serde_json::to_string(&envelope) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Dropping unserializable update for '{}': {}", envelope.id, e);
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut subscriptions = Subscriptions::default();
    while let Some(frame) = incoming.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };

        match serde_json::from_str::<WsRequest>(&text) {
            Ok(request) => subscriptions.apply(&ctx, request, &out_tx),
            Err(e) => {
                warn!("Session {} sent a malformed frame: {}", session, e);
                let error = Error::IllegalArgument(format!("malformed request: {}", e));
                let _ = out_tx.send(Envelope::error("", &error));
            }
        }
    }

    subscriptions.close_all();
    writer.abort();
    info!("WebSocket session {} closed", session);
}

/// Open subscriptions of one session, keyed by correlation id
#[derive(Default)]
struct Subscriptions {
    tasks: HashMap<String, JoinHandle<()>>,
}

impl Subscriptions {
    fn apply(&mut self, ctx: &AppContext, request: WsRequest, out: &mpsc::UnboundedSender<Envelope>) {
        // One-shot resources and failed subscriptions end on their own
        self.tasks.retain(|_, task| !task.is_finished());

        if let Some(previous) = self.tasks.remove(&request.id) {
            debug!("Closing subscription '{}'", request.id);
            previous.abort();
        }
        if !request.subscribe {
            return;
        }

        let resource = match Resource::parse(&request.uri) {
            Ok(resource) => resource,
            Err(e) => {
                let _ = out.send(Envelope::error(&request.id, &e));
                return;
            }
        };

        debug!("Opening subscription '{}' on {}", request.id, request.uri);
        let mut updates = ctx.facade.subscribe(&request.id, resource);
        let out = out.clone();
        let task = tokio::spawn(async move {
            while let Some(envelope) = updates.next().await {
                if out.send(envelope).is_err() {
                    break;
                }
            }
        });
        self.tasks.insert(request.id, task);
    }

    fn close_all(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}
