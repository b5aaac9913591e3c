// WebSocket delivery for live chat. Sockets only listen: messages are posted
// over HTTP and fanned out to the relevant rooms. A dropped or missed frame
// is fine because the messaging log is the durable source and clients
// re-fetch on reconnect.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast, RwLock};

use crate::{auth, policy::Actor, AppState};

// Room state for broadcasting messages
pub struct RoomState {
    pub broadcast: broadcast::Sender<String>,
}

impl RoomState {
    pub fn new() -> Self {
        let (broadcast, _) = broadcast::channel(256);
        Self { broadcast }
    }
}

impl Default for RoomState {
    fn default() -> Self {
        Self::new()
    }
}

// Global room registry - keyed by "company:{id}" or "user:{id}"
pub type ChatRegistry = Arc<RwLock<HashMap<String, Arc<RoomState>>>>;

pub fn create_chat_registry() -> ChatRegistry {
    Arc::new(RwLock::new(HashMap::new()))
}

pub fn company_room(company_id: &str) -> String {
    format!("company:{company_id}")
}

pub fn user_room(user_id: &str) -> String {
    format!("user:{user_id}")
}

/// Fire-and-forget fan-out to whoever is currently listening on a room.
/// No room or no listeners means nobody is connected; the send result is
/// deliberately ignored.
pub async fn publish(registry: &ChatRegistry, room_key: &str, payload: serde_json::Value) {
    let room = {
        let rooms = registry.read().await;
        rooms.get(room_key).cloned()
    };
    if let Some(room) = room {
        let _ = room.broadcast.send(payload.to_string());
    }
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    // Browsers cannot set headers on websocket upgrades, so the token rides
    // in the query string.
    let actor = match auth::decode_token(&query.token, &state.config.jwt_secret) {
        Ok(claims) => claims.into_actor(),
        Err(_) => return StatusCode::UNAUTHORIZED.into_response(),
    };
    ws.on_upgrade(move |socket| handle_socket(socket, actor, state))
}

async fn get_or_create_room(registry: &ChatRegistry, key: &str) -> Arc<RoomState> {
    let mut rooms = registry.write().await;
    rooms.entry(key.to_string()).or_default().clone()
}

async fn handle_socket(socket: WebSocket, actor: Actor, state: AppState) {
    let (sender, mut receiver) = socket.split();

    let company = get_or_create_room(&state.chat, &company_room(&actor.company_id)).await;
    let personal = get_or_create_room(&state.chat, &user_room(&actor.id)).await;

    let mut company_rx = company.broadcast.subscribe();
    let mut personal_rx = personal.broadcast.subscribe();

    // Sender wrapped in Arc<Mutex> for sharing between forwarders
    let sender = Arc::new(tokio::sync::Mutex::new(sender));

    let company_task = {
        let sender = sender.clone();
        tokio::spawn(async move {
            while let Ok(payload) = company_rx.recv().await {
                let mut sender = sender.lock().await;
                if sender.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
        })
    };
    let personal_task = {
        let sender = sender.clone();
        tokio::spawn(async move {
            while let Ok(payload) = personal_rx.recv().await {
                let mut sender = sender.lock().await;
                if sender.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
        })
    };

    // Drain the client side; only keepalives are expected.
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Close(_) => break,
            Message::Ping(data) => {
                let mut sender = sender.lock().await;
                let _ = sender.send(Message::Pong(data)).await;
            }
            _ => {}
        }
    }

    company_task.abort();
    personal_task.abort();
}
