use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, warn};
use uuid::Uuid;

use rideway_core::geo::Coordinate;
use rideway_rides::notification::{Notification, Party, RideEvent};

use super::registry::ConnectionId;
use crate::state::AppState;

/// GET /socket
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
enum ClientMessage {
    Join(JoinData),
    UpdateLocationCaptain(LocationData),
}

#[derive(Debug, Deserialize)]
struct JoinData {
    #[serde(rename = "userId")]
    user_id: Uuid,
    #[serde(rename = "userType")]
    user_type: String,
}

#[derive(Debug, Deserialize)]
struct LocationData {
    #[serde(rename = "userId")]
    user_id: Uuid,
    location: Coordinate,
}

async fn handle_socket(state: AppState, socket: WebSocket) {
    let id = Uuid::new_v4();
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Value>();

    state.registry.register(id, tx.clone());
    debug!(connection = %id, "socket connected");

    let mut send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_tx
                .send(Message::Text(payload.to_string().into()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = ws_rx.next().await {
            if let Message::Text(text) = message {
                handle_client_message(&recv_state, id, &tx, text.as_str()).await;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.registry.disconnect(id);
    debug!(connection = %id, "socket disconnected");
}

async fn handle_client_message(
    state: &AppState,
    id: ConnectionId,
    tx: &UnboundedSender<Value>,
    raw: &str,
) {
    let message: ClientMessage = match serde_json::from_str(raw) {
        Ok(message) => message,
        Err(_) => {
            send_error(tx, "unrecognized message");
            return;
        }
    };

    match message {
        ClientMessage::Join(join) => {
            let party = match join.user_type.as_str() {
                "user" => Party::user(join.user_id),
                "captain" => Party::captain(join.user_id),
                _ => {
                    send_error(tx, "unknown user type");
                    return;
                }
            };

            state.registry.join(id, party);
            debug!(connection = %id, party = %party.group_name(), "joined");
        }
        ClientMessage::UpdateLocationCaptain(update) => {
            if !update.location.is_valid() {
                send_error(tx, "invalid location");
                return;
            }

            if let Err(e) = state
                .captains
                .update_location(update.user_id, update.location)
                .await
            {
                warn!("Failed to persist captain location: {}", e);
                return;
            }

            forward_location(state, update.user_id, update.location).await;
        }
    }
}

/// Riders with an in-flight ride see their captain move.
async fn forward_location(state: &AppState, captain_id: Uuid, location: Coordinate) {
    match state.rides.active_ride_for_captain(captain_id).await {
        Ok(Some(ride)) => {
            state.dispatcher.deliver(Notification {
                to: Party::user(ride.user_id),
                event: RideEvent::CaptainLocationUpdate { location },
            });
        }
        Ok(None) => {}
        Err(e) => warn!("Failed to look up active ride: {}", e),
    }
}

fn send_error(tx: &UnboundedSender<Value>, message: &str) {
    let frame = json!({ "event": "error", "data": { "message": message } });
    let _ = tx.send(frame);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_join() {
        let raw = r#"{"event":"join","data":{"userId":"7f0c8f9e-4c0a-4a93-9c9a-2f8a54d6c2f1","userType":"captain"}}"#;
        let message: ClientMessage = serde_json::from_str(raw).unwrap();

        match message {
            ClientMessage::Join(join) => assert_eq!(join.user_type, "captain"),
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn parses_location_update() {
        let raw = r#"{"event":"update-location-captain","data":{"userId":"7f0c8f9e-4c0a-4a93-9c9a-2f8a54d6c2f1","location":{"lat":28.6,"lng":77.2}}}"#;
        let message: ClientMessage = serde_json::from_str(raw).unwrap();

        match message {
            ClientMessage::UpdateLocationCaptain(update) => {
                assert!((update.location.lat - 28.6).abs() < f64::EPSILON);
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_event() {
        let raw = r#"{"event":"self-destruct","data":{}}"#;
        assert!(serde_json::from_str::<ClientMessage>(raw).is_err());
    }

    #[test]
    fn error_frames_have_the_wire_shape() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        send_error(&tx, "invalid location");

        let frame = rx.try_recv().unwrap();
        assert_eq!(frame["event"], "error");
        assert_eq!(frame["data"]["message"], "invalid location");
    }
}
