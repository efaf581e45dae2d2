use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::hub::SharedHub;
use crate::message::RelayMessage;

/// `GET /get_users/{user}` lists everyone else online; `/ws/chat/{user}`
/// opens that user's message socket.
pub fn router(hub: SharedHub) -> Router {
    Router::new()
        .route("/get_users/{user_name}", get(get_users))
        .route("/ws/chat/{user_name}", get(chat_socket))
        .with_state(hub)
}

async fn get_users(State(hub): State<SharedHub>, Path(user_name): Path<String>) -> Json<Vec<String>> {
    Json(hub.lock().await.users_except(&user_name))
}

async fn chat_socket(
    ws: WebSocketUpgrade,
    State(hub): State<SharedHub>,
    Path(user_name): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, hub, user_name))
}

async fn handle_socket(socket: WebSocket, hub: SharedHub, user_name: String) {
    let (mut sender, mut receiver) = socket.split();
    let (outbox, mut outbox_rx) = mpsc::unbounded_channel::<String>();

    let connection_id = hub.lock().await.connect(&user_name, outbox);
    log::info!("{user_name} connected");

    let writer = tokio::spawn(async move {
        while let Some(payload) = outbox_rx.recv().await {
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<RelayMessage>(text.as_str()) {
                Ok(message) => {
                    log::info!("{} -> {}", message.from_user, message.to_user);
                    hub.lock().await.route(message);
                }
                Err(err) => {
                    log::error!("Unreadable message from {user_name}: {err}");
                    break;
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                log::warn!("Connection error for {user_name}: {err}");
                break;
            }
        }
    }

    hub.lock().await.disconnect(&user_name, connection_id);
    writer.abort();
    log::info!("{user_name} disconnected");
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;
    use crate::network::hub::RelayHub;

    #[tokio::test]
    async fn get_users_excludes_caller() {
        let hub = RelayHub::shared();
        for user in ["alice", "bob"] {
            let (tx, _rx) = mpsc::unbounded_channel();
            hub.lock().await.connect(user, tx);
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(hub)).await.unwrap();
        });

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /get_users/alice HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with(r#"["bob"]"#));
    }
}
