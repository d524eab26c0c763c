use super::error::ApiError;
use crate::notifications::{parse_notification, Notification};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Events emitted by the notification socket.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    Connected,
    Notification(Notification),
    Disconnected(String),
}

pub struct NotificationWs {
    ws_url: String,
}

impl NotificationWs {
    pub fn new(ws_url: &str) -> Self {
        Self {
            ws_url: ws_url.to_string(),
        }
    }

    /// Socket URL with the `userId` query parameter percent-encoded.
    pub fn connect_url(&self, user_id: &str) -> Result<String, ApiError> {
        let mut url = reqwest::Url::parse(&self.ws_url)
            .map_err(|e| ApiError::WebSocket(format!("invalid URL {}: {}", self.ws_url, e)))?;
        url.query_pairs_mut().append_pair("userId", user_id);
        Ok(url.into())
    }

    /// Connect once and forward notifications on `tx` until the socket
    /// closes or fails. There is no reconnect; a `Disconnected` event is
    /// always sent before returning.
    pub async fn run(&self, user_id: &str, tx: mpsc::Sender<NotificationEvent>) -> Result<(), ApiError> {
        match self.connect_and_listen(user_id, &tx).await {
            Ok(()) => {
                tracing::info!("notification WS closed");
                let _ = tx.send(NotificationEvent::Disconnected("closed".to_string())).await;
                Ok(())
            }
            Err(e) => {
                tracing::error!("notification WS error: {:#}", e);
                let _ = tx.send(NotificationEvent::Disconnected(e.to_string())).await;
                Err(e)
            }
        }
    }

    async fn connect_and_listen(
        &self,
        user_id: &str,
        tx: &mpsc::Sender<NotificationEvent>,
    ) -> Result<(), ApiError> {
        let url = self.connect_url(user_id)?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| ApiError::WebSocket(format!("connection failed: {}", e)))?;

        let (mut write, mut read) = ws_stream.split();
        tracing::info!("notification WS connected");
        let _ = tx.send(NotificationEvent::Connected).await;

        while let Some(msg) = read.next().await {
            let msg = msg.map_err(|e| ApiError::WebSocket(format!("read error: {}", e)))?;
            match msg {
                Message::Text(text) => {
                    if let Some(n) = parse_notification(&text, chrono::Utc::now()) {
                        if tx.send(NotificationEvent::Notification(n)).await.is_err() {
                            tracing::debug!("notification receiver dropped, closing WS");
                            break;
                        }
                    }
                }
                Message::Ping(data) => {
                    write
                        .send(Message::Pong(data))
                        .await
                        .map_err(|e| ApiError::WebSocket(format!("pong failed: {}", e)))?;
                }
                Message::Close(_) => {
                    tracing::debug!("notification WS received close frame");
                    break;
                }
                _ => {}
            }
        }

        Ok(())
    }
}
