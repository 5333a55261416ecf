//! WebSocket connection to the plugin host.
//!
//! [`connect`] opens `ws://127.0.0.1:<port>`, queues the registration frame,
//! and splits the socket: a writer task drains the [`HostHandle`] queue and
//! [`HostEvents`] yields decoded inbound events until the host goes away.

use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::HostError;
use crate::event::HostEvent;
use crate::launch::LaunchInfo;
use crate::outbound::{register_message, HostSink, OutboundMessage};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Cloneable sender for outbound frames.
#[derive(Debug, Clone)]
pub struct HostHandle {
    tx: mpsc::UnboundedSender<String>,
    plugin_uuid: String,
}

impl HostHandle {
    pub fn new(tx: mpsc::UnboundedSender<String>, plugin_uuid: impl Into<String>) -> Self {
        Self {
            tx,
            plugin_uuid: plugin_uuid.into(),
        }
    }
}

impl HostSink for HostHandle {
    fn send(&self, message: OutboundMessage) {
        let json = match message.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(event = message.name(), error = %e, "failed to encode message");
                return;
            }
        };
        if self.tx.send(json).is_err() {
            tracing::debug!(event = message.name(), "host connection closed, dropping message");
        }
    }

    fn plugin_uuid(&self) -> &str {
        &self.plugin_uuid
    }
}

/// Inbound side of the host connection.
pub struct HostEvents {
    reader: SplitStream<WsStream>,
}

impl HostEvents {
    /// Next decoded event, or `None` once the host has closed the socket.
    ///
    /// Malformed frames are logged and skipped.
    pub async fn next_event(&mut self) -> Option<HostEvent> {
        while let Some(msg_result) = self.reader.next().await {
            let msg = match msg_result {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!(error = %e, "host WebSocket read error");
                    return None;
                }
            };

            let text = match msg {
                Message::Text(t) => t.to_string(),
                Message::Binary(b) => match String::from_utf8(b.to_vec()) {
                    Ok(s) => s,
                    Err(_) => continue,
                },
                Message::Close(_) => {
                    tracing::info!("host WebSocket closed");
                    return None;
                }
                _ => continue,
            };

            match HostEvent::decode(&text) {
                Ok(event) => {
                    tracing::debug!(event = event.name(), "host event received");
                    return Some(event);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "dropping host message");
                }
            }
        }
        tracing::info!("host WebSocket stream ended");
        None
    }
}

/// Connect to the host, register, and request the global settings.
pub async fn connect(launch: &LaunchInfo) -> Result<(HostHandle, HostEvents), HostError> {
    let url = launch.host_url();
    tracing::info!(url = %url, "connecting to plugin host");

    let (ws_stream, _) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| HostError::Connect {
            url: url.clone(),
            reason: e.to_string(),
        })?;
    let (mut writer, reader) = ws_stream.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let handle = HostHandle::new(tx.clone(), launch.plugin_uuid.clone());

    // Registration must be the first frame on the socket.
    let _ = tx.send(register_message(&launch.register_event, &launch.plugin_uuid));
    handle.get_global_settings();

    tokio::spawn(async move {
        while let Some(json) = rx.recv().await {
            if let Err(e) = writer.send(Message::Text(json.into())).await {
                tracing::warn!(error = %e, "failed to write to host, stopping writer");
                break;
            }
        }
    });

    tracing::info!(url = %url, "registered with plugin host");
    Ok((handle, HostEvents { reader }))
}
