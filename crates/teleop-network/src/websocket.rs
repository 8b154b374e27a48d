use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use teleop_types::{config::TransportConfig, Result};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{network_error, Connection, FrameSender, Inbound, Transport};

/// JSON greeting a relay may send right after the upgrade.
#[derive(Debug, Deserialize)]
struct Greeting {
    #[serde(rename = "type")]
    kind: String,
    peer_id: Option<String>,
}

/// Persistent WebSocket client. Binary messages are frames; text is passed
/// through untouched.
pub struct WebSocketTransport {
    config: TransportConfig,
}

impl WebSocketTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self, cancel: CancellationToken) -> Result<Connection> {
        let endpoint = self.config.endpoint();
        let timeout = Duration::from_secs(self.config.connect_timeout_secs);
        info!("Connecting to relay at {endpoint}");

        let (stream, _) = tokio::time::timeout(timeout, connect_async(endpoint.as_str()))
            .await
            .map_err(|_| network_error(format!("timed out connecting to {endpoint}")))?
            .map_err(|err| network_error(format!("failed to connect to {endpoint}: {err}")))?;
        let (mut writer, mut reader) = stream.split();

        let capacity = self.config.outbound_capacity.max(1);
        let (inbound_tx, inbound_rx) = mpsc::channel::<Inbound>(capacity);
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Vec<u8>>(capacity);

        match tokio::time::timeout(timeout, reader.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => match serde_json::from_str::<Greeting>(text.as_str()) {
                Ok(greeting) if greeting.kind == "welcome" => {
                    info!(
                        peer_id = greeting.peer_id.as_deref().unwrap_or("unknown"),
                        "Connected to relay"
                    );
                }
                _ => {
                    let _ = inbound_tx.try_send(Inbound::Text(text.as_str().to_owned()));
                }
            },
            Ok(Some(Ok(Message::Binary(data)))) => {
                let _ = inbound_tx.try_send(Inbound::Binary(data.to_vec()));
            }
            Ok(Some(Ok(_))) => {}
            Ok(Some(Err(err))) => {
                return Err(network_error(format!("handshake read failed: {err}")));
            }
            Ok(None) => return Err(network_error("relay closed the connection during handshake")),
            Err(_) => warn!("No greeting from relay within {timeout:?}; continuing"),
        }

        let heartbeat = Duration::from_secs(self.config.heartbeat_secs.max(1));
        let writer_cancel = cancel.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(heartbeat);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = writer_cancel.cancelled() => {
                        let _ = writer.send(Message::Close(None)).await;
                        break;
                    }
                    frame = outbound_rx.recv() => {
                        let Some(frame) = frame else {
                            let _ = writer.send(Message::Close(None)).await;
                            break;
                        };
                        if let Err(err) = writer.send(Message::Binary(frame.into())).await {
                            error!("Send failed, stopping writer: {err}");
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        if let Err(err) = writer.send(Message::Ping(Vec::new().into())).await {
                            error!("Heartbeat failed, stopping writer: {err}");
                            break;
                        }
                    }
                }
            }
            debug!("Writer task stopped");
        });

        let reader_cancel = cancel;
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = reader_cancel.cancelled() => break,
                    message = reader.next() => {
                        let forwarded = match message {
                            Some(Ok(Message::Binary(data))) => Inbound::Binary(data.to_vec()),
                            Some(Ok(Message::Text(text))) => Inbound::Text(text.as_str().to_owned()),
                            Some(Ok(Message::Close(_))) => {
                                info!("Relay closed the connection");
                                break;
                            }
                            Some(Ok(_)) => continue,
                            Some(Err(err)) => {
                                error!("Receive failed, stopping reader: {err}");
                                break;
                            }
                            None => {
                                debug!("Stream ended");
                                break;
                            }
                        };
                        if inbound_tx.send(forwarded).await.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("Reader task stopped");
        });

        Ok(Connection {
            sender: FrameSender::new(outbound_tx),
            inbound: ReceiverStream::new(inbound_rx).boxed(),
        })
    }
}
