//! Transport adapters delivering whole binary frames to and from the bridge.

mod local;
mod websocket;

pub use local::{LocalTransport, RemotePeer};
pub use websocket::WebSocketTransport;

use async_trait::async_trait;
use futures::stream::BoxStream;
use teleop_types::{Result, TeleopError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A complete message as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Binary(Vec<u8>),
    Text(String),
}

/// Cloneable handle for queueing outbound binary frames.
#[derive(Debug, Clone)]
pub struct FrameSender {
    tx: mpsc::Sender<Vec<u8>>,
}

impl FrameSender {
    pub(crate) fn new(tx: mpsc::Sender<Vec<u8>>) -> Self {
        Self { tx }
    }

    pub async fn send(&self, frame: Vec<u8>) -> Result<()> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| network_error("connection closed; outbound frame dropped"))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// An established duplex link: a sender for frames out, a stream of frames in.
/// The inbound stream ends when the peer goes away.
pub struct Connection {
    pub sender: FrameSender,
    pub inbound: BoxStream<'static, Inbound>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish a connection whose background tasks stop when `cancel` fires.
    async fn connect(&self, cancel: CancellationToken) -> Result<Connection>;
}

pub fn network_error(message: impl Into<String>) -> TeleopError {
    TeleopError::Network(message.into())
}
