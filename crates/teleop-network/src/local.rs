use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;
use teleop_types::Result;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{network_error, Connection, FrameSender, Inbound, Transport};

/// In-process transport backed by channels; the far end is a [`RemotePeer`].
pub struct LocalTransport {
    pending: Mutex<Option<Connection>>,
}

impl LocalTransport {
    pub fn new(capacity: usize) -> (Self, RemotePeer) {
        let capacity = capacity.max(1);
        let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
        let (outbound_tx, outbound_rx) = mpsc::channel(capacity);
        let connection = Connection {
            sender: FrameSender::new(outbound_tx),
            inbound: ReceiverStream::new(inbound_rx).boxed(),
        };
        let transport = Self {
            pending: Mutex::new(Some(connection)),
        };
        let peer = RemotePeer {
            inbound: Some(inbound_tx),
            outbound: outbound_rx,
        };
        (transport, peer)
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn connect(&self, _cancel: CancellationToken) -> Result<Connection> {
        info!("Connecting local in-process transport");
        self.pending
            .lock()
            .map_err(|_| network_error("local transport lock poisoned"))?
            .take()
            .ok_or_else(|| network_error("local transport already connected"))
    }
}

/// Far end of a [`LocalTransport`], standing in for a relay.
pub struct RemotePeer {
    inbound: Option<mpsc::Sender<Inbound>>,
    outbound: mpsc::Receiver<Vec<u8>>,
}

impl RemotePeer {
    pub async fn send_binary(&self, frame: Vec<u8>) -> Result<()> {
        self.push(Inbound::Binary(frame)).await
    }

    pub async fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.push(Inbound::Text(text.into())).await
    }

    async fn push(&self, message: Inbound) -> Result<()> {
        let tx = self
            .inbound
            .as_ref()
            .ok_or_else(|| network_error("remote peer already closed"))?;
        tx.send(message)
            .await
            .map_err(|_| network_error("local connection dropped"))
    }

    /// Next frame written by the local side, or `None` once it hung up.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.outbound.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        self.outbound.try_recv().ok()
    }

    /// End the inbound stream as a closed socket would.
    pub fn close(&mut self) {
        self.inbound = None;
    }
}
