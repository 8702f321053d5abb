//! Room Connection
//!
//! Pumps map command envelopes between a [`Transport`] and in-process
//! channels, and shares executed commands with the room.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use super::transport::{ChannelTransport, Transport, TransportError, TransportResult, WebSocketTransport};
use crate::executor::CommandEmitter;
use crate::sync::{EditMapCommandMessage, SyncError, SyncResult};

enum PumpEvent {
    Outgoing(Option<EditMapCommandMessage>),
    Incoming(TransportResult<String>),
    Shutdown,
}

/// Connection to a map editing room.
pub struct RoomConnection {
    outgoing: mpsc::UnboundedSender<EditMapCommandMessage>,
    incoming: Mutex<Option<mpsc::UnboundedReceiver<EditMapCommandMessage>>>,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
    connected: Arc<AtomicBool>,
}

impl std::fmt::Debug for RoomConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomConnection")
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl RoomConnection {
    /// Connect to a room over WebSocket. Only `ws` and `wss` URLs are
    /// accepted.
    pub async fn connect(address: &str) -> TransportResult<Self> {
        let url = url::Url::parse(address)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", address, e)))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(TransportError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        let transport = WebSocketTransport::connect(url.as_str()).await?;
        log::info!("Connected to room {}", url);
        Ok(Self::from_transport(Box::new(transport)))
    }

    /// Connection whose other end is returned as a [`LoopbackServer`].
    pub fn in_memory() -> (Self, LoopbackServer) {
        let (client, server) = ChannelTransport::pair();
        (Self::from_transport(Box::new(client)), LoopbackServer { transport: server })
    }

    /// Start pumping `transport`. Must be called from within a Tokio runtime.
    pub fn from_transport(transport: Box<dyn Transport>) -> Self {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let connected = Arc::new(AtomicBool::new(true));

        tokio::spawn(Self::pump(
            transport,
            outgoing_rx,
            incoming_tx,
            shutdown_rx,
            connected.clone(),
        ));

        Self {
            outgoing: outgoing_tx,
            incoming: Mutex::new(Some(incoming_rx)),
            shutdown: Mutex::new(Some(shutdown_tx)),
            connected,
        }
    }

    async fn pump(
        mut transport: Box<dyn Transport>,
        mut outgoing: mpsc::UnboundedReceiver<EditMapCommandMessage>,
        incoming: mpsc::UnboundedSender<EditMapCommandMessage>,
        mut shutdown: oneshot::Receiver<()>,
        connected: Arc<AtomicBool>,
    ) {
        loop {
            let event = tokio::select! {
                message = outgoing.recv() => PumpEvent::Outgoing(message),
                frame = transport.receive() => PumpEvent::Incoming(frame),
                _ = &mut shutdown => PumpEvent::Shutdown,
            };

            match event {
                PumpEvent::Outgoing(Some(message)) => {
                    let frame = match serde_json::to_string(&message) {
                        Ok(frame) => frame,
                        Err(e) => {
                            log::error!("Could not encode command {}: {}", message.id, e);
                            continue;
                        }
                    };
                    if let Err(e) = transport.send(frame).await {
                        log::error!("Could not send command {}: {}", message.id, e);
                        break;
                    }
                }
                PumpEvent::Incoming(Ok(frame)) => {
                    match serde_json::from_str::<EditMapCommandMessage>(&frame) {
                        Ok(message) => {
                            if incoming.send(message).is_err() {
                                log::trace!("No subscriber for room messages");
                            }
                        }
                        Err(e) => log::warn!("Ignoring malformed room message: {}", e),
                    }
                }
                PumpEvent::Incoming(Err(TransportError::Closed)) => {
                    log::info!("Room connection closed by peer");
                    break;
                }
                PumpEvent::Incoming(Err(e)) => {
                    log::error!("Room connection failed: {}", e);
                    break;
                }
                PumpEvent::Outgoing(None) | PumpEvent::Shutdown => break,
            }
        }

        connected.store(false, Ordering::SeqCst);
        let stats = transport.stats();
        log::debug!(
            "Room connection stopped: {} sent, {} received",
            stats.messages_sent,
            stats.messages_received
        );
        if let Err(e) = transport.close().await {
            log::warn!("Error closing room transport: {}", e);
        }
    }

    /// Take the stream of messages received from the room. Only the first
    /// call returns it.
    pub fn take_incoming(&self) -> Option<mpsc::UnboundedReceiver<EditMapCommandMessage>> {
        self.incoming.lock().take()
    }

    pub fn send(&self, message: EditMapCommandMessage) -> SyncResult<()> {
        if !self.is_connected() {
            return Err(SyncError::Transport(TransportError::Closed));
        }
        self.outgoing
            .send(message)
            .map_err(|_| SyncError::Transport(TransportError::Closed))
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Stop the pump and close the transport.
    pub fn close(&self) {
        if let Some(shutdown) = self.shutdown.lock().take() {
            let _ = shutdown.send(());
        }
    }
}

impl CommandEmitter for RoomConnection {
    fn emit(&self, message: EditMapCommandMessage) -> SyncResult<()> {
        log::debug!("Emitting {} ({})", message.id, message.message.kind());
        self.send(message)
    }
}

impl Drop for RoomConnection {
    fn drop(&mut self) {
        self.close();
    }
}

/// Server end of an in-memory [`RoomConnection`].
pub struct LoopbackServer {
    transport: ChannelTransport,
}

impl LoopbackServer {
    /// Next command sent by the client, `None` once it disconnected.
    pub async fn recv(&mut self) -> Option<EditMapCommandMessage> {
        loop {
            let frame = self.transport.receive().await.ok()?;
            match serde_json::from_str(&frame) {
                Ok(message) => return Some(message),
                Err(e) => log::warn!("Loopback server ignoring malformed frame: {}", e),
            }
        }
    }

    /// Deliver a message to the client.
    pub async fn send(&mut self, message: &EditMapCommandMessage) -> SyncResult<()> {
        let frame = serde_json::to_string(message)?;
        self.transport.send(frame).await?;
        Ok(())
    }

    /// Echo the next client command back, which acknowledges it.
    pub async fn acknowledge_next(&mut self) -> Option<EditMapCommandMessage> {
        let message = self.recv().await?;
        self.send(&message).await.ok()?;
        Some(message)
    }

    /// Reject the next client command with `reason`.
    pub async fn reject_next(&mut self, reason: &str) -> Option<EditMapCommandMessage> {
        let message = self.recv().await?;
        self.send(&EditMapCommandMessage::error(message.id, reason))
            .await
            .ok()?;
        Some(message)
    }
}
