//! Transport Layer
//!
//! Text-frame transport abstraction with a WebSocket implementation and an
//! in-process channel implementation.

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};

/// Transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection closed")]
    Closed,

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Ordered, reliable delivery of text frames.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send one frame
    async fn send(&mut self, frame: String) -> TransportResult<()>;

    /// Wait for the next frame. Must be cancel safe.
    async fn receive(&mut self) -> TransportResult<String>;

    fn is_connected(&self) -> bool;

    async fn close(&mut self) -> TransportResult<()>;

    fn stats(&self) -> TransportStats;
}

/// Transport statistics
#[derive(Debug, Clone, Default)]
pub struct TransportStats {
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub send_errors: u64,
    pub receive_errors: u64,
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Room transport over a WebSocket, one JSON document per text frame.
pub struct WebSocketTransport {
    /// `None` once closed by either side
    stream: Option<WsStream>,
    stats: TransportStats,
}

impl WebSocketTransport {
    pub async fn connect(url: &str) -> TransportResult<Self> {
        log::debug!("Opening WebSocket to {}", url);
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            stream: Some(stream),
            stats: TransportStats::default(),
        })
    }

    fn lost(&mut self, error: TransportError) -> TransportError {
        self.stream = None;
        error
    }
}

#[async_trait::async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, frame: String) -> TransportResult<()> {
        let stream = self.stream.as_mut().ok_or(TransportError::Closed)?;
        let len = frame.len() as u64;
        let sent = stream.send(Message::Text(frame)).await;
        if let Err(e) = sent {
            self.stats.send_errors += 1;
            return Err(self.lost(TransportError::SendFailed(e.to_string())));
        }
        self.stats.bytes_sent += len;
        self.stats.messages_sent += 1;
        Ok(())
    }

    // Each await is a single `next()`, which loses nothing when dropped
    async fn receive(&mut self) -> TransportResult<String> {
        loop {
            let stream = self.stream.as_mut().ok_or(TransportError::Closed)?;
            let next = stream.next().await;
            let frame = match next {
                Some(Ok(Message::Text(text))) => text,
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                    Ok(text) => text,
                    Err(e) => {
                        self.stats.receive_errors += 1;
                        log::warn!("Dropping binary frame that is not UTF-8: {}", e);
                        continue;
                    }
                },
                // tungstenite answers pings itself
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Ok(Message::Close(_))) | None => return Err(self.lost(TransportError::Closed)),
                Some(Err(e)) => {
                    self.stats.receive_errors += 1;
                    return Err(self.lost(TransportError::ReceiveFailed(e.to_string())));
                }
            };
            self.stats.bytes_received += frame.len() as u64;
            self.stats.messages_received += 1;
            return Ok(frame);
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn close(&mut self) -> TransportResult<()> {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.close(None).await {
                log::debug!("WebSocket close handshake failed: {}", e);
            }
        }
        Ok(())
    }

    fn stats(&self) -> TransportStats {
        self.stats.clone()
    }
}

/// In-process transport backed by unbounded channels.
pub struct ChannelTransport {
    tx: Option<mpsc::UnboundedSender<String>>,
    rx: mpsc::UnboundedReceiver<String>,
    stats: TransportStats,
}

impl ChannelTransport {
    /// Two connected ends; frames sent on one are received on the other.
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (
            Self {
                tx: Some(a_tx),
                rx: b_rx,
                stats: TransportStats::default(),
            },
            Self {
                tx: Some(b_tx),
                rx: a_rx,
                stats: TransportStats::default(),
            },
        )
    }
}

#[async_trait::async_trait]
impl Transport for ChannelTransport {
    async fn send(&mut self, frame: String) -> TransportResult<()> {
        let tx = self.tx.as_ref().ok_or(TransportError::Closed)?;
        let len = frame.len() as u64;
        if tx.send(frame).is_err() {
            self.stats.send_errors += 1;
            return Err(TransportError::Closed);
        }
        self.stats.bytes_sent += len;
        self.stats.messages_sent += 1;
        Ok(())
    }

    async fn receive(&mut self) -> TransportResult<String> {
        let frame = self.rx.recv().await.ok_or(TransportError::Closed)?;
        self.stats.bytes_received += frame.len() as u64;
        self.stats.messages_received += 1;
        Ok(frame)
    }

    fn is_connected(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.tx = None;
        self.rx.close();
        Ok(())
    }

    fn stats(&self) -> TransportStats {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_pair_delivers_in_order() {
        let (mut client, mut server) = ChannelTransport::pair();

        client.send("one".to_string()).await.unwrap();
        client.send("two".to_string()).await.unwrap();

        assert_eq!(server.receive().await.unwrap(), "one");
        assert_eq!(server.receive().await.unwrap(), "two");

        let stats = client.stats();
        assert_eq!(stats.messages_sent, 2);
        assert_eq!(stats.bytes_sent, 6);
        assert_eq!(server.stats().messages_received, 2);
    }

    #[tokio::test]
    async fn test_closed_channel_reports_closed() {
        let (mut client, mut server) = ChannelTransport::pair();
        assert!(client.is_connected());

        server.close().await.unwrap();
        assert!(!client.is_connected());
        assert!(matches!(
            client.send("late".to_string()).await,
            Err(TransportError::Closed)
        ));
        assert!(matches!(client.receive().await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_websocket_echo_then_server_close() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            while let Some(Ok(message)) = ws.next().await {
                if message.is_text() {
                    ws.send(message).await.unwrap();
                    ws.close(None).await.unwrap();
                }
            }
        });

        let mut client = WebSocketTransport::connect(&format!("ws://{}", addr))
            .await
            .unwrap();
        client.send("hello".to_string()).await.unwrap();
        assert_eq!(client.receive().await.unwrap(), "hello");

        assert!(matches!(client.receive().await, Err(TransportError::Closed)));
        assert!(!client.is_connected());
        assert!(matches!(
            client.send("late".to_string()).await,
            Err(TransportError::Closed)
        ));

        let stats = client.stats();
        assert_eq!(stats.messages_sent, 1);
        assert_eq!(stats.messages_received, 1);
        server.await.unwrap();
    }

    #[test]
    fn test_transport_stats_default() {
        let stats = TransportStats::default();
        assert_eq!(stats.bytes_sent, 0);
        assert_eq!(stats.messages_received, 0);
    }
}
