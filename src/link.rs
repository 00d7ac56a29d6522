//! Link capability: the transport a node reads from and writes to.
//!
//! A link is externally supplied — wired UART, short-range radio, or an
//! in-memory channel — and the relay behaves identically over all of them.
//! Byte-stream transports deliver arbitrary fragments per [`Link::recv`];
//! message-oriented radio transports deliver whole payloads. Frame
//! boundaries are the codec's business, never the link's.

use tokio::sync::mpsc;

use crate::error::{RelayError, Result};

/// An abstract byte- or message-oriented transport between two nodes.
#[async_trait::async_trait]
pub trait Link: Send + 'static {
    /// Receive the next chunk of bytes from the peer.
    ///
    /// Returns:
    /// - `Some(bytes)` - A fragment of the stream, or one whole radio payload
    /// - `None` - The link is closed and will deliver nothing further
    async fn recv(&mut self) -> Option<Vec<u8>>;

    /// Write one chunk to the peer.
    ///
    /// A failed send means the egress is currently unreachable. Senders count
    /// the failure and move on — the protocol never retries a frame.
    async fn send(&mut self, bytes: &[u8]) -> Result<()>;
}

/// In-memory duplex link over bounded channels.
///
/// Used to wire generators, relays, and analyzers together in tests and
/// single-process simulations. Dropping one end makes the other end's sends
/// fail with [`RelayError::LinkUnavailable`] and its receives return `None`.
pub struct ChannelLink {
    tx: mpsc::Sender<Vec<u8>>,
    rx: mpsc::Receiver<Vec<u8>>,
}

impl ChannelLink {
    /// Create a connected pair of link endpoints.
    pub fn pair(capacity: usize) -> (ChannelLink, ChannelLink) {
        let (a_tx, a_rx) = mpsc::channel(capacity);
        let (b_tx, b_rx) = mpsc::channel(capacity);
        (ChannelLink { tx: a_tx, rx: b_rx }, ChannelLink { tx: b_tx, rx: a_rx })
    }
}

#[async_trait::async_trait]
impl Link for ChannelLink {
    async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.tx
            .send(bytes.to_vec())
            .await
            .map_err(|_| RelayError::link_unavailable("peer endpoint dropped"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pair_is_full_duplex() {
        let (mut a, mut b) = ChannelLink::pair(4);

        a.send(b"ping").await.unwrap();
        assert_eq!(b.recv().await.unwrap(), b"ping");

        b.send(b"pong").await.unwrap();
        assert_eq!(a.recv().await.unwrap(), b"pong");
    }

    #[tokio::test]
    async fn send_to_dropped_peer_is_link_unavailable() {
        let (mut a, b) = ChannelLink::pair(4);
        drop(b);

        let error = a.send(b"lost").await.unwrap_err();
        assert!(matches!(error, RelayError::LinkUnavailable { .. }));
        assert!(error.is_recoverable());
    }

    #[tokio::test]
    async fn recv_after_peer_drop_drains_then_closes() {
        let (mut a, mut b) = ChannelLink::pair(4);
        a.send(b"last words").await.unwrap();
        drop(a);

        assert_eq!(b.recv().await.unwrap(), b"last words");
        assert_eq!(b.recv().await, None);
    }
}
