//! The bidirectional message channel underneath the dispatcher.
//!
//! A transport only moves text frames. Framing, reconnection and TLS are its
//! own business; the dispatcher only asks whether it is ready and hands it
//! serialized requests. Inbound frames are delivered separately on an
//! [`Inbound`] channel so that the transport does not need to know about the
//! dispatcher.

use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Receiving half of a transport: one item per inbound text frame. The
/// channel closes when the connection does.
pub type Inbound = mpsc::UnboundedReceiver<String>;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Whether frames can currently be written.
    fn is_connected(&self) -> bool;

    /// Write one text frame.
    async fn send(&self, frame: String) -> Result<()>;

    /// Close the connection. Closing an already closed transport is a no-op.
    async fn close(&self);
}
