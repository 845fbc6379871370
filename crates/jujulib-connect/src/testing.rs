//! In-memory transport and a scripted controller for tests.
//!
//! [`MockTransport`] records every frame it is asked to write. [`MockController`]
//! pairs one with a [`ControllerApi`] and lets a test read the requests the
//! client sent and push responses back.

use crate::controller::ControllerApi;
use crate::error::{ClientError, Result};
use crate::session::Credentials;
use crate::transport::Transport;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const REQUEST_WAIT: Duration = Duration::from_secs(5);

pub struct MockTransport {
    connected: AtomicBool,
    sent: mpsc::UnboundedSender<String>,
}

impl MockTransport {
    /// A connected transport plus the receiver of everything it writes.
    /// Dropping the receiver makes further writes fail.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (sent, rx) = mpsc::unbounded_channel();
        (
            Self {
                connected: AtomicBool::new(true),
                sent,
            },
            rx,
        )
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send(&self, frame: String) -> Result<()> {
        self.sent
            .send(frame)
            .map_err(|_| ClientError::TransportClosed)
    }

    async fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

/// The far end of a [`ControllerApi`] backed by a [`MockTransport`].
pub struct MockController {
    transport: Arc<MockTransport>,
    sent: mpsc::UnboundedReceiver<String>,
    inbound: mpsc::UnboundedSender<String>,
}

impl MockController {
    /// A client with the given credentials, wired to a scripted controller.
    pub fn pair(credentials: Option<Credentials>) -> (ControllerApi, MockController) {
        let (transport, sent) = MockTransport::new();
        let transport = Arc::new(transport);
        let (inbound, inbound_rx) = mpsc::unbounded_channel();

        let api = ControllerApi::new(transport.clone(), inbound_rx, credentials);
        (
            api,
            MockController {
                transport,
                sent,
                inbound,
            },
        )
    }

    /// Wait for the next request the client writes.
    ///
    /// # Panics
    ///
    /// When nothing is written within a few seconds or the frame is not JSON.
    pub async fn next_request(&mut self) -> Value {
        let frame = tokio::time::timeout(REQUEST_WAIT, self.sent.recv())
            .await
            .expect("timed out waiting for a request")
            .expect("transport dropped");
        serde_json::from_str(&frame).expect("request is JSON")
    }

    /// The next request if one has already been written.
    pub fn try_next_request(&mut self) -> Option<Value> {
        self.sent
            .try_recv()
            .ok()
            .and_then(|frame| serde_json::from_str(&frame).ok())
    }

    /// Answer request `id` successfully.
    pub fn respond(&self, id: u64, response: Value) {
        self.push(json!({"request-id": id, "response": response}));
    }

    /// Answer request `id` with an error payload (a string or `{message, code}`).
    pub fn fail(&self, id: u64, error: Value) {
        self.push(json!({"request-id": id, "error": error}));
    }

    pub fn push(&self, frame: Value) {
        self.push_raw(frame.to_string());
    }

    pub fn push_raw(&self, frame: impl Into<String>) {
        // The client may already be gone at the end of a test.
        let _ = self.inbound.send(frame.into());
    }

    pub fn set_connected(&self, connected: bool) {
        self.transport.set_connected(connected);
    }
}
