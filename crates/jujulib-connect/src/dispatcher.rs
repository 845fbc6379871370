//! Request/response correlation over a single transport.
//!
//! Every request gets the next integer id and a one-shot slot in the pending
//! map. Inbound frames are matched to their slot by `request-id`, so the
//! controller may answer in any order. Frames that match nothing are
//! discarded.

use crate::error::{ClientError, Result};
use crate::transport::{Inbound, Transport};
use jujulib_wire::{FacadeCall, Request, Response};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// What a pending request eventually resolves to.
pub type Reply = Result<Value>;

struct PendingCalls {
    next_id: u64,
    calls: HashMap<u64, oneshot::Sender<Reply>>,
}

/// A request that has been written and is waiting for its response.
#[derive(Debug)]
pub struct PendingReply {
    id: u64,
    rx: oneshot::Receiver<Reply>,
}

impl PendingReply {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the response. A request removed by [`Dispatcher::cancel`]
    /// resolves to [`ClientError::Cancelled`].
    pub async fn recv(self) -> Reply {
        match self.rx.await {
            Ok(reply) => reply,
            Err(_) => Err(ClientError::Cancelled(self.id)),
        }
    }
}

pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    pending: Mutex<PendingCalls>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            pending: Mutex::new(PendingCalls {
                next_id: 1,
                calls: HashMap::new(),
            }),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Write a request and register its pending slot.
    ///
    /// When the transport is not connected nothing is written and no id is
    /// consumed; the caller gets [`ClientError::NotConnected`].
    pub async fn send(
        &self,
        facade: &str,
        method: &str,
        version: u32,
        params: Value,
    ) -> Result<PendingReply> {
        if !self.transport.is_connected() {
            debug!("Dropping {}.{}: transport not connected", facade, method);
            return Err(ClientError::NotConnected);
        }

        // The lock is held across the write so that wire order matches id order.
        let mut pending = self.pending.lock().await;
        let id = pending.next_id;
        let request = Request::new(facade, method, version, params, id);
        let frame = serde_json::to_string(&request).map_err(ClientError::Encode)?;

        let (tx, rx) = oneshot::channel();
        pending.calls.insert(id, tx);
        pending.next_id += 1;

        trace!("-> {}", frame);
        if let Err(e) = self.transport.send(frame).await {
            pending.calls.remove(&id);
            warn!("Failed to send {}.{} (request {}): {}", facade, method, id, e);
            return Err(e);
        }

        debug!("Sent {}.{} v{} (request {})", facade, method, version, id);
        Ok(PendingReply { id, rx })
    }

    /// Send a typed call at `version` and decode its response.
    pub async fn call<C: FacadeCall>(&self, version: u32, params: &C) -> Result<C::Response> {
        let params = serde_json::to_value(params).map_err(ClientError::Encode)?;
        let reply = self
            .send(C::FACADE, C::METHOD, version, params)
            .await?
            .recv()
            .await?;

        serde_json::from_value(reply).map_err(|source| ClientError::Decode {
            method: C::METHOD,
            source,
        })
    }

    /// Route one inbound frame to its pending request.
    pub async fn handle_message(&self, frame: &str) {
        trace!("<- {}", frame);

        let value: Value = match serde_json::from_str(frame) {
            Ok(value) => value,
            Err(e) => {
                warn!("Discarding malformed frame: {}", e);
                return;
            }
        };

        let Some(id) = value.get("request-id").and_then(Value::as_u64) else {
            debug!("Discarding frame without request-id");
            return;
        };

        let Some(tx) = self.pending.lock().await.calls.remove(&id) else {
            debug!("Discarding response to unknown request {}", id);
            return;
        };

        // A known id always completes its caller, even when the body is unusable.
        let reply = match serde_json::from_value::<Response>(value) {
            Ok(response) => response.into_result().map_err(ClientError::Remote),
            Err(source) => {
                warn!("Malformed response to request {}: {}", id, source);
                Err(ClientError::MalformedFrame { id, source })
            }
        };
        if tx.send(reply).is_err() {
            debug!("Caller for request {} went away before its response", id);
        }
    }

    /// Forget a pending request. Returns whether it was still pending.
    pub async fn cancel(&self, id: u64) -> bool {
        self.pending.lock().await.calls.remove(&id).is_some()
    }

    /// Complete every pending request with [`ClientError::TransportClosed`].
    pub async fn fail_all(&self) -> usize {
        let drained: Vec<_> = self.pending.lock().await.calls.drain().collect();
        let count = drained.len();
        for (_, tx) in drained {
            let _ = tx.send(Err(ClientError::TransportClosed));
        }
        if count > 0 {
            info!("Failed {} pending request(s): connection closed", count);
        }
        count
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.calls.len()
    }

    /// Close the transport and release every pending caller.
    pub async fn close(&self) {
        self.transport.close().await;
        self.fail_all().await;
    }

    /// Feed inbound frames into the dispatcher until the transport closes,
    /// then fail whatever is still pending.
    pub fn spawn_pump(self: &Arc<Self>, mut inbound: Inbound) -> JoinHandle<()> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(frame) = inbound.recv().await {
                dispatcher.handle_message(&frame).await;
            }
            debug!("Inbound stream ended");
            dispatcher.fail_all().await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use serde_json::json;

    fn dispatcher() -> (Arc<Dispatcher>, Arc<MockTransport>, tokio::sync::mpsc::UnboundedReceiver<String>) {
        let (transport, sent) = MockTransport::new();
        let transport = Arc::new(transport);
        (Arc::new(Dispatcher::new(transport.clone())), transport, sent)
    }

    fn sent_json(sent: &mut tokio::sync::mpsc::UnboundedReceiver<String>) -> Value {
        serde_json::from_str(&sent.try_recv().expect("a frame was sent")).unwrap()
    }

    #[tokio::test]
    async fn test_ids_increase_from_one() {
        let (dispatcher, _transport, mut sent) = dispatcher();

        let first = dispatcher.send("Pinger", "Ping", 1, json!({})).await.unwrap();
        let second = dispatcher.send("Pinger", "Ping", 1, json!({})).await.unwrap();
        let third = dispatcher.send("Pinger", "Ping", 1, json!({})).await.unwrap();

        assert_eq!((first.id(), second.id(), third.id()), (1, 2, 3));
        assert_eq!(sent_json(&mut sent)["request-id"], 1);
        assert_eq!(sent_json(&mut sent)["request-id"], 2);
        assert_eq!(sent_json(&mut sent)["request-id"], 3);
        assert_eq!(dispatcher.pending_count().await, 3);
    }

    #[tokio::test]
    async fn test_not_connected_drops_without_consuming_id() {
        let (dispatcher, transport, mut sent) = dispatcher();

        transport.set_connected(false);
        let result = dispatcher
            .send("ModelManager", "ModelInfo", 1, json!({}))
            .await;
        assert!(matches!(result, Err(ClientError::NotConnected)));
        assert!(sent.try_recv().is_err());
        assert_eq!(dispatcher.pending_count().await, 0);

        transport.set_connected(true);
        let pending = dispatcher.send("Pinger", "Ping", 1, json!({})).await.unwrap();
        assert_eq!(pending.id(), 1);
    }

    #[tokio::test]
    async fn test_missing_params_become_empty_object() {
        let (dispatcher, _transport, mut sent) = dispatcher();

        dispatcher
            .send("ModelManager", "ListModels", 2, Value::Null)
            .await
            .unwrap();
        assert_eq!(sent_json(&mut sent)["params"], json!({}));
    }

    #[tokio::test]
    async fn test_responses_matched_by_id_out_of_order() {
        let (dispatcher, _transport, _sent) = dispatcher();

        let first = dispatcher.send("A", "X", 1, json!({})).await.unwrap();
        let second = dispatcher.send("A", "Y", 1, json!({})).await.unwrap();

        dispatcher
            .handle_message(r#"{"request-id": 2, "response": {"which": "second"}}"#)
            .await;
        dispatcher
            .handle_message(r#"{"request-id": 1, "error": "bad wolf"}"#)
            .await;

        assert_eq!(second.recv().await.unwrap(), json!({"which": "second"}));
        let err = first.recv().await.unwrap_err();
        assert_eq!(err.remote_message(), Some("bad wolf"));
        assert_eq!(dispatcher.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_frames_are_discarded() {
        let (dispatcher, _transport, _sent) = dispatcher();
        let pending = dispatcher.send("A", "X", 1, json!({})).await.unwrap();

        dispatcher.handle_message("not json").await;
        dispatcher.handle_message(r#"{"response": {}}"#).await;
        dispatcher
            .handle_message(r#"{"request-id": 42, "response": {}}"#)
            .await;
        assert_eq!(dispatcher.pending_count().await, 1);

        dispatcher
            .handle_message(r#"{"request-id": 1, "response": {}}"#)
            .await;
        assert_eq!(pending.recv().await.unwrap(), json!({}));

        // A duplicate response for an already completed id is ignored too.
        dispatcher
            .handle_message(r#"{"request-id": 1, "response": {}}"#)
            .await;
    }

    #[tokio::test]
    async fn test_known_id_with_odd_body_still_completes() {
        let (dispatcher, _transport, _sent) = dispatcher();
        let no_message = dispatcher.send("A", "X", 1, json!({})).await.unwrap();
        let numeric_code = dispatcher.send("A", "Y", 1, json!({})).await.unwrap();

        dispatcher
            .handle_message(r#"{"request-id": 1, "error": {"code": "unauthorized access"}}"#)
            .await;
        dispatcher
            .handle_message(r#"{"request-id": 2, "error": "x", "error-code": 9}"#)
            .await;

        let err = no_message.recv().await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Protocol);
        assert_eq!(err.remote_message(), Some(r#"{"code":"unauthorized access"}"#));
        assert_eq!(numeric_code.recv().await.unwrap_err().remote_message(), Some("x"));
        assert_eq!(dispatcher.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_cancel_resolves_caller() {
        let (dispatcher, _transport, _sent) = dispatcher();
        let pending = dispatcher.send("A", "X", 1, json!({})).await.unwrap();

        assert!(dispatcher.cancel(1).await);
        assert!(!dispatcher.cancel(1).await);
        assert!(matches!(
            pending.recv().await,
            Err(ClientError::Cancelled(1))
        ));
    }

    #[tokio::test]
    async fn test_close_fails_all_pending() {
        let (dispatcher, transport, _sent) = dispatcher();
        let a = dispatcher.send("A", "X", 1, json!({})).await.unwrap();
        let b = dispatcher.send("A", "Y", 1, json!({})).await.unwrap();

        dispatcher.close().await;

        assert!(!transport.is_connected());
        assert!(matches!(a.recv().await, Err(ClientError::TransportClosed)));
        assert!(matches!(b.recv().await, Err(ClientError::TransportClosed)));
        assert_eq!(dispatcher.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_pump_fails_pending_when_inbound_ends() {
        let (dispatcher, _transport, _sent) = dispatcher();
        let (inbound_tx, inbound_rx) = tokio::sync::mpsc::unbounded_channel();
        let pump = dispatcher.spawn_pump(inbound_rx);

        let answered = dispatcher.send("A", "X", 1, json!({})).await.unwrap();
        let orphaned = dispatcher.send("A", "Y", 1, json!({})).await.unwrap();

        inbound_tx
            .send(r#"{"request-id": 1, "response": {"ok": true}}"#.to_string())
            .unwrap();
        assert_eq!(answered.recv().await.unwrap(), json!({"ok": true}));

        drop(inbound_tx);
        pump.await.unwrap();
        assert!(matches!(
            orphaned.recv().await,
            Err(ClientError::TransportClosed)
        ));
    }

    #[tokio::test]
    async fn test_transport_send_failure_releases_slot() {
        let (dispatcher, _transport, sent) = dispatcher();
        drop(sent);

        let result = dispatcher.send("A", "X", 1, json!({})).await;
        assert!(matches!(result, Err(ClientError::TransportClosed)));
        assert_eq!(dispatcher.pending_count().await, 0);
    }
}
