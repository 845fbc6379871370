//! WebSocket transport backed by tokio-tungstenite.

use crate::error::{ClientError, Result};
use crate::transport::{Inbound, Transport};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, warn};

/// A WebSocket connection to a controller.
///
/// The socket is split into a writer task fed through a channel and a reader
/// task that forwards text frames to the [`Inbound`] receiver returned by
/// [`WsTransport::connect`]. Either task stopping marks the transport as
/// disconnected.
pub struct WsTransport {
    outgoing: mpsc::UnboundedSender<Message>,
    connected: Arc<AtomicBool>,
}

impl WsTransport {
    /// Open a WebSocket to `url` (e.g. `wss://10.0.0.1:17070/api`).
    pub async fn connect(url: &str) -> Result<(Self, Inbound)> {
        debug!("Opening WebSocket to {}", url);
        let (stream, _response) = tokio_tungstenite::connect_async(url).await?;
        info!("WebSocket connected to {}", url);

        let (mut sink, mut source) = stream.split();
        let connected = Arc::new(AtomicBool::new(true));
        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<String>();

        let writer_connected = Arc::clone(&connected);
        tokio::spawn(async move {
            while let Some(message) = outgoing_rx.recv().await {
                let closing = matches!(message, Message::Close(_));
                if let Err(e) = sink.send(message).await {
                    warn!("WebSocket write failed: {}", e);
                    break;
                }
                if closing {
                    break;
                }
            }
            writer_connected.store(false, Ordering::SeqCst);
            let _ = sink.close().await;
        });

        let reader_connected = Arc::clone(&connected);
        tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text.as_str().to_owned(),
                    Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                        Ok(text) => text,
                        Err(_) => {
                            warn!("Discarding non UTF-8 binary frame");
                            continue;
                        }
                    },
                    Ok(Message::Close(reason)) => {
                        debug!("Controller closed the WebSocket: {:?}", reason);
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("WebSocket read failed: {}", e);
                        break;
                    }
                };

                if inbound_tx.send(text).is_err() {
                    break;
                }
            }
            reader_connected.store(false, Ordering::SeqCst);
        });

        Ok((
            Self {
                outgoing,
                connected,
            },
            inbound_rx,
        ))
    }
}

#[async_trait]
impl Transport for WsTransport {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send(&self, frame: String) -> Result<()> {
        self.outgoing
            .send(Message::Text(frame.into()))
            .map_err(|_| ClientError::TransportClosed)
    }

    async fn close(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            debug!("Closing WebSocket");
            let _ = self.outgoing.send(Message::Close(None));
        }
    }
}
