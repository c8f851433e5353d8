//! WebSocket transport for snapshot subscribers.

use futures::{SinkExt, StreamExt};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, info, warn};
use triarb_core::error::DeliveryError;
use triarb_core::traits::SubscriberSink;
use triarb_core::Shutdown;

use crate::broadcaster::{SubscriberId, SubscriberRegistry};

/// Bounded outbound queue feeding one connection's writer task.
///
/// A full queue means the client is not keeping up; delivery fails and the
/// registry drops the subscriber.
pub struct ChannelSink {
    tx: mpsc::Sender<String>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }
}

impl SubscriberSink for ChannelSink {
    fn deliver(&self, message: &str) -> Result<(), DeliveryError> {
        self.tx.try_send(message.to_string()).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Full,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

/// Accepts WebSocket subscribers and registers them for broadcast.
pub struct WsServer {
    listener: TcpListener,
    registry: Arc<SubscriberRegistry>,
    buffer: usize,
}

impl WsServer {
    /// Bind the listener.
    pub async fn bind(
        addr: &str,
        registry: Arc<SubscriberRegistry>,
        buffer: usize,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            registry,
            buffer: buffer.max(1),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until shutdown. The listener is closed on return.
    pub async fn run(self, mut shutdown: Shutdown) {
        if let Ok(addr) = self.listener.local_addr() {
            info!(addr = %addr, "accepting subscribers");
        }

        loop {
            tokio::select! {
                _ = shutdown.wait() => {
                    info!("subscriber listener closing");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tokio::spawn(handle_connection(
                            stream,
                            peer,
                            Arc::clone(&self.registry),
                            self.buffer,
                            shutdown.clone(),
                        ));
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                },
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<SubscriberRegistry>,
    buffer: usize,
    mut shutdown: Shutdown,
) {
    let socket = match accept_async(stream).await {
        Ok(socket) => socket,
        Err(e) => {
            warn!(peer = %peer, error = %e, "websocket handshake failed");
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(buffer);
    let id = SubscriberId::new();
    registry.subscribe(id, Arc::new(ChannelSink::new(tx)));
    info!(subscriber = %id, peer = %peer, "subscriber connected");

    loop {
        tokio::select! {
            outgoing = rx.recv() => match outgoing {
                Some(text) => {
                    if ws_sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                // Registry dropped the sink
                None => break,
            },
            incoming = ws_receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(other)) => debug!(subscriber = %id, ?other, "ignoring inbound message"),
            },
            _ = shutdown.wait() => {
                let _ = ws_sender.send(Message::Close(None)).await;
                break;
            }
        }
    }

    registry.unsubscribe(id);
    info!(subscriber = %id, peer = %peer, "subscriber disconnected");
}
