//! Chat socket connection

use crate::{Error, Result};
use futures_util::{SinkExt, StreamExt};
use std::future::Future;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket and no attempt in flight
    #[default]
    Disconnected,
    /// Opening a socket
    Connecting,
    /// Socket open
    Connected,
}

/// An open chat socket as a pair of text channels
///
/// Dropping `outbound` closes the socket. `inbound` ends when the socket
/// closes for any reason.
#[derive(Debug)]
pub struct SocketLink {
    /// Frames to send
    pub outbound: mpsc::UnboundedSender<String>,
    /// Frames received
    pub inbound: mpsc::UnboundedReceiver<String>,
}

impl SocketLink {
    /// Create a link and the far ends of its channels
    ///
    /// Returns the link plus `(sent frames, frame injector)` for the
    /// transport (or a test) to drive.
    pub fn pair() -> (
        Self,
        mpsc::UnboundedReceiver<String>,
        mpsc::UnboundedSender<String>,
    ) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        (
            Self {
                outbound: out_tx,
                inbound: in_rx,
            },
            out_rx,
            in_tx,
        )
    }
}

/// Opens chat sockets
pub trait Connector: Send + Sync + 'static {
    /// Open a socket to `url`
    fn open(&self, url: &str) -> impl Future<Output = Result<SocketLink>> + Send;
}

/// Chat socket URL with the bearer token as `token` query parameter
pub fn chat_url(ws_url: &str, token: &str) -> Result<String> {
    reqwest::Url::parse_with_params(ws_url, &[("token", token)])
        .map(String::from)
        .map_err(|e| Error::Transport(format!("Invalid chat URL {}: {}", ws_url, e)))
}

/// WebSocket connector over tokio-tungstenite
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    async fn open(&self, url: &str) -> Result<SocketLink> {
        let (stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        let (mut sink, mut source) = stream.split();
        let (link, mut outbound, inbound) = SocketLink::pair();

        tokio::spawn(async move {
            while let Some(text) = outbound.recv().await {
                if let Err(e) = sink.send(Message::Text(text)).await {
                    debug!("Chat socket write failed: {}", e);
                    break;
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        if inbound.send(text).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!("Chat socket read failed: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(link)
    }
}
