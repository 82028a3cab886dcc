use anyhow::{anyhow, Result};

use futures_util::StreamExt;

use tokio::sync::mpsc;
use tokio::time;
use tokio::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::{decode_server_message, ServerMessage};

/// Connection status, forwarded so consumers can render "connecting" /
/// "disconnected" states the way the UI does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnState {
    Connecting,
    Connected,
    Disconnected(String),
}

/// What the socket task sends to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum WsEvent {
    State(ConnState),
    Message(ServerMessage),
}

/// Reconnecting client for one server event stream (the lobby socket or a
/// game socket). The server never expects traffic from us on these sockets;
/// this is a pure event source.
pub struct WsClient {
    connect_url: url::Url,

    to_consumer: mpsc::Sender<WsEvent>,
}

impl WsClient {
    pub fn new(connect_url: url::Url, to_consumer: mpsc::Sender<WsEvent>) -> WsClient {
        WsClient {
            connect_url,
            to_consumer,
        }
    }

    /// Runs forever: connect, stream events, and on any error report it and
    /// retry after a short delay. Only a closed consumer channel ends the
    /// loop.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.to_consumer
                .send(WsEvent::State(ConnState::Connecting))
                .await?;

            match self.handle_ws_conn().await {
                Ok(()) => {
                    return Err(anyhow!("ws stream handler returned unexpectedly"));
                }
                Err(err) => {
                    println!("ws conn error ({}): {}", self.connect_url, &err);
                    self.to_consumer
                        .send(WsEvent::State(ConnState::Disconnected(err.to_string())))
                        .await?;
                }
            }

            time::sleep(Duration::from_millis(1000)).await;
        }
    }

    async fn handle_ws_conn(&mut self) -> Result<()> {
        let (ws_stream, _) = connect_async(self.connect_url.as_str()).await?;
        println!("connected to {}", self.connect_url);

        self.to_consumer
            .send(WsEvent::State(ConnState::Connected))
            .await?;

        let (_to_ws, mut from_ws) = ws_stream.split();

        loop {
            let recv = from_ws
                .next()
                .await
                .ok_or(anyhow!("server closed the connection"))??;

            let text = match recv {
                Message::Text(text) => text,
                // Control frames are handled by tungstenite; nothing else
                // carries events.
                _ => continue,
            };

            // A decode failure is a protocol mismatch with the server; drop
            // the connection rather than silently skipping events.
            let msg = decode_server_message(&text)
                .map_err(|err| anyhow!("failed to decode {:?}: {}", text, err))?;

            self.to_consumer.send(WsEvent::Message(msg)).await?;
        }
    }
}
