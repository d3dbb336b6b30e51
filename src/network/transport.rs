use std::ops::ControlFlow;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use super::error::HubError;
use super::negotiate::{negotiate, websocket_url};
use super::protocol::{self, HubMessage};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const EVENT_BUFFER: usize = 100;
const SERVER_TIMEOUT_MESSAGE: &str =
    "Server timeout elapsed without receiving a message from the server.";

/// Inbound traffic the controller reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Invocation {
        target: String,
        arguments: Vec<Value>,
    },
    Closed {
        error: Option<String>,
    },
}

/// A hub connection handle. `start` may be called again after a close; the
/// handle itself lives for the whole process.
#[async_trait]
pub trait HubTransport: Send {
    async fn start(&mut self) -> Result<(), HubError>;

    async fn send(&mut self, target: &str, arguments: Vec<Value>) -> Result<(), HubError>;

    /// Waits for the next invocation or for the connection to drop. Must be
    /// cancel-safe: the controller polls it inside `select!`.
    async fn next_event(&mut self) -> TransportEvent;

    async fn stop(&mut self);
}

#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub skip_negotiation: bool,
    pub handshake_timeout: Duration,
    pub keep_alive_interval: Duration,
    pub server_timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            skip_negotiation: false,
            handshake_timeout: Duration::from_secs(15),
            keep_alive_interval: Duration::from_secs(15),
            server_timeout: Duration::from_secs(30),
        }
    }
}

pub struct WebSocketTransport {
    hub_url: Url,
    options: TransportOptions,
    http: reqwest::Client,
    connection: Option<LiveConnection>,
}

struct LiveConnection {
    writer: SplitSink<WsStream, Message>,
    events: mpsc::Receiver<TransportEvent>,
    reader: JoinHandle<()>,
    last_sent: Instant,
}

impl LiveConnection {
    async fn write(&mut self, frame: String) -> Result<(), HubError> {
        self.writer.send(Message::Text(frame.into())).await?;
        self.last_sent = Instant::now();
        Ok(())
    }
}

impl Drop for LiveConnection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl WebSocketTransport {
    pub fn new(hub_url: Url, options: TransportOptions) -> Self {
        Self {
            hub_url,
            options,
            http: reqwest::Client::new(),
            connection: None,
        }
    }
}

#[async_trait]
impl HubTransport for WebSocketTransport {
    async fn start(&mut self) -> Result<(), HubError> {
        if self.connection.is_some() {
            return Err(HubError::AlreadyStarted);
        }

        // Negotiate, upgrade and handshake share one deadline.
        let limit = self.options.handshake_timeout;
        let connection = time::timeout(limit, establish(&self.http, &self.hub_url, &self.options))
            .await
            .map_err(|_| HubError::Timeout {
                elapsed: limit,
                operation: "hub connection",
            })??;

        self.connection = Some(connection);
        Ok(())
    }

    async fn send(&mut self, target: &str, arguments: Vec<Value>) -> Result<(), HubError> {
        let connection = self.connection.as_mut().ok_or(HubError::NotConnected)?;
        let frame = protocol::encode_invocation(target, &arguments)?;
        connection.write(frame).await
    }

    async fn next_event(&mut self) -> TransportEvent {
        loop {
            let Some(connection) = self.connection.as_mut() else {
                return TransportEvent::Closed {
                    error: Some(HubError::NotConnected.to_string()),
                };
            };
            let ping_at = connection.last_sent + self.options.keep_alive_interval;

            tokio::select! {
                event = connection.events.recv() => {
                    let event = event.unwrap_or(TransportEvent::Closed { error: None });
                    if matches!(event, TransportEvent::Closed { .. }) {
                        self.connection = None;
                    }
                    return event;
                }
                _ = time::sleep_until(ping_at) => {
                    if let Err(err) = connection.write(protocol::encode_ping()).await {
                        self.connection = None;
                        return TransportEvent::Closed { error: Some(err.to_string()) };
                    }
                }
            }
        }
    }

    async fn stop(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            if let Err(err) = connection.writer.send(Message::Close(None)).await {
                log::debug!("Close frame not delivered: {err}");
            }
        }
    }
}

async fn establish(
    http: &reqwest::Client,
    hub_url: &Url,
    options: &TransportOptions,
) -> Result<LiveConnection, HubError> {
    let socket_url = if options.skip_negotiation {
        websocket_url(hub_url, None)?
    } else {
        negotiate(http, hub_url).await?
    };
    log::debug!("Opening hub socket {socket_url}");

    open(socket_url, options.server_timeout).await
}

async fn open(socket_url: Url, server_timeout: Duration) -> Result<LiveConnection, HubError> {
    let (stream, _) = connect_async(socket_url.as_str()).await?;
    let (mut writer, mut reader) = stream.split();

    writer
        .send(Message::Text(protocol::handshake_request().into()))
        .await?;

    let mut buffer = String::new();
    let remainder = loop {
        match reader.next().await {
            Some(Ok(Message::Text(text))) => {
                buffer.push_str(text.as_str());
                if let Some(rest) = protocol::parse_handshake_response(&buffer)? {
                    break rest;
                }
            }
            Some(Ok(Message::Close(_))) | None => {
                return Err(HubError::Handshake(
                    "connection closed before the handshake response".to_string(),
                ));
            }
            Some(Ok(_)) => {}
            Some(Err(err)) => return Err(err.into()),
        }
    };

    let (event_sender, events) = mpsc::channel(EVENT_BUFFER);
    let reader = tokio::spawn(read_loop(reader, remainder, event_sender, server_timeout));

    Ok(LiveConnection {
        writer,
        events,
        reader,
        last_sent: Instant::now(),
    })
}

async fn read_loop(
    mut reader: SplitStream<WsStream>,
    remainder: String,
    events: mpsc::Sender<TransportEvent>,
    server_timeout: Duration,
) {
    let mut flow = forward_frame(&remainder, &events).await;

    while flow.is_continue() {
        flow = match time::timeout(server_timeout, reader.next()).await {
            Err(_) => ControlFlow::Break(Some(SERVER_TIMEOUT_MESSAGE.to_string())),
            Ok(None) | Ok(Some(Ok(Message::Close(_)))) => ControlFlow::Break(None),
            Ok(Some(Ok(Message::Text(text)))) => forward_frame(text.as_str(), &events).await,
            Ok(Some(Ok(_))) => ControlFlow::Continue(()),
            Ok(Some(Err(err))) => ControlFlow::Break(Some(err.to_string())),
        };
    }

    if let ControlFlow::Break(error) = flow {
        let _ = events.send(TransportEvent::Closed { error }).await;
    }
}

async fn forward_frame(
    frame: &str,
    events: &mpsc::Sender<TransportEvent>,
) -> ControlFlow<Option<String>> {
    for message in protocol::decode_frame(frame) {
        match message {
            Ok(HubMessage::Invocation { target, arguments }) => {
                if events
                    .send(TransportEvent::Invocation { target, arguments })
                    .await
                    .is_err()
                {
                    return ControlFlow::Break(None);
                }
            }
            Ok(HubMessage::Ping) => {}
            Ok(HubMessage::Close { error }) => return ControlFlow::Break(error),
            Ok(HubMessage::Other(kind)) => log::debug!("Ignoring hub message of type {kind}"),
            Err(err) => log::warn!("Dropping malformed hub record: {err}"),
        }
    }
    ControlFlow::Continue(())
}
