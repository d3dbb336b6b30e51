use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

use crate::common::{ChatMessage, ConnectionState, HubCommand, HubEvent, SessionId};

use super::connection::ConnectionFsm;
use super::error::HubError;
use super::transport::{HubTransport, TransportEvent};

/// Hub method the server invokes to deliver a chat line.
pub const MESSAGE_RECEIVED: &str = "messageReceived";
/// Hub method the client invokes to post a chat line.
pub const NEW_MESSAGE: &str = "newMessage";

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(5000);

/// Drives one hub connection for the lifetime of the process: connects,
/// retries at a fixed delay, relays inbound messages to the UI and outbound
/// messages to the hub.
pub struct HubClient<T> {
    transport: T,
    session_id: SessionId,
    fsm: ConnectionFsm,
    retry_delay: Duration,
    retry_at: Option<Instant>,
    event_sender: mpsc::Sender<HubEvent>,
    command_receiver: mpsc::Receiver<HubCommand>,
}

impl<T: HubTransport> HubClient<T> {
    pub fn new(
        transport: T,
        session_id: SessionId,
        retry_delay: Duration,
        event_sender: mpsc::Sender<HubEvent>,
        command_receiver: mpsc::Receiver<HubCommand>,
    ) -> Self {
        Self {
            transport,
            session_id,
            fsm: ConnectionFsm::new(),
            retry_delay,
            retry_at: None,
            event_sender,
            command_receiver,
        }
    }

    /// Runs until the command channel closes, i.e. until the UI goes away.
    pub async fn run(mut self) {
        log::info!("Hub client started for session {}", self.session_id);
        self.connect().await;

        loop {
            let connected = self.fsm.state() == ConnectionState::Connected;
            let retry_at = self.retry_at;

            tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(command) => self.handle_command(command).await,
                        None => break,
                    }
                }
                event = self.transport.next_event(), if connected => {
                    self.handle_transport_event(event).await;
                }
                _ = time::sleep_until(retry_at.unwrap_or_else(Instant::now)), if retry_at.is_some() => {
                    self.retry_at = None;
                    self.connect().await;
                }
            }
        }

        self.transport.stop().await;
        log::info!("Hub client stopped");
    }

    async fn connect(&mut self) {
        if !self.fsm.begin_connect() {
            log::debug!("Connect requested while {}; ignoring", self.fsm.state());
            return;
        }
        self.retry_at = None;
        self.publish(HubEvent::ConnectionChanged(ConnectionState::Connecting))
            .await;

        // Commands keep flowing while the attempt is in flight; a send cannot
        // succeed until the attempt resolves, so it fails right away.
        let outcome = {
            let mut start = self.transport.start();
            let mut commands_open = true;
            loop {
                tokio::select! {
                    result = &mut start => break result,
                    command = self.command_receiver.recv(), if commands_open => match command {
                        Some(HubCommand::SendMessage(text)) => {
                            report_send(&self.event_sender, text, Err(HubError::NotConnected))
                                .await;
                        }
                        None => commands_open = false,
                    },
                }
            }
        };

        match outcome {
            Ok(()) => {
                self.fsm.mark_connected();
                log::info!("Hub connected.");
                self.publish(HubEvent::ConnectionChanged(ConnectionState::Connected))
                    .await;
            }
            Err(err) => {
                self.fsm.mark_disconnected();
                log::error!(
                    "Error while starting connection: {err}; retrying in {:?}",
                    self.retry_delay
                );
                self.retry_at = Some(Instant::now() + self.retry_delay);
                self.publish(HubEvent::ConnectionChanged(ConnectionState::Disconnected))
                    .await;
            }
        }
    }

    async fn handle_command(&mut self, command: HubCommand) {
        match command {
            HubCommand::SendMessage(text) => self.send(text).await,
        }
    }

    async fn send(&mut self, text: String) {
        let result = if self.fsm.state() == ConnectionState::Connected {
            let arguments = vec![
                Value::from(self.session_id.value()),
                Value::from(text.as_str()),
            ];
            self.transport.send(NEW_MESSAGE, arguments).await
        } else {
            Err(HubError::NotConnected)
        };

        report_send(&self.event_sender, text, result).await;
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Invocation { target, arguments } => {
                if target.eq_ignore_ascii_case(MESSAGE_RECEIVED) {
                    match message_from_arguments(&arguments) {
                        Some(message) => self.on_message_received(message).await,
                        None => log::warn!(
                            "`{MESSAGE_RECEIVED}` expects (author, text), got {} argument(s)",
                            arguments.len()
                        ),
                    }
                } else {
                    log::debug!("No handler registered for hub method `{target}`");
                }
            }
            TransportEvent::Closed { error } => self.on_connection_closed(error).await,
        }
    }

    async fn on_message_received(&mut self, message: ChatMessage) {
        self.publish(HubEvent::MessageReceived(message)).await;
    }

    async fn on_connection_closed(&mut self, error: Option<String>) {
        self.fsm.mark_disconnected();
        match error {
            Some(error) => log::warn!("Connection closed ({error}), attempting to reconnect..."),
            None => log::info!("Connection closed, attempting to reconnect..."),
        }
        self.publish(HubEvent::ConnectionChanged(ConnectionState::Disconnected))
            .await;

        self.retry_at = None;
        self.connect().await;
    }

    async fn publish(&mut self, event: HubEvent) {
        publish(&self.event_sender, event).await;
    }
}

async fn publish(event_sender: &mpsc::Sender<HubEvent>, event: HubEvent) {
    if let Err(err) = event_sender.send(event).await {
        log::debug!("UI is gone, dropping hub event: {err:?}");
    }
}

async fn report_send(
    event_sender: &mpsc::Sender<HubEvent>,
    text: String,
    result: Result<(), HubError>,
) {
    let event = match result {
        Ok(()) => HubEvent::MessageSent(text),
        Err(err) => {
            log::warn!("Failed to send message: {err}");
            HubEvent::SendFailed {
                text,
                reason: err.to_string(),
            }
        }
    };
    publish(event_sender, event).await;
}

fn message_from_arguments(arguments: &[Value]) -> Option<ChatMessage> {
    match arguments {
        [author, text, ..] => Some(ChatMessage::new(
            argument_text(author)?,
            argument_text(text)?,
        )),
        _ => None,
    }
}

fn argument_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
