//! Giao diện terminal dùng chung hub client: mỗi dòng stdin được gửi đi,
//! tin nhắn nhận được in ra stdout.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::common::{ChatMessage, HubCommand, HubEvent};

pub async fn run(
    command_sender: mpsc::Sender<HubCommand>,
    mut event_receiver: mpsc::Receiver<HubEvent>,
) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    log::info!("stdin closed; leaving chat");
                    break;
                };
                if line.is_empty() {
                    continue;
                }
                if command_sender.send(HubCommand::SendMessage(line)).await.is_err() {
                    log::error!("Hub client is no longer running");
                    break;
                }
            }
            event = event_receiver.recv() => {
                match event {
                    Some(event) => handle_event(event),
                    None => break,
                }
            }
        }
    }

    Ok(())
}

fn handle_event(event: HubEvent) {
    match event {
        HubEvent::MessageReceived(message) => println!("{}", format_entry(&message)),
        HubEvent::ConnectionChanged(state) => log::debug!("Connection is {state}"),
        HubEvent::MessageSent(text) => log::debug!("Delivered: {text}"),
        HubEvent::SendFailed { text, reason } => {
            log::warn!("Message not delivered ({reason}): {text}");
        }
    }
}

fn format_entry(message: &ChatMessage) -> String {
    format!("{}: {}", message.author, message.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_shows_author_then_text() {
        assert_eq!(
            format_entry(&ChatMessage::new("1712345678901", "hello there")),
            "1712345678901: hello there"
        );
    }
}
