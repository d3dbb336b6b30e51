use crate::common::types::{ChatMessage, ConnectionState};

/// Sự kiện từ tầng kết nối hub gửi lên UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubEvent {
    MessageReceived(ChatMessage),
    ConnectionChanged(ConnectionState),
    /// Hub đã nhận tin nhắn gửi đi với nội dung này.
    MessageSent(String),
    SendFailed {
        text: String,
        reason: String,
    },
}
