/// Lệnh UI gửi xuống tầng kết nối hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubCommand {
    /// Gửi `newMessage(sessionId, text)` lên hub.
    SendMessage(String),
}
