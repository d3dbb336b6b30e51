use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Một tin nhắn chat: nhãn tác giả và nội dung, cả hai đều là chuỗi tùy ý.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub author: String,
    pub text: String,
}

impl ChatMessage {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
        }
    }
}

/// Nhãn hiển thị của phiên, lấy từ đồng hồ hệ thống lúc khởi động.
///
/// Không phải thông tin xác thực: hai client khởi động cùng một mili giây sẽ trùng nhau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(i64);

impl SessionId {
    pub fn generate() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for SessionId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Disconnected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_is_a_stable_copy() {
        let id = SessionId::generate();
        let first = id;
        let second = id;
        assert_eq!(first, second);
        assert_eq!(first.value(), second.value());
    }

    #[test]
    fn session_ids_differ_across_loads_a_few_millis_apart() {
        let first = SessionId::generate();
        std::thread::sleep(std::time::Duration::from_millis(3));
        let second = SessionId::generate();
        assert_ne!(first, second);
        assert!(second.value() > first.value());
    }

    #[test]
    fn session_id_displays_as_plain_integer() {
        assert_eq!(SessionId::from(1_712_345_678_901).to_string(), "1712345678901");
    }
}
