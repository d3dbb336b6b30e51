use crate::common::{ChatMessage, ConnectionState, SessionId};

/// Nhật ký tin nhắn chỉ thêm vào cuối. Mỗi lần thêm để lại một yêu cầu
/// cuộn xuống đáy, chat area sẽ xử lý ở frame tiếp theo.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: Vec<ChatMessage>,
    scroll_to_bottom: bool,
}

impl MessageLog {
    pub fn append(&mut self, message: ChatMessage) {
        self.entries.push(message);
        self.scroll_to_bottom = true;
    }

    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_to_bottom)
    }
}

/// Trạng thái cục bộ của UI.
pub struct AppState {
    pub session_id: SessionId,
    pub log: MessageLog,
    pub input_text: String,
    pub connection: ConnectionState,
    /// Lỗi gửi gần nhất, bị xóa khi gửi thành công lần sau.
    pub notice: Option<String>,
}

impl AppState {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            log: MessageLog::default(),
            input_text: String::new(),
            connection: ConnectionState::Idle,
            notice: None,
        }
    }

    pub fn on_message_received(&mut self, message: ChatMessage) {
        self.log.append(message);
    }

    pub fn on_message_sent(&mut self) {
        self.input_text.clear();
        self.notice = None;
    }

    pub fn on_send_failed(&mut self, reason: &str) {
        self.notice = Some(format!("Message not delivered: {reason}"));
    }

    pub fn set_connection(&mut self, state: ConnectionState) {
        if self.connection != state {
            log::debug!("Connection state {} -> {}", self.connection, state);
            self.connection = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(SessionId::from(1_712_345_678_901))
    }

    #[test]
    fn messages_append_in_delivery_order_and_scroll_each_time() {
        let mut state = state();

        for index in 0..5 {
            state.on_message_received(ChatMessage::new(
                format!("author-{index}"),
                format!("body-{index}"),
            ));
            assert_eq!(state.log.entries().len(), index + 1);
            assert!(state.log.take_scroll_request());
            assert!(!state.log.take_scroll_request());
        }

        let authors: Vec<&str> = state
            .log
            .entries()
            .iter()
            .map(|message| message.author.as_str())
            .collect();
        assert_eq!(
            authors,
            ["author-0", "author-1", "author-2", "author-3", "author-4"]
        );
    }

    #[test]
    fn markup_is_kept_verbatim() {
        let mut state = state();
        state.on_message_received(ChatMessage::new("<i>eve</i>", "<script>x</script>"));
        assert_eq!(state.log.entries()[0].text, "<script>x</script>");
    }

    #[test]
    fn successful_send_clears_input() {
        let mut state = state();
        state.input_text = "hello".to_string();
        state.on_send_failed("boom");

        state.on_message_sent();

        assert_eq!(state.input_text, "");
        assert_eq!(state.notice, None);
    }

    #[test]
    fn failed_send_keeps_input() {
        let mut state = state();
        state.input_text = "hello".to_string();

        state.on_send_failed("cannot send data if the connection is not in the Connected state");

        assert_eq!(state.input_text, "hello");
        assert!(state.notice.as_deref().unwrap().starts_with("Message not delivered"));
    }

    #[test]
    fn connection_state_tracks_latest_event() {
        let mut state = state();
        state.set_connection(ConnectionState::Connecting);
        state.set_connection(ConnectionState::Connected);
        assert_eq!(state.connection, ConnectionState::Connected);
    }
}
