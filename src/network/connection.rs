use crate::common::ConnectionState;

/// Single owner of the connection state. Every transition the controller
/// makes goes through here, which is what keeps `connect` from overlapping.
#[derive(Debug, Default)]
pub struct ConnectionFsm {
    state: ConnectionState,
}

impl ConnectionFsm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Moves to `Connecting` if no attempt is in flight and no connection is
    /// live. Returns whether the caller may start the transport.
    pub fn begin_connect(&mut self) -> bool {
        match self.state {
            ConnectionState::Idle | ConnectionState::Disconnected => {
                self.state = ConnectionState::Connecting;
                true
            }
            ConnectionState::Connecting | ConnectionState::Connected => false,
        }
    }

    pub fn mark_connected(&mut self) {
        debug_assert_eq!(self.state, ConnectionState::Connecting);
        self.state = ConnectionState::Connected;
    }

    pub fn mark_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        assert_eq!(ConnectionFsm::new().state(), ConnectionState::Idle);
    }

    #[test]
    fn second_connect_while_connecting_is_rejected() {
        let mut fsm = ConnectionFsm::new();
        assert!(fsm.begin_connect());
        assert!(!fsm.begin_connect());
        assert_eq!(fsm.state(), ConnectionState::Connecting);
    }

    #[test]
    fn connect_while_connected_is_rejected() {
        let mut fsm = ConnectionFsm::new();
        assert!(fsm.begin_connect());
        fsm.mark_connected();
        assert!(!fsm.begin_connect());
        assert_eq!(fsm.state(), ConnectionState::Connected);
    }

    #[test]
    fn disconnect_allows_a_new_attempt() {
        let mut fsm = ConnectionFsm::new();
        assert!(fsm.begin_connect());
        fsm.mark_connected();
        fsm.mark_disconnected();
        assert_eq!(fsm.state(), ConnectionState::Disconnected);
        assert!(fsm.begin_connect());
    }
}
