pub mod commands;
pub mod events;
pub mod types;

pub use commands::HubCommand;
pub use events::HubEvent;
pub use types::{ChatMessage, ConnectionState, SessionId};
