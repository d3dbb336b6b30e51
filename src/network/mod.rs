pub mod client;
pub mod connection;
pub mod error;
pub mod negotiate;
pub mod protocol;
pub mod transport;

pub use client::{DEFAULT_RETRY_DELAY, HubClient};
pub use error::HubError;
pub use negotiate::parse_hub_url;
pub use transport::{TransportOptions, WebSocketTransport};
