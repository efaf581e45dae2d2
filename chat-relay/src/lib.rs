//! Message relay for the chat client: one WebSocket per connected user,
//! point-to-point routing by `toUser`, and a user directory over HTTP.

pub mod message;
pub mod network;

pub use message::RelayMessage;
pub use network::hub::{RelayHub, SharedHub};
pub use network::routes::router;
