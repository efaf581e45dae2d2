use super::types::{ChatMessage, ConnectionState};

/// Events from the session controller up to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ConnectionChanged(ConnectionState),
    PeersUpdated {
        peers: Vec<String>,
        active_peer: Option<String>,
    },
    /// The full, time-ordered thread with `peer` after a store mutation or
    /// a selection change.
    ThreadUpdated {
        peer: String,
        thread: Vec<ChatMessage>,
    },
    /// The relay never got this message. It still sits in the local thread.
    DeliveryFailed {
        message: ChatMessage,
        reason: String,
    },
}
