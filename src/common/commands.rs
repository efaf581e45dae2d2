/// Commands the presentation layer sends down to the session controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Compose a chat message to the active peer.
    SendMessage(String),
    /// Switch the thread being shown.
    SelectPeer(String),
    /// Re-fetch the peer directory.
    RefreshPeers,
    /// Close the relay connection and stop the session.
    Disconnect,
}
