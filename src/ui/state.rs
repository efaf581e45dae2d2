use chrono::{DateTime, Utc};

use crate::common::{ChatMessage, ConnectionState, Identity, SessionEvent};

const MAX_NOTICES: usize = 20;

/// Something the user should know about that is not a chat message.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

/// The identity prompt shown before a session exists.
#[derive(Debug, Default)]
pub struct LoginForm {
    pub username: String,
    pub error: Option<String>,
}

impl LoginForm {
    /// Validates the typed name. On failure the form keeps the error to show
    /// and stays on screen for another try.
    pub fn submit(&mut self) -> Option<Identity> {
        match Identity::parse(&self.username) {
            Ok(identity) => {
                self.error = None;
                Some(identity)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                None
            }
        }
    }
}

/// What the chat screen shows, rebuilt from session events.
pub struct AppState {
    pub identity: Identity,
    pub connection: ConnectionState,
    pub peers: Vec<String>,
    pub active_peer: Option<String>,
    pub thread: Vec<ChatMessage>,
    pub input_text: String,
    pub notices: Vec<Notice>,
}

impl AppState {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            connection: ConnectionState::Idle,
            peers: Vec::new(),
            active_peer: None,
            thread: Vec::new(),
            input_text: String::new(),
            notices: Vec::new(),
        }
    }

    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ConnectionChanged(state) => {
                if state == ConnectionState::Closed && self.connection == ConnectionState::Open {
                    self.push_notice("Connection to the relay was lost".to_string());
                }
                self.connection = state;
            }
            SessionEvent::PeersUpdated { peers, active_peer } => {
                self.peers = peers;
                if self.active_peer.is_none() {
                    self.active_peer = active_peer;
                }
            }
            SessionEvent::ThreadUpdated { peer, thread } => {
                // late update for a peer the user already switched away from
                if self.active_peer.as_deref().is_some_and(|active| active != peer) {
                    return;
                }
                self.active_peer = Some(peer);
                self.thread = thread;
            }
            SessionEvent::DeliveryFailed { message, reason } => {
                self.push_notice(format!(
                    "\"{}\" to {} was not delivered ({reason})",
                    message.content, message.to_user
                ));
            }
        }
    }

    /// Switches the visible thread. Returns false when `peer` is already
    /// shown.
    pub fn select_peer(&mut self, peer: &str) -> bool {
        if self.active_peer.as_deref() == Some(peer) {
            return false;
        }
        self.active_peer = Some(peer.to_string());
        self.thread.clear();
        true
    }

    pub fn push_notice(&mut self, text: String) {
        self.notices.push(Notice {
            timestamp: Utc::now(),
            text,
        });
        if self.notices.len() > MAX_NOTICES {
            self.notices.remove(0);
        }
    }
}
