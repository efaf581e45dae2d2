use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::message::RelayMessage;

pub type SharedHub = Arc<Mutex<RelayHub>>;

struct Client {
    connection_id: u64,
    // position in the directory listing; kept across reconnects
    joined: u64,
    outbox: mpsc::UnboundedSender<String>,
}

/// Connected users and every message that has passed through the relay.
#[derive(Default)]
pub struct RelayHub {
    // one live connection per user name; a reconnect replaces the old entry
    clients: BTreeMap<String, Client>,
    history: Vec<RelayMessage>,
    next_connection_id: u64,
}

impl RelayHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedHub {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Registers `user`, replays the stored messages that involve them and
    /// announces them to everyone else. Returns the id `disconnect` expects.
    pub fn connect(&mut self, user: &str, outbox: mpsc::UnboundedSender<String>) -> u64 {
        let connection_id = self.next_connection_id;
        self.next_connection_id += 1;

        let joined = match self.clients.get(user) {
            Some(previous) => {
                log::warn!("{user} connected again, replacing the previous connection");
                previous.joined
            }
            None => connection_id,
        };
        let client = Client {
            connection_id,
            joined,
            outbox,
        };
        self.clients.insert(user.to_string(), client);

        self.replay_history(user);
        self.broadcast_status(user, "online");
        connection_id
    }

    /// Drops `user` if `connection_id` is still their live connection.
    pub fn disconnect(&mut self, user: &str, connection_id: u64) {
        match self.clients.get(user) {
            Some(client) if client.connection_id == connection_id => {
                self.clients.remove(user);
                self.broadcast_status(user, "offline");
            }
            _ => log::debug!("Stale connection {connection_id} for {user} closed"),
        }
    }

    /// Forwards `message` to its recipient. Messages for offline users are
    /// kept so they are replayed when the recipient connects.
    pub fn route(&mut self, message: RelayMessage) {
        match self.clients.get(&message.to_user) {
            Some(client) => {
                if deliver(client, &message) {
                    self.history.push(message);
                } else {
                    log::error!("Failed to send message to {}", message.to_user);
                }
            }
            None => {
                log::info!("User {} is offline. Message queued.", message.to_user);
                self.history.push(message);
            }
        }
    }

    /// Connected users other than `user`, in the order they first joined.
    pub fn users_except(&self, user: &str) -> Vec<String> {
        let mut users: Vec<(&String, u64)> = self
            .clients
            .iter()
            .filter(|(name, _)| name.as_str() != user)
            .map(|(name, client)| (name, client.joined))
            .collect();
        users.sort_by_key(|(_, joined)| *joined);
        users.into_iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn connected_count(&self) -> usize {
        self.clients.len()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn replay_history(&self, user: &str) {
        let Some(client) = self.clients.get(user) else {
            return;
        };
        let mut replayed = 0;
        for message in self.history.iter().filter(|message| message.involves(user)) {
            if !deliver(client, message) {
                break;
            }
            replayed += 1;
        }
        if replayed > 0 {
            log::info!("Replayed {replayed} stored messages to {user}");
        }
    }

    fn broadcast_status(&self, user: &str, status: &str) {
        for (name, client) in self.clients.iter().filter(|(name, _)| name.as_str() != user) {
            deliver(client, &RelayMessage::presence(user, name, status));
        }
    }
}

fn deliver(client: &Client, message: &RelayMessage) -> bool {
    match serde_json::to_string(message) {
        Ok(payload) => client.outbox.send(payload).is_ok(),
        Err(err) => {
            log::error!("Failed to encode message for {}: {err}", message.to_user);
            false
        }
    }
}
