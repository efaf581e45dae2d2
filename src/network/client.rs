use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant};

use crate::common::{
    ChatMessage, ConnectionState, Identity, MessageKind, SessionCommand, SessionEvent,
};
use crate::config::AppConfig;
use crate::storage::ConversationStore;

use super::directory::DirectoryClient;
use super::transport::{InboundMessages, TransportSession};

/// Tick period for the refresh timer when polling is switched off. The
/// branch is disabled in that case; the timer just needs a finite period.
const IDLE_REFRESH_PERIOD: Duration = Duration::from_secs(3600);

/// The presentation layer's end of a running session.
pub struct SessionHandle {
    pub commands: mpsc::Sender<SessionCommand>,
    pub events: mpsc::Receiver<SessionEvent>,
}

/// Starts a session for `identity` on the current tokio runtime.
pub fn spawn_session(identity: Identity, config: &AppConfig) -> SessionHandle {
    let directory = DirectoryClient::new(config.directory_url.clone());
    spawn_session_with(identity, config, directory)
}

pub fn spawn_session_with(
    identity: Identity,
    config: &AppConfig,
    directory: DirectoryClient,
) -> SessionHandle {
    let capacity = config.channel_capacity.max(1);
    let (command_sender, command_receiver) = mpsc::channel(capacity);
    let (event_sender, event_receiver) = mpsc::channel(capacity);

    let controller = SessionController::new(identity, config, event_sender, command_receiver)
        .with_directory(directory);
    tokio::spawn(controller.run());

    SessionHandle {
        commands: command_sender,
        events: event_receiver,
    }
}

/// Owns the relay connection, the peer list and the conversation log for
/// one local identity.
///
/// Every mutation goes through the `run` loop: UI commands, inbound relay
/// messages and directory refreshes are handled one at a time, in the order
/// they are received.
pub struct SessionController {
    identity: Identity,
    transport: TransportSession,
    directory: DirectoryClient,
    store: ConversationStore,
    peers: Vec<String>,
    active_peer: Option<String>,
    // last connection state sent to the presentation layer
    reported_state: ConnectionState,
    peer_refresh: Option<Duration>,
    refresh_on_presence: bool,
    event_sender: mpsc::Sender<SessionEvent>,
    command_receiver: mpsc::Receiver<SessionCommand>,
}

impl SessionController {
    pub fn new(
        identity: Identity,
        config: &AppConfig,
        event_sender: mpsc::Sender<SessionEvent>,
        command_receiver: mpsc::Receiver<SessionCommand>,
    ) -> Self {
        Self {
            identity,
            transport: TransportSession::new(config.relay_url.clone()),
            directory: DirectoryClient::new(config.directory_url.clone()),
            store: ConversationStore::new(),
            peers: Vec::new(),
            active_peer: None,
            reported_state: ConnectionState::Idle,
            peer_refresh: config.peer_refresh_interval(),
            refresh_on_presence: config.refresh_on_presence,
            event_sender,
            command_receiver,
        }
    }

    pub fn with_directory(mut self, directory: DirectoryClient) -> Self {
        self.directory = directory;
        self
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    pub fn active_peer(&self) -> Option<&str> {
        self.active_peer.as_deref()
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.transport.state()
    }

    /// Thread with the active peer, or nothing when no peer is selected.
    pub fn active_thread(&self) -> Vec<ChatMessage> {
        match &self.active_peer {
            Some(peer) => self.store.thread_with(peer, self.identity.as_str()),
            None => Vec::new(),
        }
    }

    /// Keeps `message` only if the local identity sent or receives it. The
    /// relay channel can carry other sessions' traffic.
    pub fn accept_inbound(&mut self, message: ChatMessage) -> bool {
        if !message.involves(self.identity.as_str()) {
            log::debug!(
                "Discarding {} -> {}: not addressed to {}",
                message.from_user,
                message.to_user,
                self.identity
            );
            return false;
        }
        self.store.append(message);
        true
    }

    /// Replaces the peer list. The first peer becomes active if none is
    /// selected yet; an existing selection is kept even if that peer left.
    /// Returns whether the active peer changed.
    pub fn apply_peer_list(&mut self, peers: Vec<String>) -> bool {
        self.peers = peers;
        if self.active_peer.is_some() {
            return false;
        }
        match self.peers.first() {
            Some(first) => {
                self.active_peer = Some(first.clone());
                true
            }
            None => false,
        }
    }

    /// Names are used verbatim; only blank ones are refused.
    pub fn select_peer(&mut self, peer: &str) {
        if peer.trim().is_empty() {
            log::warn!("Ignoring selection of an empty peer name");
            return;
        }
        self.active_peer = Some(peer.to_string());
    }

    /// Sends `content` to the active peer and records it locally whether or
    /// not the relay took it. A message that could not be written is kept
    /// in the thread and reported with `DeliveryFailed`; it is never
    /// retried.
    ///
    /// Returns the recorded message, or `None` when there is no active peer
    /// or the content is blank.
    pub async fn send_to_active_peer(&mut self, content: &str) -> Option<ChatMessage> {
        let peer = self.active_peer.clone()?;
        if content.trim().is_empty() {
            return None;
        }

        let message = ChatMessage::outgoing(self.identity.as_str(), &peer, content);
        let outcome = self.transport.send(&message).await;
        self.store.append(message.clone());

        if let Err(err) = outcome {
            log::warn!("Message to {peer} was not delivered: {err}");
            self.emit(SessionEvent::DeliveryFailed {
                message: message.clone(),
                reason: err.to_string(),
            })
            .await;
            // a failed write can close the connection
            self.report_connection_state().await;
        }
        Some(message)
    }

    /// Re-fetches the directory and publishes the new peer list.
    pub async fn refresh_peers(&mut self) {
        let peers = self.directory.list_peers(self.identity.as_str()).await;
        log::info!("Directory lists {} peer(s) for {}", peers.len(), self.identity);

        let selection_changed = self.apply_peer_list(peers);
        self.emit(SessionEvent::PeersUpdated {
            peers: self.peers.clone(),
            active_peer: self.active_peer.clone(),
        })
        .await;
        if selection_changed {
            self.publish_thread().await;
        }
    }

    /// Opens the relay connection, reporting `Connecting` and then the
    /// outcome.
    pub async fn connect(&mut self) -> InboundMessages {
        self.reported_state = ConnectionState::Connecting;
        self.emit(SessionEvent::ConnectionChanged(ConnectionState::Connecting))
            .await;
        let inbound = self.transport.connect(self.identity.as_str()).await;
        self.report_connection_state().await;
        inbound
    }

    pub async fn run(mut self) {
        log::info!("Starting chat session for {}", self.identity);

        let mut inbound = self.connect().await;
        self.refresh_peers().await;

        let polling = self.peer_refresh.is_some();
        let period = self.peer_refresh.unwrap_or(IDLE_REFRESH_PERIOD);
        let mut refresh_ticker = time::interval_at(Instant::now() + period, period);
        let mut inbound_open = true;

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(command) => {
                            if !self.handle_command(command).await {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                message = inbound.next(), if inbound_open => {
                    match message {
                        Some(message) => self.handle_inbound(message).await,
                        None => {
                            inbound_open = false;
                            self.transport.mark_closed();
                            self.report_connection_state().await;
                        }
                    }
                }
                _ = refresh_ticker.tick(), if polling => {
                    self.refresh_peers().await;
                }
            }
        }

        self.transport.disconnect().await;
        self.emit(SessionEvent::ConnectionChanged(ConnectionState::Closed))
            .await;
        log::info!(
            "Chat session for {} ended after {} message(s)",
            self.identity,
            self.store.len()
        );
    }

    /// Returns false when the session should stop.
    async fn handle_command(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::SendMessage(content) => {
                if self.send_to_active_peer(&content).await.is_some() {
                    self.publish_thread().await;
                }
            }
            SessionCommand::SelectPeer(peer) => {
                self.select_peer(&peer);
                self.publish_thread().await;
            }
            SessionCommand::RefreshPeers => self.refresh_peers().await,
            SessionCommand::Disconnect => return false,
        }
        true
    }

    async fn handle_inbound(&mut self, message: ChatMessage) {
        let presence = message.kind == MessageKind::Notification;
        if !self.accept_inbound(message) {
            return;
        }
        self.publish_thread().await;
        if presence && self.refresh_on_presence {
            self.refresh_peers().await;
        }
    }

    async fn publish_thread(&self) {
        if let Some(peer) = &self.active_peer {
            let thread = self.store.thread_with(peer, self.identity.as_str());
            self.emit(SessionEvent::ThreadUpdated {
                peer: peer.clone(),
                thread,
            })
            .await;
        }
    }

    /// Emits `ConnectionChanged` if the transport moved since the last
    /// report.
    async fn report_connection_state(&mut self) {
        let state = self.transport.state();
        if state != self.reported_state {
            self.reported_state = state;
            self.emit(SessionEvent::ConnectionChanged(state)).await;
        }
    }

    async fn emit(&self, event: SessionEvent) {
        if self.event_sender.send(event).await.is_err() {
            log::debug!("Presentation layer is gone; dropping session event");
        }
    }
}
