use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::common::{ChatMessage, ConnectionState, TransportError};

use super::endpoint_with;

type RelayStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type RelayWriter = SplitSink<RelayStream, Message>;
type RelayReader = SplitStream<RelayStream>;

/// Messages decoded from the relay, in arrival order. Ends when the socket
/// closes; a finished sequence never restarts.
pub struct InboundMessages {
    receiver: mpsc::UnboundedReceiver<ChatMessage>,
}

impl InboundMessages {
    pub async fn next(&mut self) -> Option<ChatMessage> {
        self.receiver.recv().await
    }
}

/// One WebSocket connection to the relay, scoped to a single identity.
///
/// `Idle -> Connecting -> Open -> Closed`. `Closed` is terminal: a new
/// connection needs a new `TransportSession`.
pub struct TransportSession {
    relay_url: String,
    state: ConnectionState,
    writer: Option<RelayWriter>,
    reader_task: Option<JoinHandle<()>>,
}

impl TransportSession {
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self {
            relay_url: relay_url.into(),
            state: ConnectionState::Idle,
            writer: None,
            reader_task: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Opens the connection for `identity`.
    ///
    /// Failures are logged and leave the session `Closed`; the returned
    /// sequence is then already finished.
    pub async fn connect(&mut self, identity: &str) -> InboundMessages {
        let (sender, receiver) = mpsc::unbounded_channel();
        let inbound = InboundMessages { receiver };

        if self.state != ConnectionState::Idle {
            log::warn!("Ignoring connect for {identity}: transport is already {}", self.state);
            return inbound;
        }

        let url = match endpoint_with(&self.relay_url, &[identity]) {
            Ok(url) => url,
            Err(reason) => {
                log::error!("{}", TransportError::InvalidEndpoint(reason));
                self.state = ConnectionState::Closed;
                return inbound;
            }
        };

        self.state = ConnectionState::Connecting;
        match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((stream, _)) => {
                let (writer, reader) = stream.split();
                self.writer = Some(writer);
                self.reader_task = Some(tokio::spawn(forward_inbound(reader, sender)));
                self.state = ConnectionState::Open;
                log::info!("[Connected] relay connection opened for {identity}");
            }
            Err(err) => {
                log::error!("{} ({url})", TransportError::ConnectionFailure(err));
                self.state = ConnectionState::Closed;
            }
        }

        inbound
    }

    /// Writes `message` to the relay. Nothing is queued: if the connection
    /// is not open the message is dropped and `NotConnected` returned.
    pub async fn send(&mut self, message: &ChatMessage) -> Result<(), TransportError> {
        if self.state != ConnectionState::Open {
            return Err(TransportError::NotConnected);
        }
        let Some(writer) = self.writer.as_mut() else {
            return Err(TransportError::NotConnected);
        };

        let payload = message.to_wire()?;
        if let Err(err) = writer.send(Message::Text(payload.into())).await {
            self.mark_closed();
            return Err(TransportError::SendFailed(err));
        }
        Ok(())
    }

    /// Records that the relay side went away.
    pub fn mark_closed(&mut self) {
        if self.state != ConnectionState::Closed {
            log::info!("[Disconnected] relay connection closed");
        }
        self.state = ConnectionState::Closed;
        self.writer = None;
    }

    /// Closes the connection. Safe to call in any state, any number of times.
    pub async fn disconnect(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(err) = writer.close().await {
                log::debug!("Close handshake with relay failed: {err}");
            }
        }
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        self.mark_closed();
    }
}

impl Drop for TransportSession {
    fn drop(&mut self) {
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
    }
}

async fn forward_inbound(mut reader: RelayReader, sender: mpsc::UnboundedSender<ChatMessage>) {
    while let Some(frame) = reader.next().await {
        let delivered = match frame {
            Ok(Message::Text(text)) => deliver(&sender, text.as_str()),
            Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => deliver(&sender, text),
                Err(err) => {
                    log::warn!("Dropping binary frame that is not UTF-8: {err}");
                    true
                }
            },
            Ok(Message::Close(frame)) => {
                log::info!("Relay closed the connection: {frame:?}");
                break;
            }
            Ok(_) => true,
            Err(err) => {
                log::warn!("Relay connection error: {err}");
                break;
            }
        };
        if !delivered {
            break;
        }
    }
}

/// Decodes one payload and hands it on. Malformed payloads are logged and
/// skipped. Returns false once nobody is listening.
fn deliver(sender: &mpsc::UnboundedSender<ChatMessage>, payload: &str) -> bool {
    match ChatMessage::from_wire(payload) {
        Ok(message) => sender.send(message).is_ok(),
        Err(err) => {
            log::warn!("Dropping payload: {}", TransportError::MalformedPayload(err));
            true
        }
    }
}
