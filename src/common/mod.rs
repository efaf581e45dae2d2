pub mod commands;
pub mod errors;
pub mod events;
pub mod types;

pub use commands::SessionCommand;
pub use errors::{DirectoryError, IdentityError, TransportError};
pub use events::SessionEvent;
pub use types::{ChatMessage, ConnectionState, Identity, MessageKind};
