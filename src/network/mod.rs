pub mod client;
pub mod directory;
pub mod transport;

pub use client::{SessionController, SessionHandle, spawn_session, spawn_session_with};
pub use directory::DirectoryClient;
pub use transport::{InboundMessages, TransportSession};

use reqwest::Url;

/// Appends `segments` to the path of `base`, percent-encoding each one.
fn endpoint_with(base: &str, segments: &[&str]) -> Result<Url, String> {
    let mut url = Url::parse(base).map_err(|err| format!("{base}: {err}"))?;
    url.path_segments_mut()
        .map_err(|()| format!("{base}: URL cannot carry a path"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
