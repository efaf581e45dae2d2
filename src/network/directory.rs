use crate::common::DirectoryError;

use super::endpoint_with;

/// Looks up which identities the relay currently knows about.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: String,
}

impl DirectoryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url)
    }

    pub fn with_http_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// `GET {base}/get_users/{identity}`. The local identity and repeated
    /// names are removed; first-seen order is kept.
    pub async fn fetch_peers(&self, identity: &str) -> Result<Vec<String>, DirectoryError> {
        let url = endpoint_with(&self.base_url, &["get_users", identity])
            .map_err(DirectoryError::InvalidEndpoint)?;

        let listed: Vec<String> = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut peers: Vec<String> = Vec::with_capacity(listed.len());
        for peer in listed {
            if peer != identity && !peers.contains(&peer) {
                peers.push(peer);
            }
        }
        Ok(peers)
    }

    /// Like [`fetch_peers`](Self::fetch_peers), but a failed lookup is
    /// logged and reads as "nobody is around".
    pub async fn list_peers(&self, identity: &str) -> Vec<String> {
        match self.fetch_peers(identity).await {
            Ok(peers) => peers,
            Err(err) => {
                log::warn!("Peer lookup for {identity} failed: {err}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::routing::get;
    use axum::{Json, Router};

    fn client_for(base: impl Into<String>) -> DirectoryClient {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        DirectoryClient::with_http_client(http, base)
    }

    async fn directory_stub(listed: Vec<&'static str>) -> String {
        let app = Router::new().route(
            "/get_users/{user}",
            get(move |Path(_user): Path<String>| {
                let listed = listed.clone();
                async move { Json(listed) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn lists_peers_in_directory_order() {
        let base = directory_stub(vec!["carol", "bob"]).await;
        let directory = client_for(base);

        assert_eq!(directory.list_peers("alice").await, vec!["carol", "bob"]);
    }

    #[tokio::test]
    async fn drops_self_and_duplicates() {
        let base = directory_stub(vec!["bob", "alice", "carol", "bob"]).await;
        let directory = client_for(base);

        assert_eq!(directory.fetch_peers("alice").await.unwrap(), vec!["bob", "carol"]);
    }

    #[tokio::test]
    async fn empty_directory_is_not_an_error() {
        let base = directory_stub(Vec::new()).await;
        let directory = client_for(base);

        assert!(directory.fetch_peers("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_directory_lists_nobody() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let directory = client_for(format!("http://127.0.0.1:{port}"));

        assert!(matches!(
            directory.fetch_peers("alice").await,
            Err(DirectoryError::Request(_))
        ));
        assert!(directory.list_peers("alice").await.is_empty());
    }

    #[tokio::test]
    async fn bad_base_url_lists_nobody() {
        let directory = client_for("::nope::");

        assert!(matches!(
            directory.fetch_peers("alice").await,
            Err(DirectoryError::InvalidEndpoint(_))
        ));
        assert!(directory.list_peers("alice").await.is_empty());
    }
}
