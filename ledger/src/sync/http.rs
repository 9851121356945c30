//! HTTP implementation of [`PeerTransport`].
//!
//! Talks to the JSON API every node serves:
//!
//! ```text
//! POST /block                 Block            -> 200
//! GET  /blockchain                             -> [Block]
//! GET  /blockchain/{id}?count=<n>              -> [Block]   (oldest first)
//! GET  /list?count=<n>                         -> [Peer]
//! POST /register              Peer             -> 200
//! POST /request               {"encrypted"}    -> 200
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use super::transport::{PeerTransport, TransportError};
use crate::onion::OnionRequest;
use crate::types::{Block, Peer};

/// Async `reqwest` client shared by all peer requests.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct HttpPeerTransport {
    client: Client,
}

impl HttpPeerTransport {
    /// Builds a client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    // Avoid accidental double slashes.
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn map_err(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Http(err.to_string())
    }
}

fn check_status(resp: Response) -> Result<Response, TransportError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(TransportError::Status(status.as_u16()))
    }
}

impl HttpPeerTransport {
    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, TransportError> {
        let resp = self.client.get(&url).send().await.map_err(map_err)?;
        check_status(resp)?.json::<T>().await.map_err(map_err)
    }

    async fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        url: String,
        body: &B,
    ) -> Result<(), TransportError> {
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_err)?;
        check_status(resp).map(|_| ())
    }
}

#[async_trait]
impl PeerTransport for HttpPeerTransport {
    async fn post_block(&self, peer: &Peer, block: &Block) -> Result<(), TransportError> {
        self.post_json(endpoint(&peer.base_url(), "/block"), block)
            .await
    }

    async fn get_snapshot(&self, peer: &Peer) -> Result<Vec<Block>, TransportError> {
        self.get_json(endpoint(&peer.base_url(), "/blockchain"))
            .await
    }

    async fn get_blocks_to(
        &self,
        peer: &Peer,
        id: &str,
        count: usize,
    ) -> Result<Vec<Block>, TransportError> {
        let path = format!("/blockchain/{id}?count={count}");
        self.get_json(endpoint(&peer.base_url(), &path)).await
    }

    async fn get_peers(&self, peer: &Peer, count: usize) -> Result<Vec<Peer>, TransportError> {
        let path = format!("/list?count={count}");
        self.get_json(endpoint(&peer.base_url(), &path)).await
    }

    async fn register(&self, peer: &Peer, me: &Peer) -> Result<(), TransportError> {
        self.post_json(endpoint(&peer.base_url(), "/register"), me)
            .await
    }

    async fn send_onion(
        &self,
        address: &str,
        request: &OnionRequest,
    ) -> Result<(), TransportError> {
        let url = endpoint(&format!("http://{address}"), "/request");
        self.post_json(url, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slashes() {
        assert_eq!(
            endpoint("http://10.0.0.1:8001/", "/blockchain"),
            "http://10.0.0.1:8001/blockchain"
        );
        assert_eq!(
            endpoint("http://10.0.0.1:8001", "list?count=3"),
            "http://10.0.0.1:8001/list?count=3"
        );
    }

    #[tokio::test]
    async fn unreachable_peer_is_a_transport_error() {
        let transport = HttpPeerTransport::new(Duration::from_millis(200)).unwrap();
        // Port 9 (discard) on localhost is closed in any sane test environment.
        let peer = Peer::new("127.0.0.1", 9, 1_000);

        let err = transport.get_snapshot(&peer).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::Http(_) | TransportError::Timeout
        ));
    }
}
