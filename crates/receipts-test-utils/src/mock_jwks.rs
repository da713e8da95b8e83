//! Mock issuer JWKS endpoint on wiremock.

use crate::crypto_fixtures::{jwks_json, TestKeypair};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock publishes the key set on.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// A running mock JWKS endpoint.
///
/// Every request is recorded, so tests can assert how often the service
/// actually fetched the key set.
pub struct MockJwks {
    server: MockServer,
}

impl MockJwks {
    /// Start a mock publishing the given keys.
    pub async fn start(keys: &[&TestKeypair]) -> Self {
        let mock = Self::empty().await;
        mock.mount_keys(keys).await;
        mock
    }

    /// Start a mock that answers every JWKS request with `status`.
    pub async fn start_failing(status: u16) -> Self {
        let mock = Self::empty().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock.server)
            .await;
        mock
    }

    async fn empty() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Replace the published key set (simulates issuer key rotation).
    ///
    /// Also clears recorded requests, so [`Self::fetch_count`] restarts at 0.
    pub async fn rotate(&self, keys: &[&TestKeypair]) {
        self.server.reset().await;
        self.mount_keys(keys).await;
    }

    async fn mount_keys(&self, keys: &[&TestKeypair]) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_json(keys)))
            .mount(&self.server)
            .await;
    }

    /// Full JWKS URL to configure the service with.
    pub fn jwks_url(&self) -> String {
        format!("{}{}", self.server.uri(), JWKS_PATH)
    }

    /// Number of JWKS requests received so far.
    pub async fn fetch_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| {
                requests
                    .iter()
                    .filter(|r| r.url.path() == JWKS_PATH)
                    .count()
            })
    }
}
