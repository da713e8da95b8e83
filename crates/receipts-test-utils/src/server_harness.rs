//! Test server harness for E2E testing
//!
//! Provides `TestReceiptsServer` for spawning real receipts server instances
//! in tests.

use crate::test_ids::{TEST_AUDIENCE, TEST_ISSUER};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use receipts_service::config::Config;
use receipts_service::observability::metrics::init_metrics_recorder;
use receipts_service::repositories::InMemoryReceiptRepository;
use receipts_service::routes::{self, AppState};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// Global metrics handle for test servers.
///
/// The Prometheus recorder can be installed once per process; every test
/// server in the process shares it.
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics handle shared by all test servers in this process.
pub fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Test harness for spawning the receipts server in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() -> Result<()> {
///     let jwks = MockJwks::start(&[&TestKeypair::primary()]).await;
///     let server = TestReceiptsServer::spawn(&jwks.jwks_url()).await?;
///
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestReceiptsServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    client: reqwest::Client,
    _handle: JoinHandle<()>,
}

impl TestReceiptsServer {
    /// Spawn a server validating tokens against `jwks_url`, with the test
    /// audience and issuer and the seeded receipt store.
    pub async fn spawn(jwks_url: &str) -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(jwks_url, HashMap::new()).await
    }

    /// Like [`Self::spawn`], with extra environment variables layered on top
    /// (e.g. `JWKS_CACHE_TTL_SECONDS`).
    pub async fn spawn_with_vars(
        jwks_url: &str,
        overrides: HashMap<String, String>,
    ) -> Result<Self, anyhow::Error> {
        let mut vars = HashMap::from([
            ("JWKS_URL".to_string(), jwks_url.to_string()),
            ("AUTH0_AUDIENCE".to_string(), TEST_AUDIENCE.to_string()),
            ("AUTH0_ISSUER".to_string(), TEST_ISSUER.to_string()),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("RECEIPTS_DRAIN_SECONDS".to_string(), "0".to_string()),
        ]);
        vars.extend(overrides);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let state = Arc::new(AppState::new(
            config,
            Arc::new(InMemoryReceiptRepository::seeded()),
        ));

        // Build routes using the service's real route builder
        let app = routes::build_routes(Arc::clone(&state), test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            state,
            client: reqwest::Client::new(),
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Application state, for reaching the JWKS cache directly.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// GET `path` without credentials.
    pub async fn get(&self, path: &str) -> Result<reqwest::Response, anyhow::Error> {
        Ok(self
            .client
            .get(format!("{}{}", self.url(), path))
            .send()
            .await?)
    }

    /// GET `path` with `Authorization: Bearer <token>`.
    pub async fn get_with_token(
        &self,
        path: &str,
        token: &str,
    ) -> Result<reqwest::Response, anyhow::Error> {
        Ok(self
            .client
            .get(format!("{}{}", self.url(), path))
            .bearer_auth(token)
            .send()
            .await?)
    }

    /// GET `path` with a raw `Authorization` header value.
    pub async fn get_with_authorization(
        &self,
        path: &str,
        authorization: &str,
    ) -> Result<reqwest::Response, anyhow::Error> {
        Ok(self
            .client
            .get(format!("{}{}", self.url(), path))
            .header("Authorization", authorization)
            .send()
            .await?)
    }
}

impl Drop for TestReceiptsServer {
    fn drop(&mut self) {
        // Abort the server task so the port is released when the test ends
        self._handle.abort();
    }
}
