//! Gateway assembly: shared state, router wiring and the listener.

use crate::{middleware::create_cors_layers, router};
use axum::{
    routing::{any, get},
    serve, Router,
};
use bytes::Bytes;
use protect_core::{
    admission::Blacklist,
    clock::{SharedClock, SystemClock},
    config::AppConfig,
    dedup::DedupCache,
    health::HealthReporter,
    metrics::GatewayMetrics,
    processor::{ProcessorError, RelayProcessor, RequestContext, RequestProcessor},
    signing::{RelaySigner, SignerError},
};
use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpListener, sync::broadcast, task::JoinHandle};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No relay signing key configured")]
    MissingSigningKey,

    #[error("Relay signing key rejected: {0}")]
    Signer(#[from] SignerError),

    #[error("Request processor initialization failed: {0}")]
    Processor(#[from] ProcessorError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Read-mostly state shared by every handler.
pub struct GatewayState {
    pub proxy_url: Arc<str>,
    pub relay_url: Arc<str>,
    pub signer: Arc<RelaySigner>,
    pub blacklist: Blacklist,
    pub processor: Arc<dyn RequestProcessor>,
    pub health: HealthReporter,
    pub metrics: Arc<GatewayMetrics>,
    pub request_timeout: Duration,
    pub docs_url: Arc<str>,
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("proxy_url", &self.proxy_url)
            .field("relay_url", &self.relay_url)
            .field("signer", &self.signer)
            .field("blacklist", &self.blacklist)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl GatewayState {
    /// Builds the per-request context handed to the processor.
    #[must_use]
    pub fn request_context(&self, origin: String, body: Bytes) -> RequestContext {
        RequestContext {
            origin,
            body,
            proxy_url: Arc::clone(&self.proxy_url),
            relay_url: Arc::clone(&self.relay_url),
            signer: Arc::clone(&self.signer),
        }
    }
}

/// Builder for [`GatewayServer`].
///
/// Only the configuration is required. The signer defaults to the configured
/// key, the clock to [`SystemClock`], and the processor to [`RelayProcessor`].
pub struct GatewayBuilder<'a> {
    config: &'a AppConfig,
    version: String,
    clock: Option<SharedClock>,
    signer: Option<RelaySigner>,
    processor: Option<Arc<dyn RequestProcessor>>,
}

impl<'a> GatewayBuilder<'a> {
    #[must_use]
    pub fn new(config: &'a AppConfig) -> Self {
        Self {
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
            clock: None,
            signer: None,
            processor: None,
        }
    }

    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn signer(mut self, signer: RelaySigner) -> Self {
        self.signer = Some(signer);
        self
    }

    #[must_use]
    pub fn processor(mut self, processor: Arc<dyn RequestProcessor>) -> Self {
        self.processor = Some(processor);
        self
    }

    /// # Errors
    ///
    /// Fails if the configuration is invalid, no usable signing key is
    /// available, or the default processor cannot build its HTTP client.
    pub fn build(self) -> Result<GatewayServer, GatewayError> {
        let config = self.config;
        config.validate().map_err(GatewayError::InvalidConfig)?;
        let listen_address = config.socket_addr().map_err(GatewayError::InvalidConfig)?;

        let signer = match self.signer {
            Some(signer) => signer,
            None => {
                let key =
                    config.relay.signing_key.as_deref().ok_or(GatewayError::MissingSigningKey)?;
                RelaySigner::from_hex(key)?
            }
        };

        let clock = self.clock.unwrap_or_else(SystemClock::shared);
        let metrics = Arc::new(GatewayMetrics::new());
        let dedup = Arc::new(DedupCache::new(config.retention(), Arc::clone(&clock)));

        let processor: Arc<dyn RequestProcessor> = match self.processor {
            Some(processor) => processor,
            None => Arc::new(RelayProcessor::new(
                Arc::clone(&dedup),
                Arc::clone(&metrics),
                config.request_timeout(),
            )?),
        };

        let health = HealthReporter::new(self.version, clock.now(), clock);

        let state = Arc::new(GatewayState {
            proxy_url: Arc::from(config.relay.proxy_url.as_str()),
            relay_url: Arc::from(config.relay.relay_url.as_str()),
            signer: Arc::new(signer),
            blacklist: Blacklist::new(config.admission.blacklist.iter().cloned()),
            processor,
            health,
            metrics,
            request_timeout: config.request_timeout(),
            docs_url: Arc::from(config.server.docs_url.as_str()),
        });

        Ok(GatewayServer {
            listen_address,
            state,
            dedup,
            max_concurrent_requests: config.server.max_concurrent_requests,
            max_body_bytes: config.server.max_body_bytes,
            sweep_interval: config.sweep_interval(),
        })
    }
}

/// Owns everything constructed once per process.
#[derive(Debug)]
pub struct GatewayServer {
    listen_address: SocketAddr,
    state: Arc<GatewayState>,
    dedup: Arc<DedupCache>,
    max_concurrent_requests: usize,
    max_body_bytes: usize,
    sweep_interval: Duration,
}

impl GatewayServer {
    /// Builds a gateway with the default processor and system clock.
    ///
    /// # Errors
    ///
    /// See [`GatewayBuilder::build`].
    pub fn from_config(config: &AppConfig) -> Result<Self, GatewayError> {
        GatewayBuilder::new(config).build()
    }

    #[must_use]
    pub fn builder(config: &AppConfig) -> GatewayBuilder<'_> {
        GatewayBuilder::new(config)
    }

    #[must_use]
    pub fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    #[must_use]
    pub fn state(&self) -> &Arc<GatewayState> {
        &self.state
    }

    #[must_use]
    pub fn dedup(&self) -> &Arc<DedupCache> {
        &self.dedup
    }

    /// Builds the HTTP router.
    ///
    /// Unmatched paths and unmatched methods on `/` both fall through to 404.
    pub fn router(&self) -> Router {
        let (allow_origin, allow_headers) = create_cors_layers();

        let root = get(router::handle_redirect)
            .options(router::handle_preflight)
            .post(router::handle_rpc)
            .fallback(router::handle_not_found);

        Router::new()
            .route("/", root)
            .route("/health", any(router::handle_health))
            .route("/metrics", get(router::handle_metrics))
            .fallback(router::handle_not_found)
            .with_state(Arc::clone(&self.state))
            .layer(ConcurrencyLimitLayer::new(self.max_concurrent_requests))
            .layer(RequestBodyLimitLayer::new(self.max_body_bytes))
            .layer(allow_headers)
            .layer(allow_origin)
    }

    /// Spawns the dedup sweeper; it stops when `shutdown_rx` fires.
    pub fn start_sweeper(&self, shutdown_rx: broadcast::Receiver<()>) -> JoinHandle<()> {
        self.dedup.start_sweeper(
            self.sweep_interval,
            Arc::clone(&self.state.metrics),
            shutdown_rx,
        )
    }

    /// # Errors
    ///
    /// Returns [`GatewayError::Bind`] if the listen address is unavailable.
    pub async fn bind(&self) -> Result<TcpListener, GatewayError> {
        TcpListener::bind(self.listen_address)
            .await
            .map_err(|source| GatewayError::Bind { addr: self.listen_address, source })
    }

    /// Serves on `listener` until `shutdown` resolves, then drains in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Serve`] if the accept loop fails.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let local = listener.local_addr().unwrap_or(self.listen_address);
        info!(address = %local, "gateway listening");

        serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(GatewayError::Serve)
    }
}
