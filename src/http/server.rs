//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (request ID, tracing, timeout, concurrency limit)
//! - Classify every request and route it to its segment's backend group
//! - Forward requests to upstream backends
//! - Apply configuration reloads atomically
//! - Serve the admin API when enabled

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::classify::{BasicAuthClassifier, Orchestrator, RequestView};
use crate::config::RouterConfig;
use crate::http::request::{build_upstream_request, request_id_of, MakeRequestUuidV4};
use crate::http::response;
use crate::load_balancer::pool::BackendManager;
use crate::observability::metrics;
use crate::routing::SegmentTable;
use crate::services::StaticSchemaDirectory;

/// Everything derived from one configuration generation.
#[derive(Debug)]
pub struct RouterState {
    pub config: RouterConfig,
    pub segments: SegmentTable,
    pub backends: BackendManager,
}

impl RouterState {
    pub fn from_config(config: RouterConfig) -> Self {
        Self {
            segments: SegmentTable::from_config(&config.segments),
            backends: BackendManager::new(&config.backends),
            config,
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<RouterState>>,
    pub orchestrator: Orchestrator,
    pub client: Client<HttpConnector, Body>,
    pub started: Instant,
    /// Basic-auth classifier whose protocol paths the admin API manages.
    pub protocol_paths: Option<Arc<BasicAuthClassifier>>,
}

/// HTTP server for the segment router.
pub struct HttpServer {
    state: AppState,
    directory: Option<Arc<StaticSchemaDirectory>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and pipeline.
    pub fn new(config: RouterConfig, orchestrator: Orchestrator) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let state = AppState {
            inner: Arc::new(ArcSwap::from_pointee(RouterState::from_config(config))),
            orchestrator,
            client,
            started: Instant::now(),
            protocol_paths: None,
        };

        Self {
            state,
            directory: None,
        }
    }

    /// Refresh this directory's context table on every config reload.
    pub fn with_directory(mut self, directory: Arc<StaticSchemaDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Let the admin API add and remove Basic-auth protocol paths.
    pub fn with_protocol_paths(mut self, classifier: Arc<BasicAuthClassifier>) -> Self {
        self.state.protocol_paths = Some(classifier);
        self
    }

    /// Shared handler state.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(&self) -> Router {
        let inner = self.state.inner.load();
        let timeouts = &inner.config.timeouts;
        let max_in_flight = inner.config.listener.max_connections;

        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(self.state.clone())
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(timeouts.request_secs)))
                    .layer(ConcurrencyLimitLayer::new(max_in_flight)),
            )
    }

    /// Swap in a new configuration generation.
    pub fn apply_config(state: &AppState, directory: Option<&StaticSchemaDirectory>, config: RouterConfig) {
        if let Some(directory) = directory {
            directory.replace(&config.contexts);
        }
        let backends = config.backends.len();
        let mappings = config.segments.mappings.len();
        state.inner.store(Arc::new(RouterState::from_config(config)));
        metrics::record_config_reload();
        tracing::info!(backends, mappings, "Configuration reloaded");
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<RouterConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let reload_state = self.state.clone();
        let reload_directory = self.directory.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                Self::apply_config(&reload_state, reload_directory.as_deref(), config);
            }
        });

        self.spawn_admin(shutdown.resubscribe()).await;

        let app = self.build_router().into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    async fn spawn_admin(&self, mut shutdown: broadcast::Receiver<()>) {
        let admin = self.state.inner.load().config.admin.clone();
        if !admin.enabled {
            return;
        }

        let listener = match TcpListener::bind(&admin.bind_address).await {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(address = %admin.bind_address, error = %e, "Failed to bind admin API");
                return;
            }
        };
        tracing::info!(address = %admin.bind_address, "Admin API listening");

        let app = setup_admin_router(self.state.clone());
        tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.recv().await;
                })
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "Admin API stopped with error");
            }
        });
    }
}

/// Main proxy handler.
/// Classifies the request, picks the segment's backend group, and forwards.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id_of(request.headers()).to_string();
    let method = request.method().to_string();
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let view = RequestView::from_request(&request, client_ip);
    let verdict = match state.orchestrator.evaluate(&view).await {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Cannot classify request, refusing to route");
            metrics::record_request(&method, 503, "fault", start);
            return response::routing_fault();
        }
    };

    let inner = state.inner.load_full();
    let decision = inner.segments.route(&verdict.classification);
    let reason = decision.reason.as_str();

    tracing::debug!(
        request_id = %request_id,
        path = %view.path(),
        classifier = verdict.claimed_by.as_ref().map(|c| c.name.as_str()).unwrap_or("none"),
        outcome = verdict.classification.label(),
        group = %decision.group,
        "Routing request"
    );

    let Some(backend) = inner.backends.get(decision.group) else {
        tracing::warn!(request_id = %request_id, group = %decision.group, "No backend available");
        metrics::record_request(&method, 503, reason, start);
        return response::no_backend();
    };

    let upstream = match build_upstream_request(request, backend.addr, &verdict.classification) {
        Ok(req) => req,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream request");
            metrics::record_request(&method, 502, reason, start);
            return response::upstream_failed();
        }
    };

    match state.client.request(upstream).await {
        Ok(resp) => {
            metrics::record_request(&method, resp.status().as_u16(), reason, start);
            response::relay(resp)
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, backend = %backend.name, error = %e, "Upstream error");
            metrics::record_request(&method, 502, reason, start);
            response::upstream_failed()
        }
    }
}
