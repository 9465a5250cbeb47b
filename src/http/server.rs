//! API server setup and lifecycle.
//!
//! # Responsibilities
//! - Bind the listener and build the Axum router
//! - Wire up middleware (request ID, tracing, metrics, host check, CSRF, timeout)
//! - Serve until `shutdown` is called, then drain in-flight requests
//!
//! # Design Decisions
//! - The coordinator only sees `ApiServer` and `ServerFactory`, so tests can
//!   drive it with fakes
//! - Binding happens in `create`: a port already in use is a construction
//!   failure, not a serve failure
//! - `shutdown` before `serve` releases the listener and makes a later
//!   `serve` return immediately

use async_trait::async_trait;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{BuildInfo, DaemonConfig};
use crate::device::DaemonMode;
use crate::error::{DaemonError, ServeError};
use crate::http::gateway::Gateway;
use crate::http::handlers;
use crate::http::middleware::{
    csrf_check, host_check, track_metrics, AllowedHosts, CsrfStore,
};

/// Settings the API server is built with.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub enable_csrf: bool,
    pub disable_header_check: bool,
    pub host_whitelist: Vec<String>,
    pub mode: DaemonMode,
    pub build: BuildInfo,
    pub request_timeout: Duration,
}

impl ApiConfig {
    pub fn from_config(config: &DaemonConfig) -> Self {
        Self {
            enable_csrf: config.app.enable_csrf,
            disable_header_check: config.app.disable_header_check,
            host_whitelist: config.app.whitelist().to_vec(),
            mode: config.app.mode(),
            build: config.build.clone(),
            request_timeout: Duration::from_secs(config.app.request_timeout_secs),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enable_csrf: true,
            disable_header_check: false,
            host_whitelist: Vec::new(),
            mode: DaemonMode::default(),
            build: BuildInfo::default(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub csrf: Option<Arc<CsrfStore>>,
    pub config: Arc<ApiConfig>,
}

/// A request server the coordinator can run and stop.
#[async_trait]
pub trait ApiServer: Send + Sync {
    fn local_addr(&self) -> SocketAddr;

    /// Serve until stopped. Returns `Ok` after a graceful shutdown.
    async fn serve(&self) -> Result<(), ServeError>;

    /// Stop accepting connections and wait for in-flight requests.
    async fn shutdown(&self);
}

/// Builds request servers bound to a device gateway.
#[async_trait]
pub trait ServerFactory: Send + Sync {
    async fn create(
        &self,
        host: &str,
        config: ApiConfig,
        gateway: Gateway,
    ) -> Result<Arc<dyn ApiServer>, DaemonError>;
}

/// Build the API router for a server bound to `bound`.
#[allow(deprecated)]
pub fn router(bound: SocketAddr, config: ApiConfig, gateway: Gateway) -> Router {
    let csrf = config.enable_csrf.then(|| Arc::new(CsrfStore::default()));
    let allowed = (!config.disable_header_check)
        .then(|| Arc::new(AllowedHosts::new(bound, &config.host_whitelist)));
    let timeout = config.request_timeout;

    let state = AppState {
        gateway: Arc::new(gateway),
        csrf: csrf.clone(),
        config: Arc::new(config),
    };

    let mut api = Router::new()
        .route("/csrf", get(handlers::csrf))
        .route("/version", get(handlers::version))
        .route("/available", get(handlers::available))
        .route("/features", get(handlers::features))
        .route("/generate_addresses", post(handlers::generate_addresses))
        .route("/sign_message", post(handlers::sign_message))
        .route("/check_message_signature", post(handlers::check_message_signature))
        .route("/transaction_sign", post(handlers::transaction_sign))
        .route("/cancel", put(handlers::cancel))
        .route("/wipe", delete(handlers::wipe))
        .with_state(state)
        .layer(TimeoutLayer::new(timeout));

    if let Some(store) = csrf {
        api = api.layer(middleware::from_fn_with_state(store, csrf_check));
    }
    if let Some(allowed) = allowed {
        api = api.layer(middleware::from_fn_with_state(allowed, host_check));
    }

    Router::new()
        .nest("/api/v1", api)
        .layer(middleware::from_fn(track_metrics))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Axum-backed API server.
pub struct HttpServer {
    router: Router,
    listener: Mutex<Option<TcpListener>>,
    local_addr: SocketAddr,
    stop: CancellationToken,
    stopped: CancellationToken,
}

impl HttpServer {
    /// Bind `host` and build the router.
    pub async fn create(host: &str, config: ApiConfig, gateway: Gateway) -> Result<Self, DaemonError> {
        let listener = TcpListener::bind(host).await.map_err(|e| {
            DaemonError::ServerConstruction(format!("listen on {} failed: {}", host, e))
        })?;
        let local_addr = listener.local_addr().map_err(|e| {
            DaemonError::ServerConstruction(format!("local address of {} unavailable: {}", host, e))
        })?;

        tracing::info!(
            address = %local_addr,
            mode = %config.mode,
            csrf = config.enable_csrf,
            header_check = !config.disable_header_check,
            "API server created"
        );

        Ok(Self {
            router: router(local_addr, config, gateway),
            listener: Mutex::new(Some(listener)),
            local_addr,
            stop: CancellationToken::new(),
            stopped: CancellationToken::new(),
        })
    }

    fn take_listener(&self) -> Option<TcpListener> {
        self.listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

#[async_trait]
impl ApiServer for HttpServer {
    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    async fn serve(&self) -> Result<(), ServeError> {
        let listener = match self.take_listener() {
            Some(l) => l,
            None if self.stop.is_cancelled() => return Ok(()),
            None => return Err(ServeError::AlreadyStarted),
        };
        let _stopped = self.stopped.clone().drop_guard();

        tracing::info!(address = %self.local_addr, "API server listening");

        let stop = self.stop.clone();
        axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move { stop.cancelled().await })
            .await?;

        tracing::info!("API server stopped");
        Ok(())
    }

    async fn shutdown(&self) {
        self.stop.cancel();
        if self.take_listener().is_some() {
            tracing::debug!("API server shut down before serving");
            return;
        }
        self.stopped.cancelled().await;
    }
}

/// Factory producing [`HttpServer`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpServerFactory;

#[async_trait]
impl ServerFactory for HttpServerFactory {
    async fn create(
        &self,
        host: &str,
        config: ApiConfig,
        gateway: Gateway,
    ) -> Result<Arc<dyn ApiServer>, DaemonError> {
        let server = HttpServer::create(host, config, gateway).await?;
        Ok(Arc::new(server))
    }
}
