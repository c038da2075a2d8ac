pub mod api;
pub mod cli;
pub mod config;
pub mod metrics;
pub mod tracing;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use ::tracing::{error, info};
use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio::signal::unix::{signal, SignalKind};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::api::{
    api_error::error_body,
    handlers::{mutate_handler, readiness_handler, validate_handler},
    state::ApiServerState,
    MUTATION_PATH, READINESS_PATH, VALIDATION_PATH,
};
use crate::config::Config;

/// In-flight requests are given this much time to complete once a shutdown
/// signal is received.
const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct AdmissionServer {
    router: Router,
    addr: SocketAddr,
    tls_config: Option<RustlsConfig>,
}

impl AdmissionServer {
    pub async fn new_from_config(config: Config) -> Result<Self> {
        let tls_config = match &config.tls_config {
            Some(tls_config) => Some(
                RustlsConfig::from_pem_file(&tls_config.cert_file, &tls_config.key_file).await?,
            ),
            None => None,
        };

        let state = Arc::new(ApiServerState {
            metrics_enabled: config.metrics_enabled,
        });

        let router = Router::new()
            .route(VALIDATION_PATH, post(validate_handler))
            .route(MUTATION_PATH, post(mutate_handler))
            .route(READINESS_PATH, get(readiness_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.max_request_body_bytes))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                config.request_timeout,
            ))
            .layer(middleware::map_response(error_body))
            .layer(TraceLayer::new_for_http());

        Ok(Self {
            router,
            addr: config.addr,
            tls_config,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn run(self) -> Result<()> {
        let handle = Handle::new();
        tokio::spawn(shutdown_on_signal(handle.clone()));

        info!(
            address = %self.addr,
            tls = self.tls_config.is_some(),
            "started admission server"
        );
        match self.tls_config {
            Some(tls_config) => {
                axum_server::bind_rustls(self.addr, tls_config)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?
            }
            None => {
                axum_server::bind(self.addr)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?
            }
        };
        info!("admission server stopped");

        Ok(())
    }
}

async fn shutdown_on_signal(handle: Handle) {
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "cannot install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = terminate => {},
    }

    info!("shutdown signal received, draining in-flight requests");
    handle.graceful_shutdown(Some(GRACEFUL_SHUTDOWN_TIMEOUT));
}
