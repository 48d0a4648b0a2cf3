//! Server binary entry point.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sleuth_api::{create_router, metrics, ApiConfig, AppState};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::from_env();
    info!(
        host = %config.host,
        port = config.port,
        detector = %config.detector_url,
        matcher = %config.matcher_url,
        "sleuth-api starting"
    );

    let state = match AppState::new(config.clone()) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Could not construct inference clients");
            std::process::exit(1);
        }
    };

    let app = create_router(state, prometheus_handle());

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(error = %e, "Bad bind address");
            std::process::exit(1);
        }
    };

    if let Err(e) = serve_until_shutdown(addr, app).await {
        error!(error = %e, "Server exited with an error");
        std::process::exit(1);
    }
    info!("Shutdown complete");
}

/// `RUST_LOG` controls the filter; `LOG_FORMAT=json` switches off the
/// human-readable output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Prometheus is on unless `METRICS_ENABLED` explicitly turns it off.
fn prometheus_handle() -> Option<PrometheusHandle> {
    let disabled = std::env::var("METRICS_ENABLED").is_ok_and(|v| v == "false" || v == "0");
    if disabled {
        return None;
    }
    info!("Serving Prometheus metrics at /metrics");
    Some(metrics::init_metrics())
}

async fn serve_until_shutdown(addr: SocketAddr, app: axum::Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Accepting connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, draining in-flight requests");
            }
        })
        .await
}
