//! # Support Ratio API Server
//!
//! Serves the support-ratio pipeline of `lib_ratio` as JSON over HTTP.
//!
//! ## Functionality:
//! - **Layered Configuration**: defaults, `server_ratio.conf`, then
//!   environment variables and CLI flags (`RATIO_*`).
//! - **Structured Logging**: console plus daily rotating JSON files.
//! - **Warm Start**: the first load is attempted at startup so that the
//!   initial request does not pay for the download; a failure here is logged
//!   and retried on demand.
//! - **Graceful Shutdown**: in-flight requests are given ten seconds to
//!   finish after a shutdown signal.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio_graceful::Shutdown;
use tracing::{error, info, warn};

use lib_ratio::RatioService;

mod ratio_logic;
use ratio_logic::{config, logger, routes};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load_config();
    let _guard = logger::setup_logging(&config.log_dir(), &config.log_level())?;

    let ratio_config = config.ratio_config()?;
    info!("{}", ratio_config);

    let service = Arc::new(RatioService::from_config(ratio_config)?);

    match service.get_all_countries().await {
        Ok(countries) => info!(countries = countries.len(), "Data warmed up"),
        Err(e) => warn!(error = %e, "Warm-up failed; data will be loaded on first request"),
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port()));
    let listener = TcpListener::bind(addr).await?;
    info!("Starting HTTP server on http://{}", addr);

    let app = routes::router(service);
    let shutdown: Shutdown = Shutdown::default();

    shutdown.spawn_task_fn(move |guard| async move {
        let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
            guard.cancelled().await;
        });
        if let Err(e) = serve.await {
            error!("HTTP server error: {}", e);
        }
    });

    match shutdown.shutdown_with_limit(Duration::from_secs(10)).await {
        Ok(elapsed) => {
            info!(
                "shutdown: gracefully {}s after shutdown signal received",
                elapsed.as_secs_f64()
            );
        }
        Err(e) => {
            info!("shutdown: forcefully due to timeout: {}", e);
        }
    }

    info!("Bye!");
    Ok(())
}
