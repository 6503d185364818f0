//! Server mode

use actix_web::{HttpServer, web};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::api::create_app;
use crate::api::services::admin::{login_rate_limit, login_rate_limiter};
use crate::runtime::shutdown;
use crate::runtime::startup::prepare_server_startup;

pub async fn run_server(config_path: Option<&str>) -> Result<()> {
    let startup = prepare_server_startup(config_path).await?;
    let _log_guard = startup.log_guard;
    let state = startup.state;
    let config = state.config.clone();

    // 限流配置只构建一次，所有 worker 共享计数器
    let limiter = Arc::new(
        login_rate_limit(&config.login_limit, &config.server.trusted_proxies)
            .context("Failed to build login rate limiter")?,
    );
    if config.server.trusted_proxies.is_empty() {
        warn!(
            "Client IP: auto-detect mode. Connections from private IPs will use forwarded headers. \
             Configure server.trusted_proxies to restrict this."
        );
    } else {
        info!(
            "Client IP: trusted proxies configured: {:?}",
            config.server.trusted_proxies
        );
    }
    if config.server.enable_debug_routes {
        warn!("Debug routes enabled at /debug (admin login required)");
    }

    let data = web::Data::new(state);
    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    let server = HttpServer::new(move || create_app(data.clone(), login_rate_limiter(&limiter)))
        .keep_alive(Duration::from_secs(30))
        .client_request_timeout(Duration::from_secs(10))
        .workers(config.server.workers)
        .disable_signals()
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();

    warn!("Starting server at http://{}", bind_address);
    let handle = server.handle();

    tokio::select! {
        res = server => {
            res.context("HTTP server error")?;
        }
        _ = shutdown::wait_for_signal() => {
            handle.stop(true).await;
        }
    }

    shutdown::close_database(startup.db).await;
    warn!("Graceful shutdown completed");

    Ok(())
}
