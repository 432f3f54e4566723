//! Server mode
//!
//! Starts the HTTP server: attribution middleware on every route, the capture
//! endpoint, health check and a not-found fallback.

use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Compress, web};
use anyhow::Result;
use tracing::warn;

use crate::api::middleware::AttributionMiddleware;
use crate::api::services::{AppStartTime, capture_routes, fallback, health_routes};
use crate::config::StaticConfig;
use crate::runtime::lifetime;

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function.
/// actix-web handles SIGINT/SIGTERM and drains in-flight requests itself.
pub async fn run_server(config: Arc<StaticConfig>) -> Result<()> {
    let app_start_time = AppStartTime::now();

    let startup = lifetime::startup::prepare_components(&config.attribution).map_err(|e| {
        tracing::error!("Server startup failed: {}", e);
        e
    })?;

    let resolver = startup.resolver.clone();
    let sessions = startup.sessions.clone();
    let capture_path = config.attribution.capture_path.clone();

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(AttributionMiddleware::new(resolver.clone()))
            .wrap(Compress::default())
            .app_data(web::Data::new(resolver.clone()))
            .app_data(web::Data::new(sessions.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .app_data(web::JsonConfig::default().limit(16 * 1024))
            .service(health_routes())
            .service(capture_routes(&capture_path))
            .default_service(web::to(fallback::not_found))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    .workers(cpu_count);

    warn!("Starting server at http://{}", bind_address);
    server.bind(bind_address)?.run().await?;

    warn!("Server stopped");
    Ok(())
}
