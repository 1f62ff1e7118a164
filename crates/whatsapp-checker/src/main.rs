//! WhatsApp number checker - Entry point.

use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use whatsapp_checker::{
    api::{create_router, AppState},
    config::{Config, LogConfig},
    server::{shutdown_signal, Server, ShutdownOutcome, SHUTDOWN_DEADLINE},
    session::{ConnectionManager, TerminalQr},
    AssetBundle,
};
use whatsapp_client::{BridgeClient, Store};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.log);

    info!("Starting WhatsApp number checker");

    let addr = match config.server.socket_addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    // Frontend bundle
    let assets = match AssetBundle::load(&config.frontend.dir).await {
        Ok(assets) => assets,
        Err(e) => {
            error!("Failed to load frontend: {}", e);
            std::process::exit(1);
        }
    };

    // Bridge client backed by the device store
    let store = Store::file(&config.store.path);
    let client = match BridgeClient::new(
        &config.bridge.api_url,
        store,
        config.bridge.request_timeout,
    ) {
        Ok(c) => c.with_pairing_poll_interval(config.bridge.pairing_poll_interval),
        Err(e) => {
            error!("Failed to create bridge client: {}", e);
            std::process::exit(1);
        }
    };

    if client.health_check().await {
        info!("WhatsApp bridge is healthy");
    } else {
        warn!("WhatsApp bridge at {} is not responding", config.bridge.api_url);
    }

    // Pair or reconnect; blocks until the session is live
    let session = Arc::new(ConnectionManager::new(
        Arc::new(client.clone()),
        Arc::new(TerminalQr),
    ));
    if session.establish().await.is_err() {
        std::process::exit(1);
    }

    let monitor = client.spawn_status_monitor(config.bridge.status_interval);

    let app = create_router(AppState::new(session.clone(), assets));

    let server = match Server::bind(addr, app).await {
        Ok(s) => s,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    info!("Server starting on port {}", server.local_addr().port());

    let mut running = server.spawn();

    tokio::select! {
        _ = shutdown_signal() => {}
        e = running.stopped() => {
            error!("HTTP server error: {}", e);
            std::process::exit(1);
        }
    }

    match running.shutdown(SHUTDOWN_DEADLINE).await {
        Ok(ShutdownOutcome::Graceful) => {}
        Ok(ShutdownOutcome::TimedOut) => {
            warn!("HTTP server shutdown error: deadline of {:?} exceeded", SHUTDOWN_DEADLINE)
        }
        Err(e) => error!("HTTP server shutdown error: {}", e),
    }

    monitor.abort();
    session.shutdown().await;
    info!("Server exiting");
}

fn init_logging(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let registry = tracing_subscriber::registry().with(filter);

    if log.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
