//! Server entry point

use std::net::SocketAddr;

use leadcall_config::{load_settings, Settings};
use leadcall_server::{create_router, AppState};
use leadcall_store::{PoolSettings, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Tracing is not up yet, so early config problems go to stderr.
    let settings = match load_settings(None) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Warning: failed to load config: {err}. Using defaults.");
            Settings::default()
        }
    };

    init_tracing();
    tracing::info!("Starting leadcall server v{}", env!("CARGO_PKG_VERSION"));

    let store = Store::open(
        &settings.database.path,
        PoolSettings {
            busy_timeout_ms: settings.database.busy_timeout_ms,
            pool_max_size: settings.database.pool_max_size,
        },
    )?;

    let state = AppState::from_settings(settings.clone(), store);
    tracing::info!(
        test_mode = settings.test_mode,
        telephony = settings.twilio.is_configured(),
        oracle = settings.llm.is_configured(),
        speech = settings.speech.is_configured(),
        crm = settings.zoho.is_configured(),
        scrape = settings.scrape.is_configured(),
        "application state initialized"
    );

    if settings.sweep.enabled {
        tokio::spawn(leadcall_server::sweep::run(state.clone()));
        tracing::info!(
            interval_secs = settings.sweep.interval_secs,
            batch_size = settings.sweep.batch_size,
            "follow-up sweep scheduled"
        );
    } else {
        tracing::info!("follow-up sweep disabled");
    }

    let app = create_router(state);
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
