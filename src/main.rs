use anyhow::{bail, Context, Result};
use axum::serve;
use sheet_server::core::config::Config;
use sheet_server::core::startup::{
    prepare_database, spawn_selection_cleanup, spawn_session_cleanup,
};
use sheet_server::core::state::AppState;
use sheet_server::security::gate::AuthStrategy;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::{TcpListener, UnixListener};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, Level};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let config_path = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        PathBuf::from("config.toml")
    };

    // Load and validate configuration
    let config = Config::load(&config_path).context(format!(
        "Failed to load configuration from '{}'. \
        Set JWT_SECRET (or SESSION_SECRET with AUTH_STRATEGY=session) or provide a config file.",
        config_path.display()
    ))?;

    sheet_server::core::tracing_init::init_tracing(&config.logging)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.num_threads)
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(async_main(config, config_path))
}

async fn async_main(config: Config, config_path: PathBuf) -> Result<()> {
    info!(
        config_path = %config_path.display(),
        port = ?config.server.port,
        unix_socket = ?config.server.unix_socket,
        num_threads = config.server.num_threads,
        auth_strategy = ?config.auth.strategy,
        connect_mode = ?config.store.connect_mode,
        log_level = %config.logging.level,
        log_format = %config.logging.format,
        "Sheet server starting"
    );

    let state = AppState::new(config.clone());

    // Eager mode: a store that cannot be opened stops the process here
    prepare_database(&state).await?;

    if config.auth.strategy == AuthStrategy::Session {
        spawn_session_cleanup(
            Arc::clone(&state.sessions),
            config.auth.session_cleanup_interval,
        );

        info!(
            cleanup_interval_seconds = config.auth.session_cleanup_interval,
            session_ttl_seconds = config.auth.session_ttl,
            "Session cleanup task started"
        );
    }

    spawn_selection_cleanup(
        Arc::clone(&state.active_collections),
        config.sheets.selection_cleanup_interval,
        config.sheets.selection_idle_ttl,
    );

    info!(
        cleanup_interval_seconds = config.sheets.selection_cleanup_interval,
        idle_ttl_seconds = config.sheets.selection_idle_ttl,
        "Selection cleanup task started"
    );

    let app = sheet_server::core::routes::build_router(Arc::new(state)).layer(
        ServiceBuilder::new().layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        ),
    );

    let tcp_handle = if let Some(port) = config.server.port {
        let addr = format!("0.0.0.0:{}", port);
        info!(address = %addr, "Starting TCP listener");

        let listener = TcpListener::bind(&addr)
            .await
            .context(format!("Failed to bind TCP listener to {}", addr))?;

        info!(address = %addr, "TCP listener bound successfully");

        let app_clone = app.clone();
        Some(tokio::spawn(async move {
            serve(
                listener,
                app_clone.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("TCP server error")
        }))
    } else {
        None
    };

    let unix_handle = if let Some(unix_socket) = &config.server.unix_socket {
        info!(path = %unix_socket.display(), "Starting Unix socket listener");

        // Remove a stale socket file left by a previous run
        if unix_socket.exists() {
            std::fs::remove_file(unix_socket).context(format!(
                "Failed to remove existing Unix socket: {}",
                unix_socket.display()
            ))?;
        }

        let listener = UnixListener::bind(unix_socket).context(format!(
            "Failed to bind Unix socket listener to {}",
            unix_socket.display()
        ))?;

        info!(path = %unix_socket.display(), "Unix socket listener bound successfully");

        Some(tokio::spawn(async move {
            serve(listener, app.into_make_service())
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("Unix socket server error")
        }))
    } else {
        None
    };

    info!("HTTP server(s) started, waiting for shutdown signal");

    match (tcp_handle, unix_handle) {
        (Some(tcp), Some(unix)) => {
            tokio::select! {
                result = tcp => report_server_exit("TCP", result),
                result = unix => report_server_exit("Unix socket", result),
            }
        }
        (Some(tcp), None) => report_server_exit("TCP", tcp.await),
        (None, Some(unix)) => report_server_exit("Unix socket", unix.await),
        (None, None) => {
            error!("No listeners configured");
            bail!("No listeners configured");
        }
    }

    info!("Shutting down gracefully");

    Ok(())
}

fn report_server_exit(listener: &str, result: Result<Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(listener = listener, error = %e, "Server stopped with an error"),
        Err(e) => error!(listener = listener, error = %e, "Server task panicked or was cancelled"),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
