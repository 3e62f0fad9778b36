use std::process::ExitCode;
use std::sync::Arc;
use tatame_access::{AccessGate, LoginThrottle};
use tatame_backend::{BackendClient, BackendRoleStore, BackendSessionStore};
use tatame_server::{app, auth::AppState, config::ServerConfig};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    let policy = match config.gate.policy() {
        Ok(policy) => policy,
        Err(e) => {
            tracing::error!(error = %e, "invalid gate configuration");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        protected_prefix = policy.protected_prefix(),
        login_path = policy.login_location(),
        "Loaded configuration"
    );

    let backend = match BackendClient::new(&config.backend) {
        Ok(client) => client,
        Err(report) => {
            tracing::error!(error = %report, "failed to create backend client");
            return ExitCode::FAILURE;
        }
    };

    let sessions = BackendSessionStore::from_config(
        backend.clone(),
        &config.backend,
        config.session.cookie_options(),
    );
    let roles = BackendRoleStore::new(backend.clone());
    let gate = AccessGate::new(
        Arc::new(sessions),
        Arc::new(roles),
        policy,
        config.gate.call_timeout(),
    );
    let throttle = LoginThrottle::new(config.throttle);
    let state = Arc::new(AppState::new(gate, throttle, backend));

    let listener = match TcpListener::bind(&config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr = %config.listen_addr, "failed to bind listener");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("listening on http://{}", config.listen_addr);

    if let Err(e) = axum::serve(listener, app::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutting down");
}
