use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use steward_api::config::ServerConfig;
use steward_api::router::build_app_router;
use steward_api::state::AppState;
use steward_healthcheck::{janitor, HealthCheckService, MetricSources};
use steward_metrics::{MySqlTarget, PrometheusClient};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "steward_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Metadata store ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = steward_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    steward_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    steward_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Metric sources ---
    let target = Arc::new(
        MySqlTarget::connect(&config.target_mysql_url)
            .await
            .expect("Failed to connect to monitored MySQL target"),
    );
    tracing::info!("Connected to monitored MySQL target");

    let prometheus = Arc::new(PrometheusClient::new(config.metrics_backend_url.clone()));
    tracing::info!(url = %config.metrics_backend_url, "Metrics backend client created");

    let sources = MetricSources {
        variables: Arc::clone(&target) as _,
        metrics: prometheus,
        slow_queries: target,
    };

    // --- Health-check service ---
    let healthcheck = HealthCheckService::new(pool.clone(), sources)
        .with_fetch_timeout(Duration::from_secs(config.fetch_timeout_secs));

    // --- Janitor (flags operations orphaned by process restarts) ---
    let janitor_cancel = tokio_util::sync::CancellationToken::new();
    let janitor_handle = tokio::spawn(janitor::run(pool.clone(), janitor_cancel.clone()));
    tracing::info!("Janitor started");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        healthcheck: Arc::new(healthcheck),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    janitor_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), janitor_handle).await;
    tracing::info!("Janitor stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
