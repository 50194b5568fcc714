use std::sync::Arc;

use pit_strategy::env_config;
use pit_strategy::history::HistoryStore;
use pit_strategy::predictions::PredictionSource;
use pit_strategy::server::{create_router, AppContext};
use pit_strategy::storage::load_prediction_table;

#[tokio::main]
async fn main() {
    env_config::init_tracing();
    let _base = env_config::init_base_path();
    env_config::init_rayon_threads();
    let port = env_config::server_port();

    let policy = match env_config::search_policy_from_env() {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "invalid search policy");
            std::process::exit(1);
        }
    };
    let search_timeout = env_config::search_timeout();
    tracing::info!(?policy, ?search_timeout, "search policy");

    // Predictions are optional: without them only POST /api/strategy works.
    let predictions: Option<Arc<dyn PredictionSource>> =
        match load_prediction_table(env_config::predictions_path()) {
            Ok(table) => {
                tracing::info!(circuits = ?table.circuits(), "GET /api/strategy available");
                Some(Arc::new(table))
            }
            Err(e) => {
                tracing::warn!(error = %e, "no prediction table, GET /api/strategy disabled");
                None
            }
        };

    let history = match HistoryStore::open(env_config::history_path()) {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!(error = %e, "history file unreadable, starting in memory");
            HistoryStore::in_memory()
        }
    };

    let ctx = Arc::new(AppContext {
        policy,
        search_timeout,
        predictions,
        history,
    });
    let app = create_router(ctx);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(port, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!(port, "server running, press Ctrl+C to stop");
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("stopping server");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install CTRL+C signal handler");
        std::future::pending::<()>().await;
    }
}
