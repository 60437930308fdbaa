//! CodeVersus backend entrypoint wiring REST, SSE, and storage layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codeversus_back::{
    config::AppConfig,
    routes,
    services::{
        catalog::{HttpProblemCatalog, ProblemCatalog, StaticCatalog},
        judge_service::{HttpJudgeClient, JudgeClient},
    },
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let http_client = reqwest::Client::new();

    let catalog: Arc<dyn ProblemCatalog> = match env::var("CATALOG_BASE_URL") {
        Ok(base_url) => {
            info!(%base_url, "using HTTP problem catalog");
            Arc::new(HttpProblemCatalog::new(http_client.clone(), base_url))
        }
        Err(_) => {
            info!("no catalog URL configured; using built-in problem set");
            Arc::new(StaticCatalog::builtin())
        }
    };

    let judge_base_url = env::var("JUDGE_API_URL")
        .unwrap_or_else(|_| "https://judge0-ce.p.rapidapi.com".into());
    let judge: Arc<dyn JudgeClient> = Arc::new(HttpJudgeClient::new(
        http_client,
        judge_base_url,
        env::var("JUDGE_API_KEY").ok(),
        env::var("JUDGE_API_HOST").ok(),
    ));

    let app_state = AppState::new(config, catalog, judge);

    spawn_storage(app_state.clone()).await;
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Attach the storage backend: a supervised MongoDB connection, or the
/// in-memory store when the `mongo-store` feature is off.
#[cfg(feature = "mongo-store")]
async fn spawn_storage(state: SharedState) {
    use codeversus_back::dao::contest_store::ContestStore;
    use codeversus_back::dao::contest_store::mongodb::{MongoConfig, MongoContestStore};
    use codeversus_back::dao::storage::StorageError;
    use codeversus_back::services::storage_supervisor;

    let mongo_uri = env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
    let mongo_db = env::var("MONGO_DB").ok();

    tokio::spawn(storage_supervisor::run(state, move || {
        let uri = mongo_uri.clone();
        let db_name = mongo_db.clone();
        async move {
            let config = MongoConfig::from_uri(&uri, db_name.as_deref())
                .await
                .map_err(|err| StorageError::unavailable(err.to_string(), err))?;
            let store = MongoContestStore::connect(config)
                .await
                .map_err(|err| StorageError::unavailable(err.to_string(), err))?;
            Ok(Arc::new(store) as Arc<dyn ContestStore>)
        }
    }));
}

#[cfg(not(feature = "mongo-store"))]
async fn spawn_storage(state: SharedState) {
    use codeversus_back::dao::contest_store::memory::MemoryContestStore;

    info!("mongo-store feature disabled; using in-memory storage");
    state
        .install_contest_store(Arc::new(MemoryContestStore::new()))
        .await;
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
