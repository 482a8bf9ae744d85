//! Sharq > Gharb binary entrypoint wiring REST, SSE, the question provider and the identity store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sharq_gharb_back::{
    config::AppConfig,
    dao::{
        identity::FileIdentityStore,
        image::HttpImageWarmer,
        provider::{GeminiProvider, ProviderConfig},
    },
    routes,
    services::{auth_service, question_service::QuestionPipeline},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();

    let provider = GeminiProvider::new(ProviderConfig::from_env())
        .context("building question provider client")?;
    if !provider.has_credentials() {
        warn!("API_KEY is not set; rounds will use the fallback questions");
    }
    let warmer = HttpImageWarmer::new().context("building image warm-up client")?;
    let questions = QuestionPipeline::new(Arc::new(provider), Arc::new(warmer), &config);
    let identity = Arc::new(FileIdentityStore::new(config.identity_path.clone()));

    let app_state = AppState::new(config, questions, identity);
    auth_service::restore_session(&app_state).await;

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

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
