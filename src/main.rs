use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use crate::api::imports::{
    AppState, apply_event, complete_import, create_import, get_import, get_suggestions,
    register_exercise, search_exercises,
};
use crate::clients::gemini::GeminiClient;
use crate::clients::library::LibraryClient;
use crate::config::Config;

mod api;
mod clients;
mod config;
mod error;
mod models;
mod scheduler;
mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    let library_client = LibraryClient::new(&config)?;
    let gemini_client = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
    );

    let state = AppState::new(config.clone(), library_client, gemini_client);

    if let Err(e) = scheduler::refresh_library(&state).await {
        tracing::error!(error = %e, "library.initial_refresh_failed");
    }
    let _scheduler = scheduler::start_scheduler(state.clone()).await?;

    let app = Router::new()
        .route("/", get(|| async { "OK" }))
        .route("/imports", post(create_import))
        .route("/imports/{id}", get(get_import))
        .route("/imports/{id}/suggestions", get(get_suggestions))
        .route("/imports/{id}/events", post(apply_event))
        .route("/imports/{id}/exercises", post(register_exercise))
        .route("/imports/{id}/complete", post(complete_import))
        .route("/exercises/search", get(search_exercises))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = %config.port, "server.listening");
    axum::serve(listener, app).await?;
    Ok(())
}
