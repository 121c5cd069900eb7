mod api;
mod catalog;
mod config;
mod db;
mod entities;
mod error;
mod models;
mod resolver;
mod routes;
mod templates;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{catalog::Catalog, config::Config};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,marquee=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let db = db::connect_and_migrate(&config.database_url).await?;
    let state = Arc::new(AppState { catalog: Catalog::new(db) });

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/movies", get(routes::list_movies).post(routes::create_movie))
        .route("/movies/new", get(routes::new_movie))
        .route("/movies/{id}", get(routes::show_movie))
        .route("/movies/{id}/edit", get(routes::edit_movie).post(routes::update_movie))
        .route("/movies/{id}/delete", get(routes::confirm_delete).post(routes::delete_movie))
        .route("/movies/{id}/characters", post(routes::add_character))
        .route("/genres", get(routes::genres).post(routes::create_genre))
        .route("/actors", get(routes::actors).post(routes::create_actor))
        .route("/api/movies", post(api::create_movie))
        .route(
            "/api/movies/{id}",
            get(api::get_movie).put(api::update_movie).delete(api::delete_movie),
        )
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
async fn test_app() -> (tempfile::TempDir, Router, Catalog) {
    let (dir, db) = db::test_db().await;
    let catalog = Catalog::new(db);
    let app = router(Arc::new(AppState { catalog: catalog.clone() }));
    (dir, app, catalog)
}
