pub mod checkpoint;
pub mod clock;
pub mod config;
pub mod database;
pub mod deviation;
pub mod errors;
pub mod handlers;
pub mod leaderboard;
pub mod live;
pub mod models;
pub mod poller;
pub mod projection;
pub mod route;
pub mod snapshot;
pub mod speed_band;
pub mod store;
pub mod timing;

use std::sync::Arc;

use axum::{
    Extension, Router,
    http::{HeaderValue, Method, header},
    routing::{delete, get},
};
use sqlx::PgPool;
use tokio::sync::watch;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
};

use crate::{
    clock::{SharedClock, SystemClock},
    config::AppConfig,
    database::Database,
    handlers::{
        delete_recorded_time, get_athlete_deviations, get_leaderboard, get_live_view,
        health_check, openapi_json, put_recorded_time,
    },
    live::LiveEngine,
    poller::{LiveFeed, Poller},
    store::SharedStore,
};

pub fn create_router(
    store: SharedStore,
    clock: SharedClock,
    engine: LiveEngine,
    feed: Option<LiveFeed>,
) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/openapi.json", get(openapi_json))
        // Live race state
        .route("/races/{id}/live", get(get_live_view))
        .route("/races/{id}/leaderboard", get(get_leaderboard))
        .route(
            "/races/{id}/athletes/{athlete_id}/deviations",
            get(get_athlete_deviations),
        )
        // Timing desk
        .route(
            "/races/{id}/recorded-times",
            axum::routing::put(put_recorded_time),
        )
        .route(
            "/races/{id}/recorded-times/{athlete_id}/{checkpoint_id}",
            delete(delete_recorded_time),
        )
        .layer(Extension(store))
        .layer(Extension(clock))
        .layer(Extension(engine))
        .layer(Extension(feed))
        .layer(cors)
        .layer(CompressionLayer::new())
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
}

pub async fn run_server(pool: PgPool, config: AppConfig) -> anyhow::Result<()> {
    let store: SharedStore = Arc::new(Database::new(pool));
    let clock: SharedClock = Arc::new(SystemClock);
    let engine = LiveEngine::new(config.bands);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut feed = None;
    let poller = config.live_race.map(|race_id| {
        let poller = Poller::new(store.clone(), clock.clone(), engine, race_id);
        feed = Some(poller.feed());
        tokio::spawn(poller.run(config.poll_interval, shutdown_rx))
    });

    let app = create_router(store, clock, engine, feed);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    tracing::info!("Server running on http://0.0.0.0:{}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    shutdown_tx.send_replace(true);
    if let Some(handle) = poller {
        handle.await??;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
