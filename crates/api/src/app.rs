use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{device_locations, floorplans, health, locations, media};
use crate::services::storage::{ImageStorage, LocalImageStorage};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub storage: Arc<dyn ImageStorage>,
}

/// Builds the router with images stored under `config.storage.media_root`.
pub fn create_app(config: Config, pool: PgPool) -> Router {
    let storage = LocalImageStorage::new(
        config.storage.media_root.clone(),
        &config.storage.media_url,
    );
    create_app_with_storage(config, pool, Arc::new(storage))
}

pub fn create_app_with_storage(
    config: Config,
    pool: PgPool,
    storage: Arc<dyn ImageStorage>,
) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        pool,
        config: config.clone(),
        storage,
    };

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let api_routes = Router::new()
        .route(
            "/api/v1/locations",
            get(locations::list_locations).post(locations::create_location),
        )
        .route(
            "/api/v1/locations/:location_id",
            get(locations::get_location)
                .put(locations::update_location)
                .delete(locations::delete_location),
        )
        .route(
            "/api/v1/locations/:location_id/json",
            get(locations::location_json),
        )
        .route(
            "/api/v1/locations/:location_id/floorplans/json",
            get(floorplans::location_floorplans_json),
        )
        .route(
            "/api/v1/floorplans",
            get(floorplans::list_floorplans).post(floorplans::create_floorplan),
        )
        .route(
            "/api/v1/floorplans/:floorplan_id",
            get(floorplans::get_floorplan)
                .put(floorplans::update_floorplan)
                .delete(floorplans::delete_floorplan),
        )
        .route(
            "/api/v1/devices/:device_id/location",
            get(device_locations::get_device_location)
                .put(device_locations::save_device_location)
                .delete(device_locations::delete_device_location),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route("/media/*path", get(media::serve_media));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (bottom layers run first)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
