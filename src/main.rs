mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod mail;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use db::{cache::FeedCache, DBClient, Store};
use dotenv::dotenv;
use middleware::rate_limit::{login_rate_limiter, RateLimiter};
use models::reportmodel::{CrimeReport, RoadReport};
use routes::create_router;
use service::{
    geocoding::{NominatimGeocoder, ReverseGeocoder},
    pagination::PagerRegistry,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<dyn Store>,
    pub cache: Option<Arc<dyn FeedCache>>,
    pub geocoder: Arc<dyn ReverseGeocoder>,
    pub crime_pagers: Arc<PagerRegistry<CrimeReport>>,
    pub road_pagers: Arc<PagerRegistry<RoadReport>>,
    pub login_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(
        env: Config,
        db_client: Arc<dyn Store>,
        cache: Option<Arc<dyn FeedCache>>,
        geocoder: Arc<dyn ReverseGeocoder>,
    ) -> Self {
        let page_size = env.dashboard_page_size;
        let idle_ttl = Duration::from_secs(env.dashboard_idle_secs);
        let login_limiter = Arc::new(login_rate_limiter(env.login_rate_limit));

        AppState {
            crime_pagers: Arc::new(PagerRegistry::new(db_client.clone(), page_size, idle_ttl)),
            road_pagers: Arc::new(PagerRegistry::new(db_client.clone(), page_size, idle_ttl)),
            env,
            db_client,
            cache,
            geocoder,
            login_limiter,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    dotenv().ok();

    let config = match Config::init() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    let pool = match PgPoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("Connected to the database");
            pool
        }
        Err(err) => {
            tracing::error!("Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::error!("Failed to run migrations: {}", err);
        std::process::exit(1);
    }

    let db_client = match &config.redis_url {
        Some(redis_url) => DBClient::with_redis(pool, redis_url).await,
        None => {
            tracing::info!("REDIS_URL not set, map feeds are served without a cache");
            DBClient::new(pool)
        }
    };
    tracing::info!("Cache status: {}", db_client.cache_status());
    let cache = db_client
        .redis_client
        .clone()
        .map(|redis| -> Arc<dyn FeedCache> { redis });

    let geocoder = match NominatimGeocoder::new(
        config.geocoder_url.clone(),
        &config.geocoder_user_agent,
    ) {
        Ok(geocoder) => geocoder,
        Err(err) => {
            tracing::error!("Failed to build the geocoding client: {}", err);
            std::process::exit(1);
        }
    };

    let allowed_origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    let port = config.port;
    let app_state = Arc::new(AppState::new(
        config,
        Arc::new(db_client),
        cache,
        Arc::new(geocoder),
    ));

    tokio::spawn(service::background_jobs::start_dashboard_sweep_job(
        app_state.clone(),
    ));

    let app = create_router(app_state).layer(cors);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind port {}: {}", port, err);
            std::process::exit(1);
        }
    };

    tracing::info!("Server is running on http://localhost:{}", port);

    if let Err(err) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!("Server stopped: {}", err);
    }
}
