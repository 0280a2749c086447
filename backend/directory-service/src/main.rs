use actix_cors::Cors;
use actix_middleware::{CorrelationIdMiddleware, JwtAuthMiddleware, MetricsMiddleware};
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use directory_service::config::{Config, StorageBackend};
use directory_service::{configure, AppState};
use doc_store::{DocumentStore, MemoryDocumentStore, PgDocumentStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,directory_service=debug,actix_web=info".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match config.database.backend {
        StorageBackend::Memory => {
            warn!("Using the in-memory document store; data is lost on restart");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
        StorageBackend::Postgres => {
            let url = config
                .database
                .url
                .as_deref()
                .context("database.url is required for the postgres backend")?;

            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(10))
                .idle_timeout(Duration::from_secs(600))
                .max_lifetime(Duration::from_secs(1800))
                .connect(url)
                .await
                .context("Failed to connect to database")?;

            let store = PgDocumentStore::new(pool);
            store
                .run_migrations()
                .await
                .context("Failed to run document store migrations")?;
            info!("Connected to PostgreSQL document store");
            Ok(Arc::new(store))
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::load().context("Failed to load configuration")?;
    info!("Starting directory-service v{}", env!("CARGO_PKG_VERSION"));
    info!(?config, "Configuration loaded");

    let store = connect_store(&config).await?;
    let state = web::Data::new(AppState::new(store, config.pagination));

    let jwt_secret: Arc<str> = Arc::from(config.auth.jwt_secret.as_str());
    let cors_origins = config.cors.origins();
    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting HTTP server at {}", bind_address);

    let mut server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in &cors_origins {
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(JwtAuthMiddleware::new(jwt_secret.clone()))
            .wrap(MetricsMiddleware)
            .wrap(CorrelationIdMiddleware)
            .wrap(TracingLogger::default())
            .wrap(cors)
            .configure(configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?;

    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.run().await?;
    info!("directory-service stopped");
    Ok(())
}
