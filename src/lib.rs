pub mod aggregate;
pub mod config;
pub mod db;
pub mod enrollment;
pub mod error;
pub mod identity;
pub mod memory;
pub mod models;
pub mod progress;
pub mod routes;
pub mod seed;
pub mod service;
pub mod store;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::memory::MemoryStore;
use crate::routes::AppState;
use crate::service::LearningService;
use crate::store::CatalogSeeder;

/// Backend chosen at startup.
pub struct Backend {
    pub service: LearningService,
    pub seeder: Arc<dyn CatalogSeeder>,
    pub kind: &'static str,
}

impl Backend {
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            service: LearningService::new(store.clone(), store.clone()),
            seeder: store,
            kind: "memory",
        }
    }

    pub async fn postgres(url: &str, cfg: &Config) -> anyhow::Result<Self> {
        let pool = db::connect(url, cfg).await?;
        db::migrate(&pool).await?;
        let store = Arc::new(db::PgStore::new(pool));
        Ok(Self {
            service: LearningService::new(store.clone(), store.clone()),
            seeder: store,
            kind: "postgres",
        })
    }
}

pub fn app(service: LearningService, cfg: &Config) -> Router {
    let state = AppState {
        service,
        identity: cfg.identity,
    };
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(routes::router(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)),
        )
}
