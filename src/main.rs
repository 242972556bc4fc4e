use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use learntrack::{app, config::Config, seed, Backend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cfg = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&cfg.log_filter)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let backend = match cfg.database_url.as_deref() {
        Some(url) => Backend::postgres(url, &cfg).await?,
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            Backend::memory()
        }
    };
    tracing::info!(store = backend.kind, "store ready");

    if let Some(path) = &cfg.seed_catalog {
        let catalog = seed::load(path).await?;
        let report = seed::apply(backend.seeder.as_ref(), catalog).await?;
        tracing::info!(
            courses = report.courses,
            modules = report.modules,
            "catalog seeded"
        );
    }

    let app = app(backend.service, &cfg);

    let addr = cfg.bind_addr();
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
