use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use noteverse::api::router;
use noteverse::blobs::{BlobStore, EmbeddedBlobStore, HttpBlobStore};
use noteverse::clock::SystemClock;
use noteverse::config::AppConfig;
use noteverse::notify::ChangeNotifier;
use noteverse::repository::ContentRepository;
use noteverse::state::AppState;
use noteverse::store::SqliteStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "noteverse=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = SqliteStore::migrate(pool).await?;

    let blobs: Arc<dyn BlobStore> = match config.blobs.clone() {
        Some(blob_config) => {
            info!("uploading PDFs to {}", blob_config.endpoint);
            Arc::new(HttpBlobStore::new(blob_config)?)
        }
        None => {
            info!("no blob endpoint configured, embedding PDFs as data URLs");
            Arc::new(EmbeddedBlobStore)
        }
    };

    let repo = ContentRepository::new(
        Arc::new(store),
        ChangeNotifier::new(config.notify_capacity),
        blobs,
        Arc::new(SystemClock),
    );

    let app = router(AppState { repo });

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
