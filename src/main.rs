use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use bookstore_api::{
    config::Config,
    db::{create_pool, run_migrations, PgBookStore},
    routes::{create_router, AppState},
    services::{HttpScorer, IndexMap, RecommendationService},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bookstore_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let db_pool = create_pool(&config.database_url, config.database_max_connections).await?;
    if config.run_migrations {
        run_migrations(&db_pool).await?;
    }

    // Loaded before serving; a missing file only disables personalization
    let index_map = Arc::new(IndexMap::load(&config.index_map_path));

    let scorer = HttpScorer::new(
        config.scorer_url.clone(),
        Duration::from_millis(config.scorer_timeout_ms),
    )?;

    let recommendations = RecommendationService::new(
        Arc::new(PgBookStore::new(db_pool)),
        Arc::new(scorer),
        index_map,
    );

    let app = create_router(Arc::new(AppState { recommendations }));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, scorer_url = %config.scorer_url, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
