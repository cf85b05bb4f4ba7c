use std::net::SocketAddr;

use movie_catalog_backend::{api, config::AppConfig, database::Database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();
    let config = AppConfig::from_env();

    // Initialize database
    let database = Database::new(&config.database_url).await?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    if config.enable_seed {
        tracing::info!("Seed endpoint enabled at POST /movies/seed");
    }

    let app = api::router(api::AppState::new(database, config));

    tracing::info!("🚀 Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
