use std::{net::SocketAddr, time::Duration};

use migration::{Migrator, MigratorTrait};
use sea_orm::ConnectOptions;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "roomledger={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let server_settings = settings.server;
    tracing::info!("Found server settings...");
    let db = match connect_database(&server_settings).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!("failed to initialize database: {err}");
            return Err(err);
        }
    };

    let mut builder = engine::Engine::builder().database(db);
    if let Some(ms) = server_settings.tx_timeout_ms {
        builder = builder.tx_timeout(Duration::from_millis(ms));
    }
    let engine = match builder.build().await {
        Ok(engine) => engine,
        Err(err) => {
            tracing::error!("failed to build engine from database: {err}");
            return Err(err.into());
        }
    };

    tracing::info!(tx_timeout = ?engine.tx_timeout(), "engine ready");

    let bind = server_settings
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr: SocketAddr = format!("{}:{}", bind, server_settings.port).parse()?;
    server::run(engine, addr).await;

    Ok(())
}

async fn connect_database(
    config: &settings::Server,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let mut options = ConnectOptions::new(config.database.url());
    if let Some(max) = config.max_connections {
        options.max_connections(max);
    }
    // Every pooled connection to `sqlite::memory:` opens its own database.
    if let settings::Database::Memory = config.database {
        options.max_connections(1);
    }
    options.sqlx_logging(false);

    let database = sea_orm::Database::connect(options).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
