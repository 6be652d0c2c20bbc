use std::path::Path;
use std::sync::Arc;

use todo_api::config::ServerConfig;
use todo_api::store::{LibSqlBackend, TodoStore};
use todo_api::todos::routes::todo_routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env();

    let store: Arc<dyn TodoStore> =
        Arc::new(LibSqlBackend::new_local(Path::new(&config.db_path)).await?);

    let app = todo_routes(store);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, db = %config.db_path, "Todo API listening");
    axum::serve(listener, app).await?;

    Ok(())
}
