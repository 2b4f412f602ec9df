use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};
use todo_api::{
    application::todo_service::TodoServiceImpl,
    config::{self, Config, StoreBackend},
    domain::repository::TodoStore,
    http::{routes::{system::ServiceInfo, todos}, routing},
    infrastructure::{dynamo_store::DynamoTodoStore, memory_store::MemoryTodoStore, sqlite_store::SqliteTodoStore},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let aws = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config::bootstrap_region()))
        .load()
        .await;
    let config = Config::load(&aws).await?;

    let store: Arc<dyn TodoStore> = match config.store_backend {
        StoreBackend::DynamoDb => Arc::new(DynamoTodoStore::new(aws_sdk_dynamodb::Client::new(&aws), &config.table_name)),
        StoreBackend::Sqlite => Arc::new(SqliteTodoStore::connect(&config.database_url).await?),
        StoreBackend::Memory => Arc::new(MemoryTodoStore::new()),
    };
    store.init().await?;

    let info = Arc::new(ServiceInfo::from_config(&config));
    let service = TodoServiceImpl::from_arc(store);
    let router = routing::api(todos::AppState { service, info });

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        %addr,
        environment = %config.environment,
        backend = %config.store_backend,
        table = %config.table_name,
        secrets_enabled = config.secrets_enabled,
        "listening"
    );
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let json = std::env::var("LOG_FORMAT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false);
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
}
