use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use employee_directory::config::{AppConfig, Config, LogFormat};
use employee_directory::employees::{self, DocumentEmployeeRepository, EmployeeRepository, EmployeeService};
use employee_directory::health;
use employee_directory::middleware::{json_error_handler, RequestId};
use employee_directory::store::DocumentStoreAdapter;

fn init_tracing(app: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("employee_directory={},actix_web=info", app.log_level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match app.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    init_tracing(&config.app);

    tracing::info!("Starting Employee Directory Service");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    // Connect to the document store and bind the employee collection
    let store = config
        .store
        .create_store()
        .context("Failed to create document store client")?;
    let adapter = Arc::new(DocumentStoreAdapter::new(store));
    let collection = adapter
        .initialize(
            &config.store.database_name,
            &config.store.collection_name,
            &config.store.partition_key_path,
        )
        .await
        .context("Failed to initialize document store")?;

    tracing::info!(
        "Document store ready ({:?} backend, collection {})",
        config.store.backend,
        collection.link().resource_link()
    );

    let repository: Arc<dyn EmployeeRepository> = Arc::new(
        DocumentEmployeeRepository::new(collection)
            .context("Document store collection does not fit employee records")?,
    );
    let service = Arc::new(EmployeeService::new(repository));

    // Start HTTP server
    let bind_address = config.server.bind_address();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestId)
            .wrap(TracingLogger::default())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::Data::new(service.clone()))
            .app_data(web::Data::new(adapter.clone()))
            .configure(health::configure)
            .configure(employees::configure)
    })
    .workers(config.server.workers)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await.context("HTTP server terminated with an error")
}
