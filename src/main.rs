use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, OPENAPI_PATH};
use filedrop_core::{CoreConfig, DEFAULT_REST_ADDR, FileService};

/// Main entry point for the filedrop server
///
/// Resolves configuration once, opens the storage root and serves the REST API until
/// interrupted.
///
/// # Environment Variables
/// - `FILEDROP_REST_ADDR`: Server address (default: "0.0.0.0:5000")
/// - `FILEDROP_STORAGE_DIR`: Storage root (default: "storage")
/// - `FILEDROP_METADATA_FILE`: Metadata document (default: "metadata.json")
/// - `FILEDROP_MAX_UPLOAD_BYTES`: Request body limit in bytes (default: 100 MiB)
///
/// # Errors
/// Returns an error if:
/// - the logging configuration cannot be initialised,
/// - the configuration is invalid or the storage root cannot be created,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("filedrop_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("filedrop_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = CoreConfig::from_env_values(
        std::env::var("FILEDROP_STORAGE_DIR").ok(),
        std::env::var("FILEDROP_METADATA_FILE").ok(),
        std::env::var("FILEDROP_MAX_UPLOAD_BYTES").ok(),
    )?;
    let rest_addr = std::env::var("FILEDROP_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    let service = FileService::new(&cfg)?;
    tracing::info!(
        storage = %service.storage_root().display(),
        metadata = %service.metadata_path().display(),
        "storage ready"
    );

    let app = api_rest::router(AppState::new(service, cfg.max_upload_bytes()));

    tracing::info!("++ Starting filedrop REST on {}", rest_addr);
    tracing::info!("++ OpenAPI document at {}", OPENAPI_PATH);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("filedrop stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {:?}", e);
        std::future::pending::<()>().await;
    }
}
