//! # API REST
//!
//! REST API implementation for filedrop.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI documentation
//! - REST-specific concerns (multipart parsing, content negotiation, CORS)
//!
//! Uses `api-shared` for the JSON bodies and `filedrop-core` for everything storage related.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod handlers;
pub mod page;

pub use error::ApiError;

use axum::{
    extract::DefaultBodyLimit,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use filedrop_core::FileService;
use handlers::{delete_file, download_file, file_info, health, index, list_files, upload};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

/// Application state for the REST API server
///
/// Shared by every handler. The service is internally synchronised, so the state is cheap to
/// clone per request.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FileService>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(service: FileService, max_upload_bytes: usize) -> Self {
        Self {
            service: Arc::new(service),
            max_upload_bytes,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::index,
        handlers::health,
        handlers::upload,
        handlers::list_files,
        handlers::download_file,
        handlers::file_info,
        handlers::delete_file,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::FileMetadataRes,
        api_shared::UploadRes,
        api_shared::FileSummary,
        api_shared::MessageRes,
        api_shared::ErrorRes,
    ))
)]
pub struct ApiDoc;

/// Path the OpenAPI document is served from.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Builds the full HTTP router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/list", get(list_files))
        .route("/files/:filename", get(download_file))
        .route("/files/info/:filename", get(file_info))
        .route("/delete/:filename", delete(delete_file))
        .route(OPENAPI_PATH, get(openapi))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
