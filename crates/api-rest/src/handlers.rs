//! HTTP handlers.
//!
//! Handlers validate the request shape, hand the storage work to [`FileService`] on the
//! blocking pool and turn the result into a response.

use crate::error::ApiError;
use crate::page;
use crate::AppState;
use api_shared::{FileMetadataRes, FileSummary, HealthRes, HealthService, MessageRes, UploadRes};
use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Multipart, Path as AxumPath, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use filedrop_core::{CoreError, FileRecord, FileService};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

/// Multipart field carrying the upload.
pub const FILE_FIELD: &str = "file";

/// Leading bytes read to detect a download's media type.
const SNIFF_LEN: usize = 8192;

/// RFC 5987 `attr-char` minus alphanumerics: everything else is percent-encoded.
const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

#[derive(Debug, Default, serde::Deserialize)]
pub struct UploadQuery {
    format: Option<String>,
}

/// Runs blocking storage work off the async executor.
async fn blocking<T, F>(service: &Arc<FileService>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&FileService) -> filedrop_core::CoreResult<T> + Send + 'static,
{
    let service = Arc::clone(service);
    Ok(tokio::task::spawn_blocking(move || f(&service)).await??)
}

pub(crate) fn metadata_res(record: FileRecord) -> FileMetadataRes {
    FileMetadataRes {
        original_name: record.original_name,
        size: record.size,
        size_formatted: record.size_formatted,
        upload_date: record.upload_date,
        path: record.path,
        date_folder: record.date_folder,
    }
}

/// Whether the client asked for a JSON upload response.
fn wants_json(headers: &HeaderMap, query: &UploadQuery) -> bool {
    if query.format.as_deref() == Some("json") {
        return true;
    }
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| {
            accept
                .split(',')
                .any(|part| part.trim().starts_with("application/json"))
        })
        .unwrap_or(false)
}

/// `Content-Disposition` naming `original_name`, with an ASCII fallback and a UTF-8 form.
pub(crate) fn attachment_disposition(original_name: &str) -> String {
    let fallback: String = original_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    let encoded = utf8_percent_encode(original_name, FILENAME_ENCODE_SET);
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Upload page", body = String, content_type = "text/html")
    )
)]
/// Serves the upload page.
#[axum::debug_handler]
pub async fn index() -> Result<Html<String>, ApiError> {
    Ok(Html(page::render(None)?))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
pub async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/upload",
    params(
        ("format" = Option<String>, Query, description = "`json` forces a JSON response")
    ),
    responses(
        (status = 201, description = "File stored", body = UploadRes),
        (status = 400, description = "Missing file, empty filename, disallowed or unsafe name", body = api_shared::ErrorRes),
        (status = 409, description = "No free stored name", body = api_shared::ErrorRes),
        (status = 500, description = "Internal server error", body = api_shared::ErrorRes)
    )
)]
/// Upload a file
///
/// Expects `multipart/form-data` with a `file` field. The stored record is returned as JSON
/// when the client sends `Accept: application/json` or `?format=json`; otherwise the upload
/// page is returned with a confirmation banner.
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - the request is not multipart or has no `file` part,
/// - the filename is empty,
/// - the extension is not allowed or the name is unsafe.
#[axum::debug_handler]
pub async fn upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::warn!("Upload without multipart body: {}", e);
        ApiError::BadRequest("No file part".into())
    })?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Multipart read error: {}", e);
        ApiError::BadRequest(format!("Invalid multipart body: {}", e))
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // Without a filename parameter the part is a plain form value, not a file.
        // Browsers send an empty filename when nothing was picked.
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let bytes = field.bytes().await.map_err(|e| {
            tracing::warn!("Upload read error: {}", e);
            ApiError::BadRequest(format!("Invalid multipart body: {}", e))
        })?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| ApiError::BadRequest("No file part".into()))?;
    let uploaded = blocking(&state.service, move |service| {
        service.upload(&file_name, &bytes)
    })
    .await?;

    let filename = uploaded.filename.into_string();
    if wants_json(&headers, &query) {
        let body = UploadRes {
            message: "File uploaded successfully".into(),
            filename,
            metadata: metadata_res(uploaded.record),
        };
        Ok((StatusCode::CREATED, Json(body)).into_response())
    } else {
        let banner = format!("File {} uploaded successfully!", filename);
        Ok((StatusCode::CREATED, Html(page::render(Some(&banner))?)).into_response())
    }
}

#[utoipa::path(
    get,
    path = "/list",
    responses(
        (status = 200, description = "All stored files, newest first", body = [FileSummary]),
        (status = 500, description = "Internal server error", body = api_shared::ErrorRes)
    )
)]
/// List every stored file, newest upload first.
///
/// `download_url` is absolute when the request carries a `Host` header.
#[axum::debug_handler]
pub async fn list_files(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<FileSummary>>, ApiError> {
    let files = blocking(&state.service, |service| service.list()).await?;

    let base = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(|host| format!("http://{}", host))
        .unwrap_or_default();

    let summaries = files
        .into_iter()
        .map(|f| FileSummary {
            download_url: format!("{}/files/{}", base, f.filename),
            filename: f.filename,
            original_name: f.record.original_name,
            size: f.record.size,
            size_formatted: f.record.size_formatted,
            upload_date: f.record.upload_date,
        })
        .collect();
    Ok(Json(summaries))
}

#[utoipa::path(
    get,
    path = "/files/{filename}",
    params(
        ("filename" = String, Path, description = "Stored filename")
    ),
    responses(
        (status = 200, description = "File content, named after the original upload", body = String, content_type = "application/octet-stream"),
        (status = 404, description = "Unknown file, or file missing on disk", body = api_shared::ErrorRes)
    )
)]
/// Download a stored file under its original name.
///
/// The body is streamed from disk; only the first bytes are read up front to detect the media
/// type.
#[axum::debug_handler]
pub async fn download_file(
    State(state): State<AppState>,
    AxumPath(filename): AxumPath<String>,
) -> Result<Response, ApiError> {
    let name = filename.clone();
    let located = blocking(&state.service, move |service| service.locate(&name)).await?;

    let path = located.path;
    let (file, content_type) = tokio::task::spawn_blocking(move || open_for_streaming(&path))
        .await?
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => ApiError::from(CoreError::Orphaned(filename)),
            _ => {
                tracing::error!("Failed to open stored file: {:?}", e);
                ApiError::Internal
            }
        })?;

    let disposition = HeaderValue::from_str(&attachment_disposition(&located.original_name))
        .map_err(|e| {
            tracing::error!("Invalid Content-Disposition header: {:?}", e);
            ApiError::Internal
        })?;
    let body = Body::from_stream(ReaderStream::new(tokio::fs::File::from_std(file)));

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// Opens `path` and detects its media type from the leading bytes, leaving the file positioned
/// at the start.
fn open_for_streaming(path: &Path) -> std::io::Result<(std::fs::File, &'static str)> {
    let mut file = std::fs::File::open(path)?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    file.by_ref().take(SNIFF_LEN as u64).read_to_end(&mut head)?;
    file.seek(SeekFrom::Start(0))?;
    Ok((file, filedrop_files::media_type(&head)))
}

#[utoipa::path(
    get,
    path = "/files/info/{filename}",
    params(
        ("filename" = String, Path, description = "Stored filename")
    ),
    responses(
        (status = 200, description = "Stored record", body = FileMetadataRes),
        (status = 404, description = "Unknown file", body = api_shared::ErrorRes)
    )
)]
/// Return the stored record of a file.
#[axum::debug_handler]
pub async fn file_info(
    State(state): State<AppState>,
    AxumPath(filename): AxumPath<String>,
) -> Result<Json<FileMetadataRes>, ApiError> {
    let record = blocking(&state.service, move |service| service.info(&filename)).await?;
    Ok(Json(metadata_res(record)))
}

#[utoipa::path(
    delete,
    path = "/delete/{filename}",
    params(
        ("filename" = String, Path, description = "Stored filename")
    ),
    responses(
        (status = 200, description = "File deleted", body = MessageRes),
        (status = 404, description = "Unknown file", body = api_shared::ErrorRes)
    )
)]
/// Delete a file and its record.
#[axum::debug_handler]
pub async fn delete_file(
    State(state): State<AppState>,
    AxumPath(filename): AxumPath<String>,
) -> Result<Json<MessageRes>, ApiError> {
    let deleted = blocking(&state.service, move |service| service.delete(&filename)).await?;
    Ok(Json(MessageRes {
        message: format!("File {} deleted successfully", deleted.filename),
    }))
}
