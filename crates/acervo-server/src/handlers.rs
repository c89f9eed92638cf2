//! HTTP request handlers for the catalog server.
//!
//! Routes:
//! - `GET /health`
//! - `GET /api/documents`, `POST /api/documents`
//! - `GET /api/documents/:id`, `GET /api/documents/:id/export`
//! - `GET /api/catalog`, `GET /api/categories`
//! - `POST /api/decode-document`
//! - `GET /api/placeholder/:width/:height` and stored images under the image prefix

use acervo_domain::catalog::distinct_categories;
use acervo_domain::traits::{DocumentStore, Upload};
use acervo_domain::{CatalogQuery, CategoryFilter, Document, DocumentId, SortKey};
use acervo_export::{export, ExportError, ExportFormat};
use acervo_extractor::DocxExtractor;
use acervo_ingest::{
    FsImageStore, ImageStoreError, IngestionError, IngestionPipeline, Submission,
    TranscriptionStatus,
};
use acervo_store::{SqliteStore, StoreError};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Header set on ingest responses whose transcription could not be extracted
pub const NOTICE_HEADER: &str = "x-acervo-notice";

/// The concrete pipeline the server runs
pub type Pipeline = IngestionPipeline<DocxExtractor, SqliteStore, FsImageStore>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Ingestion pipeline for new submissions
    pub pipeline: Arc<Pipeline>,
    /// Document store, shared with the pipeline
    pub store: Arc<Mutex<SqliteStore>>,
    /// Extractor, shared with the pipeline
    pub extractor: Arc<DocxExtractor>,
}

impl AppState {
    /// Build state around a pipeline, sharing its store and extractor
    pub fn new(pipeline: Pipeline) -> Self {
        let store = pipeline.store();
        let extractor = pipeline.extractor();
        Self {
            pipeline: Arc::new(pipeline),
            store,
            extractor,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// "ok" or "unavailable"
    pub status: String,
    /// Number of stored documents, when the store answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<usize>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Structured detail, e.g. the offending form field
    pub details: serde_json::Value,
}

/// Query string of `GET /api/catalog`
#[derive(Debug, Default, Deserialize)]
pub struct CatalogParams {
    /// Substring searched in title, source and category
    pub search: Option<String>,
    /// Category, or "All"/"Todos"
    pub category: Option<String>,
    /// "date" (default) or "title"
    pub sort: Option<String>,
}

/// Query string of `GET /api/documents/:id/export`
#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    /// "json" (default) or "txt"
    pub format: Option<String>,
    /// Selected excerpt to include
    pub excerpt: Option<String>,
}

/// Body of `POST /api/decode-document`
#[derive(Debug, Deserialize)]
pub struct DecodeRequest {
    /// Base64-encoded .docx bytes
    #[serde(rename = "encodedData", default)]
    pub encoded_data: Option<String>,
}

/// Response of `POST /api/decode-document`
#[derive(Debug, Serialize, Deserialize)]
pub struct DecodeResponse {
    /// Extracted plain text
    pub text: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Malformed or incomplete request, optionally naming a form field
    BadRequest {
        /// Error message
        message: String,
        /// Offending field, if any
        field: Option<&'static str>,
    },
    /// Unknown document id or resource
    NotFound(String),
    /// Upload exceeds a configured limit
    PayloadTooLarge(String),
    /// The request was understood but its content could not be processed
    Unprocessable(String),
    /// The document store could not be reached
    StoreUnavailable(String),
    /// Internal server error
    InternalError(String),
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
            field: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            AppError::BadRequest { message, field } => (
                StatusCode::BAD_REQUEST,
                message,
                field.map_or(serde_json::Value::Null, |f| serde_json::json!({ "field": f })),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, serde_json::Value::Null),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, msg, serde_json::Value::Null)
            }
            AppError::Unprocessable(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Error processing document".to_string(),
                serde_json::Value::String(msg),
            ),
            AppError::StoreUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Document store unavailable".to_string(),
                serde_json::Value::String(msg),
            ),
            AppError::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg, serde_json::Value::Null)
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            details,
        });
        (status, body).into_response()
    }
}

impl From<IngestionError> for AppError {
    fn from(e: IngestionError) -> Self {
        match e {
            IngestionError::MissingField(_) | IngestionError::Invalid(_) => AppError::BadRequest {
                field: e.field(),
                message: e.to_string(),
            },
            IngestionError::ImageTooLarge { .. } => AppError::PayloadTooLarge(e.to_string()),
            IngestionError::ImageStorage(msg) => {
                error!("Image storage failed: {}", msg);
                AppError::InternalError(format!("Image storage failed: {}", msg))
            }
            IngestionError::StoreUnavailable(msg) => {
                error!("Document store unavailable: {}", msg);
                AppError::StoreUnavailable(msg)
            }
        }
    }
}

impl From<ExportError> for AppError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::UnknownFormat(_) => AppError::bad_request(e.to_string()),
            ExportError::Serialization(_) => AppError::InternalError(e.to_string()),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(e.body_text())
        } else {
            AppError::bad_request(format!("Invalid multipart body: {}", e.body_text()))
        }
    }
}

/// Run a read against the shared store, mapping failures to 503
fn with_store<T>(
    state: &AppState,
    op: impl FnOnce(&SqliteStore) -> Result<T, StoreError>,
) -> Result<T, AppError> {
    let store = state
        .store
        .lock()
        .map_err(|e| AppError::StoreUnavailable(format!("Store lock error: {}", e)))?;
    op(&store).map_err(|e| {
        error!("Store operation failed: {}", e);
        AppError::StoreUnavailable(e.to_string())
    })
}

/// Look up a document; malformed ids are reported as not found
fn find_document(state: &AppState, id: &str) -> Result<Document, AppError> {
    let not_found = || AppError::NotFound(format!("Document not found: {}", id));
    let id = DocumentId::from_string(id).map_err(|_| not_found())?;
    with_store(state, |store| store.get_by_id(id))?.ok_or_else(not_found)
}

/// GET /health - Store reachability and document count
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthCheckResponse>) {
    let probe = with_store(&state, |store| {
        store.ping()?;
        store.count()
    });

    match probe {
        Ok(count) => (
            StatusCode::OK,
            Json(HealthCheckResponse {
                status: "ok".to_string(),
                documents: Some(count),
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthCheckResponse {
                status: "unavailable".to_string(),
                documents: None,
            }),
        ),
    }
}

/// GET /api/documents - Every document, in store order
async fn list_documents(State(state): State<AppState>) -> Result<Json<Vec<Document>>, AppError> {
    Ok(Json(with_store(&state, |store| store.list_all())?))
}

/// GET /api/catalog - Filtered, sorted view
async fn catalog(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> Result<Json<Vec<Document>>, AppError> {
    let sort = match params.sort.as_deref().map(str::trim) {
        None | Some("") => SortKey::default(),
        Some(raw) => raw
            .parse::<SortKey>()
            .map_err(|e| AppError::bad_request(e.to_string()))?,
    };
    let query = CatalogQuery::new(
        params.search.unwrap_or_default(),
        CategoryFilter::parse(params.category.as_deref().unwrap_or_default()),
        sort,
    );

    let documents = with_store(&state, |store| store.list_all())?;
    let view = query.apply(&documents);
    debug!("Catalog query {:?} matched {} of {}", query, view.len(), documents.len());

    Ok(Json(view))
}

/// GET /api/categories - Categories present in the catalog
async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    let documents = with_store(&state, |store| store.list_all())?;
    Ok(Json(distinct_categories(&documents)))
}

/// GET /api/documents/:id - One document
async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
    Ok(Json(find_document(&state, &id)?))
}

/// POST /api/documents - Ingest a multipart submission
async fn create_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let multipart = multipart.map_err(|e| AppError::bad_request(e.body_text()))?;
    let submission = read_submission(multipart).await?;
    let report = state.pipeline.ingest_with_report(submission).await?;

    info!("Created document {}", report.document.id);

    let mut response = (StatusCode::CREATED, Json(report.document)).into_response();
    if let TranscriptionStatus::Failed(reason) = &report.transcription {
        debug!("Flagging unreadable transcription: {}", reason);
        response.headers_mut().insert(
            HeaderName::from_static(NOTICE_HEADER),
            HeaderValue::from_static("transcription-unreadable"),
        );
    }
    Ok(response)
}

/// Collect form fields and file parts into a submission
async fn read_submission(mut multipart: Multipart) -> Result<Submission, AppError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "image" | "transcription" => {
                let upload = Upload {
                    file_name: field.file_name().map(str::to_string),
                    content_type: field.content_type().map(str::to_string),
                    bytes: field.bytes().await?.to_vec(),
                };
                if name == "image" {
                    submission.image = Some(upload);
                } else {
                    submission.transcription = Some(upload);
                }
            }
            _ => {
                let value = field.text().await?;
                if !submission.form.set_field(&name, value) {
                    debug!("Ignoring unknown form field '{}'", name);
                }
            }
        }
    }

    Ok(submission)
}

/// GET /api/documents/:id/export - Download as JSON or text
async fn export_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ExportParams>,
) -> Result<Response, AppError> {
    let format = match params.format.as_deref().map(str::trim) {
        None | Some("") => ExportFormat::default(),
        Some(raw) => raw.parse::<ExportFormat>()?,
    };
    let document = find_document(&state, &id)?;
    let exported = export(&document, format, params.excerpt.as_deref())?;

    let disposition = HeaderValue::from_str(&content_disposition(&exported.filename))
        .map_err(|e| AppError::InternalError(format!("Invalid filename header: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(exported.content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        exported.bytes,
    )
        .into_response())
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let encoded: String = filename
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
                (b as char).to_string()
            } else {
                format!("%{:02X}", b)
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}

/// POST /api/decode-document - Extract text from a base64 .docx
async fn decode_document(
    State(state): State<AppState>,
    payload: Result<Json<DecodeRequest>, JsonRejection>,
) -> Result<Json<DecodeResponse>, AppError> {
    let Json(request) =
        payload.map_err(|e| AppError::bad_request(format!("Invalid request body: {}", e.body_text())))?;

    let encoded = request
        .encoded_data
        .filter(|data| !data.trim().is_empty())
        .ok_or_else(|| {
            AppError::bad_request("Invalid input: encodedData is required and must be a string")
        })?;

    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| AppError::bad_request(format!("encodedData is not valid base64: {}", e)))?;

    let extractor = Arc::clone(&state.extractor);
    let text = tokio::task::spawn_blocking(move || extractor.extract_text(&bytes))
        .await
        .map_err(|e| AppError::InternalError(format!("Task join error: {}", e)))?
        .map_err(|e| {
            warn!("Failed to decode document: {}", e);
            AppError::Unprocessable(e.to_string())
        })?;

    Ok(Json(DecodeResponse { text }))
}

/// GET /api/placeholder/:width/:height - Neutral SVG for documents without an image
async fn placeholder(Path((width, height)): Path<(u32, u32)>) -> Response {
    let width = width.clamp(1, 2000);
    let height = height.clamp(1, 2000);
    let svg = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="100%" height="100%" fill="#e5e7eb"/></svg>"##,
        w = width,
        h = height
    );
    ([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response()
}

/// GET <image prefix>/:name - A stored image
async fn serve_image(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let images = state.pipeline.images();
    let url = format!("{}/{}", images.public_base_url(), name);

    let bytes = images.read(&url).map_err(|e| match e {
        ImageStoreError::Io(io) if io.kind() != std::io::ErrorKind::NotFound => {
            error!("Failed to read image {}: {}", url, io);
            AppError::InternalError("Failed to read image".to_string())
        }
        _ => AppError::NotFound(format!("Image not found: {}", name)),
    })?;

    Ok(([(header::CONTENT_TYPE, image_content_type(&name))], bytes).into_response())
}

fn image_content_type(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => "image/png",
        Some("jpg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("tif") => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Create the axum router with all routes
///
/// `max_upload_bytes` caps every request body.
pub fn create_router(state: AppState, max_upload_bytes: usize) -> AxumRouter {
    let image_route = format!("{}/:name", state.pipeline.images().public_base_url());

    AxumRouter::new()
        .route("/health", get(health_check))
        .route("/api/documents", get(list_documents).post(create_document))
        .route("/api/documents/:id", get(get_document))
        .route("/api/documents/:id/export", get(export_document))
        .route("/api/catalog", get(catalog))
        .route("/api/categories", get(categories))
        .route("/api/decode-document", post(decode_document))
        .route("/api/placeholder/:width/:height", get(placeholder))
        .route(&image_route, get(serve_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use acervo_ingest::IngestConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt; // for oneshot

    fn create_test_state(dir: &std::path::Path) -> AppState {
        let store = Arc::new(Mutex::new(SqliteStore::new(":memory:").unwrap()));
        let images = FsImageStore::new(dir.join("images"), "/images").unwrap();
        AppState::new(IngestionPipeline::new(
            DocxExtractor::default(),
            store,
            images,
            IngestConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(create_test_state(dir.path()), 1024);

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_placeholder_is_svg() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(create_test_state(dir.path()), 1024);

        let request = Request::builder()
            .uri("/api/placeholder/160/200")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
    }

    #[test]
    fn test_content_disposition() {
        assert_eq!(
            content_disposition("decreto-nº-21.076.json"),
            "attachment; filename=\"decreto-n_-21.076.json\"; filename*=UTF-8''decreto-n%C2%BA-21.076.json"
        );
    }

    #[test]
    fn test_ingestion_errors_map_to_status() {
        let missing: AppError = IngestionError::MissingField("title").into();
        assert!(matches!(missing, AppError::BadRequest { field: Some("title"), .. }));

        let too_large: AppError = IngestionError::ImageTooLarge { size: 2, limit: 1 }.into();
        assert_eq!(too_large.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);

        let down: AppError = IngestionError::StoreUnavailable("gone".to_string()).into();
        assert_eq!(down.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_image_content_type() {
        assert_eq!(image_content_type("0191.png"), "image/png");
        assert_eq!(image_content_type("0191.jpg"), "image/jpeg");
        assert_eq!(image_content_type("0191"), "application/octet-stream");
    }
}
