// HTTP API
// axum router exposing analysis, file upload analysis and per-owner history

pub mod auth;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use uuid::Uuid;

use crate::error::AnalysisError;
use crate::models::{
    AnalysisResult, AnalyzeRequest, HealthResponse, HistoryListResponse, HistoryQuery, OwnerId,
};
use crate::services::detection::Analyzer;
use crate::services::history_store::{DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT};
use crate::services::text_processor::{extract_upload_text, MAX_UPLOAD_BYTES};

pub use auth::TokenResolver;

/// Multipart framing on top of the file itself.
const UPLOAD_BODY_OVERHEAD: usize = 64 * 1024;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub identities: Arc<TokenResolver>,
}

impl AppState {
    fn require_owner(&self, headers: &HeaderMap) -> Result<OwnerId, AnalysisError> {
        self.identities.resolve(headers).ok_or(AnalysisError::Unauthorized)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .route(
            "/analyze/file",
            post(analyze_file).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + UPLOAD_BODY_OVERHEAD)),
        )
        .route("/history", get(list_history))
        .route("/history/:id", delete(delete_history))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        message: "TextLens API is alive".into(),
    })
}

async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, AnalysisError> {
    let Json(request) = payload
        .map_err(|e| AnalysisError::Validation(format!("Invalid request body: {}", e.body_text())))?;
    let text = request.text.unwrap_or_default();

    let owner = state.identities.resolve(&headers);
    let result = state.analyzer.analyze(&text, owner).await?;
    Ok(Json(result))
}

async fn analyze_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResult>, AnalysisError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AnalysisError::Validation(format!("Invalid upload: {}", e.body_text())))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AnalysisError::Validation(format!("Invalid upload: {}", e.body_text())))?;
        upload = Some((file_name, content_type, bytes));
        break;
    }

    let (file_name, content_type, bytes) =
        upload.ok_or_else(|| AnalysisError::Validation("Please enter text or upload a file".to_string()))?;

    info!(
        file = %file_name,
        content_type = content_type.as_deref().unwrap_or("-"),
        size = bytes.len(),
        "[API] file upload received"
    );

    let text = tokio::task::spawn_blocking(move || {
        extract_upload_text(&file_name, content_type.as_deref(), &bytes)
    })
    .await
    .map_err(|e| AnalysisError::Internal(format!("extraction task failed: {}", e)))??;

    let owner = state.identities.resolve(&headers);
    let result = state.analyzer.analyze(&text, owner).await?;
    Ok(Json(result))
}

async fn list_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryListResponse>, AnalysisError> {
    let owner = state.require_owner(&headers)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let items = state.analyzer.history().list_recent(&owner, limit).await?;
    Ok(Json(HistoryListResponse { items }))
}

async fn delete_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AnalysisError> {
    let owner = state.require_owner(&headers)?;
    if state.analyzer.history().delete(&owner, id).await? {
        info!(%id, owner = %owner, "[API] analysis deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AnalysisError::NotFound)
    }
}
