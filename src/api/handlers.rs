//! API Handlers
//!
//! HTTP request handlers for each endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::cache::{self, CacheStore, SharedCache};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    DeleteResponse, DocumentResponse, ExerciseParams, HealthResponse, HistoryParams,
    HistoryResponse, PutDocumentRequest, RootResponse, StatsResponse, SubmitAttemptRequest,
};
use crate::store::{CachedStore, DocumentPath, DocumentStore, MemoryStore};
use crate::training::{
    new_exercise, Accuracy, Exercise, Profile, Progress, RecordedAttempt, Streak, TrainingService,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cached view of the backing document store
    pub store: Arc<dyn DocumentStore>,
    /// Cache behind `store`, for stats and cleanup
    pub cache: SharedCache,
    pub training: TrainingService,
}

impl AppState {
    /// Puts `cache` in front of `backing` and wires the training service to it.
    pub fn new(backing: Arc<dyn DocumentStore>, cache: CacheStore) -> Self {
        let cache = cache::shared(cache);
        let store: Arc<dyn DocumentStore> = Arc::new(CachedStore::new(backing, cache.clone()));
        Self {
            training: TrainingService::new(store.clone()),
            store,
            cache,
        }
    }

    /// State over `backing` with cache limits from the Config.
    pub fn from_config(config: &Config, backing: Arc<dyn DocumentStore>) -> Self {
        Self::new(
            backing,
            CacheStore::new(config.cache_max_entries, config.cache_ttl),
        )
    }

    /// State over a fresh in-memory store.
    pub fn in_memory(cache: CacheStore) -> Self {
        Self::new(Arc::new(MemoryStore::new()), cache)
    }
}

// == Placeholder Routes ==

/// Handler for GET /
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse::new())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.read().await.stats();
    Json(StatsResponse::from(stats))
}

// == Document Routes ==

/// Handler for GET /documents/*path
pub async fn get_document_handler(
    State(state): State<AppState>,
    Path(raw_path): Path<String>,
) -> Result<Json<DocumentResponse>> {
    let path = DocumentPath::parse(&raw_path)?;
    let document = state
        .store
        .get(&path)
        .await?
        .ok_or_else(|| AppError::NotFound(path.to_string()))?;

    Ok(Json(DocumentResponse::new(&path, document)))
}

/// Handler for PUT /documents/*path
///
/// Replaces the whole document.
pub async fn put_document_handler(
    State(state): State<AppState>,
    Path(raw_path): Path<String>,
    Json(req): Json<PutDocumentRequest>,
) -> Result<Json<DocumentResponse>> {
    let path = DocumentPath::parse(&raw_path)?;
    let document = state.store.set(&path, req.fields).await?;
    info!("Stored document {}", path);

    Ok(Json(DocumentResponse::new(&path, document)))
}

/// Handler for DELETE /documents/*path
pub async fn delete_document_handler(
    State(state): State<AppState>,
    Path(raw_path): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let path = DocumentPath::parse(&raw_path)?;
    state.store.delete(&path).await?;
    info!("Deleted document {}", path);

    Ok(Json(DeleteResponse::new(&path)))
}

// == Training Routes ==

/// Handler for GET /exercises/pitch
pub async fn exercise_handler(Query(params): Query<ExerciseParams>) -> Result<Json<Exercise>> {
    Ok(Json(new_exercise(params.difficulty()?)))
}

/// Handler for POST /users/:user_id/attempts
pub async fn submit_attempt_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<SubmitAttemptRequest>,
) -> Result<(StatusCode, Json<RecordedAttempt>)> {
    let recorded = state.training.record_attempt(&user_id, req.into()).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

/// Handler for GET /users/:user_id/attempts
pub async fn history_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>> {
    let query = params.to_query()?;
    let attempts = state.training.history(&user_id, &query).await?;
    Ok(Json(HistoryResponse::new(user_id, attempts)))
}

/// Handler for GET /users/:user_id/profile
pub async fn profile_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Profile>> {
    Ok(Json(state.training.profile(&user_id).await?))
}

/// Handler for GET /users/:user_id/progress
pub async fn progress_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Progress>> {
    Ok(Json(state.training.progress(&user_id).await?))
}

/// Handler for GET /users/:user_id/streak
pub async fn streak_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Streak>> {
    Ok(Json(state.training.streak(&user_id).await?))
}

/// Handler for GET /users/:user_id/accuracy
pub async fn accuracy_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Accuracy>> {
    Ok(Json(state.training.accuracy(&user_id).await?))
}
