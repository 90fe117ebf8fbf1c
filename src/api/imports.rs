use axum::Json;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, header::AUTHORIZATION},
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::clients::gemini::GeminiClient;
use crate::clients::library::LibraryClient;
use crate::config::Config;
use crate::error::AppError;
use crate::models::exercise::{ExerciseRecord, NewExerciseDraft};
use crate::services::ai_prompt::GenerationRequest;
use crate::services::import_session::ImportSession;
use crate::services::notifications::{self, Notification};
use crate::services::resolution::ResolutionEvent;
use crate::services::{ai_parser, ai_prompt, matcher, registration};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub library_client: LibraryClient,
    pub gemini_client: GeminiClient,
    /// Active library, freshest first. Import sessions take a copy when they start.
    pub library: Arc<RwLock<Vec<ExerciseRecord>>>,
    pub sessions: Arc<Mutex<HashMap<u64, ImportSession>>>,
    pub next_session_id: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: Config, library_client: LibraryClient, gemini_client: GeminiClient) -> Self {
        Self {
            config,
            library_client,
            gemini_client,
            library: Arc::new(RwLock::new(Vec::new())),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            next_session_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn library_snapshot(&self) -> Vec<ExerciseRecord> {
        self.library
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace_library(&self, records: Vec<ExerciseRecord>) {
        *self.library.write().unwrap_or_else(PoisonError::into_inner) = records;
    }

    fn push_library_record(&self, record: ExerciseRecord) {
        let mut library = self.library.write().unwrap_or_else(PoisonError::into_inner);
        library.retain(|existing| existing.id != record.id);
        library.insert(0, record);
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<u64, ImportSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Discards imports open longer than the configured lifetime and returns how many
    /// were dropped. Imports with a registration in flight are kept.
    pub fn evict_stale_sessions(&self, now: DateTime<Utc>) -> usize {
        let max_age = Duration::minutes(self.config.session_ttl_minutes);
        let mut sessions = self.sessions();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_stale(now, max_age));
        before - sessions.len()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum CreateImportRequest {
    /// Output of the PDF extraction step, parsed leniently.
    Extracted { import: Value },
    Generate(GenerationRequest),
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Deserialize)]
pub struct RegisterExerciseRequest {
    pub name: String,
    pub draft: NewExerciseDraft,
}

fn authenticate_request(headers: &HeaderMap, state: &AppState) -> Result<(), AppError> {
    let auth_str = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    if token != state.config.api_token {
        return Err(AppError::Unauthorized);
    }

    Ok(())
}

fn session_view(id: u64, session: &ImportSession, notification: Option<Notification>) -> Value {
    json!({
        "id": id,
        "metadata": session.metadata(),
        "unmatched": session.unmatched(),
        "resolutions": session.mapping(),
        "pending": session.pending_names(),
        "notification": notification,
    })
}

pub async fn create_import(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateImportRequest>,
) -> Result<Json<Value>, AppError> {
    authenticate_request(&headers, &state)?;

    let library = state.library_snapshot();

    let import = match payload {
        CreateImportRequest::Extracted { import } => ai_parser::parse_import_value(&import),
        CreateImportRequest::Generate(request) => {
            if request.description.trim().is_empty() {
                return Err(AppError::BadRequest("description is required".to_string()));
            }

            let prompt = ai_prompt::build_workout_generation_prompt(&request, &library);
            tracing::debug!(prompt = %prompt, "gemini.prompt");

            let response = state.gemini_client.generate_text(&prompt).await?;
            tracing::debug!(response = %response, "gemini.response");

            ai_parser::parse_workout_response(&response)?
        }
    };

    let session = ImportSession::start(import, library);
    let notification = notifications::auto_match_notification(
        session.mapping().resolved_count(),
        session.unmatched().len(),
    );

    let id = state.next_session_id.fetch_add(1, Ordering::Relaxed);
    let view = session_view(id, &session, Some(notification));
    state.sessions().insert(id, session);

    tracing::info!(session_id = id, "import.created");
    Ok(Json(view))
}

pub async fn get_import(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Value>, AppError> {
    authenticate_request(&headers, &state)?;

    let sessions = state.sessions();
    let session = sessions.get(&id).ok_or(AppError::SessionNotFound(id))?;
    Ok(Json(session_view(id, session, None)))
}

pub async fn get_suggestions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ExerciseRecord>>, AppError> {
    authenticate_request(&headers, &state)?;

    let sessions = state.sessions();
    let session = sessions.get(&id).ok_or(AppError::SessionNotFound(id))?;
    Ok(Json(session.suggestions(&query.q)))
}

pub async fn apply_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(event): Json<ResolutionEvent>,
) -> Result<Json<Value>, AppError> {
    authenticate_request(&headers, &state)?;

    let mut sessions = state.sessions();
    let session = sessions.get_mut(&id).ok_or(AppError::SessionNotFound(id))?;

    match &event {
        ResolutionEvent::AutoMatch { names } => {
            if let Some(name) = names.iter().find(|name| !session.knows_name(name)) {
                return Err(unknown_name(name));
            }
        }
        ResolutionEvent::ManualMatch { name, exercise_id } => {
            if !session.knows_name(name) {
                return Err(unknown_name(name));
            }
            if !session.library().iter().any(|record| &record.id == exercise_id) {
                return Err(AppError::BadRequest(format!(
                    "exercise {} is not in the library",
                    exercise_id
                )));
            }
        }
        ResolutionEvent::Replace { name } if !session.knows_name(name) => {
            return Err(unknown_name(name));
        }
        ResolutionEvent::AddNew { .. } => {
            return Err(AppError::BadRequest(
                "new exercises are added through the exercises endpoint".to_string(),
            ));
        }
        ResolutionEvent::Complete => {
            return Err(AppError::BadRequest(
                "imports are completed through the complete endpoint".to_string(),
            ));
        }
        _ => {}
    }

    session.apply(event);
    Ok(Json(session_view(id, session, None)))
}

fn unknown_name(name: &str) -> AppError {
    AppError::BadRequest(format!("unknown exercise name '{}'", name))
}

pub async fn register_exercise(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(payload): Json<RegisterExerciseRequest>,
) -> Result<Json<Value>, AppError> {
    authenticate_request(&headers, &state)?;

    // The marker holds off completion and eviction until the insert settles
    {
        let mut sessions = state.sessions();
        let session = sessions.get_mut(&id).ok_or(AppError::SessionNotFound(id))?;
        if !session.knows_name(&payload.name) {
            return Err(unknown_name(&payload.name));
        }
        session.begin_registration();
    }

    let result = registration::register(
        &state.library_client,
        &payload.draft,
        state.config.default_owner_id.as_deref(),
    )
    .await;

    if let Ok(record) = &result {
        state.push_library_record(record.clone());
    }

    let mut sessions = state.sessions();
    let Some(session) = sessions.get_mut(&id) else {
        let record = result?;
        tracing::warn!(
            session_id = id,
            exercise_id = %record.id,
            "import.registration_outlived_session"
        );
        let notification = Notification::info(format!("Added '{}' to the library", record.name));
        return Ok(Json(json!({
            "exercise": record,
            "notification": notification,
        })));
    };

    session.finish_registration();
    let record = result?;
    let notification = Notification::info(format!("Added '{}' to the library", record.name));
    session.record_registration(&payload.name, payload.draft, record);

    Ok(Json(session_view(id, session, Some(notification))))
}

pub async fn complete_import(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Value>, AppError> {
    authenticate_request(&headers, &state)?;

    let mut session = {
        let mut sessions = state.sessions();
        let session = sessions.get(&id).ok_or(AppError::SessionNotFound(id))?;
        if session.has_registration_in_flight() {
            return Err(AppError::Conflict(
                "a new exercise is still being saved for this import".to_string(),
            ));
        }
        sessions.remove(&id).ok_or(AppError::SessionNotFound(id))?
    };
    session.refresh_library(state.library_snapshot());

    let draft = match session.clone().complete() {
        Ok(draft) => draft,
        Err(e) => {
            // Matching can continue after a failed rebuild
            state.sessions().insert(id, session);
            return Err(e.into());
        }
    };

    let notification = notifications::completion_notification(&draft);
    Ok(Json(json!({
        "workout": draft,
        "notification": notification,
    })))
}

pub async fn search_exercises(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ExerciseRecord>>, AppError> {
    authenticate_request(&headers, &state)?;

    let library = state.library.read().unwrap_or_else(PoisonError::into_inner);
    Ok(Json(matcher::search_library(&query.q, &library)))
}
