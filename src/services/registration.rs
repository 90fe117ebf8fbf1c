use thiserror::Error;
use tracing::{info, warn};

use crate::clients::models::requests::CreateExerciseRequest;
use crate::models::exercise::{ExerciseRecord, NewExerciseDraft, join_selection};

/// Persistence seam for the exercise library.
pub trait ExerciseStore {
    /// Active exercises, freshest first.
    fn fetch_active_exercises(&self)
    -> impl Future<Output = anyhow::Result<Vec<ExerciseRecord>>> + Send;

    /// Inserts one row and returns it as stored.
    fn create_exercise(
        &self,
        request: &CreateExerciseRequest,
    ) -> impl Future<Output = anyhow::Result<ExerciseRecord>> + Send;
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Exercise name is required")]
    MissingName,

    #[error("Failed to save exercise '{name}': {reason}")]
    Persistence { name: String, reason: String },
}

pub fn build_create_request(
    draft: &NewExerciseDraft,
    owner_id: Option<&str>,
) -> Result<CreateExerciseRequest, RegistrationError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(RegistrationError::MissingName);
    }

    Ok(CreateExerciseRequest {
        name: name.to_string(),
        equipment: join_selection(&draft.equipment),
        difficulty: non_empty(draft.difficulty.as_deref()),
        exercise_type: non_empty(draft.category.as_deref()),
        goal: non_empty(draft.goal.as_deref()),
        units: join_selection(&draft.units),
        target_muscles: clean_list(&draft.muscles),
        instructions: non_empty(draft.instructions.as_deref()),
        cues: non_empty(draft.cues.as_deref()),
        image_url: non_empty(draft.image_url.as_deref()),
        video_url: non_empty(draft.video_url.as_deref()),
        is_active: true,
        is_global: true,
        created_by: owner_id.map(str::to_string),
    })
}

/// Validates and persists a draft, returning the stored record.
///
/// One persistence call per invocation; a failure leaves nothing behind to clean up,
/// so retrying is just calling this again with the same draft.
pub async fn register<S: ExerciseStore>(
    store: &S,
    draft: &NewExerciseDraft,
    owner_id: Option<&str>,
) -> Result<ExerciseRecord, RegistrationError> {
    let request = build_create_request(draft, owner_id)?;

    match store.create_exercise(&request).await {
        Ok(record) => {
            info!(exercise_id = %record.id, name = %record.name, "exercise.registered");
            Ok(record)
        }
        Err(e) => {
            warn!(error = %e, name = %request.name, "exercise.registration_failed");
            Err(RegistrationError::Persistence {
                name: request.name,
                reason: e.to_string(),
            })
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn clean_list(values: &[String]) -> Option<Vec<String>> {
    let cleaned: Vec<String> = values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
