use serde::Deserialize;

use crate::models::exercise::ExerciseRecord;

// Insert with `Prefer: return=representation` answers with the stored rows as an array
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct CreatedExerciseRows {
    pub rows: Vec<ExerciseRecord>,
}

// Error body returned by the REST layer on constraint violations
#[derive(Debug, Deserialize)]
pub struct RestErrorResponse {
    pub message: Option<String>,
    pub code: Option<String>,
    pub details: Option<String>,
}
