use serde::{Deserialize, Serialize};

use crate::models::exercise::ExerciseRecord;
use crate::models::import::ImportMetadata;

pub const DEFAULT_REST_SECONDS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Normal,
    Superset,
    Circuit,
    Warmup,
    Cooldown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetType {
    Warmup,
    Normal,
    Dropset,
    Burnout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSet {
    pub id: String,
    #[serde(rename = "type")]
    pub set_type: SetType,
    pub set_number: u32,
    pub rest_seconds: u32,
    /// Empty when no load was given.
    pub weight: String,
    /// Zero when no rep count was given.
    pub reps: u32,
    pub notes: Option<String>,
}

impl ExerciseSet {
    pub fn default_for(id: String) -> Self {
        Self {
            id,
            set_type: SetType::Normal,
            set_number: 1,
            rest_seconds: DEFAULT_REST_SECONDS,
            weight: String::new(),
            reps: 0,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutExercise {
    pub id: String,
    pub exercise: ExerciseRecord,
    pub sets: Vec<ExerciseSet>,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub exercises: Vec<WorkoutExercise>,
}

/// The builder-ready result of a completed import.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutDraft {
    pub metadata: ImportMetadata,
    pub sessions: Vec<Session>,
}
