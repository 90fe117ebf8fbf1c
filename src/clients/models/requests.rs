use serde::Serialize;

/// Row inserted into the hosted `exercises` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateExerciseRequest {
    pub name: String,
    pub equipment: Option<String>,
    pub difficulty: Option<String>,
    pub exercise_type: Option<String>,
    pub goal: Option<String>,
    pub units: Option<String>,
    pub target_muscles: Option<Vec<String>>,
    pub instructions: Option<String>,
    pub cues: Option<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub is_active: bool,
    pub is_global: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}
