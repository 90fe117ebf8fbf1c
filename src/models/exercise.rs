use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExerciseId(String);

impl ExerciseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Temporary identity for a record that has not been persisted (or not fetched back) yet.
    pub fn placeholder(name: &str) -> Self {
        let slug = name
            .trim()
            .to_lowercase()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        Self(format!("temp-{}", slug))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with("temp-")
    }
}

impl fmt::Display for ExerciseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An entry in the exercise library, as stored by the hosted backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub id: ExerciseId,
    pub name: String,
    /// Single tag or comma-joined tag set.
    #[serde(default)]
    pub equipment: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub exercise_type: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub target_muscles: Vec<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub cues: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_global: bool,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ExerciseRecord {
    pub fn equipment_tags(&self) -> Vec<&str> {
        self.equipment
            .as_deref()
            .map(|equipment| {
                equipment
                    .split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A user-authored exercise definition that has not been persisted yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewExerciseDraft {
    pub name: String,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub units: Vec<String>,
    #[serde(default)]
    pub muscles: Vec<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub cues: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

impl NewExerciseDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Stand-in record used when the persisted row can't be looked up yet.
    pub fn to_placeholder_record(&self, id: ExerciseId) -> ExerciseRecord {
        ExerciseRecord {
            id,
            name: self.name.trim().to_string(),
            equipment: join_selection(&self.equipment),
            difficulty: self.difficulty.clone(),
            exercise_type: self.category.clone(),
            goal: self.goal.clone(),
            units: join_selection(&self.units),
            target_muscles: self.muscles.clone(),
            instructions: self.instructions.clone(),
            cues: self.cues.clone(),
            image_url: self.image_url.clone(),
            video_url: self.video_url.clone(),
            is_active: true,
            is_global: true,
            created_by: None,
            created_at: None,
        }
    }
}

/// Comma-joins a multi-select; an empty selection is stored as no value.
pub fn join_selection(values: &[String]) -> Option<String> {
    let joined = values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join(",");

    if joined.is_empty() { None } else { Some(joined) }
}
