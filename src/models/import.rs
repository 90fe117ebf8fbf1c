use serde::{Deserialize, Serialize};

use crate::models::exercise::ExerciseRecord;

pub const DEFAULT_IMPORT_TITLE: &str = "Imported Workout";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportMetadata {
    pub title: String,
    pub difficulty: Option<String>,
    pub equipment: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
}

/// One raw exercise line as extracted from a PDF or generated by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportedExercise {
    pub name: String,
    /// Free text: may encode reps, a percentage of 1RM or a time span.
    pub duration: Option<String>,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportedBlock {
    pub name: String,
    /// Free-text label, mapped onto `SessionType` during rebuild.
    pub block_type: String,
    pub exercises: Vec<ImportedExercise>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    pub metadata: ImportMetadata,
    pub blocks: Vec<ImportedBlock>,
}

/// A distinct exercise name seen during one import, with its precomputed suggestions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedExerciseName {
    pub name: String,
    pub instructions: Option<String>,
    pub suggestions: Vec<ExerciseRecord>,
}

impl ImportResult {
    /// Distinct exercise names in block order, each paired with the first
    /// non-empty instructions recorded against it.
    pub fn unique_exercise_names(&self) -> Vec<(String, Option<String>)> {
        let mut names: Vec<(String, Option<String>)> = Vec::new();

        for exercise in self.blocks.iter().flat_map(|block| &block.exercises) {
            let name = exercise.name.trim();
            if name.is_empty() {
                continue;
            }

            let instructions = exercise
                .instructions
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string);

            match names.iter_mut().find(|(existing, _)| existing == name) {
                Some((_, existing_instructions)) => {
                    if existing_instructions.is_none() {
                        *existing_instructions = instructions;
                    }
                }
                None => names.push((name.to_string(), instructions)),
            }
        }

        names
    }

    pub fn exercise_count(&self) -> usize {
        self.blocks.iter().map(|block| block.exercises.len()).sum()
    }
}
