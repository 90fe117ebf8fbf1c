use anyhow::Result;
use serde_json::Value;
use tracing::debug;

use crate::models::import::{
    DEFAULT_IMPORT_TITLE, ImportMetadata, ImportResult, ImportedBlock, ImportedExercise,
};

/// Parses the model's reply, which may wrap the JSON in a ```json fence.
pub fn parse_workout_response(response: &str) -> Result<ImportResult> {
    let json_content = extract_json_from_response(response);
    let parsed_json = parse_json_string(&json_content)?;
    Ok(parse_import_value(&parsed_json))
}

/// Builds an `ImportResult` from untrusted JSON (model output or PDF extraction).
/// Missing or mistyped fields fall back to defaults instead of failing.
pub fn parse_import_value(json: &Value) -> ImportResult {
    ImportResult {
        metadata: extract_metadata_from_json(json),
        blocks: extract_blocks_from_json(json),
    }
}

fn extract_json_from_response(response: &str) -> String {
    if let Some(json_block_start) = response.find("```json") {
        let content_start = json_block_start + "```json".len();

        if let Some(remaining_content) = response.get(content_start..) {
            if let Some(code_block_end) = remaining_content.find("```") {
                return remaining_content[..code_block_end].trim().to_string();
            }
            return remaining_content.trim().to_string();
        }
    }

    response.trim().to_string()
}

fn parse_json_string(json_str: &str) -> Result<Value> {
    serde_json::from_str(json_str)
        .map_err(|e| anyhow::anyhow!("Failed to parse JSON response: {}", e))
}

fn extract_metadata_from_json(json: &Value) -> ImportMetadata {
    let metadata = json.get("metadata").unwrap_or(&Value::Null);

    ImportMetadata {
        title: text_field(metadata, "title").unwrap_or_else(|| DEFAULT_IMPORT_TITLE.to_string()),
        difficulty: text_field(metadata, "difficulty"),
        equipment: text_field(metadata, "equipment"),
        description: text_field(metadata, "description"),
        duration: text_field(metadata, "duration"),
    }
}

fn extract_blocks_from_json(json: &Value) -> Vec<ImportedBlock> {
    let Some(blocks) = json.get("blocks").and_then(Value::as_array) else {
        debug!("import.no_blocks_array");
        return Vec::new();
    };

    blocks
        .iter()
        .enumerate()
        .map(|(index, block)| ImportedBlock {
            name: text_field(block, "name").unwrap_or_else(|| format!("Block {}", index + 1)),
            block_type: text_field(block, "type")
                .or_else(|| text_field(block, "block_type"))
                .unwrap_or_default(),
            exercises: extract_exercises_from_json(block),
        })
        .collect()
}

fn extract_exercises_from_json(block: &Value) -> Vec<ImportedExercise> {
    let Some(exercises) = block.get("exercises").and_then(Value::as_array) else {
        return Vec::new();
    };

    exercises
        .iter()
        .filter_map(|exercise| {
            let Some(name) = text_field(exercise, "name") else {
                debug!(exercise = %exercise, "import.exercise_without_name_skipped");
                return None;
            };

            Some(ImportedExercise {
                name,
                duration: text_field(exercise, "duration"),
                instructions: text_field(exercise, "instructions")
                    .or_else(|| text_field(exercise, "notes")),
            })
        })
        .collect()
}

/// Trimmed, non-empty text; numbers and booleans are stringified.
fn text_field(json: &Value, key: &str) -> Option<String> {
    let text = match json.get(key)? {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => return None,
    };

    if text.is_empty() { None } else { Some(text) }
}
