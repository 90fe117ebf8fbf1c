use serde::Deserialize;

use crate::models::exercise::ExerciseRecord;

/// How many library names are offered to the model as preferred spellings.
const LIBRARY_HINT_LIMIT: usize = 150;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationRequest {
    pub description: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub equipment: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

fn format_library_for_prompt(library: &[ExerciseRecord]) -> String {
    library
        .iter()
        .take(LIBRARY_HINT_LIMIT)
        .map(|record| {
            let equipment = record.equipment_tags();
            if equipment.is_empty() {
                format!("- {}\n", record.name)
            } else {
                format!("- {} ({})\n", record.name, equipment.join(", "))
            }
        })
        .collect::<Vec<_>>()
        .join("")
}

fn format_constraints(request: &GenerationRequest) -> String {
    let mut output = String::new();
    if let Some(difficulty) = request.difficulty.as_deref() {
        output.push_str(&format!("- Difficulty: {}\n", difficulty));
    }
    if let Some(equipment) = request.equipment.as_deref() {
        output.push_str(&format!("- Available equipment: {}\n", equipment));
    }
    if let Some(duration) = request.duration.as_deref() {
        output.push_str(&format!("- Target duration: {}\n", duration));
    }
    if output.is_empty() {
        output.push_str("- None given, use sensible defaults\n");
    }
    output
}

pub fn build_workout_generation_prompt(
    request: &GenerationRequest,
    library: &[ExerciseRecord],
) -> String {
    format!(
        r#"You are a professional strength and conditioning coach writing a structured workout for a coaching platform.

COACH REQUEST:
{}

CONSTRAINTS:
{}
EXERCISE LIBRARY (prefer these exact names when an exercise fits):
{}
RULES:
1. Group exercises into blocks. Each block has a name and a type
2. Block type MUST be one of: normal, superset, circuit, amrap, interval, warmup, cooldown
3. Use "duration" for the prescription, written as "<N> reps", "<N> reps at <N>% 1RM", "<N> sec" or "<N> min"
4. Keep instructions to one short coaching cue per exercise
5. For any field that has no meaningful value, ALWAYS use null, never "N/A" or empty strings

OUTPUT FORMAT:
Return ONLY a JSON object with this exact structure:
{{
    "metadata": {{
        "title": "Workout Title",
        "difficulty": "intermediate",
        "equipment": "dumbbell, bench",
        "description": "One sentence summary",
        "duration": "45 min"
    }},
    "blocks": [
        {{
            "name": "Block Name",
            "type": "circuit",
            "exercises": [
                {{
                    "name": "Exercise Name",
                    "duration": "12 reps",
                    "instructions": "Brace before each rep"
                }}
            ]
        }}
    ]
}}"#,
        request.description.trim(),
        format_constraints(request),
        format_library_for_prompt(library),
    )
}
