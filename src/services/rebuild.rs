use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::exercise::{ExerciseId, ExerciseRecord, NewExerciseDraft};
use crate::models::import::{ImportResult, ImportedBlock, ImportedExercise};
use crate::models::workout::{
    DEFAULT_REST_SECONDS, ExerciseSet, Session, SessionType, SetType, WorkoutDraft,
    WorkoutExercise,
};
use crate::services::resolution::{Resolution, ResolutionMapping};

static REPS_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+)\s*reps?\b").ok());

static ONE_REP_MAX_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+(?:\.\d+)?%)\s*1\s*rm\b").ok());

static TIME_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+)\s*(min|sec)").ok());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RebuildError {
    #[error("No exercises could be matched")]
    NoExercisesMatched,
}

/// Rebuilds the builder's session list from raw import blocks and a finished mapping.
///
/// Exercises whose name is unresolved are dropped, and a block left with nothing is
/// not emitted. When blocks were given but none survives, the whole rebuild fails
/// with [`RebuildError::NoExercisesMatched`].
pub fn rebuild(
    blocks: &[ImportedBlock],
    mapping: &ResolutionMapping,
    library: &[ExerciseRecord],
) -> Result<Vec<Session>, RebuildError> {
    let mut sessions = Vec::new();

    for block in blocks {
        let session_id = format!("session-{}", sessions.len() + 1);

        let exercises: Vec<WorkoutExercise> = block
            .exercises
            .iter()
            .filter_map(|exercise| {
                let record = resolve_record(exercise.name.trim(), mapping, library)?;
                Some((exercise, record))
            })
            .enumerate()
            .map(|(index, (exercise, record))| {
                let exercise_id = format!("{}-exercise-{}", session_id, index + 1);
                build_workout_exercise(exercise_id, exercise, record)
            })
            .collect();

        if exercises.is_empty() {
            debug!(block = %block.name, "rebuild.block_skipped_no_matches");
            continue;
        }

        sessions.push(Session {
            id: session_id,
            name: block.name.clone(),
            session_type: map_block_type(&block.block_type),
            exercises,
        });
    }

    if !blocks.is_empty() && sessions.is_empty() {
        warn!(block_count = blocks.len(), "rebuild.no_exercises_matched");
        return Err(RebuildError::NoExercisesMatched);
    }

    debug!(
        block_count = blocks.len(),
        session_count = sessions.len(),
        "rebuild.completed"
    );

    Ok(sessions)
}

pub fn build_workout_draft(
    import: &ImportResult,
    mapping: &ResolutionMapping,
    library: &[ExerciseRecord],
) -> Result<WorkoutDraft, RebuildError> {
    Ok(WorkoutDraft {
        metadata: import.metadata.clone(),
        sessions: rebuild(&import.blocks, mapping, library)?,
    })
}

fn resolve_record(
    name: &str,
    mapping: &ResolutionMapping,
    library: &[ExerciseRecord],
) -> Option<ExerciseRecord> {
    match mapping.get(name)? {
        Resolution::Unresolved => None,
        Resolution::MatchedExisting { exercise_id } => Some(
            find_by_id(library, exercise_id).unwrap_or_else(|| {
                warn!(%name, %exercise_id, "rebuild.matched_record_missing_from_library");
                NewExerciseDraft::named(name).to_placeholder_record(exercise_id.clone())
            }),
        ),
        Resolution::MatchedNew { draft, exercise_id } => Some(match exercise_id {
            Some(id) => {
                find_by_id(library, id).unwrap_or_else(|| draft.to_placeholder_record(id.clone()))
            }
            None => find_by_name(library, &draft.name).unwrap_or_else(|| {
                debug!(%name, "rebuild.new_exercise_placeholder");
                draft.to_placeholder_record(ExerciseId::placeholder(&draft.name))
            }),
        }),
    }
}

fn find_by_id(library: &[ExerciseRecord], id: &ExerciseId) -> Option<ExerciseRecord> {
    library.iter().find(|record| &record.id == id).cloned()
}

fn find_by_name(library: &[ExerciseRecord], name: &str) -> Option<ExerciseRecord> {
    let wanted = name.trim().to_lowercase();
    library
        .iter()
        .find(|record| record.name.trim().to_lowercase() == wanted)
        .cloned()
}

fn build_workout_exercise(
    id: String,
    exercise: &ImportedExercise,
    record: ExerciseRecord,
) -> WorkoutExercise {
    let instructions = exercise
        .instructions
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    let mut set = derive_set(format!("{}-set-1", id), exercise.duration.as_deref());
    set.notes = instructions.clone();

    WorkoutExercise {
        id,
        exercise: record,
        sets: vec![set],
        instructions,
    }
}

/// Single set inferred from a free-text duration: reps (with an optional `% 1RM`
/// label), else a minute/second span stored as rest, else the default set.
pub fn derive_set(id: String, duration: Option<&str>) -> ExerciseSet {
    let mut set = ExerciseSet::default_for(id);
    let Some(duration) = duration.map(str::trim).filter(|d| !d.is_empty()) else {
        return set;
    };

    if let Some(reps) = capture_number(&REPS_PATTERN, duration) {
        set.set_type = SetType::Normal;
        set.rest_seconds = DEFAULT_REST_SECONDS;
        set.reps = reps;
        set.weight = capture_text(&ONE_REP_MAX_PATTERN, duration).unwrap_or_default();
        return set;
    }

    if let Some(seconds) = parse_time_seconds(duration) {
        set.rest_seconds = seconds;
        set.reps = 0;
        set.weight = String::new();
        return set;
    }

    debug!(%duration, "rebuild.duration_unparsed");
    set
}

fn parse_time_seconds(duration: &str) -> Option<u32> {
    let captures = TIME_PATTERN.as_ref()?.captures(duration)?;
    let amount: u32 = captures.get(1)?.as_str().parse().ok()?;
    let unit = captures.get(2)?.as_str().to_lowercase();

    if unit == "min" {
        amount.checked_mul(60)
    } else {
        Some(amount)
    }
}

fn capture_number(pattern: &LazyLock<Option<Regex>>, text: &str) -> Option<u32> {
    pattern
        .as_ref()?
        .captures(text)
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn capture_text(pattern: &LazyLock<Option<Regex>>, text: &str) -> Option<String> {
    pattern
        .as_ref()?
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// Maps a free-text block label onto the closed session type set.
pub fn map_block_type(label: &str) -> SessionType {
    match label.trim().to_lowercase().as_str() {
        "normal" | "regular" => SessionType::Normal,
        "circuit" | "amrap" => SessionType::Circuit,
        // Ambiguous in practice; kept on normal until product decides otherwise.
        "interval" => SessionType::Normal,
        "superset" => SessionType::Superset,
        "warmup" | "warm-up" => SessionType::Warmup,
        "cooldown" | "cool-down" => SessionType::Cooldown,
        other => {
            warn!(block_type = %other, "rebuild.unknown_block_type");
            SessionType::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::resolution::{ResolutionEvent, reduce};

    fn record(id: &str, name: &str) -> ExerciseRecord {
        NewExerciseDraft::named(name).to_placeholder_record(ExerciseId::new(id))
    }

    fn exercise(name: &str, duration: Option<&str>) -> ImportedExercise {
        ImportedExercise {
            name: name.to_string(),
            duration: duration.map(str::to_string),
            instructions: None,
        }
    }

    fn block(name: &str, block_type: &str, exercises: Vec<ImportedExercise>) -> ImportedBlock {
        ImportedBlock {
            name: name.to_string(),
            block_type: block_type.to_string(),
            exercises,
        }
    }

    fn matched(pairs: &[(&str, &str)]) -> ResolutionMapping {
        pairs
            .iter()
            .fold(ResolutionMapping::new(), |mapping, (name, id)| {
                reduce(
                    mapping,
                    ResolutionEvent::ManualMatch {
                        name: name.to_string(),
                        exercise_id: ExerciseId::new(*id),
                    },
                    &[],
                )
            })
    }

    #[test]
    fn test_amrap_block_with_reps() {
        let library = vec![record("ex-9", "Burpees")];
        let blocks = vec![block(
            "Circuit 1",
            "AMRAP",
            vec![exercise("Burpees", Some("12 reps"))],
        )];

        let sessions = rebuild(&blocks, &matched(&[("Burpees", "ex-9")]), &library).unwrap();

        assert_eq!(sessions.len(), 1);
        let session = &sessions[0];
        assert_eq!(session.session_type, SessionType::Circuit);
        assert_eq!(session.name, "Circuit 1");
        assert_eq!(session.exercises.len(), 1);
        assert_eq!(session.exercises[0].exercise.id, ExerciseId::new("ex-9"));

        let set = &session.exercises[0].sets[0];
        assert_eq!(set.set_type, SetType::Normal);
        assert_eq!(set.set_number, 1);
        assert_eq!(set.reps, 12);
        assert_eq!(set.rest_seconds, 60);
        assert_eq!(set.weight, "");
    }

    #[test]
    fn test_unmatched_only_block_fails_rebuild() {
        let blocks = vec![block(
            "Circuit 1",
            "AMRAP",
            vec![exercise("Burpees", Some("12 reps"))],
        )];

        assert_eq!(
            rebuild(&blocks, &ResolutionMapping::new(), &[]),
            Err(RebuildError::NoExercisesMatched)
        );
    }

    #[test]
    fn test_unresolved_exercises_and_empty_blocks_are_dropped() {
        let library = vec![record("1", "Squat"), record("2", "Plank")];
        let blocks = vec![
            block("Warm Up", "warm-up", vec![exercise("Arm Circles", None)]),
            block(
                "Main",
                "superset",
                vec![
                    exercise("Squat", Some("5 reps")),
                    exercise("Mystery Move", Some("10 reps")),
                    exercise("Plank", Some("1 min")),
                ],
            ),
        ];
        let mut mapping = matched(&[("Squat", "1"), ("Plank", "2")]);
        mapping = reduce(
            mapping,
            ResolutionEvent::Replace {
                name: "Mystery Move".to_string(),
            },
            &library,
        );

        let sessions = rebuild(&blocks, &mapping, &library).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "session-1");
        assert_eq!(sessions[0].session_type, SessionType::Superset);

        let names: Vec<_> = sessions[0]
            .exercises
            .iter()
            .map(|e| e.exercise.name.as_str())
            .collect();
        assert_eq!(names, vec!["Squat", "Plank"]);
        assert_eq!(sessions[0].exercises[1].id, "session-1-exercise-2");
        assert_eq!(sessions[0].exercises[1].sets[0].rest_seconds, 60);
        assert!(sessions.iter().all(|s| !s.exercises.is_empty()));
    }

    #[test]
    fn test_empty_import_is_not_a_failure() {
        assert_eq!(rebuild(&[], &ResolutionMapping::new(), &[]), Ok(vec![]));
    }

    #[test]
    fn test_duration_parsing() {
        let set = derive_set("s".to_string(), Some("40 sec"));
        assert_eq!((set.rest_seconds, set.reps, set.weight.as_str()), (40, 0, ""));

        let set = derive_set("s".to_string(), Some("2 min"));
        assert_eq!(set.rest_seconds, 120);

        let set = derive_set("s".to_string(), Some("4 reps at 70% 1RM"));
        assert_eq!((set.reps, set.weight.as_str()), (4, "70%"));
        assert_eq!(set.rest_seconds, 60);

        let set = derive_set("s".to_string(), Some("8 Reps"));
        assert_eq!(set.reps, 8);

        let set = derive_set("s".to_string(), Some("70% 1RM"));
        assert_eq!(set, ExerciseSet::default_for("s".to_string()));

        let set = derive_set("s".to_string(), Some("until failure"));
        assert_eq!(set, ExerciseSet::default_for("s".to_string()));

        let set = derive_set("s".to_string(), None);
        assert_eq!(set.rest_seconds, DEFAULT_REST_SECONDS);
        assert_eq!(set.set_number, 1);
    }

    #[test]
    fn test_instructions_copied_to_set_notes() {
        let library = vec![record("1", "Plank")];
        let mut plank = exercise("Plank", Some("30 sec"));
        plank.instructions = Some(" Squeeze glutes ".to_string());
        let blocks = vec![block("Core", "normal", vec![plank])];

        let sessions = rebuild(&blocks, &matched(&[("Plank", "1")]), &library).unwrap();
        let workout_exercise = &sessions[0].exercises[0];
        assert_eq!(workout_exercise.instructions.as_deref(), Some("Squeeze glutes"));
        assert_eq!(workout_exercise.sets[0].notes.as_deref(), Some("Squeeze glutes"));
        assert_eq!(workout_exercise.sets[0].rest_seconds, 30);
    }

    #[test]
    fn test_block_type_mapping() {
        assert_eq!(map_block_type("Regular"), SessionType::Normal);
        assert_eq!(map_block_type("circuit"), SessionType::Circuit);
        assert_eq!(map_block_type("AMRAP"), SessionType::Circuit);
        assert_eq!(map_block_type("Interval"), SessionType::Normal);
        assert_eq!(map_block_type("SuperSet"), SessionType::Superset);
        assert_eq!(map_block_type("Warm-Up"), SessionType::Warmup);
        assert_eq!(map_block_type("cooldown"), SessionType::Cooldown);
        assert_eq!(map_block_type("EMOM"), SessionType::Normal);
        assert_eq!(map_block_type(""), SessionType::Normal);
    }

    #[test]
    fn test_new_exercise_prefers_returned_identity() {
        let library = vec![record("db-7", "Sled Push")];
        let mapping = reduce(
            ResolutionMapping::new(),
            ResolutionEvent::AddNew {
                name: "sled push".to_string(),
                draft: NewExerciseDraft::named("Sled Push"),
                exercise_id: Some(ExerciseId::new("db-7")),
            },
            &library,
        );
        let blocks = vec![block("Finisher", "normal", vec![exercise("sled push", None)])];

        let sessions = rebuild(&blocks, &mapping, &library).unwrap();
        assert_eq!(sessions[0].exercises[0].exercise, library[0]);

        // Library not refreshed yet: the returned identity still wins over a temp id
        let sessions = rebuild(&blocks, &mapping, &[]).unwrap();
        assert_eq!(sessions[0].exercises[0].exercise.id, ExerciseId::new("db-7"));
        assert_eq!(sessions[0].exercises[0].exercise.name, "Sled Push");
    }

    #[test]
    fn test_new_exercise_without_identity_uses_name_then_placeholder() {
        let mapping = reduce(
            ResolutionMapping::new(),
            ResolutionEvent::AddNew {
                name: "Sled Push".to_string(),
                draft: NewExerciseDraft::named("Sled Push"),
                exercise_id: None,
            },
            &[],
        );
        let blocks = vec![block("Finisher", "normal", vec![exercise("Sled Push", None)])];

        let refreshed = vec![record("db-7", "sled push")];
        let sessions = rebuild(&blocks, &mapping, &refreshed).unwrap();
        assert_eq!(sessions[0].exercises[0].exercise.id, ExerciseId::new("db-7"));

        let sessions = rebuild(&blocks, &mapping, &[]).unwrap();
        let placeholder = &sessions[0].exercises[0].exercise;
        assert_eq!(placeholder.id, ExerciseId::new("temp-sled-push"));
        assert!(placeholder.id.is_placeholder());
    }

    #[test]
    fn test_conservation_of_exercises() {
        let library = vec![record("1", "Squat"), record("2", "Lunge")];
        let blocks = vec![
            block(
                "A",
                "normal",
                vec![exercise("Squat", None), exercise("Lunge", None)],
            ),
            block(
                "B",
                "circuit",
                vec![exercise("Squat", Some("10 reps")), exercise("Row", None)],
            ),
        ];
        let mapping = matched(&[("Squat", "1"), ("Lunge", "2")]);

        let sessions = rebuild(&blocks, &mapping, &library).unwrap();
        let emitted: Vec<_> = sessions
            .iter()
            .flat_map(|s| s.exercises.iter().map(|e| e.exercise.name.as_str()))
            .collect();
        assert_eq!(emitted, vec!["Squat", "Lunge", "Squat"]);
        assert_eq!(sessions[1].id, "session-2");
    }
}
