use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::models::exercise::{ExerciseId, ExerciseRecord, NewExerciseDraft};
use crate::models::import::UnmatchedExerciseName;
use crate::services::matcher;

/// Where a single imported exercise name currently stands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Unresolved,
    MatchedExisting {
        exercise_id: ExerciseId,
    },
    /// `exercise_id` is the identity returned by registration, when known.
    MatchedNew {
        draft: NewExerciseDraft,
        exercise_id: Option<ExerciseId>,
    },
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Resolution::Unresolved)
    }
}

/// Name -> resolution for one import session. A name is in exactly one state at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolutionMapping {
    entries: BTreeMap<String, Resolution>,
    completed: bool,
}

impl ResolutionMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` means the name has never been seen, which also counts as unresolved.
    pub fn get(&self, name: &str) -> Option<&Resolution> {
        self.entries.get(name)
    }

    pub fn is_resolved(&self, name: &str) -> bool {
        self.get(name).is_some_and(Resolution::is_resolved)
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn resolved_count(&self) -> usize {
        self.entries.values().filter(|r| r.is_resolved()).count()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Resolution)> {
        self.entries
            .iter()
            .map(|(name, resolution)| (name.as_str(), resolution))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ResolutionEvent {
    /// Auto-accept exact library matches for names not seen before.
    AutoMatch { names: Vec<String> },
    ManualMatch {
        name: String,
        exercise_id: ExerciseId,
    },
    AddNew {
        name: String,
        draft: NewExerciseDraft,
        exercise_id: Option<ExerciseId>,
    },
    Replace { name: String },
    Complete,
}

/// Applies one event to the mapping. Pure apart from logging; `library` is only read
/// by `AutoMatch`.
pub fn reduce(
    mut mapping: ResolutionMapping,
    event: ResolutionEvent,
    library: &[ExerciseRecord],
) -> ResolutionMapping {
    if mapping.completed {
        warn!(?event, "resolution.event_after_complete_ignored");
        return mapping;
    }

    match event {
        ResolutionEvent::AutoMatch { names } => {
            for name in names {
                if mapping.entries.contains_key(&name) {
                    continue;
                }

                let resolution = match exact_suggestion(&name, library) {
                    Some(record) => {
                        debug!(%name, exercise_id = %record.id, "resolution.auto_matched");
                        Resolution::MatchedExisting {
                            exercise_id: record.id.clone(),
                        }
                    }
                    None => Resolution::Unresolved,
                };
                mapping.entries.insert(name, resolution);
            }
        }
        ResolutionEvent::ManualMatch { name, exercise_id } => {
            debug!(%name, %exercise_id, "resolution.manual_match");
            mapping
                .entries
                .insert(name, Resolution::MatchedExisting { exercise_id });
        }
        ResolutionEvent::AddNew {
            name,
            draft,
            exercise_id,
        } => {
            debug!(%name, exercise_id = ?exercise_id, "resolution.add_new");
            mapping
                .entries
                .insert(name, Resolution::MatchedNew { draft, exercise_id });
        }
        ResolutionEvent::Replace { name } => {
            debug!(%name, "resolution.replace");
            mapping.entries.insert(name, Resolution::Unresolved);
        }
        ResolutionEvent::Complete => {
            debug!(
                resolved = mapping.resolved_count(),
                total = mapping.entries.len(),
                "resolution.complete"
            );
            mapping.completed = true;
        }
    }

    mapping
}

fn exact_suggestion<'a>(name: &str, library: &'a [ExerciseRecord]) -> Option<&'a ExerciseRecord> {
    let wanted = name.to_lowercase();
    let suggestions = matcher::find_matches(name, library);
    let exact = suggestions
        .iter()
        .find(|record| record.name.to_lowercase() == wanted)?;
    library.iter().find(|record| record.id == exact.id)
}

/// Suggestions shown next to the unmatched list.
///
/// Without search text this is the fuzzy suggestion list of the *first* name that is
/// still unresolved, whichever name is being edited. With search text it is a plain
/// substring filter over the whole library.
pub fn display_suggestions(
    unmatched: &[UnmatchedExerciseName],
    mapping: &ResolutionMapping,
    library: &[ExerciseRecord],
    search: &str,
) -> Vec<ExerciseRecord> {
    if !search.trim().is_empty() {
        return matcher::search_library(search, library);
    }

    first_unresolved_suggestions(unmatched, mapping)
}

pub fn first_unresolved_suggestions(
    unmatched: &[UnmatchedExerciseName],
    mapping: &ResolutionMapping,
) -> Vec<ExerciseRecord> {
    unmatched
        .iter()
        .find(|entry| !mapping.is_resolved(&entry.name))
        .map(|entry| entry.suggestions.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str) -> ExerciseRecord {
        NewExerciseDraft::named(name).to_placeholder_record(ExerciseId::new(id))
    }

    fn library() -> Vec<ExerciseRecord> {
        vec![
            record("1", "Barbell Bench Press"),
            record("2", "Burpees"),
            record("3", "Goblet Squat"),
        ]
    }

    fn auto_match(names: &[&str]) -> ResolutionEvent {
        ResolutionEvent::AutoMatch {
            names: names.iter().map(|name| name.to_string()).collect(),
        }
    }

    fn unmatched(name: &str, library: &[ExerciseRecord]) -> UnmatchedExerciseName {
        UnmatchedExerciseName {
            name: name.to_string(),
            instructions: None,
            suggestions: matcher::find_matches(name, library),
        }
    }

    #[test]
    fn test_auto_match_accepts_exact_names_only() {
        let library = library();
        let mapping = reduce(
            ResolutionMapping::new(),
            auto_match(&["burpees", "BB Bench", "Lunges"]),
            &library,
        );

        assert_eq!(
            mapping.get("burpees"),
            Some(&Resolution::MatchedExisting {
                exercise_id: ExerciseId::new("2")
            })
        );
        assert_eq!(mapping.get("BB Bench"), Some(&Resolution::Unresolved));
        assert_eq!(mapping.get("Lunges"), Some(&Resolution::Unresolved));
        assert_eq!(mapping.resolved_count(), 1);
    }

    #[test]
    fn test_auto_match_is_idempotent() {
        let library = library();
        let once = reduce(
            ResolutionMapping::new(),
            auto_match(&["Burpees", "Goblet Squat", "Lunges"]),
            &library,
        );
        let twice = reduce(
            once.clone(),
            auto_match(&["Burpees", "Goblet Squat", "Lunges"]),
            &library,
        );
        assert_eq!(once, twice);
    }

    #[test]
    fn test_auto_match_does_not_undo_replace() {
        let library = library();
        let mapping = reduce(ResolutionMapping::new(), auto_match(&["Burpees"]), &library);
        let mapping = reduce(
            mapping,
            ResolutionEvent::Replace {
                name: "Burpees".to_string(),
            },
            &library,
        );
        let mapping = reduce(mapping, auto_match(&["Burpees"]), &library);
        assert!(!mapping.is_resolved("Burpees"));
    }

    #[test]
    fn test_manual_match_then_add_new_stays_exclusive() {
        let library = library();
        let mapping = reduce(
            ResolutionMapping::new(),
            ResolutionEvent::ManualMatch {
                name: "BB Bench".to_string(),
                exercise_id: ExerciseId::new("1"),
            },
            &library,
        );
        let mapping = reduce(
            mapping,
            ResolutionEvent::AddNew {
                name: "BB Bench".to_string(),
                draft: NewExerciseDraft::named("BB Bench"),
                exercise_id: Some(ExerciseId::new("new-1")),
            },
            &library,
        );

        assert_eq!(mapping.entries().count(), 1);
        assert!(matches!(
            mapping.get("BB Bench"),
            Some(Resolution::MatchedNew { exercise_id: Some(id), .. }) if id.as_str() == "new-1"
        ));

        let mapping = reduce(
            mapping,
            ResolutionEvent::ManualMatch {
                name: "BB Bench".to_string(),
                exercise_id: ExerciseId::new("1"),
            },
            &library,
        );
        assert_eq!(
            mapping.get("BB Bench"),
            Some(&Resolution::MatchedExisting {
                exercise_id: ExerciseId::new("1")
            })
        );
    }

    #[test]
    fn test_replace_returns_to_unresolved() {
        let library = library();
        let mapping = reduce(
            ResolutionMapping::new(),
            ResolutionEvent::AddNew {
                name: "Lunges".to_string(),
                draft: NewExerciseDraft::named("Lunges"),
                exercise_id: None,
            },
            &library,
        );
        assert!(mapping.is_resolved("Lunges"));

        let mapping = reduce(
            mapping,
            ResolutionEvent::Replace {
                name: "Lunges".to_string(),
            },
            &library,
        );
        assert_eq!(mapping.get("Lunges"), Some(&Resolution::Unresolved));
    }

    #[test]
    fn test_events_after_complete_are_ignored() {
        let library = library();
        let mapping = reduce(ResolutionMapping::new(), ResolutionEvent::Complete, &library);
        assert!(mapping.is_completed());

        let mapping = reduce(
            mapping,
            ResolutionEvent::ManualMatch {
                name: "Lunges".to_string(),
                exercise_id: ExerciseId::new("3"),
            },
            &library,
        );
        assert!(mapping.get("Lunges").is_none());
    }

    #[test]
    fn test_display_suggestions_follow_first_unresolved_name() {
        let library = library();
        let unmatched = vec![unmatched("Burpees", &library), unmatched("Squat", &library)];
        let mapping = reduce(
            ResolutionMapping::new(),
            auto_match(&["Burpees", "Squat"]),
            &library,
        );

        let suggestions = display_suggestions(&unmatched, &mapping, &library, "");
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].name, "Goblet Squat");
    }

    #[test]
    fn test_display_suggestions_with_search_ignore_fuzzy_ranking() {
        let library = library();
        let unmatched = vec![unmatched("Squat", &library)];
        let mapping = ResolutionMapping::new();

        let suggestions = display_suggestions(&unmatched, &mapping, &library, "B");
        let names: Vec<_> = suggestions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Barbell Bench Press", "Burpees", "Goblet Squat"]);
    }

    #[test]
    fn test_display_suggestions_empty_when_everything_resolved() {
        let library = library();
        let unmatched = vec![unmatched("Burpees", &library)];
        let mapping = reduce(ResolutionMapping::new(), auto_match(&["Burpees"]), &library);
        assert!(display_suggestions(&unmatched, &mapping, &library, "  ").is_empty());
    }

    #[test]
    fn test_event_deserializes_from_tagged_json() {
        let event: ResolutionEvent = serde_json::from_str(
            r#"{"event": "manual_match", "name": "BB Bench", "exercise_id": "1"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ResolutionEvent::ManualMatch {
                name: "BB Bench".to_string(),
                exercise_id: ExerciseId::new("1"),
            }
        );
    }
}
