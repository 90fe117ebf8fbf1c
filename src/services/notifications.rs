use serde::Serialize;

use crate::models::workout::WorkoutDraft;
use crate::services::rebuild::RebuildError;
use crate::services::registration::RegistrationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Info,
    Error,
}

/// Category plus message; presentation is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub category: NotificationCategory,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            category: NotificationCategory::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            category: NotificationCategory::Error,
            message: message.into(),
        }
    }
}

impl From<&RegistrationError> for Notification {
    fn from(error: &RegistrationError) -> Self {
        Notification::error(error.to_string())
    }
}

impl From<&RebuildError> for Notification {
    fn from(error: &RebuildError) -> Self {
        match error {
            RebuildError::NoExercisesMatched => Notification::error(
                "No exercises could be matched. Match at least one exercise and try again.",
            ),
        }
    }
}

pub fn auto_match_notification(auto_matched: usize, total: usize) -> Notification {
    match (auto_matched, total) {
        (_, 0) => Notification::info("No exercises found in the import"),
        (matched, total) if matched == total => {
            Notification::info(format!("All {} exercises matched automatically", total))
        }
        (matched, total) => Notification::info(format!(
            "{} of {} exercises matched automatically, {} need review",
            matched,
            total,
            total - matched
        )),
    }
}

pub fn completion_notification(draft: &WorkoutDraft) -> Notification {
    let exercise_count: usize = draft
        .sessions
        .iter()
        .map(|session| session.exercises.len())
        .sum();

    Notification::info(format!(
        "Imported {} {} with {} {}",
        draft.sessions.len(),
        plural(draft.sessions.len(), "session", "sessions"),
        exercise_count,
        plural(exercise_count, "exercise", "exercises")
    ))
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}
