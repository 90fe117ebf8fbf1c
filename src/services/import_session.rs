use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::models::exercise::{ExerciseId, ExerciseRecord, NewExerciseDraft};
use crate::models::import::{ImportMetadata, ImportResult, UnmatchedExerciseName};
use crate::models::workout::WorkoutDraft;
use crate::services::matcher;
use crate::services::rebuild::{self, RebuildError};
use crate::services::resolution::{self, Resolution, ResolutionEvent, ResolutionMapping};

/// One import being reconciled against a library snapshot.
#[derive(Debug, Clone)]
pub struct ImportSession {
    import: ImportResult,
    library: Vec<ExerciseRecord>,
    unmatched: Vec<UnmatchedExerciseName>,
    mapping: ResolutionMapping,
    started_at: DateTime<Utc>,
    registrations_in_flight: u32,
}

impl ImportSession {
    /// Collects the distinct names, precomputes their suggestions and auto-matches.
    pub fn start(import: ImportResult, library: Vec<ExerciseRecord>) -> Self {
        let unmatched: Vec<UnmatchedExerciseName> = import
            .unique_exercise_names()
            .into_iter()
            .map(|(name, instructions)| UnmatchedExerciseName {
                suggestions: matcher::find_matches(&name, &library),
                name,
                instructions,
            })
            .collect();

        let names = unmatched.iter().map(|entry| entry.name.clone()).collect();
        let mapping = resolution::reduce(
            ResolutionMapping::new(),
            ResolutionEvent::AutoMatch { names },
            &library,
        );

        info!(
            title = %import.metadata.title,
            block_count = import.blocks.len(),
            exercise_count = import.exercise_count(),
            name_count = unmatched.len(),
            auto_matched = mapping.resolved_count(),
            "import.session_started"
        );

        Self {
            import,
            library,
            unmatched,
            mapping,
            started_at: Utc::now(),
            registrations_in_flight: 0,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Older than `max_age` at `now` and not waiting on a registration.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.registrations_in_flight == 0 && now - self.started_at > max_age
    }

    pub fn has_registration_in_flight(&self) -> bool {
        self.registrations_in_flight > 0
    }

    /// Marks a registration as started; pair with [`Self::finish_registration`].
    pub fn begin_registration(&mut self) {
        self.registrations_in_flight += 1;
    }

    pub fn finish_registration(&mut self) {
        self.registrations_in_flight = self.registrations_in_flight.saturating_sub(1);
    }

    pub fn metadata(&self) -> &ImportMetadata {
        &self.import.metadata
    }

    pub fn unmatched(&self) -> &[UnmatchedExerciseName] {
        &self.unmatched
    }

    pub fn mapping(&self) -> &ResolutionMapping {
        &self.mapping
    }

    pub fn library(&self) -> &[ExerciseRecord] {
        &self.library
    }

    pub fn knows_name(&self, name: &str) -> bool {
        self.unmatched.iter().any(|entry| entry.name == name)
    }

    pub fn pending_names(&self) -> Vec<&str> {
        self.unmatched
            .iter()
            .filter(|entry| !self.mapping.is_resolved(&entry.name))
            .map(|entry| entry.name.as_str())
            .collect()
    }

    pub fn apply(&mut self, event: ResolutionEvent) {
        let mapping = std::mem::take(&mut self.mapping);
        self.mapping = resolution::reduce(mapping, event, &self.library);
    }

    pub fn suggestions(&self, search: &str) -> Vec<ExerciseRecord> {
        resolution::display_suggestions(&self.unmatched, &self.mapping, &self.library, search)
    }

    /// Records a successful registration: maps `name` to the stored identity and puts
    /// the record at the front of the snapshot.
    pub fn record_registration(
        &mut self,
        name: &str,
        draft: NewExerciseDraft,
        record: ExerciseRecord,
    ) {
        self.apply(ResolutionEvent::AddNew {
            name: name.to_string(),
            draft,
            exercise_id: Some(record.id.clone()),
        });

        self.library.retain(|existing| existing.id != record.id);
        self.library.insert(0, record);
    }

    /// Swaps in a fresher snapshot. Every record the mapping points at survives, even
    /// when the snapshot predates it or no longer lists it.
    pub fn refresh_library(&mut self, library: Vec<ExerciseRecord>) {
        let missing: Vec<ExerciseRecord> = self
            .library
            .iter()
            .filter(|record| !library.iter().any(|fresh| fresh.id == record.id))
            .filter(|record| self.is_referenced(&record.id))
            .cloned()
            .collect();

        debug!(
            record_count = library.len(),
            kept_records = missing.len(),
            "import.library_refreshed"
        );

        self.library = missing.into_iter().chain(library).collect();
    }

    fn is_referenced(&self, id: &ExerciseId) -> bool {
        self.mapping
            .entries()
            .any(|(_, resolution)| match resolution {
                Resolution::MatchedExisting { exercise_id } => exercise_id == id,
                Resolution::MatchedNew {
                    exercise_id: Some(exercise_id),
                    ..
                } => exercise_id == id,
                _ => false,
            })
    }

    /// Finalizes the mapping as-is and rebuilds the workout; unresolved names are left out.
    pub fn complete(mut self) -> Result<WorkoutDraft, RebuildError> {
        if self.registrations_in_flight > 0 {
            warn!(
                in_flight = self.registrations_in_flight,
                "import.completed_with_registration_in_flight"
            );
        }
        self.apply(ResolutionEvent::Complete);
        let draft = rebuild::build_workout_draft(&self.import, &self.mapping, &self.library)?;

        let placeholder_count = draft
            .sessions
            .iter()
            .flat_map(|session| &session.exercises)
            .filter(|exercise| exercise.exercise.id.is_placeholder())
            .count();

        info!(
            title = %draft.metadata.title,
            session_count = draft.sessions.len(),
            placeholder_count,
            skipped_names = self.pending_names().len(),
            "import.completed"
        );

        Ok(draft)
    }
}
