use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::models::exercise::ExerciseRecord;

pub const MAX_SUGGESTIONS: usize = 5;

/// Abbreviations and phrasings expanded on the query before retrying containment.
const SYNONYMS: &[(&str, &str)] = &[
    ("bb", "barbell"),
    ("db", "dumbbell"),
    ("dbs", "dumbbell"),
    ("bw", "bodyweight"),
    ("kb", "kettlebell"),
    ("kbs", "kettlebell"),
    ("sl", "single leg"),
    ("single-leg", "single leg"),
    ("one leg", "single leg"),
    ("one arm", "single arm"),
    ("single-arm", "single arm"),
    ("rdl", "romanian deadlift"),
    ("ohp", "overhead press"),
    ("pushup", "push up"),
    ("push-up", "push up"),
    ("pullup", "pull up"),
    ("pull-up", "pull up"),
];

static SYNONYM_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    SYNONYMS
        .iter()
        .filter_map(|(short, long)| {
            Regex::new(&format!(r"(?i)(^|[^\w-]){}($|[^\w-])", regex::escape(short)))
                .ok()
                .map(|pattern| (pattern, *long))
        })
        .collect()
});

static EQUIPMENT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(barbell|dumbbell|bodyweight|assisted|machine|cable|kettlebell)s?\b").ok()
});

static WHITESPACE_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s+").ok());

/// Ranked library suggestions for a free-text exercise name.
///
/// Each library record contributes at most once, through the first heuristic it
/// satisfies: exact name (moved to the front), substring containment, containment
/// after synonym expansion, then containment with equipment words removed. Output is
/// de-duplicated by identity and capped at [`MAX_SUGGESTIONS`].
pub fn find_matches(name: &str, library: &[ExerciseRecord]) -> Vec<ExerciseRecord> {
    let query = normalize(name);
    if query.is_empty() {
        return Vec::new();
    }

    let expanded_query = expand_synonyms(&query);
    let stripped_query = strip_equipment(&query);

    let mut matches: Vec<&ExerciseRecord> = Vec::new();

    for record in library {
        let candidate = normalize(&record.name);
        if candidate.is_empty() {
            continue;
        }

        if candidate == query {
            matches.insert(0, record);
        } else if contains_either(&candidate, &query) {
            matches.push(record);
        } else if contains_either(&candidate, &expanded_query) {
            matches.push(record);
        } else {
            let stripped_candidate = strip_equipment(&candidate);
            if !stripped_query.is_empty()
                && !stripped_candidate.is_empty()
                && contains_either(&stripped_candidate, &stripped_query)
            {
                matches.push(record);
            }
        }
    }

    let mut seen = HashSet::new();
    matches
        .into_iter()
        .filter(|&record| seen.insert(&record.id))
        .take(MAX_SUGGESTIONS)
        .cloned()
        .collect()
}

/// Case-insensitive substring filter over the whole library, used for free-text search.
pub fn search_library(query: &str, library: &[ExerciseRecord]) -> Vec<ExerciseRecord> {
    let query = normalize(query);
    if query.is_empty() {
        return Vec::new();
    }

    library
        .iter()
        .filter(|record| record.name.to_lowercase().contains(&query))
        .cloned()
        .collect()
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn contains_either(left: &str, right: &str) -> bool {
    left.contains(right) || right.contains(left)
}

fn expand_synonyms(query: &str) -> String {
    SYNONYM_PATTERNS
        .iter()
        .fold(query.to_string(), |expanded, (pattern, replacement)| {
            pattern
                .replace_all(&expanded, format!("${{1}}{}${{2}}", replacement))
                .into_owned()
        })
}

fn strip_equipment(value: &str) -> String {
    let stripped = match EQUIPMENT_PATTERN.as_ref() {
        Some(pattern) => pattern.replace_all(value, " ").into_owned(),
        None => value.to_string(),
    };

    match WHITESPACE_PATTERN.as_ref() {
        Some(pattern) => pattern.replace_all(stripped.trim(), " ").into_owned(),
        None => stripped.trim().to_string(),
    }
}
