//! Exercise catalogue search.
//!
//! # Invariants
//! - Each omitted criterion contributes no clause at all.
//! - Code sets are translated to stored labels before binding.
//! - Text matches when the normalized query is a substring of the normalized
//!   name or cues. The normalizer is passed in, not registered on the
//!   connection.
//! - Only active exercises are returned unless `include_inactive` is set.

use crate::model::exercise::Exercise;
use crate::model::vocabulary::{Vocabulary, EQUIPMENT, MOVEMENT_PATTERNS, PRIMARY_MUSCLES};
use crate::repo::exercise_repo::{parse_exercise_row, EXERCISE_SELECT_SQL};
use crate::repo::RepoResult;
use crate::text::normalize::Normalizer;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::ops::RangeInclusive;

/// Search criteria; `ExerciseSearch::default()` matches every active exercise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExerciseSearch {
    /// Free text matched against name and cues.
    pub text: Option<String>,
    /// Primary muscle codes; empty means any.
    pub primary_muscles: Vec<String>,
    /// Equipment codes; empty means any.
    pub equipment: Vec<String>,
    /// Movement pattern codes; empty means any.
    pub patterns: Vec<String>,
    /// Inclusive difficulty bounds. Exercises without difficulty never match.
    pub difficulty: Option<RangeInclusive<i64>>,
    pub include_inactive: bool,
    /// Maximum results, applied after text matching.
    pub limit: Option<u32>,
}

impl ExerciseSearch {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Runs `criteria` against the catalogue, folding text with `normalizer`.
pub fn search_exercises(
    conn: &Connection,
    criteria: &ExerciseSearch,
    normalizer: Normalizer,
) -> RepoResult<Vec<Exercise>> {
    if criteria.limit == Some(0) {
        return Ok(Vec::new());
    }

    let mut sql = format!("{EXERCISE_SELECT_SQL} WHERE 1 = 1");
    let mut bind_values: Vec<Value> = Vec::new();

    if !criteria.include_inactive {
        sql.push_str(" AND is_active = 1");
    }

    push_label_set(
        &mut sql,
        &mut bind_values,
        "primary_muscle",
        &criteria.primary_muscles,
        &PRIMARY_MUSCLES,
    );
    push_label_set(
        &mut sql,
        &mut bind_values,
        "equipment",
        &criteria.equipment,
        &EQUIPMENT,
    );
    push_label_set(
        &mut sql,
        &mut bind_values,
        "pattern",
        &criteria.patterns,
        &MOVEMENT_PATTERNS,
    );

    if let Some(range) = criteria.difficulty.as_ref() {
        sql.push_str(" AND difficulty BETWEEN ? AND ?");
        bind_values.push(Value::Integer(*range.start()));
        bind_values.push(Value::Integer(*range.end()));
    }

    sql.push_str(" ORDER BY name COLLATE NOCASE ASC, id ASC");

    let needle = criteria
        .text
        .as_deref()
        .filter(|text| !text.trim().is_empty())
        .map(normalizer)
        .filter(|folded| !folded.is_empty());

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut hits = Vec::new();

    while let Some(row) = rows.next()? {
        let exercise = parse_exercise_row(row)?;
        if let Some(needle) = needle.as_deref() {
            if !matches_text(&exercise, needle, normalizer) {
                continue;
            }
        }

        hits.push(exercise);
        if criteria
            .limit
            .is_some_and(|limit| hits.len() >= limit as usize)
        {
            break;
        }
    }

    Ok(hits)
}

fn matches_text(exercise: &Exercise, needle: &str, normalizer: Normalizer) -> bool {
    if normalizer(&exercise.name).contains(needle) {
        return true;
    }
    exercise
        .cues
        .as_deref()
        .is_some_and(|cues| normalizer(cues).contains(needle))
}

fn push_label_set(
    sql: &mut String,
    bind_values: &mut Vec<Value>,
    column: &str,
    codes: &[String],
    vocabulary: &Vocabulary,
) {
    if codes.is_empty() {
        return;
    }

    let placeholders = vec!["?"; codes.len()].join(", ");
    sql.push_str(&format!(" AND {column} IN ({placeholders})"));
    for code in codes {
        bind_values.push(Value::Text(vocabulary.label_for(code).to_string()));
    }
}
