//! Exercise catalogue use-case service.
//!
//! # Responsibility
//! - Derive slugs from names on create and rename.
//! - Reject a second active exercise with the same name before the write.
//!
//! # Invariants
//! - Retired exercises never block a name.
//! - Service APIs never bypass repository persistence contracts.

use crate::model::exercise::{Exercise, ExerciseId};
use crate::repo::exercise_repo::{ExerciseListQuery, ExerciseRepository};
use crate::repo::{RepoError, RepoResult};
use crate::search::exercise_search::ExerciseSearch;
use crate::text::normalize::slugify;

const ENTITY: &str = "exercise";

pub struct ExerciseService<R: ExerciseRepository> {
    repo: R,
}

impl<R: ExerciseRepository> ExerciseService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a catalogue entry.
    ///
    /// # Contract
    /// - `slug` is recomputed from the trimmed `name`.
    /// - Returns `DuplicateKey` when an active exercise already uses the name.
    pub fn create_exercise(&self, exercise: &Exercise) -> RepoResult<Exercise> {
        let mut draft = exercise.clone();
        draft.name = draft.name.trim().to_string();
        draft.slug = slugify(&draft.name);

        self.ensure_name_available(&draft.name, None)?;
        self.repo.create_exercise(&draft)
    }

    /// Replaces every mutable field of an existing exercise.
    ///
    /// Renaming re-derives the slug and re-runs the name pre-check.
    pub fn update_exercise(&self, exercise: &Exercise) -> RepoResult<Exercise> {
        let existing = self
            .repo
            .get_exercise(exercise.id)?
            .ok_or_else(|| RepoError::not_found(ENTITY, exercise.id))?;

        let mut draft = exercise.clone();
        draft.name = draft.name.trim().to_string();
        draft.slug = slugify(&draft.name);
        if draft.name != existing.name && draft.is_active {
            self.ensure_name_available(&draft.name, Some(existing.id))?;
        }
        self.repo.update_exercise(&draft)
    }

    pub fn get_exercise(&self, id: ExerciseId) -> RepoResult<Option<Exercise>> {
        self.repo.get_exercise(id)
    }

    pub fn list_exercises(&self, query: &ExerciseListQuery) -> RepoResult<Vec<Exercise>> {
        self.repo.list_exercises(query)
    }

    pub fn search_exercises(&self, criteria: &ExerciseSearch) -> RepoResult<Vec<Exercise>> {
        self.repo.search_exercises(criteria)
    }

    /// Retires an exercise; fails with `ConflictingReference` while a
    /// session still lists it.
    pub fn retire_exercise(&self, id: ExerciseId) -> RepoResult<()> {
        self.repo.soft_delete_exercise(id)
    }

    fn ensure_name_available(&self, name: &str, owner: Option<ExerciseId>) -> RepoResult<()> {
        match self.repo.get_exercise_by_name(name)? {
            Some(found) if found.is_active && Some(found.id) != owner => {
                Err(RepoError::DuplicateKey {
                    entity: ENTITY,
                    detail: format!("an active exercise is already named `{name}`"),
                })
            }
            _ => Ok(()),
        }
    }
}
