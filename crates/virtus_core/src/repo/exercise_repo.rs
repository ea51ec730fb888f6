//! Exercise repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and search over the `exercises` catalogue.
//! - Translate vocabulary codes to stored labels on write and back on read.
//!
//! # Invariants
//! - Unknown codes are stored verbatim; unknown labels are read back verbatim.
//! - An exercise referenced by a session exercise is never retired or deleted.
//! - `created_at` / `updated_at` are stamped here with process time.

use crate::model::exercise::{Exercise, ExerciseId};
use crate::model::vocabulary::{EQUIPMENT, MOVEMENT_PATTERNS, PRIMARY_MUSCLES};
use crate::repo::{
    bool_to_int, int_to_bool, map_delete_error, map_write_error, now_epoch_secs, parse_uuid,
    RepoError, RepoResult,
};
use crate::search::exercise_search::{search_exercises, ExerciseSearch};
use crate::text::normalize::{normalize, Normalizer};
use log::{info, warn};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const ENTITY: &str = "exercise";

pub(crate) const EXERCISE_SELECT_SQL: &str = "SELECT
    id,
    name,
    slug,
    primary_muscle,
    secondary_muscles,
    equipment,
    pattern,
    difficulty,
    tempo,
    rep_range,
    rpe_default,
    rest_s_default,
    cues,
    image_path,
    is_active,
    created_at,
    updated_at
FROM exercises";

/// Simple listing filters; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExerciseListQuery {
    /// Case-insensitive substring of the exercise name.
    pub name: Option<String>,
    /// Primary muscle code.
    pub primary_muscle: Option<String>,
    /// Equipment code.
    pub equipment: Option<String>,
    pub include_inactive: bool,
}

/// Repository interface for exercise catalogue operations.
pub trait ExerciseRepository {
    fn create_exercise(&self, exercise: &Exercise) -> RepoResult<Exercise>;
    fn get_exercise(&self, id: ExerciseId) -> RepoResult<Option<Exercise>>;
    /// Looks up by name, preferring the active row when retired ones share it.
    fn get_exercise_by_name(&self, name: &str) -> RepoResult<Option<Exercise>>;
    fn update_exercise(&self, exercise: &Exercise) -> RepoResult<Exercise>;
    fn soft_delete_exercise(&self, id: ExerciseId) -> RepoResult<()>;
    fn delete_exercise(&self, id: ExerciseId) -> RepoResult<()>;
    fn list_exercises(&self, query: &ExerciseListQuery) -> RepoResult<Vec<Exercise>>;
    fn search_exercises(&self, criteria: &ExerciseSearch) -> RepoResult<Vec<Exercise>>;
    fn is_exercise_referenced(&self, id: ExerciseId) -> RepoResult<bool>;
}

/// SQLite-backed exercise repository.
pub struct SqliteExerciseRepository<'conn> {
    conn: &'conn Connection,
    normalizer: Normalizer,
}

impl<'conn> SqliteExerciseRepository<'conn> {
    /// Uses [`normalize`] for accent-insensitive text search.
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_normalizer(conn, normalize)
    }

    pub fn with_normalizer(conn: &'conn Connection, normalizer: Normalizer) -> Self {
        Self { conn, normalizer }
    }
}

impl ExerciseRepository for SqliteExerciseRepository<'_> {
    fn create_exercise(&self, exercise: &Exercise) -> RepoResult<Exercise> {
        let now = now_epoch_secs();
        let stored = StoredLabels::from_exercise(exercise)?;

        self.conn
            .execute(
                "INSERT INTO exercises (
                    id,
                    name,
                    slug,
                    primary_muscle,
                    secondary_muscles,
                    equipment,
                    pattern,
                    difficulty,
                    tempo,
                    rep_range,
                    rpe_default,
                    rest_s_default,
                    cues,
                    image_path,
                    is_active,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?16);",
                params![
                    exercise.id.to_string(),
                    exercise.name.as_str(),
                    exercise.slug.as_str(),
                    stored.primary_muscle,
                    stored.secondary_muscles,
                    stored.equipment,
                    stored.pattern,
                    exercise.difficulty,
                    exercise.tempo.as_deref(),
                    exercise.rep_range.as_deref(),
                    exercise.rpe_default,
                    exercise.rest_s_default,
                    exercise.cues.as_deref(),
                    exercise.image_path.as_deref(),
                    bool_to_int(exercise.is_active),
                    now,
                ],
            )
            .map_err(|err| map_write_error(err, ENTITY))?;

        let mut created = exercise.clone();
        created.created_at = now;
        created.updated_at = now;
        Ok(created)
    }

    fn get_exercise(&self, id: ExerciseId) -> RepoResult<Option<Exercise>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EXERCISE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_exercise_row(row)?));
        }
        Ok(None)
    }

    fn get_exercise_by_name(&self, name: &str) -> RepoResult<Option<Exercise>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EXERCISE_SELECT_SQL}
             WHERE name = ?1
             ORDER BY is_active DESC, updated_at DESC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_exercise_row(row)?));
        }
        Ok(None)
    }

    fn update_exercise(&self, exercise: &Exercise) -> RepoResult<Exercise> {
        let now = now_epoch_secs();
        let stored = StoredLabels::from_exercise(exercise)?;

        let changed = self
            .conn
            .execute(
                "UPDATE exercises
                 SET
                    name = ?1,
                    slug = ?2,
                    primary_muscle = ?3,
                    secondary_muscles = ?4,
                    equipment = ?5,
                    pattern = ?6,
                    difficulty = ?7,
                    tempo = ?8,
                    rep_range = ?9,
                    rpe_default = ?10,
                    rest_s_default = ?11,
                    cues = ?12,
                    image_path = ?13,
                    is_active = ?14,
                    updated_at = ?15
                 WHERE id = ?16;",
                params![
                    exercise.name.as_str(),
                    exercise.slug.as_str(),
                    stored.primary_muscle,
                    stored.secondary_muscles,
                    stored.equipment,
                    stored.pattern,
                    exercise.difficulty,
                    exercise.tempo.as_deref(),
                    exercise.rep_range.as_deref(),
                    exercise.rpe_default,
                    exercise.rest_s_default,
                    exercise.cues.as_deref(),
                    exercise.image_path.as_deref(),
                    bool_to_int(exercise.is_active),
                    now,
                    exercise.id.to_string(),
                ],
            )
            .map_err(|err| map_write_error(err, ENTITY))?;

        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, exercise.id));
        }

        self.get_exercise(exercise.id)?
            .ok_or_else(|| RepoError::not_found(ENTITY, exercise.id))
    }

    fn soft_delete_exercise(&self, id: ExerciseId) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        reject_if_referenced(&tx, id)?;

        let changed = tx.execute(
            "UPDATE exercises
             SET
                is_active = 0,
                updated_at = ?1
             WHERE id = ?2;",
            params![now_epoch_secs(), id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }

        tx.commit()?;
        info!("event=exercise_soft_delete module=repo status=ok exercise_id={id}");
        Ok(())
    }

    fn delete_exercise(&self, id: ExerciseId) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        reject_if_referenced(&tx, id)?;

        let changed = tx
            .execute("DELETE FROM exercises WHERE id = ?1;", [id.to_string()])
            .map_err(|err| map_delete_error(err, ENTITY, &id))?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }

        tx.commit()?;
        info!("event=exercise_delete module=repo status=ok exercise_id={id}");
        Ok(())
    }

    fn list_exercises(&self, query: &ExerciseListQuery) -> RepoResult<Vec<Exercise>> {
        let mut sql = format!("{EXERCISE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_inactive {
            sql.push_str(" AND is_active = 1");
        }

        if let Some(name) = query.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            sql.push_str(" AND name LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(format!("%{}%", escape_like(name))));
        }

        if let Some(code) = query.primary_muscle.as_deref() {
            sql.push_str(" AND primary_muscle = ?");
            bind_values.push(Value::Text(PRIMARY_MUSCLES.label_for(code).to_string()));
        }

        if let Some(code) = query.equipment.as_deref() {
            sql.push_str(" AND equipment = ?");
            bind_values.push(Value::Text(EQUIPMENT.label_for(code).to_string()));
        }

        sql.push_str(" ORDER BY name COLLATE NOCASE ASC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut exercises = Vec::new();
        while let Some(row) = rows.next()? {
            exercises.push(parse_exercise_row(row)?);
        }
        Ok(exercises)
    }

    fn search_exercises(&self, criteria: &ExerciseSearch) -> RepoResult<Vec<Exercise>> {
        search_exercises(self.conn, criteria, self.normalizer)
    }

    fn is_exercise_referenced(&self, id: ExerciseId) -> RepoResult<bool> {
        is_referenced(self.conn, id)
    }
}

/// Enumerated fields translated to their stored labels.
struct StoredLabels {
    primary_muscle: String,
    secondary_muscles: Option<String>,
    equipment: Option<String>,
    pattern: Option<String>,
}

impl StoredLabels {
    fn from_exercise(exercise: &Exercise) -> RepoResult<Self> {
        let secondary_muscles = if exercise.secondary_muscles.is_empty() {
            None
        } else {
            let labels = exercise
                .secondary_muscles
                .iter()
                .map(|code| PRIMARY_MUSCLES.label_for(code))
                .collect::<Vec<_>>();
            Some(serde_json::to_string(&labels).map_err(|err| {
                RepoError::InvalidData(format!("cannot encode secondary muscles: {err}"))
            })?)
        };

        Ok(Self {
            primary_muscle: PRIMARY_MUSCLES
                .label_for(&exercise.primary_muscle)
                .to_string(),
            secondary_muscles,
            equipment: exercise
                .equipment
                .as_deref()
                .map(|code| EQUIPMENT.label_for(code).to_string()),
            pattern: exercise
                .pattern
                .as_deref()
                .map(|code| MOVEMENT_PATTERNS.label_for(code).to_string()),
        })
    }
}

pub(crate) fn parse_exercise_row(row: &Row<'_>) -> RepoResult<Exercise> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "exercises.id")?;

    let primary_label: String = row.get("primary_muscle")?;
    let secondary_muscles = match row.get::<_, Option<String>>("secondary_muscles")? {
        Some(raw) if !raw.trim().is_empty() => serde_json::from_str::<Vec<String>>(&raw)
            .map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid secondary muscles `{raw}` in exercises.secondary_muscles"
                ))
            })?
            .iter()
            .map(|label| PRIMARY_MUSCLES.code_for(label).to_string())
            .collect(),
        _ => Vec::new(),
    };

    Ok(Exercise {
        id,
        name: row.get("name")?,
        slug: row.get("slug")?,
        primary_muscle: PRIMARY_MUSCLES.code_for(&primary_label).to_string(),
        secondary_muscles,
        equipment: row
            .get::<_, Option<String>>("equipment")?
            .map(|label| EQUIPMENT.code_for(&label).to_string()),
        pattern: row
            .get::<_, Option<String>>("pattern")?
            .map(|label| MOVEMENT_PATTERNS.code_for(&label).to_string()),
        difficulty: row.get("difficulty")?,
        tempo: row.get("tempo")?,
        rep_range: row.get("rep_range")?,
        rpe_default: row.get("rpe_default")?,
        rest_s_default: row.get("rest_s_default")?,
        cues: row.get("cues")?,
        image_path: row.get("image_path")?,
        is_active: int_to_bool(row.get("is_active")?, "exercises.is_active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn is_referenced(conn: &Connection, id: ExerciseId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM session_exercises
            WHERE exercise_id = ?1
        );",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn reject_if_referenced(conn: &Connection, id: ExerciseId) -> RepoResult<()> {
    if is_referenced(conn, id)? {
        warn!(
            "event=exercise_delete module=repo status=rejected error_code=conflicting_reference exercise_id={id}"
        );
        return Err(RepoError::ConflictingReference {
            entity: ENTITY,
            id: id.to_string(),
            referenced_by: "session_exercises",
        });
    }
    Ok(())
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
