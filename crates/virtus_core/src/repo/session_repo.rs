//! Training session repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist sessions and their ordered exercise slots.
//! - Provide the dependent rows that guard exercise deletion.
//!
//! # Invariants
//! - Slot positions are allocated as `MAX(position) + 1` inside one transaction.
//! - Deleting a session removes its slots (`ON DELETE CASCADE`).

use crate::model::client::ClientId;
use crate::model::exercise::ExerciseId;
use crate::model::session::{Session, SessionExercise, SessionId};
use crate::repo::{
    format_date, map_write_error, now_epoch_secs, parse_date, parse_optional_uuid, parse_uuid,
    RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const ENTITY: &str = "session";

const SESSION_SELECT_SQL: &str = "SELECT
    id,
    client_id,
    session_date,
    title,
    created_at
FROM sessions";

pub trait SessionRepository {
    fn create_session(&self, session: &Session) -> RepoResult<Session>;
    fn get_session(&self, id: SessionId) -> RepoResult<Option<Session>>;
    /// Lists sessions newest first, optionally restricted to one client.
    fn list_sessions(&self, client_id: Option<ClientId>) -> RepoResult<Vec<Session>>;
    /// Appends `exercise_id` at the end of the session's exercise list.
    fn add_session_exercise(
        &self,
        session_id: SessionId,
        exercise_id: ExerciseId,
    ) -> RepoResult<SessionExercise>;
    fn list_session_exercises(&self, session_id: SessionId) -> RepoResult<Vec<SessionExercise>>;
    fn delete_session(&self, id: SessionId) -> RepoResult<()>;
}

pub struct SqliteSessionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSessionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SessionRepository for SqliteSessionRepository<'_> {
    fn create_session(&self, session: &Session) -> RepoResult<Session> {
        let now = now_epoch_secs();
        self.conn
            .execute(
                "INSERT INTO sessions (id, client_id, session_date, title, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    session.id.to_string(),
                    session.client_id.map(|id| id.to_string()),
                    format_date(session.session_date),
                    session.title.as_deref(),
                    now,
                ],
            )
            .map_err(|err| map_write_error(err, ENTITY))?;

        let mut created = session.clone();
        created.created_at = now;
        Ok(created)
    }

    fn get_session(&self, id: SessionId) -> RepoResult<Option<Session>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SESSION_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_session_row(row)?));
        }
        Ok(None)
    }

    fn list_sessions(&self, client_id: Option<ClientId>) -> RepoResult<Vec<Session>> {
        let mut sql = format!("{SESSION_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(client_id) = client_id {
            sql.push_str(" AND client_id = ?");
            bind_values.push(Value::Text(client_id.to_string()));
        }
        sql.push_str(" ORDER BY session_date DESC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut sessions = Vec::new();
        while let Some(row) = rows.next()? {
            sessions.push(parse_session_row(row)?);
        }
        Ok(sessions)
    }

    fn add_session_exercise(
        &self,
        session_id: SessionId,
        exercise_id: ExerciseId,
    ) -> RepoResult<SessionExercise> {
        let tx = self.conn.unchecked_transaction()?;
        ensure_exists(&tx, "sessions", ENTITY, session_id)?;
        ensure_exists(&tx, "exercises", "exercise", exercise_id)?;

        let position: u32 = tx.query_row(
            "SELECT COALESCE(MAX(position), 0) + 1
             FROM session_exercises
             WHERE session_id = ?1;",
            [session_id.to_string()],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO session_exercises (session_id, exercise_id, position)
             VALUES (?1, ?2, ?3);",
            params![session_id.to_string(), exercise_id.to_string(), position],
        )?;
        tx.commit()?;

        Ok(SessionExercise {
            session_id,
            exercise_id,
            position,
        })
    }

    fn list_session_exercises(&self, session_id: SessionId) -> RepoResult<Vec<SessionExercise>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, exercise_id, position
             FROM session_exercises
             WHERE session_id = ?1
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([session_id.to_string()])?;
        let mut slots = Vec::new();
        while let Some(row) = rows.next()? {
            let session_text: String = row.get("session_id")?;
            let exercise_text: String = row.get("exercise_id")?;
            slots.push(SessionExercise {
                session_id: parse_uuid(&session_text, "session_exercises.session_id")?,
                exercise_id: parse_uuid(&exercise_text, "session_exercises.exercise_id")?,
                position: row.get("position")?,
            });
        }
        Ok(slots)
    }

    fn delete_session(&self, id: SessionId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM sessions WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }
        Ok(())
    }
}

fn parse_session_row(row: &Row<'_>) -> RepoResult<Session> {
    let id_text: String = row.get("id")?;
    let date_text: String = row.get("session_date")?;
    Ok(Session {
        id: parse_uuid(&id_text, "sessions.id")?,
        client_id: parse_optional_uuid(row.get("client_id")?, "sessions.client_id")?,
        session_date: parse_date(&date_text, "sessions.session_date")?,
        title: row.get("title")?,
        created_at: row.get("created_at")?,
    })
}

fn ensure_exists(
    conn: &Connection,
    table: &'static str,
    entity: &'static str,
    id: uuid::Uuid,
) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id.to_string()],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepoError::not_found(entity, id))
    }
}
