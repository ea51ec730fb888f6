use chrono::NaiveDate;
use uuid::Uuid;
use virtus_core::db::open_db_in_memory;
use virtus_core::repo::client_repo::{ClientRepository, SqliteClientRepository};
use virtus_core::repo::exercise_repo::{ExerciseRepository, SqliteExerciseRepository};
use virtus_core::repo::session_repo::{SessionRepository, SqliteSessionRepository};
use virtus_core::{Client, Exercise, Session};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn exercises_are_appended_in_order() {
    let store = open_db_in_memory().unwrap();
    let exercises = SqliteExerciseRepository::new(store.conn());
    let sessions = SqliteSessionRepository::new(store.conn());

    let squat = exercises
        .create_exercise(&Exercise::new("Squat", "QUADRICEPS"))
        .unwrap();
    let row = exercises
        .create_exercise(&Exercise::new("Rowing barre", "DORSAUX"))
        .unwrap();
    let mut session = Session::new(None, date(2024, 2, 1));
    session.title = Some("Bas du corps".to_string());
    let session = sessions.create_session(&session).unwrap();

    let first = sessions.add_session_exercise(session.id, squat.id).unwrap();
    let second = sessions.add_session_exercise(session.id, row.id).unwrap();
    let third = sessions.add_session_exercise(session.id, squat.id).unwrap();
    assert_eq!((first.position, second.position, third.position), (1, 2, 3));

    let slots = sessions.list_session_exercises(session.id).unwrap();
    let ids: Vec<_> = slots.iter().map(|slot| slot.exercise_id).collect();
    assert_eq!(ids, vec![squat.id, row.id, squat.id]);

    let loaded = sessions.get_session(session.id).unwrap().unwrap();
    assert_eq!(loaded.title.as_deref(), Some("Bas du corps"));
}

#[test]
fn adding_to_unknown_session_or_exercise_is_not_found() {
    let store = open_db_in_memory().unwrap();
    let exercises = SqliteExerciseRepository::new(store.conn());
    let sessions = SqliteSessionRepository::new(store.conn());
    let squat = exercises
        .create_exercise(&Exercise::new("Squat", "QUADRICEPS"))
        .unwrap();
    let session = sessions
        .create_session(&Session::new(None, date(2024, 2, 1)))
        .unwrap();

    assert!(sessions
        .add_session_exercise(Uuid::new_v4(), squat.id)
        .unwrap_err()
        .is_not_found());
    assert!(sessions
        .add_session_exercise(session.id, Uuid::new_v4())
        .unwrap_err()
        .is_not_found());
    assert!(sessions.list_session_exercises(session.id).unwrap().is_empty());
}

#[test]
fn list_filters_by_client_newest_first() {
    let store = open_db_in_memory().unwrap();
    let clients = SqliteClientRepository::new(store.conn());
    let sessions = SqliteSessionRepository::new(store.conn());
    let ada = clients
        .create_client(&Client::new("Ada", "Lovelace", date(1990, 12, 10)))
        .unwrap();

    let older = sessions
        .create_session(&Session::new(Some(ada.id), date(2024, 1, 10)))
        .unwrap();
    let newer = sessions
        .create_session(&Session::new(Some(ada.id), date(2024, 3, 10)))
        .unwrap();
    sessions
        .create_session(&Session::new(None, date(2024, 2, 10)))
        .unwrap();

    let for_ada: Vec<_> = sessions
        .list_sessions(Some(ada.id))
        .unwrap()
        .into_iter()
        .map(|session| session.id)
        .collect();
    assert_eq!(for_ada, vec![newer.id, older.id]);
    assert_eq!(sessions.list_sessions(None).unwrap().len(), 3);
}

#[test]
fn deleting_a_session_removes_its_slots() {
    let store = open_db_in_memory().unwrap();
    let exercises = SqliteExerciseRepository::new(store.conn());
    let sessions = SqliteSessionRepository::new(store.conn());
    let squat = exercises
        .create_exercise(&Exercise::new("Squat", "QUADRICEPS"))
        .unwrap();
    let session = sessions
        .create_session(&Session::new(None, date(2024, 2, 1)))
        .unwrap();
    sessions.add_session_exercise(session.id, squat.id).unwrap();

    sessions.delete_session(session.id).unwrap();

    let remaining: i64 = store
        .conn()
        .query_row("SELECT COUNT(*) FROM session_exercises;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
    assert!(sessions.delete_session(session.id).unwrap_err().is_not_found());
}
