use chrono::NaiveDate;
use virtus_core::db::open_db_in_memory;
use virtus_core::repo::exercise_repo::{
    ExerciseListQuery, ExerciseRepository, SqliteExerciseRepository,
};
use virtus_core::repo::session_repo::{SessionRepository, SqliteSessionRepository};
use virtus_core::service::exercise_service::ExerciseService;
use virtus_core::{Exercise, RepoError, Session};

fn bench_press() -> Exercise {
    let mut exercise = Exercise::new("Développé couché", "PECTORAUX");
    exercise.secondary_muscles = vec!["TRICEPS".to_string(), "EPAULES".to_string()];
    exercise.equipment = Some("BAR".to_string());
    exercise.pattern = Some("PH".to_string());
    exercise.difficulty = Some(3);
    exercise.rpe_default = Some(8.0);
    exercise.rest_s_default = Some(120);
    exercise.cues = Some("Omoplates serrées".to_string());
    exercise
}

#[test]
fn create_derives_slug_and_round_trips_codes() {
    let store = open_db_in_memory().unwrap();
    let repo = SqliteExerciseRepository::new(store.conn());

    let created = repo.create_exercise(&bench_press()).unwrap();
    assert_eq!(created.slug, "developpe-couche");
    assert!(created.created_at > 0);
    assert_eq!(created.created_at, created.updated_at);

    let loaded = repo.get_exercise(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.primary_muscle, "PECTORAUX");
    assert_eq!(loaded.secondary_muscles, vec!["TRICEPS", "EPAULES"]);
    assert_eq!(loaded.equipment.as_deref(), Some("BAR"));
}

#[test]
fn enumerated_fields_are_stored_as_labels() {
    let store = open_db_in_memory().unwrap();
    let repo = SqliteExerciseRepository::new(store.conn());
    let created = repo.create_exercise(&bench_press()).unwrap();

    let (primary, secondary, equipment): (String, String, String) = store
        .conn()
        .query_row(
            "SELECT primary_muscle, secondary_muscles, equipment FROM exercises WHERE id = ?1;",
            [created.id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();

    assert_eq!(primary, "Pectoraux");
    assert_eq!(
        serde_json::from_str::<Vec<String>>(&secondary).unwrap(),
        vec!["Triceps", "Épaules"]
    );
    assert_eq!(equipment, "Barre");
}

#[test]
fn unknown_stored_label_is_read_back_verbatim() {
    let store = open_db_in_memory().unwrap();
    let repo = SqliteExerciseRepository::new(store.conn());
    let created = repo.create_exercise(&bench_press()).unwrap();

    store
        .conn()
        .execute(
            "UPDATE exercises SET primary_muscle = 'Grand dentelé' WHERE id = ?1;",
            [created.id.to_string()],
        )
        .unwrap();

    let loaded = repo.get_exercise(created.id).unwrap().unwrap();
    assert_eq!(loaded.primary_muscle, "Grand dentelé");
}

#[test]
fn second_active_exercise_with_same_name_is_a_duplicate() {
    let store = open_db_in_memory().unwrap();
    let repo = SqliteExerciseRepository::new(store.conn());
    repo.create_exercise(&bench_press()).unwrap();

    let err = repo.create_exercise(&bench_press()).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateKey { entity: "exercise", .. }));
}

#[test]
fn retired_exercise_frees_its_name() {
    let store = open_db_in_memory().unwrap();
    let repo = SqliteExerciseRepository::new(store.conn());
    let first = repo.create_exercise(&bench_press()).unwrap();

    repo.soft_delete_exercise(first.id).unwrap();
    let second = repo.create_exercise(&bench_press()).unwrap();

    let by_name = repo
        .get_exercise_by_name("Développé couché")
        .unwrap()
        .unwrap();
    assert_eq!(by_name.id, second.id);
    assert!(!repo.get_exercise(first.id).unwrap().unwrap().is_active);
}

#[test]
fn referenced_exercise_cannot_be_retired_or_deleted() {
    let store = open_db_in_memory().unwrap();
    let exercises = SqliteExerciseRepository::new(store.conn());
    let sessions = SqliteSessionRepository::new(store.conn());

    let exercise = exercises.create_exercise(&bench_press()).unwrap();
    let session = sessions
        .create_session(&Session::new(
            None,
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
        ))
        .unwrap();
    sessions.add_session_exercise(session.id, exercise.id).unwrap();

    assert!(exercises.is_exercise_referenced(exercise.id).unwrap());
    let retire_err = exercises.soft_delete_exercise(exercise.id).unwrap_err();
    assert!(matches!(
        retire_err,
        RepoError::ConflictingReference {
            referenced_by: "session_exercises",
            ..
        }
    ));
    let delete_err = exercises.delete_exercise(exercise.id).unwrap_err();
    assert!(matches!(delete_err, RepoError::ConflictingReference { .. }));

    let still_there = exercises.get_exercise(exercise.id).unwrap().unwrap();
    assert!(still_there.is_active);
}

#[test]
fn exercise_becomes_deletable_once_its_session_is_gone() {
    let store = open_db_in_memory().unwrap();
    let exercises = SqliteExerciseRepository::new(store.conn());
    let sessions = SqliteSessionRepository::new(store.conn());

    let exercise = exercises.create_exercise(&bench_press()).unwrap();
    let session = sessions
        .create_session(&Session::new(
            None,
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
        ))
        .unwrap();
    sessions.add_session_exercise(session.id, exercise.id).unwrap();
    sessions.delete_session(session.id).unwrap();

    exercises.delete_exercise(exercise.id).unwrap();
    assert!(exercises.get_exercise(exercise.id).unwrap().is_none());
}

#[test]
fn missing_exercise_reports_not_found() {
    let store = open_db_in_memory().unwrap();
    let repo = SqliteExerciseRepository::new(store.conn());
    let ghost = bench_press();

    assert!(repo.get_exercise(ghost.id).unwrap().is_none());
    assert!(repo.soft_delete_exercise(ghost.id).unwrap_err().is_not_found());
    assert!(repo.update_exercise(&ghost).unwrap_err().is_not_found());
}

#[test]
fn list_filters_by_name_fragment_and_codes() {
    let store = open_db_in_memory().unwrap();
    let repo = SqliteExerciseRepository::new(store.conn());
    repo.create_exercise(&bench_press()).unwrap();
    let mut squat = Exercise::new("Squat arrière", "QUADRICEPS");
    squat.equipment = Some("BAR".to_string());
    repo.create_exercise(&squat).unwrap();
    let mut curl = Exercise::new("Curl haltères", "BICEPS");
    curl.equipment = Some("DB".to_string());
    repo.create_exercise(&curl).unwrap();

    let barbell = repo
        .list_exercises(&ExerciseListQuery {
            equipment: Some("BAR".to_string()),
            ..ExerciseListQuery::default()
        })
        .unwrap();
    let names: Vec<_> = barbell.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Développé couché", "Squat arrière"]);

    let fragment = repo
        .list_exercises(&ExerciseListQuery {
            name: Some("CURL".to_string()),
            ..ExerciseListQuery::default()
        })
        .unwrap();
    assert_eq!(fragment.len(), 1);
    assert_eq!(fragment[0].primary_muscle, "BICEPS");
}

#[test]
fn service_rejects_duplicate_active_names_and_reslugs_on_rename() {
    let store = open_db_in_memory().unwrap();
    let service = ExerciseService::new(SqliteExerciseRepository::new(store.conn()));

    let created = service.create_exercise(&bench_press()).unwrap();
    let err = service
        .create_exercise(&Exercise::new("  Développé couché ", "PECTORAUX"))
        .unwrap_err();
    assert!(matches!(err, RepoError::DuplicateKey { .. }));

    let mut renamed = created.clone();
    renamed.name = "Développé incliné".to_string();
    let updated = service.update_exercise(&renamed).unwrap();
    assert_eq!(updated.slug, "developpe-incline");
    assert!(updated.updated_at >= created.updated_at);

    service.retire_exercise(updated.id).unwrap();
    assert!(service.get_exercise(updated.id).unwrap().is_some());
    assert!(service
        .list_exercises(&ExerciseListQuery::default())
        .unwrap()
        .is_empty());
}
