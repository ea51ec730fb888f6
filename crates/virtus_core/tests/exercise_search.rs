use virtus_core::db::open_db_in_memory;
use virtus_core::repo::exercise_repo::{ExerciseRepository, SqliteExerciseRepository};
use virtus_core::{Exercise, ExerciseSearch};

fn seed(repo: &SqliteExerciseRepository<'_>) {
    let mut press = Exercise::new("Développé militaire", "EPAULES");
    press.equipment = Some("BAR".to_string());
    press.pattern = Some("PV".to_string());
    press.difficulty = Some(3);
    press.cues = Some("Gainer les fessiers".to_string());
    repo.create_exercise(&press).unwrap();

    let mut raise = Exercise::new("Élévations latérales", "EPAULES");
    raise.equipment = Some("DB".to_string());
    raise.difficulty = Some(1);
    raise.cues = Some("Coudes légèrement fléchis".to_string());
    repo.create_exercise(&raise).unwrap();

    let mut deadlift = Exercise::new("Soulevé de terre", "ISCHIO_JAMBIERS");
    deadlift.equipment = Some("BAR".to_string());
    deadlift.pattern = Some("HINGE".to_string());
    deadlift.difficulty = Some(5);
    deadlift.cues = Some("Dos neutre, épaules basses".to_string());
    repo.create_exercise(&deadlift).unwrap();

    let mut plank = Exercise::new("Planche", "ABDOMINAUX");
    plank.equipment = Some("BW".to_string());
    plank.pattern = Some("CORE_AEXT".to_string());
    repo.create_exercise(&plank).unwrap();

    let mut retired = Exercise::new("Pull-over machine", "DORSAUX");
    retired.equipment = Some("MACH".to_string());
    retired.difficulty = Some(2);
    retired.is_active = false;
    repo.create_exercise(&retired).unwrap();
}

fn names(hits: &[Exercise]) -> Vec<&str> {
    hits.iter().map(|exercise| exercise.name.as_str()).collect()
}

#[test]
fn empty_criteria_return_every_active_exercise_by_name() {
    let store = open_db_in_memory().unwrap();
    let repo = SqliteExerciseRepository::new(store.conn());
    seed(&repo);

    let hits = repo.search_exercises(&ExerciseSearch::default()).unwrap();

    // NOCASE only folds ASCII, so a leading `É` sorts after every ASCII letter.
    assert_eq!(
        names(&hits),
        vec![
            "Développé militaire",
            "Planche",
            "Soulevé de terre",
            "Élévations latérales",
        ]
    );
}

#[test]
fn text_matches_name_without_accents_or_case() {
    let store = open_db_in_memory().unwrap();
    let repo = SqliteExerciseRepository::new(store.conn());
    seed(&repo);

    let hits = repo
        .search_exercises(&ExerciseSearch::with_text("ELEVATIONS"))
        .unwrap();
    assert_eq!(names(&hits), vec!["Élévations latérales"]);

    let accented = repo
        .search_exercises(&ExerciseSearch::with_text("développé"))
        .unwrap();
    assert_eq!(names(&accented), vec!["Développé militaire"]);
}

#[test]
fn text_also_matches_cues() {
    let store = open_db_in_memory().unwrap();
    let repo = SqliteExerciseRepository::new(store.conn());
    seed(&repo);

    let hits = repo
        .search_exercises(&ExerciseSearch::with_text("epaules basses"))
        .unwrap();

    assert_eq!(names(&hits), vec!["Soulevé de terre"]);
}

#[test]
fn surrounding_spaces_are_part_of_the_needle() {
    let store = open_db_in_memory().unwrap();
    let repo = SqliteExerciseRepository::new(store.conn());
    seed(&repo);

    let bare = repo
        .search_exercises(&ExerciseSearch::with_text("de"))
        .unwrap();
    assert_eq!(bare.len(), 3);

    let word = repo
        .search_exercises(&ExerciseSearch::with_text("de "))
        .unwrap();
    assert_eq!(names(&word), vec!["Soulevé de terre"]);

    let padded = repo
        .search_exercises(&ExerciseSearch::with_text(" developpe"))
        .unwrap();
    assert!(padded.is_empty());
}

#[test]
fn blank_text_is_ignored() {
    let store = open_db_in_memory().unwrap();
    let repo = SqliteExerciseRepository::new(store.conn());
    seed(&repo);

    let hits = repo
        .search_exercises(&ExerciseSearch::with_text("   "))
        .unwrap();

    assert_eq!(hits.len(), 4);
}

#[test]
fn code_sets_filter_by_any_member() {
    let store = open_db_in_memory().unwrap();
    let repo = SqliteExerciseRepository::new(store.conn());
    seed(&repo);

    let criteria = ExerciseSearch {
        equipment: vec!["BAR".to_string(), "BW".to_string()],
        ..ExerciseSearch::default()
    };
    let hits = repo.search_exercises(&criteria).unwrap();
    assert_eq!(
        names(&hits),
        vec!["Développé militaire", "Planche", "Soulevé de terre"]
    );

    let criteria = ExerciseSearch {
        primary_muscles: vec!["EPAULES".to_string()],
        patterns: vec!["PV".to_string()],
        ..ExerciseSearch::default()
    };
    let hits = repo.search_exercises(&criteria).unwrap();
    assert_eq!(names(&hits), vec!["Développé militaire"]);
}

#[test]
fn difficulty_range_is_inclusive_and_skips_unrated() {
    let store = open_db_in_memory().unwrap();
    let repo = SqliteExerciseRepository::new(store.conn());
    seed(&repo);

    let criteria = ExerciseSearch {
        difficulty: Some(1..=3),
        ..ExerciseSearch::default()
    };
    let hits = repo.search_exercises(&criteria).unwrap();

    assert_eq!(
        names(&hits),
        vec!["Développé militaire", "Élévations latérales"]
    );
}

#[test]
fn include_inactive_returns_retired_exercises() {
    let store = open_db_in_memory().unwrap();
    let repo = SqliteExerciseRepository::new(store.conn());
    seed(&repo);

    let criteria = ExerciseSearch {
        text: Some("pull".to_string()),
        include_inactive: true,
        ..ExerciseSearch::default()
    };
    let hits = repo.search_exercises(&criteria).unwrap();
    assert_eq!(names(&hits), vec!["Pull-over machine"]);

    let active_only = repo
        .search_exercises(&ExerciseSearch::with_text("pull"))
        .unwrap();
    assert!(active_only.is_empty());
}

#[test]
fn limit_applies_after_text_matching() {
    let store = open_db_in_memory().unwrap();
    let repo = SqliteExerciseRepository::new(store.conn());
    seed(&repo);

    let criteria = ExerciseSearch {
        text: Some("e".to_string()),
        limit: Some(2),
        ..ExerciseSearch::default()
    };
    let hits = repo.search_exercises(&criteria).unwrap();
    assert_eq!(hits.len(), 2);

    let none = ExerciseSearch {
        limit: Some(0),
        ..ExerciseSearch::default()
    };
    assert!(repo.search_exercises(&none).unwrap().is_empty());
}

#[test]
fn custom_normalizer_is_used_for_text_matching() {
    fn exact(text: &str) -> String {
        text.to_string()
    }

    let store = open_db_in_memory().unwrap();
    let repo = SqliteExerciseRepository::with_normalizer(store.conn(), exact);
    seed(&repo);

    let folded = repo
        .search_exercises(&ExerciseSearch::with_text("developpe"))
        .unwrap();
    assert!(folded.is_empty());

    let verbatim = repo
        .search_exercises(&ExerciseSearch::with_text("Développé"))
        .unwrap();
    assert_eq!(names(&verbatim), vec!["Développé militaire"]);
}
