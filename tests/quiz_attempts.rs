use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use react_engine::storage::{InMemoryStorage, StorageBackend};
use react_engine::{
    GamificationEngine, QuizEngine, QuizError, QuizQuestion, Role, User, PASS_THRESHOLD,
};
use uuid::Uuid;

fn new_engine() -> (QuizEngine<InMemoryStorage>, Arc<Mutex<InMemoryStorage>>) {
    let storage = Arc::new(Mutex::new(InMemoryStorage::new()));
    let ledger = GamificationEngine::new(Arc::clone(&storage));
    let engine = QuizEngine::new(Arc::clone(&storage), ledger);
    (engine, storage)
}

fn seed_citizen(storage: &Arc<Mutex<InMemoryStorage>>, name: &str) -> Uuid {
    let user = User::new(name, &format!("{name}@react.dev"), "hash", Role::Citizen);
    let id = user.id;
    storage.lock().unwrap().store_user(&user).expect("seed user");
    id
}

fn points_of(storage: &Arc<Mutex<InMemoryStorage>>, id: &Uuid) -> i64 {
    storage
        .lock()
        .unwrap()
        .get_user(id)
        .expect("lookup")
        .expect("user exists")
        .points
}

// Every question's correct option is index 1
fn yes_no_questions(count: usize) -> Vec<QuizQuestion> {
    (0..count)
        .map(|n| QuizQuestion {
            text: format!("Question {n}"),
            options: vec!["No".to_string(), "Yes".to_string()],
            correct_answer_index: 1,
        })
        .collect()
}

fn all_correct(count: usize) -> HashMap<usize, usize> {
    (0..count).map(|n| (n, 1)).collect()
}

#[test]
fn perfect_score_passes_and_awards_points() {
    let (engine, storage) = new_engine();
    let admin = seed_citizen(&storage, "admin");
    let user = seed_citizen(&storage, "asha");
    let quiz = engine
        .create_quiz("Civic Sense", "Basics", 20, yes_no_questions(3), &admin)
        .expect("create");

    let result = engine
        .submit(&quiz.id, &user, &all_correct(3))
        .expect("submit");

    assert_eq!(
        result.message,
        "Quiz passed! You scored 100%. 20 points awarded!"
    );
    assert_eq!(result.points_awarded, 20);
    assert!(result.attempted);
    assert_eq!(points_of(&storage, &user), 20);
}

#[test]
fn below_threshold_fails_without_points() {
    let (engine, storage) = new_engine();
    let admin = seed_citizen(&storage, "admin");
    let user = seed_citizen(&storage, "asha");
    let quiz = engine
        .create_quiz("Civic Sense", "Basics", 20, yes_no_questions(3), &admin)
        .expect("create");

    // One of three correct: 33%
    let answers = HashMap::from([(0, 1), (1, 0), (2, 0)]);
    let result = engine.submit(&quiz.id, &user, &answers).expect("submit");

    assert_eq!(
        result.message,
        "You scored 33%. You need 70% to pass. Try again!"
    );
    assert_eq!(result.points_awarded, 0);
    assert!(!result.attempted);
    assert_eq!(points_of(&storage, &user), 0);
}

#[test]
fn exact_threshold_passes() {
    let (engine, storage) = new_engine();
    let admin = seed_citizen(&storage, "admin");
    let user = seed_citizen(&storage, "asha");
    let quiz = engine
        .create_quiz("Long Quiz", "Ten questions", 30, yes_no_questions(10), &admin)
        .expect("create");

    // Seven of ten correct sits exactly on the pass mark
    let answers: HashMap<usize, usize> = (0..10).map(|n| (n, if n < 7 { 1 } else { 0 })).collect();
    let result = engine.submit(&quiz.id, &user, &answers).expect("submit");

    assert!(result.attempted);
    assert_eq!(result.points_awarded, 30);

    let attempt = storage
        .lock()
        .unwrap()
        .get_quiz_attempt(&user, &quiz.id)
        .expect("lookup")
        .expect("attempt row");
    assert_eq!(attempt.score, PASS_THRESHOLD);
    assert!(attempt.passed);
}

#[test]
fn unanswered_questions_count_as_wrong() {
    let (engine, storage) = new_engine();
    let admin = seed_citizen(&storage, "admin");
    let user = seed_citizen(&storage, "asha");
    let quiz = engine
        .create_quiz("Civic Sense", "Basics", 20, yes_no_questions(4), &admin)
        .expect("create");

    let result = engine
        .submit(&quiz.id, &user, &HashMap::new())
        .expect("submit");
    assert_eq!(result.message, "You scored 0%. You need 70% to pass. Try again!");
    assert!(!result.attempted);
}

#[test]
fn retake_after_failure_overwrites_the_single_attempt_row() {
    let (engine, storage) = new_engine();
    let admin = seed_citizen(&storage, "admin");
    let user = seed_citizen(&storage, "asha");
    let quiz = engine
        .create_quiz("Civic Sense", "Basics", 20, yes_no_questions(2), &admin)
        .expect("create");

    engine
        .submit(&quiz.id, &user, &HashMap::from([(0, 0), (1, 0)]))
        .expect("failed attempt");
    let first = storage
        .lock()
        .unwrap()
        .get_quiz_attempt(&user, &quiz.id)
        .expect("lookup")
        .expect("attempt row");
    assert!(!first.passed);

    engine
        .submit(&quiz.id, &user, &all_correct(2))
        .expect("passing retake");

    let attempts = storage
        .lock()
        .unwrap()
        .list_quiz_attempts_for_user(&user)
        .expect("list");
    assert_eq!(attempts.len(), 1);
    assert!(attempts[0].passed);
    assert_eq!(attempts[0].score, 100.0);
    // The row keeps its original creation time
    assert_eq!(attempts[0].created_at, first.created_at);
    assert_eq!(points_of(&storage, &user), 20);
}

#[test]
fn passed_quiz_short_circuits_resubmission() {
    let (engine, storage) = new_engine();
    let admin = seed_citizen(&storage, "admin");
    let user = seed_citizen(&storage, "asha");
    let quiz = engine
        .create_quiz("Civic Sense", "Basics", 20, yes_no_questions(2), &admin)
        .expect("create");

    engine
        .submit(&quiz.id, &user, &all_correct(2))
        .expect("first pass");

    let err = engine
        .submit(&quiz.id, &user, &all_correct(2))
        .unwrap_err();
    match err {
        QuizError::AlreadyPassed { points_awarded } => {
            assert_eq!(points_awarded, 20);
        }
        other => panic!("expected AlreadyPassed, got {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "You have already successfully passed this quiz and earned the points."
    );

    // No double credit
    assert_eq!(points_of(&storage, &user), 20);
}

#[test]
fn submitting_to_unknown_quiz_is_not_found() {
    let (engine, storage) = new_engine();
    let user = seed_citizen(&storage, "asha");

    let err = engine
        .submit(&Uuid::new_v4(), &user, &HashMap::new())
        .unwrap_err();
    assert!(matches!(err, QuizError::NotFound));
}

#[test]
fn listing_strips_answers_and_flags_passed_quizzes() {
    let (engine, storage) = new_engine();
    let admin = seed_citizen(&storage, "admin");
    let user = seed_citizen(&storage, "asha");
    let quiz = engine
        .create_quiz("Civic Sense", "Basics", 20, yes_no_questions(2), &admin)
        .expect("create");

    let before = engine.list_for_user(&user).expect("list");
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].questions.len(), 2);
    assert!(!before[0].attempted);

    // A failed attempt still shows as not attempted
    engine
        .submit(&quiz.id, &user, &HashMap::new())
        .expect("failed attempt");
    let after_fail = engine.list_for_user(&user).expect("list");
    assert!(!after_fail[0].attempted);

    engine
        .submit(&quiz.id, &user, &all_correct(2))
        .expect("pass");
    let after_pass = engine.list_for_user(&user).expect("list");
    assert!(after_pass[0].attempted);
}

#[test]
fn attempt_history_is_newest_first_with_titles() {
    let (engine, storage) = new_engine();
    let admin = seed_citizen(&storage, "admin");
    let user = seed_citizen(&storage, "asha");
    let first_quiz = engine
        .create_quiz("First Quiz", "One", 10, yes_no_questions(1), &admin)
        .expect("create");
    let second_quiz = engine
        .create_quiz("Second Quiz", "Two", 10, yes_no_questions(1), &admin)
        .expect("create");

    engine
        .submit(&first_quiz.id, &user, &all_correct(1))
        .expect("first");
    engine
        .submit(&second_quiz.id, &user, &all_correct(1))
        .expect("second");

    let history = engine.my_attempts(&user).expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].title, "Second Quiz");
    assert_eq!(history[1].title, "First Quiz");
    assert!(history[0].passed && history[1].passed);
}

#[test]
fn quiz_creation_validates_questions() {
    let (engine, storage) = new_engine();
    let admin = seed_citizen(&storage, "admin");

    let err = engine
        .create_quiz("Empty", "No questions", 10, Vec::new(), &admin)
        .unwrap_err();
    match err {
        QuizError::Validation(msg) => {
            assert_eq!(msg, "Quiz must contain at least one question.")
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let single_option = vec![QuizQuestion {
        text: "Only one way?".to_string(),
        options: vec!["Yes".to_string()],
        correct_answer_index: 0,
    }];
    assert!(engine
        .create_quiz("Bad", "One option", 10, single_option, &admin)
        .is_err());

    let out_of_range = vec![QuizQuestion {
        text: "Pick".to_string(),
        options: vec!["A".to_string(), "B".to_string()],
        correct_answer_index: 5,
    }];
    assert!(engine
        .create_quiz("Bad", "Bad index", 10, out_of_range, &admin)
        .is_err());
}
