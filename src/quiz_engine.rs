use crate::gamification_engine::{GamificationEngine, PointAction};
use crate::storage::{StorageBackend, StorageError};
use crate::types::{Quiz, QuizAttempt, QuizQuestion};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Minimum score, in percent, to pass a quiz.
pub const PASS_THRESHOLD: f64 = 70.0;

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Quiz not found")]
    NotFound,
    #[error("You have already successfully passed this quiz and earned the points.")]
    AlreadyPassed { points_awarded: i64 },
    #[error("{0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Quiz as shown to takers: no correct answer indices.
#[derive(Debug, Serialize)]
pub struct QuizView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub points_awarded: i64,
    pub questions: Vec<QuestionView>,
    pub attempted: bool,
}

#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub text: String,
    pub options: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct QuizSubmission {
    pub message: String,
    pub points_awarded: i64,
    pub attempted: bool,
}

#[derive(Debug, Serialize)]
pub struct AttemptView {
    pub quiz_id: Uuid,
    pub title: String,
    pub score: f64,
    pub passed: bool,
    pub created_at: DateTime<Utc>,
}

pub struct QuizEngine<S: StorageBackend> {
    storage: Arc<std::sync::Mutex<S>>,
    ledger: GamificationEngine<S>,
}

impl<S: StorageBackend> QuizEngine<S> {
    pub fn new(storage: Arc<std::sync::Mutex<S>>, ledger: GamificationEngine<S>) -> Self {
        Self { storage, ledger }
    }

    /// Every quiz with answers stripped, flagged with whether this user has
    /// already passed it.
    pub fn list_for_user(&self, user_id: &Uuid) -> Result<Vec<QuizView>, QuizError> {
        let storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("quiz storage mutex poisoned".to_string()))?;

        let mut quizzes = storage.list_quizzes()?;
        quizzes.sort_by_key(|q| q.created_at);

        let mut views = Vec::with_capacity(quizzes.len());
        for quiz in quizzes {
            let attempted = storage
                .get_quiz_attempt(user_id, &quiz.id)?
                .map(|a| a.passed)
                .unwrap_or(false);
            views.push(QuizView {
                id: quiz.id,
                title: quiz.title,
                description: quiz.description,
                points_awarded: quiz.points_awarded,
                questions: quiz
                    .questions
                    .into_iter()
                    .map(|q| QuestionView {
                        text: q.text,
                        options: q.options,
                    })
                    .collect(),
                attempted,
            });
        }
        Ok(views)
    }

    /// Scores a submission. `answers` maps question index to chosen option
    /// index; unanswered questions simply count as wrong. One attempt row
    /// per (user, quiz) is kept, failed attempts overwritten by later ones,
    /// and a user who already passed is short-circuited without rescoring.
    pub fn submit(
        &self,
        quiz_id: &Uuid,
        user_id: &Uuid,
        answers: &HashMap<usize, usize>,
    ) -> Result<QuizSubmission, QuizError> {
        let (quiz, score, passed) = {
            let mut storage = self
                .storage
                .lock()
                .map_err(|_| StorageError::LockError("quiz storage mutex poisoned".to_string()))?;

            let quiz = storage.get_quiz(quiz_id)?.ok_or(QuizError::NotFound)?;
            if quiz.questions.is_empty() {
                return Err(QuizError::Validation("Quiz has no questions.".to_string()));
            }

            let existing = storage.get_quiz_attempt(user_id, quiz_id)?;
            if let Some(previous) = &existing {
                if previous.passed {
                    return Err(QuizError::AlreadyPassed {
                        points_awarded: quiz.points_awarded,
                    });
                }
            }

            let correct = quiz
                .questions
                .iter()
                .enumerate()
                .filter(|(index, question)| {
                    answers.get(index) == Some(&question.correct_answer_index)
                })
                .count();
            let score = correct as f64 / quiz.questions.len() as f64 * 100.0;
            let passed = score >= PASS_THRESHOLD;

            let now = Utc::now();
            let attempt = QuizAttempt {
                id: existing.as_ref().map(|a| a.id).unwrap_or_else(Uuid::new_v4),
                user_id: *user_id,
                quiz_id: *quiz_id,
                score,
                passed,
                created_at: existing.map(|a| a.created_at).unwrap_or(now),
                updated_at: now,
            };
            storage.upsert_quiz_attempt(&attempt)?;

            (quiz, score, passed)
        };

        if passed {
            if let Err(e) = self
                .ledger
                .award(user_id, PointAction::QuizReward(quiz.points_awarded))
            {
                warn!(%quiz_id, %user_id, error = %e, "quiz points not credited");
            }
        }

        let message = if passed {
            format!(
                "Quiz passed! You scored {:.0}%. {} points awarded!",
                score, quiz.points_awarded
            )
        } else {
            format!("You scored {:.0}%. You need 70% to pass. Try again!", score)
        };

        Ok(QuizSubmission {
            message,
            points_awarded: if passed { quiz.points_awarded } else { 0 },
            attempted: passed,
        })
    }

    /// The user's attempt history, newest first.
    pub fn my_attempts(&self, user_id: &Uuid) -> Result<Vec<AttemptView>, QuizError> {
        let storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("quiz storage mutex poisoned".to_string()))?;

        let mut attempts = storage.list_quiz_attempts_for_user(user_id)?;
        attempts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut views = Vec::with_capacity(attempts.len());
        for attempt in attempts {
            let title = storage
                .get_quiz(&attempt.quiz_id)?
                .map(|q| q.title)
                .unwrap_or_else(|| "Unknown quiz".to_string());
            views.push(AttemptView {
                quiz_id: attempt.quiz_id,
                title,
                score: attempt.score,
                passed: attempt.passed,
                created_at: attempt.created_at,
            });
        }
        Ok(views)
    }

    pub fn get_quiz(&self, quiz_id: &Uuid) -> Result<Quiz, QuizError> {
        let storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("quiz storage mutex poisoned".to_string()))?;
        storage.get_quiz(quiz_id)?.ok_or(QuizError::NotFound)
    }

    // Admin operations

    pub fn create_quiz(
        &self,
        title: &str,
        description: &str,
        points_awarded: i64,
        questions: Vec<QuizQuestion>,
        created_by: &Uuid,
    ) -> Result<Quiz, QuizError> {
        if title.trim().is_empty() {
            return Err(QuizError::Validation("Title is required.".to_string()));
        }
        if questions.is_empty() {
            return Err(QuizError::Validation(
                "Quiz must contain at least one question.".to_string(),
            ));
        }
        for question in &questions {
            if question.options.len() < 2 {
                return Err(QuizError::Validation(
                    "Each question needs at least two options.".to_string(),
                ));
            }
            if question.correct_answer_index >= question.options.len() {
                return Err(QuizError::Validation(
                    "Correct answer index is out of range.".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let quiz = Quiz {
            id: Uuid::new_v4(),
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            points_awarded,
            questions,
            created_by: *created_by,
            created_at: now,
            updated_at: now,
        };

        let mut storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("quiz storage mutex poisoned".to_string()))?;
        storage.store_quiz(&quiz)?;
        Ok(quiz)
    }

    pub fn update_quiz(&self, quiz: &Quiz) -> Result<Quiz, QuizError> {
        if quiz.questions.is_empty() {
            return Err(QuizError::Validation(
                "Quiz must contain at least one question.".to_string(),
            ));
        }
        let mut updated = quiz.clone();
        updated.updated_at = Utc::now();

        let mut storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("quiz storage mutex poisoned".to_string()))?;
        match storage.update_quiz(&updated) {
            Ok(()) => Ok(updated),
            Err(StorageError::NotFound) => Err(QuizError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub fn delete_quiz(&self, quiz_id: &Uuid) -> Result<(), QuizError> {
        let mut storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("quiz storage mutex poisoned".to_string()))?;
        match storage.delete_quiz(quiz_id) {
            Ok(()) => Ok(()),
            Err(StorageError::NotFound) => Err(QuizError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_all(&self) -> Result<Vec<Quiz>, QuizError> {
        let storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("quiz storage mutex poisoned".to_string()))?;
        let mut quizzes = storage.list_quizzes()?;
        quizzes.sort_by_key(|q| q.created_at);
        Ok(quizzes)
    }
}
