use crate::types::{
    Campaign, CampaignParticipant, Issue, PushSubscription, Quiz, QuizAttempt, User,
};
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug)]
pub enum StorageError {
    IoError(std::io::Error),
    SerializationError(serde_json::Error),
    LockError(String),
    DuplicateKey(String),
    NotFound,
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::SerializationError(err)
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::IoError(e) => write!(f, "IO error: {}", e),
            StorageError::SerializationError(e) => write!(f, "Serialization error: {}", e),
            StorageError::LockError(e) => write!(f, "Lock error: {}", e),
            StorageError::DuplicateKey(e) => write!(f, "Duplicate key: {}", e),
            StorageError::NotFound => write!(f, "Record not found"),
        }
    }
}

impl std::error::Error for StorageError {}

/// Document-store interface for the platform.
///
/// The `*_if_*` methods are conditional single-document updates: each call
/// checks its condition and applies its mutation as one atomic step from the
/// caller's point of view. The in-memory backend gets this for free from the
/// shared mutex; a database-backed implementation must map each of them onto
/// a single conditional update statement.
pub trait StorageBackend: Send {
    // User operations
    fn store_user(&mut self, user: &User) -> Result<(), StorageError>;
    fn get_user(&self, id: &Uuid) -> Result<Option<User>, StorageError>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;
    fn update_user(&mut self, user: &User) -> Result<(), StorageError>;
    fn list_users(&self) -> Result<Vec<User>, StorageError>;
    /// Appends the badge only when the user exists and does not already hold
    /// it. Returns true when the badge was appended.
    fn add_badge_if_missing(&mut self, user_id: &Uuid, badge: &str) -> Result<bool, StorageError>;
    fn set_push_subscription(
        &mut self,
        user_id: &Uuid,
        subscription: Option<PushSubscription>,
    ) -> Result<(), StorageError>;

    // Issue operations
    fn store_issue(&mut self, issue: &Issue) -> Result<(), StorageError>;
    fn get_issue(&self, id: &Uuid) -> Result<Option<Issue>, StorageError>;
    fn update_issue(&mut self, issue: &Issue) -> Result<(), StorageError>;
    fn list_issues(&self) -> Result<Vec<Issue>, StorageError>;

    // Campaign operations
    fn store_campaign(&mut self, campaign: &Campaign) -> Result<(), StorageError>;
    fn get_campaign(&self, id: &Uuid) -> Result<Option<Campaign>, StorageError>;
    fn update_campaign(&mut self, campaign: &Campaign) -> Result<(), StorageError>;
    fn delete_campaign(&mut self, id: &Uuid) -> Result<(), StorageError>;
    fn list_campaigns(&self) -> Result<Vec<Campaign>, StorageError>;
    /// Inserts the participant only when the user is not already on the
    /// campaign's roster. Returns true on insert, false when the user was
    /// already a participant. The joined/already-joined distinction comes
    /// from this result alone, never from counting modified rows.
    fn add_participant_if_absent(
        &mut self,
        campaign_id: &Uuid,
        participant: &CampaignParticipant,
    ) -> Result<bool, StorageError>;
    /// Adds 1 to the participant's progress only when the participant exists
    /// and has not completed the campaign. Returns the updated participant,
    /// or None when no matching incomplete participant was found.
    fn increment_participant_progress(
        &mut self,
        campaign_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<CampaignParticipant>, StorageError>;
    /// Flips `is_complete` only when it is currently false. Returns true for
    /// exactly one caller per (campaign, user), however many race.
    fn complete_participant_if_incomplete(
        &mut self,
        campaign_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<bool, StorageError>;

    // Quiz operations
    fn store_quiz(&mut self, quiz: &Quiz) -> Result<(), StorageError>;
    fn get_quiz(&self, id: &Uuid) -> Result<Option<Quiz>, StorageError>;
    fn update_quiz(&mut self, quiz: &Quiz) -> Result<(), StorageError>;
    fn delete_quiz(&mut self, id: &Uuid) -> Result<(), StorageError>;
    fn list_quizzes(&self) -> Result<Vec<Quiz>, StorageError>;
    /// Inserts or overwrites the attempt keyed by (user, quiz). A user never
    /// accumulates more than one attempt row per quiz.
    fn upsert_quiz_attempt(&mut self, attempt: &QuizAttempt) -> Result<(), StorageError>;
    fn get_quiz_attempt(
        &self,
        user_id: &Uuid,
        quiz_id: &Uuid,
    ) -> Result<Option<QuizAttempt>, StorageError>;
    fn list_quiz_attempts_for_user(&self, user_id: &Uuid)
        -> Result<Vec<QuizAttempt>, StorageError>;
}

pub struct InMemoryStorage {
    users: HashMap<Uuid, User>,
    issues: HashMap<Uuid, Issue>,
    campaigns: HashMap<Uuid, Campaign>,
    quizzes: HashMap<Uuid, Quiz>,
    quiz_attempts: HashMap<(Uuid, Uuid), QuizAttempt>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
            issues: HashMap::new(),
            campaigns: HashMap::new(),
            quizzes: HashMap::new(),
            quiz_attempts: HashMap::new(),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for InMemoryStorage {
    fn store_user(&mut self, user: &User) -> Result<(), StorageError> {
        if self
            .users
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(StorageError::DuplicateKey("username".to_string()));
        }
        if self
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(StorageError::DuplicateKey("email".to_string()));
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    fn get_user(&self, id: &Uuid) -> Result<Option<User>, StorageError> {
        Ok(self.users.get(id).cloned())
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        Ok(self
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        Ok(self.users.values().find(|u| u.email == email).cloned())
    }

    fn update_user(&mut self, user: &User) -> Result<(), StorageError> {
        if !self.users.contains_key(&user.id) {
            return Err(StorageError::NotFound);
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    fn list_users(&self) -> Result<Vec<User>, StorageError> {
        Ok(self.users.values().cloned().collect())
    }

    fn add_badge_if_missing(&mut self, user_id: &Uuid, badge: &str) -> Result<bool, StorageError> {
        let user = match self.users.get_mut(user_id) {
            Some(u) => u,
            None => return Ok(false),
        };
        if user.badges.iter().any(|b| b == badge) {
            return Ok(false);
        }
        user.badges.push(badge.to_string());
        user.updated_at = Utc::now();
        Ok(true)
    }

    fn set_push_subscription(
        &mut self,
        user_id: &Uuid,
        subscription: Option<PushSubscription>,
    ) -> Result<(), StorageError> {
        let user = self.users.get_mut(user_id).ok_or(StorageError::NotFound)?;
        user.subscription = subscription;
        user.updated_at = Utc::now();
        Ok(())
    }

    fn store_issue(&mut self, issue: &Issue) -> Result<(), StorageError> {
        self.issues.insert(issue.id, issue.clone());
        Ok(())
    }

    fn get_issue(&self, id: &Uuid) -> Result<Option<Issue>, StorageError> {
        Ok(self.issues.get(id).cloned())
    }

    fn update_issue(&mut self, issue: &Issue) -> Result<(), StorageError> {
        if !self.issues.contains_key(&issue.id) {
            return Err(StorageError::NotFound);
        }
        self.issues.insert(issue.id, issue.clone());
        Ok(())
    }

    fn list_issues(&self) -> Result<Vec<Issue>, StorageError> {
        Ok(self.issues.values().cloned().collect())
    }

    fn store_campaign(&mut self, campaign: &Campaign) -> Result<(), StorageError> {
        self.campaigns.insert(campaign.id, campaign.clone());
        Ok(())
    }

    fn get_campaign(&self, id: &Uuid) -> Result<Option<Campaign>, StorageError> {
        Ok(self.campaigns.get(id).cloned())
    }

    fn update_campaign(&mut self, campaign: &Campaign) -> Result<(), StorageError> {
        if !self.campaigns.contains_key(&campaign.id) {
            return Err(StorageError::NotFound);
        }
        self.campaigns.insert(campaign.id, campaign.clone());
        Ok(())
    }

    fn delete_campaign(&mut self, id: &Uuid) -> Result<(), StorageError> {
        self.campaigns.remove(id).ok_or(StorageError::NotFound)?;
        Ok(())
    }

    fn list_campaigns(&self) -> Result<Vec<Campaign>, StorageError> {
        Ok(self.campaigns.values().cloned().collect())
    }

    fn add_participant_if_absent(
        &mut self,
        campaign_id: &Uuid,
        participant: &CampaignParticipant,
    ) -> Result<bool, StorageError> {
        let campaign = self
            .campaigns
            .get_mut(campaign_id)
            .ok_or(StorageError::NotFound)?;
        if campaign
            .participants
            .iter()
            .any(|p| p.user_id == participant.user_id)
        {
            return Ok(false);
        }
        campaign.participants.push(participant.clone());
        campaign.updated_at = Utc::now();
        Ok(true)
    }

    fn increment_participant_progress(
        &mut self,
        campaign_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<CampaignParticipant>, StorageError> {
        let campaign = match self.campaigns.get_mut(campaign_id) {
            Some(c) => c,
            None => return Ok(None),
        };
        let participant = campaign
            .participants
            .iter_mut()
            .find(|p| p.user_id == *user_id && !p.is_complete);
        match participant {
            Some(p) => {
                p.progress += 1;
                let updated = p.clone();
                campaign.updated_at = Utc::now();
                Ok(Some(updated))
            }
            None => Ok(None),
        }
    }

    fn complete_participant_if_incomplete(
        &mut self,
        campaign_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<bool, StorageError> {
        let campaign = match self.campaigns.get_mut(campaign_id) {
            Some(c) => c,
            None => return Ok(false),
        };
        let participant = campaign
            .participants
            .iter_mut()
            .find(|p| p.user_id == *user_id && !p.is_complete);
        match participant {
            Some(p) => {
                p.is_complete = true;
                campaign.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn store_quiz(&mut self, quiz: &Quiz) -> Result<(), StorageError> {
        self.quizzes.insert(quiz.id, quiz.clone());
        Ok(())
    }

    fn get_quiz(&self, id: &Uuid) -> Result<Option<Quiz>, StorageError> {
        Ok(self.quizzes.get(id).cloned())
    }

    fn update_quiz(&mut self, quiz: &Quiz) -> Result<(), StorageError> {
        if !self.quizzes.contains_key(&quiz.id) {
            return Err(StorageError::NotFound);
        }
        self.quizzes.insert(quiz.id, quiz.clone());
        Ok(())
    }

    fn delete_quiz(&mut self, id: &Uuid) -> Result<(), StorageError> {
        self.quizzes.remove(id).ok_or(StorageError::NotFound)?;
        Ok(())
    }

    fn list_quizzes(&self) -> Result<Vec<Quiz>, StorageError> {
        Ok(self.quizzes.values().cloned().collect())
    }

    fn upsert_quiz_attempt(&mut self, attempt: &QuizAttempt) -> Result<(), StorageError> {
        self.quiz_attempts
            .insert((attempt.user_id, attempt.quiz_id), attempt.clone());
        Ok(())
    }

    fn get_quiz_attempt(
        &self,
        user_id: &Uuid,
        quiz_id: &Uuid,
    ) -> Result<Option<QuizAttempt>, StorageError> {
        Ok(self.quiz_attempts.get(&(*user_id, *quiz_id)).cloned())
    }

    fn list_quiz_attempts_for_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<QuizAttempt>, StorageError> {
        Ok(self
            .quiz_attempts
            .values()
            .filter(|a| a.user_id == *user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, TargetAction};
    use chrono::Duration;

    fn sample_user(name: &str) -> User {
        User::new(name, &format!("{}@react.dev", name), "hash", Role::Citizen)
    }

    fn sample_campaign() -> Campaign {
        let now = Utc::now();
        Campaign {
            id: Uuid::new_v4(),
            title: "Pothole Week".to_string(),
            description: "Report road damage".to_string(),
            target_action: TargetAction::Report,
            target_goal: 3,
            reward_points: 100,
            reward_badge: "Road Warrior".to_string(),
            start_date: now,
            end_date: now + Duration::days(7),
            participants: Vec::new(),
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let mut storage = InMemoryStorage::new();
        storage.store_user(&sample_user("asha")).expect("store");

        let mut clone = sample_user("asha");
        clone.email = "other@react.dev".to_string();
        let result = storage.store_user(&clone);
        assert!(matches!(result, Err(StorageError::DuplicateKey(_))));
    }

    #[test]
    fn badge_append_is_set_guarded() {
        let mut storage = InMemoryStorage::new();
        let user = sample_user("asha");
        storage.store_user(&user).expect("store");

        assert!(storage
            .add_badge_if_missing(&user.id, "Road Warrior")
            .expect("first append"));
        assert!(!storage
            .add_badge_if_missing(&user.id, "Road Warrior")
            .expect("second append"));

        let stored = storage.get_user(&user.id).expect("get").expect("exists");
        assert_eq!(stored.badges, vec!["Road Warrior".to_string()]);
    }

    #[test]
    fn participant_insert_is_keyed_by_user() {
        let mut storage = InMemoryStorage::new();
        let campaign = sample_campaign();
        storage.store_campaign(&campaign).expect("store");

        let participant = CampaignParticipant {
            user_id: Uuid::new_v4(),
            progress: 0,
            is_complete: false,
            joined_at: Utc::now(),
        };

        assert!(storage
            .add_participant_if_absent(&campaign.id, &participant)
            .expect("first join"));
        assert!(!storage
            .add_participant_if_absent(&campaign.id, &participant)
            .expect("second join"));

        let stored = storage
            .get_campaign(&campaign.id)
            .expect("get")
            .expect("exists");
        assert_eq!(stored.participants.len(), 1);
    }

    #[test]
    fn progress_increment_requires_incomplete_participant() {
        let mut storage = InMemoryStorage::new();
        let campaign = sample_campaign();
        storage.store_campaign(&campaign).expect("store");
        let user_id = Uuid::new_v4();

        // Not a participant yet
        assert!(storage
            .increment_participant_progress(&campaign.id, &user_id)
            .expect("increment")
            .is_none());

        let participant = CampaignParticipant {
            user_id,
            progress: 0,
            is_complete: false,
            joined_at: Utc::now(),
        };
        storage
            .add_participant_if_absent(&campaign.id, &participant)
            .expect("join");

        let updated = storage
            .increment_participant_progress(&campaign.id, &user_id)
            .expect("increment")
            .expect("participant");
        assert_eq!(updated.progress, 1);

        // Completion freezes progress
        assert!(storage
            .complete_participant_if_incomplete(&campaign.id, &user_id)
            .expect("complete"));
        assert!(!storage
            .complete_participant_if_incomplete(&campaign.id, &user_id)
            .expect("second complete"));
        assert!(storage
            .increment_participant_progress(&campaign.id, &user_id)
            .expect("increment after complete")
            .is_none());
    }

    #[test]
    fn quiz_attempt_upsert_keeps_one_row() {
        let mut storage = InMemoryStorage::new();
        let user_id = Uuid::new_v4();
        let quiz_id = Uuid::new_v4();
        let now = Utc::now();

        let first = QuizAttempt {
            id: Uuid::new_v4(),
            user_id,
            quiz_id,
            score: 33.3,
            passed: false,
            created_at: now,
            updated_at: now,
        };
        storage.upsert_quiz_attempt(&first).expect("first attempt");

        let second = QuizAttempt {
            score: 100.0,
            passed: true,
            updated_at: Utc::now(),
            ..first.clone()
        };
        storage
            .upsert_quiz_attempt(&second)
            .expect("second attempt");

        let attempts = storage
            .list_quiz_attempts_for_user(&user_id)
            .expect("list");
        assert_eq!(attempts.len(), 1);
        assert!(attempts[0].passed);
        assert_eq!(attempts[0].score, 100.0);
    }
}
