use crate::storage::{StorageBackend, StorageError};
use crate::types::Role;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum GamificationError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Point-earning actions. The fixed actions take their value from the
/// `PointsTable`; campaign and quiz rewards carry the amount configured on
/// the campaign or quiz itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointAction {
    ReportIssue,
    VerifyIssue,
    Comment,
    ResolutionBonus,
    CampaignReward(i64),
    QuizReward(i64),
}

/// Configured point values for the fixed actions. Actions missing from the
/// table are silent no-ops, so an engine wired with a partial table simply
/// stops crediting the missing actions.
#[derive(Debug, Clone)]
pub struct PointsTable {
    values: HashMap<PointAction, i64>,
}

impl Default for PointsTable {
    fn default() -> Self {
        let values = HashMap::from([
            (PointAction::ReportIssue, 10),
            (PointAction::VerifyIssue, 2),
            (PointAction::Comment, 1),
            (PointAction::ResolutionBonus, 25),
        ]);
        Self { values }
    }
}

impl PointsTable {
    pub fn new(values: HashMap<PointAction, i64>) -> Self {
        Self { values }
    }

    pub fn amount_for(&self, action: PointAction) -> Option<i64> {
        match action {
            PointAction::CampaignReward(amount) | PointAction::QuizReward(amount) => Some(amount),
            fixed => self.values.get(&fixed).copied(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub points: i64,
    pub streak: i64,
    pub impact_score: i64,
}

#[derive(Debug)]
pub struct GamificationEngine<S: StorageBackend> {
    storage: Arc<std::sync::Mutex<S>>,
    points: PointsTable,
}

impl<S: StorageBackend> Clone for GamificationEngine<S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            points: self.points.clone(),
        }
    }
}

impl<S: StorageBackend> GamificationEngine<S> {
    pub fn new(storage: Arc<std::sync::Mutex<S>>) -> Self {
        Self {
            storage,
            points: PointsTable::default(),
        }
    }

    pub fn with_table(storage: Arc<std::sync::Mutex<S>>, points: PointsTable) -> Self {
        Self { storage, points }
    }

    /// Credits the user for an action, maintaining the activity streak and
    /// recomputing the impact score. Returns the amount credited, or None
    /// when the award was a no-op (unconfigured action or unknown user).
    pub fn award(
        &self,
        user_id: &Uuid,
        action: PointAction,
    ) -> Result<Option<i64>, GamificationError> {
        let amount = match self.points.amount_for(action) {
            Some(amount) => amount,
            None => {
                debug!(?action, "no point value configured, skipping award");
                return Ok(None);
            }
        };

        let mut storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("gamification storage mutex poisoned".to_string()))?;

        let mut user = match storage.get_user(user_id)? {
            Some(user) => user,
            None => {
                debug!(%user_id, "award for unknown user, skipping");
                return Ok(None);
            }
        };

        let now = Utc::now();
        user.points += amount;

        // Streak bookkeeping runs once per calendar day (UTC): the first
        // action of a day extends or resets the streak, later actions on the
        // same day leave it untouched.
        let today = now.date_naive();
        let last_active = user.last_activity_date.map(|d| d.date_naive());
        if last_active != Some(today) {
            user.streak = match (last_active, today.pred_opt()) {
                (Some(last), Some(yesterday)) if last == yesterday => user.streak + 1,
                _ => 1,
            };
            user.last_activity_date = Some(now);
        }

        user.impact_score = user.points + user.streak * 5;
        user.updated_at = now;
        storage.update_user(&user)?;

        Ok(Some(amount))
    }

    /// Grants a badge at most once per user, whatever the caller count.
    pub fn award_badge(&self, user_id: &Uuid, badge: &str) -> Result<bool, GamificationError> {
        let mut storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("gamification storage mutex poisoned".to_string()))?;
        Ok(storage.add_badge_if_missing(user_id, badge)?)
    }

    /// Citizen ranking by impact score, points breaking ties.
    pub fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, GamificationError> {
        let storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("gamification storage mutex poisoned".to_string()))?;

        let mut citizens: Vec<_> = storage
            .list_users()?
            .into_iter()
            .filter(|u| u.role == Role::Citizen)
            .collect();
        citizens.sort_by(|a, b| {
            b.impact_score
                .cmp(&a.impact_score)
                .then(b.points.cmp(&a.points))
        });
        citizens.truncate(limit);

        Ok(citizens
            .into_iter()
            .map(|u| LeaderboardEntry {
                username: u.username,
                points: u.points,
                streak: u.streak,
                impact_score: u.impact_score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_the_fixed_actions() {
        let table = PointsTable::default();
        assert_eq!(table.amount_for(PointAction::ReportIssue), Some(10));
        assert_eq!(table.amount_for(PointAction::VerifyIssue), Some(2));
        assert_eq!(table.amount_for(PointAction::Comment), Some(1));
        assert_eq!(table.amount_for(PointAction::ResolutionBonus), Some(25));
    }

    #[test]
    fn carried_rewards_ignore_the_table() {
        let table = PointsTable::new(HashMap::new());
        assert_eq!(table.amount_for(PointAction::CampaignReward(100)), Some(100));
        assert_eq!(table.amount_for(PointAction::QuizReward(15)), Some(15));
        assert_eq!(table.amount_for(PointAction::ReportIssue), None);
    }
}
