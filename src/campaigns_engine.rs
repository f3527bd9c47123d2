use crate::gamification_engine::{GamificationEngine, PointAction};
use crate::storage::{StorageBackend, StorageError};
use crate::types::{Campaign, CampaignParticipant, TargetAction};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Campaign not found")]
    NotFound,
    #[error("This campaign has already ended.")]
    Ended,
    #[error("You have already joined this campaign.")]
    AlreadyJoined,
    #[error("{0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct NewCampaign {
    pub title: String,
    pub description: String,
    pub target_action: TargetAction,
    pub target_goal: i64,
    pub reward_points: i64,
    pub reward_badge: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug)]
pub struct CampaignsEngine<S: StorageBackend> {
    storage: Arc<std::sync::Mutex<S>>,
    ledger: GamificationEngine<S>,
}

impl<S: StorageBackend> Clone for CampaignsEngine<S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            ledger: self.ledger.clone(),
        }
    }
}

impl<S: StorageBackend> CampaignsEngine<S> {
    pub fn new(storage: Arc<std::sync::Mutex<S>>, ledger: GamificationEngine<S>) -> Self {
        Self { storage, ledger }
    }

    /// Campaigns whose end date has not passed, oldest start first.
    pub fn active_campaigns(&self, now: DateTime<Utc>) -> Result<Vec<Campaign>, CampaignError> {
        let storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("campaign storage mutex poisoned".to_string()))?;
        let mut campaigns: Vec<_> = storage
            .list_campaigns()?
            .into_iter()
            .filter(|c| c.end_date >= now)
            .collect();
        campaigns.sort_by_key(|c| c.start_date);
        Ok(campaigns)
    }

    pub fn get_campaign(&self, campaign_id: &Uuid) -> Result<Campaign, CampaignError> {
        let storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("campaign storage mutex poisoned".to_string()))?;
        storage
            .get_campaign(campaign_id)?
            .ok_or(CampaignError::NotFound)
    }

    /// Enrolls the user. Whether this was a fresh join or a repeat is decided
    /// solely by the storage insert-if-absent result.
    pub fn join(&self, campaign_id: &Uuid, user_id: &Uuid) -> Result<(), CampaignError> {
        let mut storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("campaign storage mutex poisoned".to_string()))?;

        let campaign = storage
            .get_campaign(campaign_id)?
            .ok_or(CampaignError::NotFound)?;
        if campaign.end_date < Utc::now() {
            return Err(CampaignError::Ended);
        }

        let participant = CampaignParticipant {
            user_id: *user_id,
            progress: 0,
            is_complete: false,
            joined_at: Utc::now(),
        };
        let inserted = storage.add_participant_if_absent(campaign_id, &participant)?;
        if !inserted {
            return Err(CampaignError::AlreadyJoined);
        }
        Ok(())
    }

    /// Advances every active campaign targeting this action for a user who
    /// has joined it. A participant reaching the goal is completed through a
    /// guarded write, so the reward and badge are handed out exactly once no
    /// matter how many concurrent actions cross the threshold together.
    /// Returns the number of campaigns whose progress moved.
    pub fn advance(&self, user_id: &Uuid, action: TargetAction) -> Result<usize, CampaignError> {
        let now = Utc::now();

        // Phase 1: guarded progress writes under the storage lock.
        let mut advanced = 0;
        let mut completions: Vec<(Uuid, i64, String)> = Vec::new();
        {
            let mut storage = self.storage.lock().map_err(|_| {
                StorageError::LockError("campaign storage mutex poisoned".to_string())
            })?;

            let targets: Vec<Campaign> = storage
                .list_campaigns()?
                .into_iter()
                .filter(|c| c.target_action == action && c.end_date >= now)
                .collect();

            for campaign in targets {
                let updated = storage.increment_participant_progress(&campaign.id, user_id)?;
                let participant = match updated {
                    Some(p) => p,
                    None => continue,
                };
                advanced += 1;

                if participant.progress >= campaign.target_goal
                    && storage.complete_participant_if_incomplete(&campaign.id, user_id)?
                {
                    completions.push((
                        campaign.id,
                        campaign.reward_points,
                        campaign.reward_badge.clone(),
                    ));
                }
            }
        }

        // Phase 2: rewards, outside the lock. The completion is already
        // committed, so reward hiccups are logged rather than propagated.
        for (campaign_id, reward_points, reward_badge) in completions {
            info!(%campaign_id, %user_id, reward_points, "campaign completed");
            if let Err(e) = self
                .ledger
                .award(user_id, PointAction::CampaignReward(reward_points))
            {
                warn!(%campaign_id, %user_id, error = %e, "campaign reward credit failed");
            }
            if let Err(e) = self.ledger.award_badge(user_id, &reward_badge) {
                warn!(%campaign_id, %user_id, error = %e, "campaign badge grant failed");
            }
        }

        Ok(advanced)
    }

    // Admin operations

    pub fn create_campaign(
        &self,
        new_campaign: NewCampaign,
        created_by: &Uuid,
    ) -> Result<Campaign, CampaignError> {
        if new_campaign.title.trim().is_empty() || new_campaign.description.trim().is_empty() {
            return Err(CampaignError::Validation(
                "Title and description are required.".to_string(),
            ));
        }
        if new_campaign.start_date >= new_campaign.end_date {
            return Err(CampaignError::Validation(
                "Start date must be before end date.".to_string(),
            ));
        }

        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            title: new_campaign.title,
            description: new_campaign.description,
            target_action: new_campaign.target_action,
            target_goal: new_campaign.target_goal,
            reward_points: new_campaign.reward_points,
            reward_badge: new_campaign.reward_badge,
            start_date: new_campaign.start_date,
            end_date: new_campaign.end_date,
            participants: Vec::new(),
            created_by: *created_by,
            created_at: now,
            updated_at: now,
        };

        let mut storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("campaign storage mutex poisoned".to_string()))?;
        storage.store_campaign(&campaign)?;
        Ok(campaign)
    }

    pub fn update_campaign(&self, campaign: &Campaign) -> Result<Campaign, CampaignError> {
        if campaign.start_date >= campaign.end_date {
            return Err(CampaignError::Validation(
                "Start date must be before end date.".to_string(),
            ));
        }
        let mut updated = campaign.clone();
        updated.updated_at = Utc::now();

        let mut storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("campaign storage mutex poisoned".to_string()))?;
        match storage.update_campaign(&updated) {
            Ok(()) => Ok(updated),
            Err(StorageError::NotFound) => Err(CampaignError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub fn delete_campaign(&self, campaign_id: &Uuid) -> Result<(), CampaignError> {
        let mut storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("campaign storage mutex poisoned".to_string()))?;
        match storage.delete_campaign(campaign_id) {
            Ok(()) => Ok(()),
            Err(StorageError::NotFound) => Err(CampaignError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_all(&self) -> Result<Vec<Campaign>, CampaignError> {
        let storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("campaign storage mutex poisoned".to_string()))?;
        let mut campaigns = storage.list_campaigns()?;
        campaigns.sort_by_key(|c| c.start_date);
        Ok(campaigns)
    }
}
