use crate::campaigns_engine::CampaignsEngine;
use crate::gamification_engine::{GamificationEngine, PointAction};
use crate::media_store::StoredMedia;
use crate::push_dispatcher::PushDispatcher;
use crate::storage::{StorageBackend, StorageError};
use crate::types::{
    GeoPoint, Issue, IssueCategory, IssueComment, IssueStatus, TargetAction, TimelineEntry,
};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// The community verification threshold. The verifier that brings a Pending
/// issue to this count flips it to Verified.
pub const VERIFICATION_THRESHOLD: usize = 5;

#[derive(Error, Debug)]
pub enum IssueError {
    #[error("Issue not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct NewIssue {
    pub title: String,
    pub description: String,
    pub category: IssueCategory,
    pub client_location: Option<GeoPoint>,
    pub media: Option<StoredMedia>,
}

#[derive(Debug)]
pub struct VerificationOutcome {
    pub verifications_count: usize,
    pub new_status: IssueStatus,
}

/// Orchestrates the issue lifecycle. Citizen and authority actions mutate
/// the issue first; the ledger, campaign tracker and push dispatcher run as
/// side effects after the mutation commits and never undo it.
pub struct IssuesEngine<S: StorageBackend> {
    storage: Arc<std::sync::Mutex<S>>,
    ledger: GamificationEngine<S>,
    campaigns: CampaignsEngine<S>,
    push: PushDispatcher<S>,
}

impl<S: StorageBackend> IssuesEngine<S> {
    pub fn new(
        storage: Arc<std::sync::Mutex<S>>,
        ledger: GamificationEngine<S>,
        campaigns: CampaignsEngine<S>,
        push: PushDispatcher<S>,
    ) -> Self {
        Self {
            storage,
            ledger,
            campaigns,
            push,
        }
    }

    /// Files a new report. Client coordinates win over coordinates the media
    /// pipeline extracted from the upload; with neither, the report is
    /// rejected before anything is stored.
    pub fn create_issue(&self, reporter: &Uuid, new_issue: NewIssue) -> Result<Issue, IssueError> {
        if new_issue.title.trim().is_empty() || new_issue.description.trim().is_empty() {
            return Err(IssueError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }

        let media_gps = new_issue.media.as_ref().and_then(|m| m.gps);
        let location = match new_issue.client_location.or(media_gps) {
            Some(location) => location,
            None => {
                return Err(IssueError::Validation(
                    "Location data (GPS) is required to report an issue.".to_string(),
                ))
            }
        };

        let now = Utc::now();
        let issue = Issue {
            id: Uuid::new_v4(),
            title: new_issue.title.trim().to_string(),
            description: new_issue.description.trim().to_string(),
            category: new_issue.category,
            status: IssueStatus::Pending,
            location,
            media_url: new_issue.media.map(|m| m.url),
            reported_by: *reporter,
            verifications: Vec::new(),
            timeline: vec![TimelineEntry::new(
                IssueStatus::Pending,
                "Issue reported.",
                Some(*reporter),
            )],
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        {
            let mut storage = self.storage.lock().map_err(|_| {
                StorageError::LockError("issue storage mutex poisoned".to_string())
            })?;
            storage.store_issue(&issue)?;
        }

        if let Err(e) = self.ledger.award(reporter, PointAction::ReportIssue) {
            warn!(issue_id = %issue.id, error = %e, "report points not credited");
        }
        if let Err(e) = self.campaigns.advance(reporter, TargetAction::Report) {
            warn!(issue_id = %issue.id, error = %e, "report campaigns not advanced");
        }

        Ok(issue)
    }

    /// Adds or removes the caller from the verifier list. The add direction
    /// awards points and can flip a Pending issue to Verified at the
    /// threshold; removing a verification reverses neither points nor
    /// campaign progress.
    pub fn toggle_verification(
        &self,
        issue_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<VerificationOutcome, IssueError> {
        let (outcome, added) = {
            let mut storage = self.storage.lock().map_err(|_| {
                StorageError::LockError("issue storage mutex poisoned".to_string())
            })?;

            let mut issue = storage.get_issue(issue_id)?.ok_or(IssueError::NotFound)?;

            let added = match issue.verifications.iter().position(|v| v == user_id) {
                Some(index) => {
                    issue.verifications.remove(index);
                    false
                }
                None => {
                    issue.verifications.push(*user_id);
                    if issue.verifications.len() >= VERIFICATION_THRESHOLD
                        && issue.status == IssueStatus::Pending
                    {
                        issue.status = IssueStatus::Verified;
                        issue.timeline.push(TimelineEntry::new(
                            IssueStatus::Verified,
                            "Community verified (5+ verifications).",
                            Some(*user_id),
                        ));
                    }
                    true
                }
            };

            issue.updated_at = Utc::now();
            storage.update_issue(&issue)?;

            (
                VerificationOutcome {
                    verifications_count: issue.verifications.len(),
                    new_status: issue.status,
                },
                added,
            )
        };

        if added {
            if let Err(e) = self.ledger.award(user_id, PointAction::VerifyIssue) {
                warn!(%issue_id, error = %e, "verification points not credited");
            }
            if let Err(e) = self.campaigns.advance(user_id, TargetAction::Verify) {
                warn!(%issue_id, error = %e, "verify campaigns not advanced");
            }
        }

        Ok(outcome)
    }

    pub fn add_comment(
        &self,
        issue_id: &Uuid,
        user_id: &Uuid,
        text: &str,
    ) -> Result<IssueComment, IssueError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(IssueError::Validation(
                "Comment text is required.".to_string(),
            ));
        }

        let comment = IssueComment {
            id: Uuid::new_v4(),
            user: *user_id,
            text: trimmed.to_string(),
            date: Utc::now(),
        };

        {
            let mut storage = self.storage.lock().map_err(|_| {
                StorageError::LockError("issue storage mutex poisoned".to_string())
            })?;
            let mut issue = storage.get_issue(issue_id)?.ok_or(IssueError::NotFound)?;
            issue.comments.push(comment.clone());
            issue.updated_at = Utc::now();
            storage.update_issue(&issue)?;
        }

        if let Err(e) = self.ledger.award(user_id, PointAction::Comment) {
            warn!(%issue_id, error = %e, "comment points not credited");
        }
        if let Err(e) = self.campaigns.advance(user_id, TargetAction::Comment) {
            warn!(%issue_id, error = %e, "comment campaigns not advanced");
        }

        Ok(comment)
    }

    /// Authority/Admin status change. The reporter earns the resolution
    /// bonus on the first transition into Resolved over the issue's whole
    /// history, and is notified whenever the status actually changed.
    pub async fn update_status(
        &self,
        issue_id: &Uuid,
        actor: &Uuid,
        new_status: IssueStatus,
        comment: Option<String>,
    ) -> Result<Issue, IssueError> {
        if new_status == IssueStatus::Pending {
            return Err(IssueError::Validation("Invalid status provided.".to_string()));
        }

        let (issue, old_status, first_resolution) = {
            let mut storage = self.storage.lock().map_err(|_| {
                StorageError::LockError("issue storage mutex poisoned".to_string())
            })?;

            let mut issue = storage.get_issue(issue_id)?.ok_or(IssueError::NotFound)?;
            let old_status = issue.status;
            let first_resolution = new_status == IssueStatus::Resolved
                && !issue
                    .timeline
                    .iter()
                    .any(|e| e.status == IssueStatus::Resolved);

            let entry_comment = comment.unwrap_or_else(|| {
                format!("Status updated to {} by Authority/Admin.", new_status)
            });
            issue.status = new_status;
            issue
                .timeline
                .push(TimelineEntry::new(new_status, &entry_comment, Some(*actor)));
            issue.updated_at = Utc::now();
            storage.update_issue(&issue)?;

            (issue, old_status, first_resolution)
        };

        if first_resolution {
            if let Err(e) = self
                .ledger
                .award(&issue.reported_by, PointAction::ResolutionBonus)
            {
                warn!(%issue_id, error = %e, "resolution bonus not credited");
            }
        }

        if old_status != new_status {
            self.push.notify_issue_update(&issue, new_status).await;
        }

        Ok(issue)
    }

    /// Resolution with photo proof. The first transition into Resolved pays
    /// the reporter's bonus, credits the acting authority a verification
    /// award, advances the authority's Verify campaigns and notifies the
    /// reporter; repeated Resolved updates append to the timeline only.
    pub async fn resolve_with_proof(
        &self,
        issue_id: &Uuid,
        actor: &Uuid,
        comment: Option<String>,
        media: StoredMedia,
    ) -> Result<Issue, IssueError> {
        let (issue, first_resolution) = {
            let mut storage = self.storage.lock().map_err(|_| {
                StorageError::LockError("issue storage mutex poisoned".to_string())
            })?;

            let mut issue = storage.get_issue(issue_id)?.ok_or(IssueError::NotFound)?;
            let first_resolution = !issue
                .timeline
                .iter()
                .any(|e| e.status == IssueStatus::Resolved);

            let entry_comment = comment
                .unwrap_or_else(|| "Issue resolved by authority with photo proof.".to_string());
            let mut entry =
                TimelineEntry::new(IssueStatus::Resolved, &entry_comment, Some(*actor));
            entry.resolution_media_url = Some(media.url.clone());

            issue.status = IssueStatus::Resolved;
            issue.timeline.push(entry);
            issue.updated_at = Utc::now();
            storage.update_issue(&issue)?;

            (issue, first_resolution)
        };

        if first_resolution {
            if let Err(e) = self
                .ledger
                .award(&issue.reported_by, PointAction::ResolutionBonus)
            {
                warn!(%issue_id, error = %e, "resolution bonus not credited");
            }
            if let Err(e) = self.ledger.award(actor, PointAction::VerifyIssue) {
                warn!(%issue_id, error = %e, "authority resolution points not credited");
            }
            if let Err(e) = self.campaigns.advance(actor, TargetAction::Verify) {
                warn!(%issue_id, error = %e, "authority verify campaigns not advanced");
            }
            self.push
                .notify_issue_update(&issue, IssueStatus::Resolved)
                .await;
        }

        Ok(issue)
    }

    pub fn get_issue(&self, issue_id: &Uuid) -> Result<Issue, IssueError> {
        let storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("issue storage mutex poisoned".to_string()))?;
        storage.get_issue(issue_id)?.ok_or(IssueError::NotFound)
    }

    /// All issues, newest first.
    pub fn list_issues(&self) -> Result<Vec<Issue>, IssueError> {
        let storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("issue storage mutex poisoned".to_string()))?;
        let mut issues = storage.list_issues()?;
        issues.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(issues)
    }
}
