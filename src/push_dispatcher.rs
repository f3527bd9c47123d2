use crate::storage::{StorageBackend, StorageError};
use crate::types::{Issue, IssueStatus, PushSubscription};
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PushError {
    #[error("Invalid subscription: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Delivers report-update notifications to the reporter's push endpoint.
/// Delivery is strictly best effort: a committed status change is never
/// failed or rolled back because the push leg misbehaved.
#[derive(Debug)]
pub struct PushDispatcher<S: StorageBackend> {
    storage: Arc<std::sync::Mutex<S>>,
    http: reqwest::Client,
}

impl<S: StorageBackend> Clone for PushDispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            http: self.http.clone(),
        }
    }
}

impl<S: StorageBackend> PushDispatcher<S> {
    pub fn new(storage: Arc<std::sync::Mutex<S>>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { storage, http }
    }

    pub fn validate_endpoint(url: &str) -> Result<(), PushError> {
        let parsed = url::Url::parse(url)
            .map_err(|e| PushError::Validation(format!("Invalid URL: {}", e)))?;

        // Only allow HTTP and HTTPS
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PushError::Validation(
                "Only HTTP and HTTPS URLs are allowed".to_string(),
            ));
        }

        // Reject localhost and private IP ranges
        if let Some(host) = parsed.host_str() {
            if host == "localhost" || host == "127.0.0.1" || host == "0.0.0.0" {
                return Err(PushError::Validation(
                    "Localhost URLs are not allowed".to_string(),
                ));
            }

            if host.starts_with("192.168.") || host.starts_with("10.") || host.starts_with("172.16.")
            {
                return Err(PushError::Validation(
                    "Private IP addresses are not allowed".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Stores the subscription on the user. The newest subscription wins.
    pub fn subscribe(
        &self,
        user_id: &Uuid,
        subscription: PushSubscription,
    ) -> Result<(), PushError> {
        Self::validate_endpoint(&subscription.endpoint)?;

        let mut storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("push storage mutex poisoned".to_string()))?;
        storage.set_push_subscription(user_id, Some(subscription))?;
        info!(%user_id, "push subscription saved");
        Ok(())
    }

    /// Notifies the reporter that their issue changed status. Failures are
    /// logged and swallowed; an endpoint answering 410 Gone has its stored
    /// subscription cleared.
    pub async fn notify_issue_update(&self, issue: &Issue, new_status: IssueStatus) {
        let subscription = match self.reporter_subscription(&issue.reported_by) {
            Ok(Some(sub)) => sub,
            Ok(None) => {
                debug!(issue_id = %issue.id, "reporter has no push subscription");
                return;
            }
            Err(e) => {
                warn!(issue_id = %issue.id, error = %e, "could not load reporter subscription");
                return;
            }
        };

        let issue_id = issue.id.to_string();
        let payload = json!({
            "title": format!("Report Update: {}", new_status),
            "body": format!(
                "Your issue (ID: {}...) has been updated to \"{}\".",
                &issue_id[..8],
                new_status
            ),
            "url": format!("/issues/{}", issue.id),
        });

        match self
            .http
            .post(&subscription.endpoint)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) if response.status() == StatusCode::GONE => {
                info!(issue_id = %issue.id, "push endpoint gone, clearing subscription");
                self.clear_subscription(&issue.reported_by);
            }
            Ok(response) if !response.status().is_success() => {
                warn!(
                    issue_id = %issue.id,
                    status = %response.status(),
                    "push endpoint rejected notification"
                );
            }
            Ok(_) => {
                debug!(issue_id = %issue.id, "push notification delivered");
            }
            Err(e) => {
                warn!(issue_id = %issue.id, error = %e, "push notification failed");
            }
        }
    }

    fn reporter_subscription(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<PushSubscription>, StorageError> {
        let storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("push storage mutex poisoned".to_string()))?;
        Ok(storage.get_user(user_id)?.and_then(|u| u.subscription))
    }

    fn clear_subscription(&self, user_id: &Uuid) {
        let result = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockError("push storage mutex poisoned".to_string()))
            .and_then(|mut storage| storage.set_push_subscription(user_id, None));
        if let Err(e) = result {
            warn!(%user_id, error = %e, "failed to clear stale subscription");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;

    #[test]
    fn endpoint_must_be_http() {
        assert!(PushDispatcher::<InMemoryStorage>::validate_endpoint(
            "https://push.example.com/send/abc"
        )
        .is_ok());
        assert!(PushDispatcher::<InMemoryStorage>::validate_endpoint("ftp://example.com").is_err());
        assert!(PushDispatcher::<InMemoryStorage>::validate_endpoint("not a url").is_err());
        assert!(
            PushDispatcher::<InMemoryStorage>::validate_endpoint("http://localhost/push").is_err()
        );
    }
}
