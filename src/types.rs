use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Citizen,
    Authority,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Citizen => write!(f, "Citizen"),
            Role::Authority => write!(f, "Authority"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushKeys {
    pub p256dh: String,
    pub auth: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: PushKeys,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub points: i64,
    pub badges: Vec<String>,
    pub impact_score: i64,
    pub streak: i64,
    pub last_activity_date: Option<DateTime<Utc>>,
    pub subscription: Option<PushSubscription>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: &str, email: &str, password_hash: &str, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
            points: 0,
            badges: Vec::new(),
            impact_score: 0,
            streak: 0,
            last_activity_date: None,
            subscription: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueCategory {
    Roads,
    Waste,
    Water,
    Electricity,
    Other,
}

impl IssueCategory {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Roads" => Some(IssueCategory::Roads),
            "Waste" => Some(IssueCategory::Waste),
            "Water" => Some(IssueCategory::Water),
            "Electricity" => Some(IssueCategory::Electricity),
            "Other" => Some(IssueCategory::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueCategory::Roads => write!(f, "Roads"),
            IssueCategory::Waste => write!(f, "Waste"),
            IssueCategory::Water => write!(f, "Water"),
            IssueCategory::Electricity => write!(f, "Electricity"),
            IssueCategory::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueStatus {
    Pending,
    Verified,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
    Rejected,
}

impl IssueStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(IssueStatus::Pending),
            "Verified" => Some(IssueStatus::Verified),
            "In Progress" => Some(IssueStatus::InProgress),
            "Resolved" => Some(IssueStatus::Resolved),
            "Rejected" => Some(IssueStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueStatus::Pending => write!(f, "Pending"),
            IssueStatus::Verified => write!(f, "Verified"),
            IssueStatus::InProgress => write!(f, "In Progress"),
            IssueStatus::Resolved => write!(f, "Resolved"),
            IssueStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub status: IssueStatus,
    pub comment: String,
    pub date: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_media_url: Option<String>,
}

impl TimelineEntry {
    pub fn new(status: IssueStatus, comment: &str, updated_by: Option<Uuid>) -> Self {
        Self {
            status,
            comment: comment.to_string(),
            date: Utc::now(),
            updated_by,
            resolution_media_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueComment {
    pub id: Uuid,
    pub user: Uuid,
    pub text: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: IssueCategory,
    pub status: IssueStatus,
    pub location: GeoPoint,
    pub media_url: Option<String>,
    pub reported_by: Uuid,
    pub verifications: Vec<Uuid>,
    pub timeline: Vec<TimelineEntry>,
    pub comments: Vec<IssueComment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetAction {
    Report,
    Verify,
    Comment,
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignParticipant {
    pub user_id: Uuid,
    pub progress: i64,
    pub is_complete: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub target_action: TargetAction,
    pub target_goal: i64,
    pub reward_points: i64,
    pub reward_badge: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub participants: Vec<CampaignParticipant>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub points_awarded: i64,
    pub questions: Vec<QuizQuestion>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub quiz_id: Uuid,
    pub score: f64,
    pub passed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
