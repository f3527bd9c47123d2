use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::api::shared_state::AppState;
use crate::auth_middleware::{jwt_auth_middleware, require_authority, AuthenticatedUser};
use crate::campaigns_engine::{CampaignError, NewCampaign};
use crate::quiz_engine::QuizError;
use crate::types::{Campaign, Quiz, QuizQuestion, TargetAction};

fn default_target_goal() -> i64 {
    1
}

fn default_reward_points() -> i64 {
    50
}

fn default_reward_badge() -> String {
    "Campaign Contributor".to_string()
}

fn default_points_awarded() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub title: String,
    pub description: String,
    pub target_action: String,
    #[serde(default = "default_target_goal")]
    pub target_goal: i64,
    #[serde(default = "default_reward_points")]
    pub reward_points: i64,
    #[serde(default = "default_reward_badge")]
    pub reward_badge: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCampaignRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_action: Option<String>,
    pub target_goal: Option<i64>,
    pub reward_points: Option<i64>,
    pub reward_badge: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateQuizRequest {
    pub title: String,
    pub description: String,
    #[serde(default = "default_points_awarded")]
    pub points_awarded: i64,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuizRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub points_awarded: Option<i64>,
    pub questions: Option<Vec<QuizQuestion>>,
}

pub fn admin_routes(app_state: Arc<AppState>) -> Router {
    // Whole group is restricted to Authority/Admin accounts
    Router::new()
        .route("/campaigns", post(create_campaign))
        .route("/campaigns", get(list_campaigns))
        .route("/campaigns/:id", get(get_campaign))
        .route("/campaigns/:id", put(update_campaign))
        .route("/campaigns/:id", delete(delete_campaign))
        .route("/quizzes", post(create_quiz))
        .route("/quizzes", get(list_quizzes))
        .route("/quizzes/:id", get(get_quiz))
        .route("/quizzes/:id", put(update_quiz))
        .route("/quizzes/:id", delete(delete_quiz))
        .route_layer(middleware::from_fn(require_authority))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            jwt_auth_middleware,
        ))
        .with_state(app_state)
}

fn parse_target_action(value: &str) -> Result<TargetAction, String> {
    match value {
        "Report" => Ok(TargetAction::Report),
        "Verify" => Ok(TargetAction::Verify),
        "Comment" => Ok(TargetAction::Comment),
        "Custom" => Ok(TargetAction::Custom),
        _ => Err(format!("Invalid target action: {}", value)),
    }
}

/// Accepts RFC 3339 plus the offset-less shapes browser date inputs send.
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}

fn campaign_error_response(e: CampaignError, server_msg: &str) -> (StatusCode, Json<Value>) {
    match e {
        CampaignError::NotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Campaign not found."})),
        ),
        CampaignError::Validation(msg) => (StatusCode::BAD_REQUEST, Json(json!({"error": msg}))),
        CampaignError::Ended | CampaignError::AlreadyJoined => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": e.to_string()})),
        ),
        CampaignError::Storage(inner) => {
            error!(error = %inner, "{}", server_msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": server_msg})),
            )
        }
    }
}

fn quiz_error_response(e: QuizError, server_msg: &str) -> (StatusCode, Json<Value>) {
    match e {
        QuizError::NotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Quiz not found."})),
        ),
        QuizError::Validation(msg) => (StatusCode::BAD_REQUEST, Json(json!({"error": msg}))),
        QuizError::AlreadyPassed { .. } => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": e.to_string()})),
        ),
        QuizError::Storage(inner) => {
            error!(error = %inner, "{}", server_msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": server_msg})),
            )
        }
    }
}

// --- Campaign management ---

async fn create_campaign(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let target_action = parse_target_action(&payload.target_action)
        .map_err(|msg| (StatusCode::BAD_REQUEST, Json(json!({"error": msg}))))?;

    let (start_date, end_date) = match (
        parse_date(&payload.start_date),
        parse_date(&payload.end_date),
    ) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Invalid start or end date format provided."})),
            ))
        }
    };

    let new_campaign = NewCampaign {
        title: payload.title,
        description: payload.description,
        target_action,
        target_goal: payload.target_goal,
        reward_points: payload.reward_points,
        reward_badge: payload.reward_badge,
        start_date,
        end_date,
    };

    match app_state
        .campaigns_engine
        .create_campaign(new_campaign, &user.user_id)
    {
        Ok(campaign) => Ok((
            StatusCode::CREATED,
            Json(json!({"message": "Campaign created successfully!", "campaign": campaign})),
        )),
        Err(e) => Err(campaign_error_response(
            e,
            "Internal server error during campaign creation.",
        )),
    }
}

async fn list_campaigns(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<Campaign>>, (StatusCode, Json<Value>)> {
    match app_state.campaigns_engine.list_all() {
        Ok(campaigns) => Ok(Json(campaigns)),
        Err(e) => Err(campaign_error_response(e, "Error fetching campaigns.")),
    }
}

async fn get_campaign(
    State(app_state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Campaign>, (StatusCode, Json<Value>)> {
    match app_state.campaigns_engine.get_campaign(&campaign_id) {
        Ok(campaign) => Ok(Json(campaign)),
        Err(e) => Err(campaign_error_response(e, "Error fetching campaign.")),
    }
}

async fn update_campaign(
    State(app_state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
    Json(payload): Json<UpdateCampaignRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut campaign = app_state
        .campaigns_engine
        .get_campaign(&campaign_id)
        .map_err(|e| campaign_error_response(e, "Error fetching campaign."))?;

    if let Some(title) = payload.title {
        campaign.title = title;
    }
    if let Some(description) = payload.description {
        campaign.description = description;
    }
    if let Some(action) = payload.target_action {
        campaign.target_action = parse_target_action(&action)
            .map_err(|msg| (StatusCode::BAD_REQUEST, Json(json!({"error": msg}))))?;
    }
    if let Some(goal) = payload.target_goal {
        campaign.target_goal = goal;
    }
    if let Some(points) = payload.reward_points {
        campaign.reward_points = points;
    }
    if let Some(badge) = payload.reward_badge {
        campaign.reward_badge = badge;
    }
    if let Some(start) = payload.start_date {
        campaign.start_date = parse_date(&start).ok_or((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid start or end date format provided."})),
        ))?;
    }
    if let Some(end) = payload.end_date {
        campaign.end_date = parse_date(&end).ok_or((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid start or end date format provided."})),
        ))?;
    }

    match app_state.campaigns_engine.update_campaign(&campaign) {
        Ok(campaign) => Ok(Json(
            json!({"message": "Campaign updated successfully!", "campaign": campaign}),
        )),
        Err(e) => Err(campaign_error_response(e, "Error updating campaign.")),
    }
}

async fn delete_campaign(
    State(app_state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match app_state.campaigns_engine.delete_campaign(&campaign_id) {
        Ok(()) => Ok(Json(json!({"message": "Campaign deleted successfully!"}))),
        Err(e) => Err(campaign_error_response(e, "Error deleting campaign.")),
    }
}

// --- Quiz management ---

async fn create_quiz(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    match app_state.quiz_engine.create_quiz(
        &payload.title,
        &payload.description,
        payload.points_awarded,
        payload.questions,
        &user.user_id,
    ) {
        Ok(quiz) => Ok((
            StatusCode::CREATED,
            Json(json!({"message": "Quiz created successfully!", "quiz": quiz})),
        )),
        Err(e) => Err(quiz_error_response(e, "Error creating quiz.")),
    }
}

async fn list_quizzes(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<Quiz>>, (StatusCode, Json<Value>)> {
    match app_state.quiz_engine.list_all() {
        Ok(quizzes) => Ok(Json(quizzes)),
        Err(e) => Err(quiz_error_response(e, "Error fetching quizzes.")),
    }
}

async fn get_quiz(
    State(app_state): State<Arc<AppState>>,
    Path(quiz_id): Path<Uuid>,
) -> Result<Json<Quiz>, (StatusCode, Json<Value>)> {
    match app_state.quiz_engine.get_quiz(&quiz_id) {
        Ok(quiz) => Ok(Json(quiz)),
        Err(e) => Err(quiz_error_response(e, "Error fetching quiz.")),
    }
}

async fn update_quiz(
    State(app_state): State<Arc<AppState>>,
    Path(quiz_id): Path<Uuid>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut quiz = app_state
        .quiz_engine
        .get_quiz(&quiz_id)
        .map_err(|e| quiz_error_response(e, "Error fetching quiz."))?;

    if let Some(title) = payload.title {
        quiz.title = title;
    }
    if let Some(description) = payload.description {
        quiz.description = description;
    }
    if let Some(points) = payload.points_awarded {
        quiz.points_awarded = points;
    }
    if let Some(questions) = payload.questions {
        quiz.questions = questions;
    }

    match app_state.quiz_engine.update_quiz(&quiz) {
        Ok(quiz) => Ok(Json(
            json!({"message": "Quiz updated successfully!", "quiz": quiz}),
        )),
        Err(e) => Err(quiz_error_response(e, "Error updating quiz.")),
    }
}

async fn delete_quiz(
    State(app_state): State<Arc<AppState>>,
    Path(quiz_id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match app_state.quiz_engine.delete_quiz(&quiz_id) {
        Ok(()) => Ok(Json(json!({"message": "Quiz deleted successfully!"}))),
        Err(e) => Err(quiz_error_response(e, "Error deleting quiz.")),
    }
}
