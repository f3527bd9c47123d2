use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::api::shared_state::AppState;
use crate::auth_middleware::{jwt_auth_middleware, AuthenticatedUser};
use crate::campaigns_engine::CampaignError;
use crate::types::Campaign;

/// Campaign plus the calling user's participation status.
#[derive(Debug, Serialize)]
pub struct CampaignWithStatus {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub is_joined: bool,
    pub user_progress: i64,
}

pub fn campaign_routes(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(list_active_campaigns))
        .route("/:id/join", post(join_campaign))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            jwt_auth_middleware,
        ))
        .with_state(app_state)
}

async fn list_active_campaigns(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<CampaignWithStatus>>, (StatusCode, Json<Value>)> {
    let campaigns = app_state
        .campaigns_engine
        .active_campaigns(Utc::now())
        .map_err(|e| {
            error!(error = %e, "campaign listing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to fetch campaigns."})),
            )
        })?;

    let with_status = campaigns
        .into_iter()
        .map(|campaign| {
            let participant = campaign
                .participants
                .iter()
                .find(|p| p.user_id == user.user_id);
            let is_joined = participant.is_some();
            let user_progress = participant.map(|p| p.progress).unwrap_or(0);
            CampaignWithStatus {
                campaign,
                is_joined,
                user_progress,
            }
        })
        .collect();

    Ok(Json(with_status))
}

async fn join_campaign(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match app_state.campaigns_engine.join(&campaign_id, &user.user_id) {
        Ok(()) => Ok(Json(
            json!({"message": "Successfully joined campaign!", "is_joined": true}),
        )),
        Err(CampaignError::NotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Campaign not found."})),
        )),
        Err(e @ CampaignError::Ended) => {
            Err((StatusCode::BAD_REQUEST, Json(json!({"error": e.to_string()}))))
        }
        Err(e @ CampaignError::AlreadyJoined) => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": e.to_string(), "is_joined": true})),
        )),
        Err(CampaignError::Validation(msg)) => {
            Err((StatusCode::BAD_REQUEST, Json(json!({"error": msg}))))
        }
        Err(CampaignError::Storage(e)) => {
            error!(%campaign_id, error = %e, "campaign join failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to join campaign."})),
            ))
        }
    }
}
