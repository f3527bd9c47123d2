use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use crate::api::shared_state::AppState;
use crate::gamification_engine::LeaderboardEntry;

/// Top 50 citizens, ranked by impact score then points.
pub const LEADERBOARD_LIMIT: usize = 50;

pub fn gamification_routes(app_state: Arc<AppState>) -> Router {
    // The leaderboard is a public motivator, no login required
    Router::new()
        .route("/leaderboard", get(leaderboard))
        .with_state(app_state)
}

async fn leaderboard(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<LeaderboardEntry>>, (StatusCode, Json<Value>)> {
    match app_state.gamification_engine.leaderboard(LEADERBOARD_LIMIT) {
        Ok(entries) => Ok(Json(entries)),
        Err(e) => {
            error!(error = %e, "leaderboard query failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to fetch leaderboard"})),
            ))
        }
    }
}
