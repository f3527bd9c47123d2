use axum::{
    extract::State, http::StatusCode, middleware, response::Json, routing::get, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use crate::api::shared_state::AppState;
use crate::auth_middleware::{jwt_auth_middleware, require_authority};
use crate::types::IssueStatus;

#[derive(Debug, Serialize)]
pub struct IssueSummary {
    pub total: usize,
    pub pending: usize,
    pub verified: usize,
    pub inprogress: usize,
    pub resolved: usize,
    pub rejected: usize,
}

#[derive(Debug, Serialize)]
pub struct GeoPointView {
    pub lat: f64,
    pub lon: f64,
    pub status: IssueStatus,
}

pub fn analytics_routes(app_state: Arc<AppState>) -> Router {
    // Status counts back the authority dashboard; the geo layer feeds the
    // public heatmap
    let protected_routes = Router::new()
        .route("/summary", get(issue_summary))
        .route_layer(middleware::from_fn(require_authority))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            jwt_auth_middleware,
        ));

    let public_routes = Router::new().route("/geo", get(geo_analytics));

    public_routes
        .merge(protected_routes)
        .with_state(app_state)
}

async fn issue_summary(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<IssueSummary>, (StatusCode, Json<Value>)> {
    let issues = app_state.issues_engine.list_issues().map_err(|e| {
        error!(error = %e, "issue summary query failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to fetch issue summary"})),
        )
    })?;

    let mut summary = IssueSummary {
        total: issues.len(),
        pending: 0,
        verified: 0,
        inprogress: 0,
        resolved: 0,
        rejected: 0,
    };
    for issue in &issues {
        match issue.status {
            IssueStatus::Pending => summary.pending += 1,
            IssueStatus::Verified => summary.verified += 1,
            IssueStatus::InProgress => summary.inprogress += 1,
            IssueStatus::Resolved => summary.resolved += 1,
            IssueStatus::Rejected => summary.rejected += 1,
        }
    }

    Ok(Json(summary))
}

async fn geo_analytics(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<GeoPointView>>, (StatusCode, Json<Value>)> {
    let issues = app_state.issues_engine.list_issues().map_err(|e| {
        error!(error = %e, "geo analytics query failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to fetch geo analytics"})),
        )
    })?;

    let points = issues
        .into_iter()
        .map(|issue| GeoPointView {
            lat: issue.location.latitude,
            lon: issue.location.longitude,
            status: issue.status,
        })
        .collect();

    Ok(Json(points))
}
