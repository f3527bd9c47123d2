use axum::{
    extract::State, http::StatusCode, middleware, response::Json, routing::post, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use crate::api::shared_state::AppState;
use crate::auth_middleware::{jwt_auth_middleware, AuthenticatedUser};
use crate::push_dispatcher::PushError;
use crate::types::PushSubscription;

pub fn notification_routes(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/subscribe", post(subscribe))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            jwt_auth_middleware,
        ))
        .with_state(app_state)
}

async fn subscribe(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(subscription): Json<PushSubscription>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    match app_state
        .push_dispatcher
        .subscribe(&user.user_id, subscription)
    {
        Ok(()) => Ok((StatusCode::CREATED, Json(json!({"success": true})))),
        Err(PushError::Validation(msg)) => {
            Err((StatusCode::BAD_REQUEST, Json(json!({"error": msg}))))
        }
        Err(PushError::Storage(e)) => {
            error!(error = %e, "subscription save failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to save subscription."})),
            ))
        }
    }
}
