use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::api::shared_state::AppState;
use crate::auth_middleware::{jwt_auth_middleware, AuthenticatedUser};
use crate::quiz_engine::{AttemptView, QuizError, QuizSubmission, QuizView};

#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    /// Question index mapped to the chosen option index.
    pub answers: HashMap<usize, usize>,
}

pub fn quiz_routes(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(list_quizzes))
        .route("/my-attempts", get(my_attempts))
        .route("/:id/submit", post(submit_quiz))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            jwt_auth_middleware,
        ))
        .with_state(app_state)
}

async fn list_quizzes(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<QuizView>>, (StatusCode, Json<Value>)> {
    match app_state.quiz_engine.list_for_user(&user.user_id) {
        Ok(quizzes) => Ok(Json(quizzes)),
        Err(e) => {
            error!(error = %e, "quiz listing failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to fetch quizzes."})),
            ))
        }
    }
}

async fn submit_quiz(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(quiz_id): Path<Uuid>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<Json<QuizSubmission>, (StatusCode, Json<Value>)> {
    match app_state
        .quiz_engine
        .submit(&quiz_id, &user.user_id, &payload.answers)
    {
        Ok(submission) => Ok(Json(submission)),
        Err(QuizError::NotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Quiz not found."})),
        )),
        Err(e @ QuizError::AlreadyPassed { points_awarded }) => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": e.to_string(),
                "points_awarded": points_awarded,
                "attempted": true,
            })),
        )),
        Err(QuizError::Validation(msg)) => {
            Err((StatusCode::BAD_REQUEST, Json(json!({"error": msg}))))
        }
        Err(QuizError::Storage(e)) => {
            error!(%quiz_id, error = %e, "quiz submission failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Error submitting quiz."})),
            ))
        }
    }
}

async fn my_attempts(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<AttemptView>>, (StatusCode, Json<Value>)> {
    match app_state.quiz_engine.my_attempts(&user.user_id) {
        Ok(attempts) => Ok(Json(attempts)),
        Err(e) => {
            error!(error = %e, "quiz attempt history failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to retrieve quiz history."})),
            ))
        }
    }
}
