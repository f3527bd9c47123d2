use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::api::shared_state::AppState;
use crate::auth_middleware::{jwt_auth_middleware, require_authority, AuthenticatedUser};
use crate::issues_engine::{IssueError, NewIssue};
use crate::media_store::StoredMedia;
use crate::types::{GeoPoint, Issue, IssueCategory, IssueStatus};

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
    pub comment: Option<String>,
}

pub fn issue_routes(app_state: Arc<AppState>) -> Router {
    // Status changes are reserved for Authority/Admin accounts
    let authority_routes = Router::new()
        .route("/:id/status", put(update_status))
        .route("/:id/resolution-status", put(update_resolution_status))
        .route_layer(middleware::from_fn(require_authority));

    Router::new()
        .route("/", post(create_issue))
        .route("/", get(list_issues))
        .route("/:id", get(get_issue))
        .route("/:id/verify", post(toggle_verification))
        .route("/:id/comments", post(add_comment))
        .merge(authority_routes)
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            jwt_auth_middleware,
        ))
        .with_state(app_state)
}

/// Multipart fields accepted by the report and resolution endpoints.
#[derive(Debug, Default)]
struct UploadForm {
    title: String,
    description: String,
    category: String,
    status: String,
    comment: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
    file: Option<(String, Vec<u8>)>,
}

async fn read_upload_form(
    multipart: &mut Multipart,
) -> Result<UploadForm, (StatusCode, Json<Value>)> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid multipart form data"})),
        )
    })? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "media" | "resolution_media" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(|_| {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({"error": "Invalid multipart form data"})),
                    )
                })?;
                if !bytes.is_empty() {
                    form.file = Some((filename, bytes.to_vec()));
                }
            }
            _ => {
                let value = field.text().await.map_err(|_| {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({"error": "Invalid multipart form data"})),
                    )
                })?;
                match name.as_str() {
                    "title" => form.title = value,
                    "description" => form.description = value,
                    "category" => form.category = value,
                    "status" => form.status = value,
                    "comment" => form.comment = Some(value),
                    "lat" => form.lat = Some(value),
                    "lon" => form.lon = Some(value),
                    _ => {}
                }
            }
        }
    }

    Ok(form)
}

/// Client coordinates are used only when both halves of the pair parse.
fn parse_client_location(
    lat: Option<&str>,
    lon: Option<&str>,
) -> Result<Option<GeoPoint>, (StatusCode, Json<Value>)> {
    match (lat, lon) {
        (Some(lat), Some(lon)) if !lat.trim().is_empty() && !lon.trim().is_empty() => {
            let latitude: f64 = lat.trim().parse().map_err(|_| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "Invalid location coordinates."})),
                )
            })?;
            let longitude: f64 = lon.trim().parse().map_err(|_| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "Invalid location coordinates."})),
                )
            })?;
            Ok(Some(GeoPoint {
                longitude,
                latitude,
            }))
        }
        _ => Ok(None),
    }
}

async fn store_upload(
    app_state: &AppState,
    file: Option<(String, Vec<u8>)>,
) -> Result<Option<StoredMedia>, (StatusCode, Json<Value>)> {
    match file {
        Some((filename, bytes)) => {
            let stored = app_state
                .media_store
                .store(&filename, &bytes)
                .await
                .map_err(|e| {
                    error!(error = %e, "media upload failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({"error": "Media upload failed."})),
                    )
                })?;
            Ok(Some(stored))
        }
        None => Ok(None),
    }
}

async fn create_issue(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Issue>), (StatusCode, Json<Value>)> {
    let form = read_upload_form(&mut multipart).await?;

    if form.title.trim().is_empty()
        || form.description.trim().is_empty()
        || form.category.trim().is_empty()
    {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Please fill in all required fields"})),
        ));
    }
    let category = IssueCategory::parse(form.category.trim()).ok_or((
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "Invalid category value."})),
    ))?;

    let client_location = parse_client_location(form.lat.as_deref(), form.lon.as_deref())?;
    // Media is stored before the issue exists; a failed upload aborts the report
    let media = store_upload(&app_state, form.file).await?;

    let new_issue = NewIssue {
        title: form.title,
        description: form.description,
        category,
        client_location,
        media,
    };

    match app_state
        .issues_engine
        .create_issue(&user.user_id, new_issue)
    {
        Ok(issue) => Ok((StatusCode::CREATED, Json(issue))),
        Err(IssueError::Validation(msg)) => {
            Err((StatusCode::BAD_REQUEST, Json(json!({"error": msg}))))
        }
        Err(IssueError::NotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Issue not found"})),
        )),
        Err(IssueError::Storage(e)) => {
            error!(error = %e, "issue creation failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Server error when creating issue"})),
            ))
        }
    }
}

async fn list_issues(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<Issue>>, (StatusCode, Json<Value>)> {
    match app_state.issues_engine.list_issues() {
        Ok(issues) => Ok(Json(issues)),
        Err(e) => {
            error!(error = %e, "issue listing failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Server error when fetching issues"})),
            ))
        }
    }
}

async fn get_issue(
    State(app_state): State<Arc<AppState>>,
    Path(issue_id): Path<Uuid>,
) -> Result<Json<Issue>, (StatusCode, Json<Value>)> {
    match app_state.issues_engine.get_issue(&issue_id) {
        Ok(issue) => Ok(Json(issue)),
        Err(IssueError::NotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Issue not found."})),
        )),
        Err(e) => {
            error!(%issue_id, error = %e, "issue lookup failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Server error when fetching issue"})),
            ))
        }
    }
}

async fn toggle_verification(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(issue_id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match app_state
        .issues_engine
        .toggle_verification(&issue_id, &user.user_id)
    {
        Ok(outcome) => Ok(Json(json!({
            "verifications_count": outcome.verifications_count,
            "new_status": outcome.new_status,
        }))),
        Err(IssueError::NotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Issue not found"})),
        )),
        Err(IssueError::Validation(msg)) => {
            Err((StatusCode::BAD_REQUEST, Json(json!({"error": msg}))))
        }
        Err(IssueError::Storage(e)) => {
            error!(%issue_id, error = %e, "verification toggle failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Server error when toggling verification"})),
            ))
        }
    }
}

async fn add_comment(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(issue_id): Path<Uuid>,
    Json(payload): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    match app_state
        .issues_engine
        .add_comment(&issue_id, &user.user_id, &payload.text)
    {
        Ok(comment) => Ok((
            StatusCode::CREATED,
            Json(json!({"message": "Comment added successfully.", "comment": comment})),
        )),
        Err(IssueError::Validation(msg)) => {
            Err((StatusCode::BAD_REQUEST, Json(json!({"error": msg}))))
        }
        Err(IssueError::NotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Issue not found."})),
        )),
        Err(IssueError::Storage(e)) => {
            error!(%issue_id, error = %e, "comment append failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Server error while adding comment."})),
            ))
        }
    }
}

async fn update_status(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(issue_id): Path<Uuid>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<Json<Issue>, (StatusCode, Json<Value>)> {
    let new_status = IssueStatus::parse(&payload.status).ok_or((
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "Invalid status provided."})),
    ))?;
    // Empty comment falls back to the engine's default timeline comment
    let comment = payload.comment.filter(|c| !c.trim().is_empty());

    match app_state
        .issues_engine
        .update_status(&issue_id, &user.user_id, new_status, comment)
        .await
    {
        Ok(issue) => Ok(Json(issue)),
        Err(IssueError::Validation(msg)) => {
            Err((StatusCode::BAD_REQUEST, Json(json!({"error": msg}))))
        }
        Err(IssueError::NotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Issue not found"})),
        )),
        Err(IssueError::Storage(e)) => {
            error!(%issue_id, error = %e, "status update failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Server error when updating status"})),
            ))
        }
    }
}

async fn update_resolution_status(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(issue_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<Issue>, (StatusCode, Json<Value>)> {
    let form = read_upload_form(&mut multipart).await?;

    // Proof-of-resolution is mandatory on this path
    if form.status != "Resolved" || form.file.is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Status must be Resolved and resolution media is required."})),
        ));
    }

    let media = match store_upload(&app_state, form.file).await? {
        Some(media) => media,
        None => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(
                    json!({"error": "Status must be Resolved and resolution media is required."}),
                ),
            ))
        }
    };
    let comment = form.comment.filter(|c| !c.trim().is_empty());

    match app_state
        .issues_engine
        .resolve_with_proof(&issue_id, &user.user_id, comment, media)
        .await
    {
        Ok(issue) => Ok(Json(issue)),
        Err(IssueError::NotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Issue not found"})),
        )),
        Err(IssueError::Validation(msg)) => {
            Err((StatusCode::BAD_REQUEST, Json(json!({"error": msg}))))
        }
        Err(IssueError::Storage(e)) => {
            error!(%issue_id, error = %e, "resolution update failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Server error during resolution update."})),
            ))
        }
    }
}
