use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde_json::json;
use std::sync::Arc;

use crate::api::auth::Claims;
use crate::api::shared_state::AppState;
use crate::types::Role;

/// Extractor for the authenticated caller from JWT claims
/// Use this in handlers to get the acting user's id and role automatically
pub struct AuthenticatedUser {
    pub user_id: uuid::Uuid,
    pub role: Role,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Extract claims from request extensions (inserted by jwt_auth_middleware)
        let claims = parts
            .extensions
            .get::<Claims>()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": "Missing authentication. This endpoint requires JWT authentication."})),
                )
            })?;

        Ok(AuthenticatedUser {
            user_id: claims.user_id,
            role: claims.role,
        })
    }
}

/// JWT authentication middleware
/// Extracts and verifies JWT token from Authorization header
/// Injects Claims into request extensions on success
pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    // Extract JWT token from Authorization header
    let token = extract_jwt_token(&request).ok_or_else(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Missing authentication token"})),
        )
    })?;

    // Verify and decode token using jwt_secret from AppState
    let claims = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(state.jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": format!("Invalid token: {}", e)})),
        )
    })?;

    // Insert claims into request extensions
    request.extensions_mut().insert(claims);

    // Continue to next handler
    Ok(next.run(request).await)
}

/// Role gate for authority surfaces. Layered after `jwt_auth_middleware`;
/// lets Authority and Admin callers through, rejects everyone else before
/// the handler runs.
pub async fn require_authority(
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    let claims = request.extensions().get::<Claims>().ok_or_else(|| {
        (
            StatusCode::FORBIDDEN,
            Json(json!({"error": "Access denied: User authentication required."})),
        )
    })?;

    if !matches!(claims.role, Role::Authority | Role::Admin) {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": format!("Access denied: Role '{}' is not permitted.", claims.role)
            })),
        ));
    }

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header (Bearer token)
fn extract_jwt_token(request: &Request) -> Option<String> {
    let auth_header = request.headers().get("Authorization")?.to_str().ok()?;

    // Support "Bearer <token>" format
    auth_header.strip_prefix("Bearer ").map(|s| s.to_string())
}
