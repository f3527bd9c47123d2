use crate::api::shared_state::AppState;
use crate::auth_middleware::{jwt_auth_middleware, AuthenticatedUser};
use crate::storage::StorageBackend;
use crate::storage_helpers::{with_storage, with_storage_mut, StorageLockError};
use crate::types::{Role, User};
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Account passwords only need length here; the platform targets broad
/// civic participation rather than workforce-grade password policy.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub role: Role,
    pub exp: usize,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: i64,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub points: i64,
    pub badges: Vec<String>,
    pub impact_score: i64,
    pub streak: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            points: user.points,
            badges: user.badges.clone(),
            impact_score: user.impact_score,
            streak: user.streak,
            created_at: user.created_at,
        }
    }
}

// Auth state contains JWT secret
pub struct AuthState {
    pub jwt_secret: String,
}

impl AuthState {
    pub fn generate_token(
        &self,
        user_id: &Uuid,
        role: Role,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let expiration = Utc::now()
            .checked_add_signed(Duration::hours(24))
            .unwrap_or_else(Utc::now)
            .timestamp();

        let claims = Claims {
            user_id: *user_id,
            role,
            exp: expiration as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )
    }
}

pub fn auth_routes(app_state: Arc<AppState>) -> Router {
    // Create AuthState using the shared JWT secret from AppState
    let auth_state = Arc::new(AuthState {
        jwt_secret: app_state.jwt_secret.clone(),
    });

    // Unauthenticated routes
    let public_routes = Router::new()
        .route("/login", post(login))
        .route("/register", post(register));

    // Protected routes requiring JWT authentication
    let protected_routes = Router::new().route("/me", get(me)).route_layer(
        middleware::from_fn_with_state(app_state.clone(), jwt_auth_middleware),
    );

    // Merge public and protected routes
    public_routes
        .merge(protected_routes)
        .with_state((auth_state, app_state))
}

fn lock_error_response(e: StorageLockError) -> (StatusCode, Json<Value>) {
    match e {
        StorageLockError::Timeout => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "Service temporarily busy, please retry"})),
        ),
        StorageLockError::Other(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": msg})),
        ),
    }
}

#[instrument(skip(auth, app_state, payload), fields(email = %payload.email))]
async fn login(
    State((auth, app_state)): State<(Arc<AuthState>, Arc<AppState>)>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, Json<Value>)> {
    let user = with_storage(&app_state.shared_storage, "auth_login_get_user", |storage| {
        Ok(storage.get_user_by_email(&payload.email)?)
    })
    .map_err(lock_error_response)?;

    if let Some(user) = user {
        // Verify password (bcrypt is CPU intensive - must be done WITHOUT holding the lock!)
        let password_valid = verify(&payload.password, &user.password_hash).unwrap_or(false);

        if password_valid {
            let token = auth.generate_token(&user.id, user.role).map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Failed to generate token"})),
                )
            })?;

            let expires_at = Utc::now()
                .checked_add_signed(Duration::hours(24))
                .unwrap_or_else(Utc::now)
                .timestamp();

            info!("Login successful for user: {}", user.id);
            return Ok(Json(AuthResponse {
                token,
                expires_at,
                user: UserProfile::from(&user),
            }));
        } else {
            warn!("Login failed: invalid password for {}", payload.email);
        }
    } else {
        warn!("Login failed: no account for {}", payload.email);
    }

    Err((
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Invalid credentials"})),
    ))
}

#[instrument(skip(auth, app_state, payload), fields(username = %payload.username, email = %payload.email))]
async fn register(
    State((auth, app_state)): State<(Arc<AuthState>, Arc<AppState>)>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, Json<Value>)> {
    if payload.username.trim().len() < 3 {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Username must be at least 3 characters long"})),
        ));
    }
    if !payload.email.contains('@') {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "A valid email address is required"})),
        ));
    }
    if let Err(e) = validate_password(&payload.password) {
        return Err((StatusCode::BAD_REQUEST, Json(json!({"error": e}))));
    }

    // Check for existing username/email before doing the expensive hash
    with_storage(
        &app_state.shared_storage,
        "auth_register_check_existing",
        |storage| {
            if storage.get_user_by_username(payload.username.trim())?.is_some() {
                return Err("Username already exists".into());
            }
            if storage.get_user_by_email(&payload.email)?.is_some() {
                return Err("Email already exists".into());
            }
            Ok(())
        },
    )
    .map_err(|e| match e {
        StorageLockError::Timeout => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "Service temporarily busy, please retry"})),
        ),
        StorageLockError::Other(msg) => {
            if msg.contains("already exists") {
                (StatusCode::CONFLICT, Json(json!({"error": msg})))
            } else {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": msg})),
                )
            }
        }
    })?;

    // Hash password (CPU intensive - must be done WITHOUT holding the lock!)
    let password_hash = hash(&payload.password, DEFAULT_COST).map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to hash password"})),
        )
    })?;

    // Everyone signs up as a Citizen; Authority and Admin accounts are
    // provisioned out of band.
    let user = User::new(
        payload.username.trim(),
        &payload.email,
        &password_hash,
        Role::Citizen,
    );

    with_storage_mut(&app_state.shared_storage, "auth_register_store", |storage| {
        Ok(storage.store_user(&user)?)
    })
    .map_err(|e| match e {
        StorageLockError::Timeout => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "Service temporarily busy, please retry"})),
        ),
        StorageLockError::Other(msg) => {
            if msg.contains("Duplicate key") {
                (
                    StatusCode::CONFLICT,
                    Json(json!({"error": "Username or email already exists"})),
                )
            } else {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": msg})),
                )
            }
        }
    })?;

    let token = auth.generate_token(&user.id, user.role).map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to generate token"})),
        )
    })?;

    let expires_at = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .unwrap_or_else(Utc::now)
        .timestamp();

    info!("Registered new citizen account {}", user.id);
    Ok(Json(AuthResponse {
        token,
        expires_at,
        user: UserProfile::from(&user),
    }))
}

async fn me(
    State((_, app_state)): State<(Arc<AuthState>, Arc<AppState>)>,
    user: AuthenticatedUser,
) -> Result<Json<UserProfile>, (StatusCode, Json<Value>)> {
    let stored = with_storage(&app_state.shared_storage, "auth_me_get_user", |storage| {
        Ok(storage.get_user(&user.user_id)?)
    })
    .map_err(lock_error_response)?;

    match stored {
        Some(user) => Ok(Json(UserProfile::from(&user))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "User not found"})),
        )),
    }
}
