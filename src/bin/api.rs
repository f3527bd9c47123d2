use axum::{
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber;

use react_engine::api::{
    admin_routes, analytics_routes, auth_routes, campaign_routes, gamification_routes,
    issue_routes, notification_routes, quiz_routes, shared_state::AppState,
};
use react_engine::db_init::setup_development_data;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize shared state
    let app_state = Arc::new(AppState::new());

    // Setup development data (demo accounts + sample campaign/quiz/issue)
    {
        let mut storage = app_state.shared_storage.lock().unwrap();
        if let Err(e) = setup_development_data(&mut storage) {
            tracing::error!("Failed to setup development data: {}", e);
        }
    }

    // Uploaded media is written here by the media store and served back
    // under /uploads.
    let media_dir = std::env::var("MEDIA_DIR").unwrap_or_else(|_| "./uploads".to_string());

    // Each route group wires its own JWT / role guards internally; the
    // leaderboard and geo analytics endpoints inside them stay public.
    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes(app_state.clone()))
        .nest("/api/issues", issue_routes(app_state.clone()))
        .nest("/api/campaigns", campaign_routes(app_state.clone()))
        .nest("/api/quizzes", quiz_routes(app_state.clone()))
        .nest("/api/gamification", gamification_routes(app_state.clone()))
        .nest("/api/analytics", analytics_routes(app_state.clone()))
        .nest("/api/notifications", notification_routes(app_state.clone()))
        .nest("/api/admin", admin_routes(app_state.clone()))
        .nest_service("/uploads", ServeDir::new(media_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // PORT comes from the environment in hosted deploys, fallback to 3000
    // for local development
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("🚀 reACT API server starting on {} (PORT={})", addr, port);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    info!("✅ Server listening and ready to accept connections on {}", addr);
    info!("🏥 Health check endpoint: http://{}:{}/health", addr.ip(), addr.port());

    axum::serve(listener, app).await.unwrap();
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "reACT Civic Issue Reporting API",
        "version": "0.1.0",
        "description": "Community-driven civic issue reporting and resolution platform",
        "features": [
            "Issues Engine - Geo-tagged reports with community verification",
            "Campaigns Engine - Time-boxed civic drives with progress tracking",
            "Gamification Engine - Points, streaks, badges and leaderboard",
            "Quiz Engine - Civic awareness quizzes with scored attempts",
            "Push Dispatcher - Status change notifications to subscribed devices",
            "Storage Engine - Pluggable backend support"
        ]
    }))
}

async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
        "uptime": "System operational"
    })))
}
