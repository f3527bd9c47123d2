use crate::campaigns_engine::CampaignsEngine;
use crate::gamification_engine::{GamificationEngine, PointsTable};
use crate::issues_engine::IssuesEngine;
use crate::media_store::{LocalMediaStore, MediaStore};
use crate::push_dispatcher::PushDispatcher;
use crate::quiz_engine::QuizEngine;
use crate::storage::{InMemoryStorage, StorageBackend};
use std::sync::{Arc, Mutex};

/// AppState with generic storage backend
///
/// All engines share ONE storage mutex so cross-collection flows (issue
/// verification awarding points, campaign completion granting a badge)
/// observe a single consistent view. Engines take the guard per call and
/// release it before invoking each other, so the composition never holds
/// two locks at once.
pub struct AppState<S: StorageBackend + 'static = InMemoryStorage> {
    pub issues_engine: IssuesEngine<S>,
    pub campaigns_engine: CampaignsEngine<S>,
    pub gamification_engine: GamificationEngine<S>,
    pub quiz_engine: QuizEngine<S>,
    pub push_dispatcher: PushDispatcher<S>,
    pub shared_storage: Arc<Mutex<S>>,
    pub media_store: Arc<dyn MediaStore>,
    pub jwt_secret: String,
}

impl AppState<InMemoryStorage> {
    pub fn new() -> Self {
        let media_dir = std::env::var("MEDIA_DIR").unwrap_or_else(|_| "./uploads".to_string());
        let media_store: Arc<dyn MediaStore> = Arc::new(LocalMediaStore::new(media_dir));
        Self::with_storage(InMemoryStorage::new(), media_store)
    }
}

impl Default for AppState<InMemoryStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StorageBackend + 'static> AppState<S> {
    /// Wire every engine onto one shared storage instance.
    pub fn with_storage(storage: S, media_store: Arc<dyn MediaStore>) -> Self {
        let shared_storage = Arc::new(Mutex::new(storage));

        let gamification_engine =
            GamificationEngine::with_table(Arc::clone(&shared_storage), PointsTable::default());
        let campaigns_engine =
            CampaignsEngine::new(Arc::clone(&shared_storage), gamification_engine.clone());
        let push_dispatcher = PushDispatcher::new(Arc::clone(&shared_storage));
        let issues_engine = IssuesEngine::new(
            Arc::clone(&shared_storage),
            gamification_engine.clone(),
            campaigns_engine.clone(),
            push_dispatcher.clone(),
        );
        let quiz_engine =
            QuizEngine::new(Arc::clone(&shared_storage), gamification_engine.clone());

        // Get JWT secret from environment - required for security
        let jwt_secret = std::env::var("JWT_SECRET")
            .expect("JWT_SECRET environment variable must be set. Please set a secure secret key for JWT authentication.");

        if jwt_secret.len() < 32 {
            panic!("JWT_SECRET must be at least 32 characters long for security");
        }

        Self {
            issues_engine,
            campaigns_engine,
            gamification_engine,
            quiz_engine,
            push_dispatcher,
            shared_storage,
            media_store,
            jwt_secret,
        }
    }
}
