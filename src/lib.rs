pub mod api;
pub mod auth_middleware;
pub mod campaigns_engine;
pub mod db_init;
pub mod gamification_engine;
pub mod issues_engine;
pub mod media_store;
pub mod push_dispatcher;
pub mod quiz_engine;
pub mod storage;
pub mod storage_helpers;
pub mod types;

pub use campaigns_engine::*;
pub use gamification_engine::*;
pub use issues_engine::*;
pub use media_store::*;
pub use push_dispatcher::*;
pub use quiz_engine::*;
pub use storage::*;
pub use types::*;
