pub mod admin;
pub mod analytics;
pub mod auth;
pub mod campaigns;
pub mod gamification;
pub mod issues;
pub mod notifications;
pub mod quizzes;
pub mod shared_state;

pub use admin::admin_routes;
pub use analytics::analytics_routes;
pub use auth::auth_routes;
pub use campaigns::campaign_routes;
pub use gamification::gamification_routes;
pub use issues::issue_routes;
pub use notifications::notification_routes;
pub use quizzes::quiz_routes;
