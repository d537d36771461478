pub mod api;
pub mod config;
pub mod conversation;
pub mod logging;
pub mod model;
pub mod presets;
pub mod state;

// Re-export main types for convenience
pub use api::{BackendError, ChatBackend, HttpBackend};
pub use config::Config;
pub use conversation::Conversation;
pub use model::ModelChoice;
pub use presets::Presets;
pub use state::{ChatRole, ChatTurn, Notice, NoticeLevel, PendingRequest};
