pub mod config;
pub mod db;
pub mod directory;
pub mod effects;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod orchestrator;
pub mod telemetry;

pub use config::EngagementConfig;
pub use db::create_pool;
pub use error::{EngagementError, EngagementResult, ErrorKind};
pub use orchestrator::{Collaborators, EngagementOrchestrator};
