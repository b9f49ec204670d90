pub mod config;
pub mod error;

pub use config::EngineConfig;
pub use error::{CoreError, RulesViolation};
