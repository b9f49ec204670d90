use thiserror::Error;

/// A game rule blocked the command. Recoverable; the message is shown to the
/// player verbatim and engine state is unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RulesViolation {
    #[error("{0} is already running; wait for the current run to finish")]
    AlreadyRunning(String),

    #[error("not enough resources: {0}")]
    InsufficientResources(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("{0} has no automations; buy one in the store first")]
    NoAutomationOwned(String),

    #[error("meditation needs at least one full seed (have {0:.4})")]
    InsufficientSeeds(f64),
}

/// Errors surfaced by the engine command boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error(transparent)]
    Rules(#[from] RulesViolation),

    /// Invalid catalog reference. Unreachable through a well-behaved caller,
    /// but must never corrupt state.
    #[error("no such activity: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
