use thiserror::Error;

use crate::models::ResolutionStatus;
use crate::voting::workflow::ResolutionEvent;

#[derive(Error, Debug)]
pub enum GovernanceError {
    #[error("Cannot {event} a resolution that is {from}")]
    InvalidStateTransition {
        from: ResolutionStatus,
        event: ResolutionEvent,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GovernanceError>;
