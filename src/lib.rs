pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod readiness;
pub mod tasks;
pub mod voting;

pub use error::{GovernanceError, Result};
