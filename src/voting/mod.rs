pub mod tally;
pub mod workflow;

use serde::Serialize;

use crate::models::ResolutionStatus;
use tally::Tally;

// Outcome of closing a resolution, ready for minutes and notifications
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionResults {
    pub status: ResolutionStatus, // Passed or Failed
    pub tally: Tally,
    pub quorum_met: bool,
    pub summary: String, // Human readable breakdown
}
