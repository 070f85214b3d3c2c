//! Resolution lifecycle: draft -> open -> passed | failed.
//!
//! The workflow only computes the next record from a snapshot. Persisting it
//! (and re-checking the status atomically) is the store's job.

use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::error::{GovernanceError, Result};
use crate::models::{Resolution, ResolutionStatus, Vote};
use crate::voting::tally::{calculate_results, UnanimityPolicy};
use crate::voting::ResolutionResults;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResolutionEvent {
    OpenVoting,
    CloseVoting,
}

impl fmt::Display for ResolutionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionEvent::OpenVoting => f.write_str("open voting on"),
            ResolutionEvent::CloseVoting => f.write_str("close voting on"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Status(ResolutionStatus),
    /// Passed or failed, decided by the vote tally.
    Tally,
}

/// The full transition table. Anything not listed is rejected.
pub fn transition(from: ResolutionStatus, event: ResolutionEvent) -> Result<Target> {
    use ResolutionEvent::*;
    use ResolutionStatus::*;

    match (from, event) {
        (Draft, OpenVoting) => Ok(Target::Status(Open)),
        (Open, CloseVoting) => Ok(Target::Tally),
        (Draft | Open | Closed | Passed | Failed, OpenVoting | CloseVoting) => {
            Err(GovernanceError::InvalidStateTransition { from, event })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClosureDecision {
    pub resolution: Resolution,
    pub results: ResolutionResults,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolutionWorkflow {
    pub unanimity: UnanimityPolicy,
}

impl ResolutionWorkflow {
    pub fn new(unanimity: UnanimityPolicy) -> Self {
        Self { unanimity }
    }

    /// Returns the opened resolution; `resolution` itself is never modified.
    pub fn open(&self, resolution: &Resolution, now: DateTime<Utc>) -> Result<Resolution> {
        let Target::Status(next) = transition(resolution.status, ResolutionEvent::OpenVoting)? else {
            return Err(GovernanceError::InvalidStateTransition {
                from: resolution.status,
                event: ResolutionEvent::OpenVoting,
            });
        };

        debug!("Resolution {} {} -> {}", resolution.id, resolution.status, next);
        Ok(Resolution {
            status: next,
            opened_at: Some(now),
            ..resolution.clone()
        })
    }

    /// Tallies `votes` and returns the closed resolution with its results.
    pub fn close(&self, resolution: &Resolution, votes: &[Vote], now: DateTime<Utc>) -> Result<ClosureDecision> {
        transition(resolution.status, ResolutionEvent::CloseVoting)?;
        check_snapshot(resolution, votes)?;

        let results = calculate_results(resolution, votes, self.unanimity);
        debug!(
            "Resolution {} {} -> {} ({} votes)",
            resolution.id,
            resolution.status,
            results.status,
            votes.len()
        );

        Ok(ClosureDecision {
            resolution: Resolution {
                status: results.status,
                closed_at: Some(now),
                ..resolution.clone()
            },
            results,
        })
    }
}

/// A vote may be cast only while the resolution is open, once per voter.
pub fn validate_vote(resolution: &Resolution, existing: &[Vote], voter_id: &str) -> Result<()> {
    if resolution.status != ResolutionStatus::Open {
        return Err(GovernanceError::Validation(format!(
            "Resolution {} is {} and not accepting votes",
            resolution.id, resolution.status
        )));
    }
    if voter_id.trim().is_empty() {
        return Err(GovernanceError::Validation("Voter id must not be empty".to_string()));
    }
    if existing.iter().any(|vote| vote.voter_id == voter_id) {
        return Err(GovernanceError::Validation(format!(
            "Voter {} has already voted on resolution {}",
            voter_id, resolution.id
        )));
    }
    Ok(())
}

fn check_snapshot(resolution: &Resolution, votes: &[Vote]) -> Result<()> {
    let mut voters = HashSet::new();
    for vote in votes {
        if vote.resolution_id != resolution.id {
            return Err(GovernanceError::Validation(format!(
                "Vote {} belongs to resolution {}, not {}",
                vote.id, vote.resolution_id, resolution.id
            )));
        }
        if !voters.insert(vote.voter_id.as_str()) {
            return Err(GovernanceError::Validation(format!(
                "Voter {} appears more than once",
                vote.voter_id
            )));
        }
    }
    Ok(())
}
