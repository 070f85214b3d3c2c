use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::GovernanceError;
use crate::models::{Resolution, ResolutionStatus, Vote, VoteChoice, VotingType};
use crate::voting::ResolutionResults;

/// How abstentions interact with a unanimous vote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnanimityPolicy {
    /// Every cast vote must be an approval; a single abstention blocks passage.
    #[default]
    AllApprove,
    /// No rejections; abstentions are neutral.
    NoRejections,
}

impl FromStr for UnanimityPolicy {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all_approve" => Ok(UnanimityPolicy::AllApprove),
            "no_rejections" => Ok(UnanimityPolicy::NoRejections),
            other => Err(GovernanceError::Validation(format!("Unknown unanimity policy: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub approve: u32,
    pub reject: u32,
    pub abstain: u32,
}

impl Tally {
    pub fn from_votes(votes: &[Vote]) -> Self {
        votes.iter().fold(Tally::default(), |mut tally, vote| {
            match vote.choice {
                VoteChoice::Approve => tally.approve += 1,
                VoteChoice::Reject => tally.reject += 1,
                VoteChoice::Abstain => tally.abstain += 1,
            }
            tally
        })
    }

    pub fn total_voters(&self) -> u32 {
        self.approve + self.reject + self.abstain
    }

    /// Votes that express a position (approve or reject).
    pub fn decisive(&self) -> u32 {
        self.approve + self.reject
    }

    pub fn meets_quorum(&self, quorum_required: u32) -> bool {
        self.total_voters() >= quorum_required
    }

    /// Whether the tally carries under `voting_type`, ignoring quorum.
    pub fn carries(&self, voting_type: VotingType, policy: UnanimityPolicy) -> bool {
        match voting_type {
            VotingType::SimpleMajority => self.approve > self.reject,
            // approve >= ceil(2/3 * decisive), kept in integers
            VotingType::TwoThirds => 3 * self.approve >= 2 * self.decisive(),
            VotingType::Unanimous => match policy {
                UnanimityPolicy::AllApprove => self.reject == 0 && self.approve == self.total_voters(),
                UnanimityPolicy::NoRejections => self.reject == 0,
            },
        }
    }
}

/// Decide the outcome of a resolution from a snapshot of its votes.
pub fn calculate_results(resolution: &Resolution, votes: &[Vote], policy: UnanimityPolicy) -> ResolutionResults {
    let tally = Tally::from_votes(votes);
    let quorum_met = tally.meets_quorum(resolution.quorum_required);

    // Quorum failure overrides the tally
    let status = if quorum_met && tally.carries(resolution.voting_type, policy) {
        ResolutionStatus::Passed
    } else {
        ResolutionStatus::Failed
    };

    let summary = build_summary(resolution, &tally, quorum_met, status);

    ResolutionResults {
        status,
        tally,
        quorum_met,
        summary,
    }
}

fn build_summary(resolution: &Resolution, tally: &Tally, quorum_met: bool, status: ResolutionStatus) -> String {
    let total = tally.total_voters();
    let percentage = |count: u32| {
        if total > 0 {
            (count as f64 * 1000.0 / total as f64).round() / 10.0
        } else {
            0.0
        }
    };

    let mut summary = format!("**{}** ({})\n\n", resolution.title, resolution.voting_type);

    for (label, count) in [
        ("Approve", tally.approve),
        ("Reject", tally.reject),
        ("Abstain", tally.abstain),
    ] {
        summary.push_str(&format!("{}: {} votes ({}%)\n", label, count, percentage(count)));
    }

    summary.push_str(&format!(
        "\nQuorum: {} of {} required{}\n",
        total,
        resolution.quorum_required,
        if quorum_met { "" } else { " (not met)" }
    ));

    let outcome = match status {
        ResolutionStatus::Passed => "Resolution passed.",
        _ if !quorum_met => "Resolution failed: quorum not reached.",
        _ => "Resolution failed.",
    };
    summary.push_str(outcome);

    summary
}
