use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::GovernanceError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub id: String,
    pub meeting_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub status: ResolutionStatus,
    pub voting_type: VotingType,
    pub quorum_required: u32,
    pub created_at: DateTime<Utc>,
    pub opened_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub voting_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    Draft,
    Open,
    Closed,
    Passed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingType {
    SimpleMajority,
    TwoThirds,
    Unanimous,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub id: String,
    pub resolution_id: String,
    pub voter_id: String,
    pub choice: VoteChoice,
    pub comment: Option<String>,
    pub cast_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    Approve,
    Reject,
    Abstain,
}

impl Resolution {
    pub fn new(
        meeting_id: Option<String>,
        title: String,
        description: Option<String>,
        voting_type: VotingType,
        quorum_required: u32,
        deadline_minutes: Option<i64>,
    ) -> Result<Self, GovernanceError> {
        let now = Utc::now();
        // The deadline clock starts at creation; it only matters once the resolution is open.
        let voting_deadline = deadline_minutes
            .map(|mins| deadline_after(now, mins))
            .transpose()?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            meeting_id,
            title,
            description,
            status: ResolutionStatus::Draft,
            voting_type,
            quorum_required,
            created_at: now,
            opened_at: None,
            closed_at: None,
            voting_deadline,
        })
    }
}

fn deadline_after(now: DateTime<Utc>, minutes: i64) -> Result<DateTime<Utc>, GovernanceError> {
    if minutes <= 0 {
        return Err(GovernanceError::Validation(format!(
            "Deadline must be a positive number of minutes, got {}",
            minutes
        )));
    }
    chrono::Duration::try_minutes(minutes)
        .and_then(|duration| now.checked_add_signed(duration))
        .ok_or_else(|| GovernanceError::Validation(format!("Deadline of {} minutes is out of range", minutes)))
}

impl Vote {
    pub fn new(resolution_id: String, voter_id: String, choice: VoteChoice, comment: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            resolution_id,
            voter_id,
            choice,
            comment,
            cast_at: Utc::now(),
        }
    }
}

impl ResolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStatus::Draft => "draft",
            ResolutionStatus::Open => "open",
            ResolutionStatus::Closed => "closed",
            ResolutionStatus::Passed => "passed",
            ResolutionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ResolutionStatus::Closed | ResolutionStatus::Passed | ResolutionStatus::Failed
        )
    }
}

impl VotingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VotingType::SimpleMajority => "simple_majority",
            VotingType::TwoThirds => "two_thirds",
            VotingType::Unanimous => "unanimous",
        }
    }
}

impl VoteChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteChoice::Approve => "approve",
            VoteChoice::Reject => "reject",
            VoteChoice::Abstain => "abstain",
        }
    }
}

impl FromStr for ResolutionStatus {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(ResolutionStatus::Draft),
            "open" => Ok(ResolutionStatus::Open),
            "closed" => Ok(ResolutionStatus::Closed),
            "passed" => Ok(ResolutionStatus::Passed),
            "failed" => Ok(ResolutionStatus::Failed),
            other => Err(GovernanceError::Validation(format!("Unknown resolution status: {}", other))),
        }
    }
}

impl FromStr for VotingType {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple_majority" => Ok(VotingType::SimpleMajority),
            "two_thirds" => Ok(VotingType::TwoThirds),
            "unanimous" => Ok(VotingType::Unanimous),
            other => Err(GovernanceError::Validation(format!("Unknown voting type: {}", other))),
        }
    }
}

impl FromStr for VoteChoice {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" => Ok(VoteChoice::Approve),
            "reject" => Ok(VoteChoice::Reject),
            "abstain" => Ok(VoteChoice::Abstain),
            other => Err(GovernanceError::Validation(format!("Unknown vote choice: {}", other))),
        }
    }
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for VotingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// Profile records consumed by the readiness scorer. Every field may be missing
// from the source document; absence means "no contribution".

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfessionalProfile {
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    #[serde(default)]
    pub experience_type: ExperienceType,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceType {
    Board,
    Executive,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
}

/// A full professional record as fetched from the profile source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfessionalRecord {
    #[serde(flatten)]
    pub profile: ProfessionalProfile,
    #[serde(default)]
    pub experiences: Vec<Experience>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub certifications: Vec<Certification>,
}

impl Experience {
    pub fn of_type(experience_type: ExperienceType) -> Self {
        Self {
            experience_type,
            organization: None,
            title: None,
        }
    }
}
