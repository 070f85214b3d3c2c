//! Board-readiness scoring.
//!
//! Each bucket of the rubric is an ordered table of tiers. The first tier
//! whose predicate matches awards its points; buckets are summed and the
//! total is clamped to [`MAX_SCORE`].

use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::error::Result;

use crate::models::{Certification, Experience, ExperienceType, ProfessionalProfile, ProfessionalRecord, Skill};

pub const MAX_SCORE: u32 = 100;

/// Summaries longer than this many characters earn the full summary bonus.
const LONG_SUMMARY_CHARS: usize = 200;

/// Counts extracted from a record; the tiers only ever look at these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadinessSignals {
    pub has_headline: bool,
    pub summary_chars: Option<usize>,
    pub board_experience: usize,
    pub executive_experience: usize,
    pub skills: usize,
    pub certifications: usize,
}

pub struct Tier {
    pub label: &'static str,
    pub points: u32,
    pub applies: fn(&ReadinessSignals) -> bool,
}

pub const HEADLINE_TIERS: &[Tier] = &[Tier {
    label: "headline present",
    points: 5,
    applies: |s| s.has_headline,
}];

pub const SUMMARY_TIERS: &[Tier] = &[
    Tier {
        label: "detailed summary",
        points: 15,
        applies: |s| matches!(s.summary_chars, Some(n) if n > LONG_SUMMARY_CHARS),
    },
    Tier {
        label: "summary present",
        points: 10,
        applies: |s| s.summary_chars.is_some(),
    },
];

pub const EXPERIENCE_TIERS: &[Tier] = &[
    Tier {
        label: "board experience",
        points: 30,
        applies: |s| s.board_experience >= 1,
    },
    Tier {
        label: "senior executive experience",
        points: 15,
        applies: |s| s.executive_experience > 2,
    },
];

pub const BOARD_DEPTH_TIERS: &[Tier] = &[
    Tier {
        label: "three or more board seats",
        points: 20,
        applies: |s| s.board_experience > 2,
    },
    Tier {
        label: "two board seats",
        points: 10,
        applies: |s| s.board_experience == 2,
    },
];

pub const SKILL_TIERS: &[Tier] = &[
    Tier {
        label: "ten or more skills",
        points: 15,
        applies: |s| s.skills >= 10,
    },
    Tier {
        label: "five or more skills",
        points: 10,
        applies: |s| s.skills >= 5,
    },
    Tier {
        label: "some skills",
        points: 5,
        applies: |s| s.skills > 0,
    },
];

pub const CERTIFICATION_TIERS: &[Tier] = &[
    Tier {
        label: "two or more certifications",
        points: 15,
        applies: |s| s.certifications >= 2,
    },
    Tier {
        label: "one certification",
        points: 10,
        applies: |s| s.certifications == 1,
    },
];

pub fn first_match<'a>(tiers: &'a [Tier], signals: &ReadinessSignals) -> Option<&'a Tier> {
    tiers.iter().find(|tier| (tier.applies)(signals))
}

/// Points of the first matching tier, or zero.
pub fn award(tiers: &[Tier], signals: &ReadinessSignals) -> u32 {
    first_match(tiers, signals).map(|tier| tier.points).unwrap_or(0)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadinessBreakdown {
    pub profile: u32,
    pub experience: u32,
    pub skills: u32,
    pub certifications: u32,
    pub total: u32,
    /// Labels of the tiers that awarded points, in rubric order.
    pub matched: Vec<&'static str>,
}

impl ReadinessSignals {
    pub fn collect(
        profile: Option<&ProfessionalProfile>,
        experiences: &[Experience],
        skills: &[Skill],
        certifications: &[Certification],
    ) -> Self {
        fn present(text: &Option<String>) -> Option<&str> {
            text.as_deref().filter(|t| !t.trim().is_empty())
        }

        let count_of = |kind: ExperienceType| {
            experiences
                .iter()
                .filter(|exp| exp.experience_type == kind)
                .count()
        };

        Self {
            has_headline: profile.and_then(|p| present(&p.headline)).is_some(),
            summary_chars: profile
                .and_then(|p| present(&p.summary))
                .map(|summary| summary.chars().count()),
            board_experience: count_of(ExperienceType::Board),
            executive_experience: count_of(ExperienceType::Executive),
            skills: skills.len(),
            certifications: certifications.len(),
        }
    }
}

pub fn breakdown(
    profile: Option<&ProfessionalProfile>,
    experiences: &[Experience],
    skills: &[Skill],
    certifications: &[Certification],
) -> ReadinessBreakdown {
    let signals = ReadinessSignals::collect(profile, experiences, skills, certifications);

    let profile = award(HEADLINE_TIERS, &signals) + award(SUMMARY_TIERS, &signals);
    let experience = award(EXPERIENCE_TIERS, &signals) + award(BOARD_DEPTH_TIERS, &signals);
    let skills = award(SKILL_TIERS, &signals);
    let certifications = award(CERTIFICATION_TIERS, &signals);

    let matched = [
        HEADLINE_TIERS,
        SUMMARY_TIERS,
        EXPERIENCE_TIERS,
        BOARD_DEPTH_TIERS,
        SKILL_TIERS,
        CERTIFICATION_TIERS,
    ]
    .iter()
    .filter_map(|tiers| first_match(tiers, &signals))
    .map(|tier| tier.label)
    .collect();

    ReadinessBreakdown {
        profile,
        experience,
        skills,
        certifications,
        total: (profile + experience + skills + certifications).min(MAX_SCORE),
        matched,
    }
}

/// Board-readiness score in `0..=100`. Never fails; missing data scores zero.
///
/// A headline or summary that is empty or whitespace-only counts as absent.
/// Summary length is measured in characters, not bytes.
pub fn score(
    profile: Option<&ProfessionalProfile>,
    experiences: &[Experience],
    skills: &[Skill],
    certifications: &[Certification],
) -> u32 {
    breakdown(profile, experiences, skills, certifications).total
}

pub fn score_record(record: &ProfessionalRecord) -> ReadinessBreakdown {
    breakdown(
        Some(&record.profile),
        &record.experiences,
        &record.skills,
        &record.certifications,
    )
}

/// Loads a professional record from a JSON document. Missing sections are empty.
pub fn load_record(path: &Path) -> Result<ProfessionalRecord> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
