//! Scoring helpers for the Compatibility Evaluator.
//!
//! All fits are normalized to [0,1]:
//! - `academic_fit`    : graduated credit per required subject, averaged
//! - `environment_fit` : declared work environment vs. candidate affinity
//! - `social_fit`      : declared interaction level vs. candidate affinity
//!
//! Overall = weighted sum of the fits and the two boolean matches, clamped to [0,1].

use super::weights::CompatibilityWeights;
use crate::config::AcademicSettings;
use crate::profile::{InteractionLevel, Level, StudentProfile, Subject, WorkEnvironment};
use std::collections::{BTreeMap, BTreeSet};

/// Fit for an undeclared work-environment preference.
pub const NEUTRAL_ENVIRONMENT_FIT: f32 = 0.5;
/// Fit for a medium (or undeclared) interaction preference.
pub const NEUTRAL_SOCIAL_FIT: f32 = 0.8;

/// Inputs to the overall score. Fits are clamped on construction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FitInputs {
    pub profile_match: bool,
    pub sector_match: bool,
    pub academic_fit: f32,
    pub environment_fit: f32,
    pub social_fit: f32,
    pub technical_application: bool,
}

impl FitInputs {
    pub fn new(
        profile_match: bool,
        sector_match: bool,
        academic: f32,
        environment: f32,
        social: f32,
        technical: bool,
    ) -> Self {
        fn c(x: f32) -> f32 {
            x.clamp(0.0, 1.0)
        }
        Self {
            profile_match,
            sector_match,
            academic_fit: c(academic),
            environment_fit: c(environment),
            social_fit: c(social),
            technical_application: technical,
        }
    }
}

fn flag(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Weighted overall compatibility.
pub fn overall_compatibility(inputs: &FitInputs, w: &CompatibilityWeights) -> f32 {
    let raw = flag(inputs.profile_match) * w.profile_match
        + flag(inputs.sector_match) * w.sector_match
        + inputs.academic_fit * w.academic_fit
        + inputs.environment_fit * w.environment_fit
        + inputs.social_fit * w.social_fit
        + flag(inputs.technical_application) * w.technical_application;
    raw.clamp(0.0, 1.0)
}

/// Credit for one requirement: full at or above the level's threshold,
/// then linear decay toward zero below it.
pub fn requirement_credit(grade: f32, level: Level, s: &AcademicSettings) -> f32 {
    let threshold = match level {
        Level::High => s.high_threshold,
        Level::Medium => s.medium_threshold,
        Level::Low => s.low_threshold,
    };
    if grade >= threshold {
        return 1.0;
    }
    (1.0 - (threshold - grade) * s.decay_per_point).clamp(0.0, 1.0)
}

/// Average requirement credit; neutral when the candidate states no requirements.
/// Requirements on unknown subjects and subjects without an average use the neutral grade.
pub fn academic_fit(
    student: &StudentProfile,
    requirements: &BTreeMap<String, Level>,
    s: &AcademicSettings,
) -> f32 {
    if requirements.is_empty() {
        return s.no_requirements_fit;
    }
    let total: f32 = requirements
        .iter()
        .map(|(subject, level)| {
            let grade = Subject::from_alias(subject)
                .and_then(|sub| student.average(sub))
                .unwrap_or(s.neutral_grade);
            requirement_credit(grade, *level, s)
        })
        .sum();
    total / requirements.len() as f32
}

pub fn environment_fit(
    preference: Option<WorkEnvironment>,
    affinity: &BTreeSet<WorkEnvironment>,
) -> f32 {
    use WorkEnvironment::*;
    let has = |e: WorkEnvironment| affinity.contains(&e);
    match preference {
        Some(Office) if has(Office) => 1.0,
        Some(Office) if has(Outdoor) => 0.3,
        Some(Office) => 0.7,
        Some(Outdoor) if has(Outdoor) => 1.0,
        Some(Outdoor) if has(Office) => 0.4,
        Some(Outdoor) => 0.6,
        Some(Remote) if has(Remote) => 1.0,
        Some(Remote) if has(Office) => 0.8,
        Some(Remote) => 0.2,
        None => NEUTRAL_ENVIRONMENT_FIT,
    }
}

pub fn social_fit(preference: Option<InteractionLevel>, affinity: Option<InteractionLevel>) -> f32 {
    match (preference, affinity) {
        (Some(Level::High), Some(Level::High)) | (Some(Level::Low), Some(Level::Low)) => 1.0,
        (Some(Level::High), Some(Level::Low)) | (Some(Level::Low), Some(Level::High)) => 0.2,
        (Some(Level::High), _) | (Some(Level::Low), _) => 0.6,
        (Some(Level::Medium), _) | (None, _) => NEUTRAL_SOCIAL_FIT,
    }
}
