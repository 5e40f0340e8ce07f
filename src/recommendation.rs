//! recommendation.rs: output shapes of the pipeline.
//!
//! Everything here is plain data with `Serialize`, so a whole result can be
//! compared byte-for-byte (determinism) or handed to a front-end as JSON.

use crate::analyze::compat::CompatibilityAssessment;
use crate::catalog::CareerCandidate;
use crate::classifier::ClassifierPrediction;
use crate::profile::Archetype;
use serde::Serialize;

/// Final profile: one archetype, or a hybrid of two (base first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProfileLabel {
    pub primary: Archetype,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<Archetype>,
}

impl ProfileLabel {
    pub fn single(a: Archetype) -> Self {
        Self {
            primary: a,
            secondary: None,
        }
    }

    pub fn hybrid(base: Archetype, other: Archetype) -> Self {
        if base == other {
            return Self::single(base);
        }
        Self {
            primary: base,
            secondary: Some(other),
        }
    }

    pub fn is_hybrid(&self) -> bool {
        self.secondary.is_some()
    }

    pub fn contains(&self, a: Archetype) -> bool {
        self.primary == a || self.secondary == Some(a)
    }

    pub fn archetypes(&self) -> impl Iterator<Item = Archetype> {
        std::iter::once(self.primary).chain(self.secondary)
    }
}

impl std::fmt::Display for ProfileLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.secondary {
            Some(s) => write!(f, "{}-{}", self.primary, s),
            None => write!(f, "{}", self.primary),
        }
    }
}

/// Which branch of the profile reconciliation produced the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSource {
    Base,
    Classifier,
    Hybrid,
    /// Classifier failed or returned an unknown label.
    BaseFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedProfile {
    pub label: ProfileLabel,
    pub confidence: f32,
    pub justification: String,
    pub source: ProfileSource,
    /// Rule-derived archetype, kept for transparency notes.
    pub base: Archetype,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier: Option<ClassifierPrediction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectorSource {
    Declared,
    Classifier,
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSector {
    pub sector: Option<String>,
    pub confidence: f32,
    pub justification: String,
    pub source: SectorSource,
}

/// Signed, composable score change produced by the logic layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreAdjustment {
    pub delta: f32,
    pub reason: String,
    /// Rule that produced it.
    pub rule: String,
}

impl ScoreAdjustment {
    pub fn new(rule: impl Into<String>, delta: f32, reason: impl Into<String>) -> Self {
        Self {
            delta,
            reason: reason.into(),
            rule: rule.into(),
        }
    }
}

/// A candidate dropped by a hard-exclusion rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exclusion {
    pub candidate: String,
    pub rule: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonKind {
    Personalized,
    Compatibility,
    Transparency,
}

/// User-facing justification line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reason {
    pub message: String,
    pub kind: ReasonKind,
}

impl Reason {
    pub fn new(kind: ReasonKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    pub fn personalized(message: impl Into<String>) -> Self {
        Self::new(ReasonKind::Personalized, message)
    }

    pub fn compatibility(message: impl Into<String>) -> Self {
        Self::new(ReasonKind::Compatibility, message)
    }

    pub fn transparency(message: impl Into<String>) -> Self {
        Self::new(ReasonKind::Transparency, message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// 1-based position in the result.
    pub rank: usize,
    pub candidate: CareerCandidate,
    /// Clamped to the configured [floor, ceiling].
    pub final_score: f32,
    pub reasons: Vec<Reason>,
    pub assessment: CompatibilityAssessment,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub adjustments: Vec<ScoreAdjustment>,
    pub diversity_bonus: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResult {
    /// Anonymized student id (hash), never the raw profile.
    pub student: String,
    pub profile: ResolvedProfile,
    pub sector: ResolvedSector,
    pub items: Vec<Recommendation>,
    pub exclusions: Vec<Exclusion>,
    /// Every candidate was excluded; items are ranked on compatibility alone.
    pub fallback: bool,
}

impl RecommendationResult {
    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|r| r.candidate.name.as_str()).collect()
    }
}
