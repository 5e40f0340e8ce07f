//! Compatibility Evaluator: one `CompatibilityAssessment` per (student, candidate).

use super::scoring::{
    academic_fit, environment_fit, overall_compatibility, social_fit, FitInputs,
};
use crate::catalog::CareerCandidate;
use crate::config::EngineConfig;
use crate::profile::StudentProfile;
use crate::recommendation::{ResolvedProfile, ResolvedSector};
use serde::Serialize;

const EXCELLENT_ACADEMIC: f32 = 0.7;
const GOOD_ACADEMIC: f32 = 0.5;
const STRONG_FIT: f32 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompatibilityAssessment {
    pub profile_match: bool,
    pub sector_match: bool,
    /// `None` when the student declared no sector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_sector_match: Option<bool>,
    pub academic_fit: f32,
    pub environment_fit: f32,
    pub social_fit: f32,
    pub technical_application: bool,
    pub overall: f32,
    pub justifications: Vec<String>,
}

/// Assess one candidate. Pure; missing data counts as "no signal".
pub fn evaluate(
    student: &StudentProfile,
    profile: &ResolvedProfile,
    sector: &ResolvedSector,
    candidate: &CareerCandidate,
    cfg: &EngineConfig,
) -> CompatibilityAssessment {
    let matched_archetype = profile
        .label
        .archetypes()
        .find(|a| candidate.personality_tags.contains(a));

    // Declared sectors take priority over the resolved one.
    let declared_hit = student
        .declared_sectors
        .iter()
        .find(|s| candidate.has_sector(s));
    let declared_sector_match = if student.declared_sectors.is_empty() {
        None
    } else {
        Some(declared_hit.is_some())
    };
    let matched_sector = declared_hit.map(String::as_str).or_else(|| {
        sector
            .sector
            .as_deref()
            .filter(|s| candidate.has_sector(s))
    });

    let inputs = FitInputs::new(
        matched_archetype.is_some(),
        matched_sector.is_some(),
        academic_fit(student, &candidate.academic_requirements, &cfg.academic),
        environment_fit(student.work_environment, &candidate.work_environment_affinity),
        social_fit(student.social_interaction, candidate.social_interaction_affinity),
        cfg.is_technical(&candidate.name),
    );
    let overall = overall_compatibility(&inputs, &cfg.weights);

    let mut justifications = Vec::new();
    if let Some(a) = matched_archetype {
        justifications.push(format!("Matches your {a} profile"));
    }
    if let Some(s) = matched_sector {
        justifications.push(format!("Belongs to the {s} sector you are drawn to"));
    }
    if inputs.academic_fit > EXCELLENT_ACADEMIC {
        justifications.push("Excellent fit with your academic record".to_string());
    } else if inputs.academic_fit > GOOD_ACADEMIC {
        justifications.push("Good fit with your academic record".to_string());
    }
    if inputs.environment_fit > STRONG_FIT {
        justifications.push("Suits the work environment you prefer".to_string());
    }
    if inputs.social_fit > STRONG_FIT {
        justifications.push("Matches the amount of interaction you want".to_string());
    }
    if inputs.technical_application {
        justifications.push("Hands-on, applied career".to_string());
    }

    CompatibilityAssessment {
        profile_match: inputs.profile_match,
        sector_match: inputs.sector_match,
        declared_sector_match,
        academic_fit: inputs.academic_fit,
        environment_fit: inputs.environment_fit,
        social_fit: inputs.social_fit,
        technical_application: inputs.technical_application,
        overall,
        justifications,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Archetype, Level, Subject, WorkEnvironment};
    use crate::recommendation::{ProfileLabel, ProfileSource, SectorSource};

    fn profile(label: ProfileLabel) -> ResolvedProfile {
        ResolvedProfile {
            label,
            confidence: 0.9,
            justification: String::new(),
            source: ProfileSource::Base,
            base: label.primary,
            classifier: None,
        }
    }

    fn sector(s: Option<&str>) -> ResolvedSector {
        ResolvedSector {
            sector: s.map(str::to_string),
            confidence: 0.9,
            justification: String::new(),
            source: SectorSource::Classifier,
        }
    }

    fn cfg() -> EngineConfig {
        EngineConfig::from_toml_str(
            r#"
[groups]
technical_application = ["Ingeniería Civil"]
"#,
        )
        .unwrap()
    }

    fn civil() -> CareerCandidate {
        let mut c = CareerCandidate::new("Ingeniería Civil")
            .with_tags(&[Archetype::Technical])
            .with_sectors(&["Industrial", "Construcción"])
            .with_requirement("matematicas", Level::High);
        c.work_environment_affinity.insert(WorkEnvironment::Outdoor);
        c
    }

    #[test]
    fn full_match_reaches_high_overall() {
        let student = StudentProfile::new()
            .with_average(Subject::Mathematics, 4.6)
            .with_environment(WorkEnvironment::Outdoor);
        let a = evaluate(
            &student,
            &profile(ProfileLabel::single(Archetype::Technical)),
            &sector(Some("Industrial")),
            &civil(),
            &cfg(),
        );
        assert!(a.profile_match && a.sector_match && a.technical_application);
        assert_eq!(a.declared_sector_match, None);
        assert_eq!(a.academic_fit, 1.0);
        assert_eq!(a.environment_fit, 1.0);
        // 0.25 + 0.25 + 0.20 + 0.15 + 0.8*0.10 + 0.05
        assert!((a.overall - 0.98).abs() < 1e-5);
        assert!(a.justifications.iter().any(|j| j.contains("Técnico")));
        assert!(a.justifications.iter().any(|j| j.contains("Excellent")));
    }

    #[test]
    fn hybrid_secondary_counts_as_profile_match() {
        let a = evaluate(
            &StudentProfile::new(),
            &profile(ProfileLabel::hybrid(Archetype::Social, Archetype::Technical)),
            &sector(None),
            &civil(),
            &cfg(),
        );
        assert!(a.profile_match);
        assert!(!a.sector_match);
    }

    #[test]
    fn declared_sector_wins_over_resolved() {
        let student = StudentProfile::new().with_sector("Construcción");
        let a = evaluate(
            &student,
            &profile(ProfileLabel::single(Archetype::Social)),
            &sector(Some("Salud")),
            &civil(),
            &cfg(),
        );
        assert!(a.sector_match);
        assert_eq!(a.declared_sector_match, Some(true));
        assert!(a.justifications.iter().any(|j| j.contains("Construcción")));

        let other = StudentProfile::new().with_sector("Salud");
        let b = evaluate(
            &other,
            &profile(ProfileLabel::single(Archetype::Social)),
            &sector(Some("Salud")),
            &civil(),
            &cfg(),
        );
        assert!(!b.sector_match);
        assert_eq!(b.declared_sector_match, Some(false));
        assert!(!b.profile_match);
    }
}
