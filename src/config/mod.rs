// src/config/mod.rs
//! Immutable engine configuration.
//!
//! Weights, thresholds, curated candidate groups, sub-field groups, alignment
//! keywords and reason templates live in one `EngineConfig` value that is built
//! once and handed to the `Recommender`. Nothing in the pipeline reads globals.
//!
//! Lookup order for every config file: env var → `config/<file>` → embedded copy.

pub mod gateway;

use crate::analyze::weights::CompatibilityWeights;
use crate::catalog::Catalog;
use crate::profile::{Archetype, Signal};
use crate::sectors::SectorVocabulary;
use crate::text::fold;
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

// --- env names & defaults ---
pub const ENV_CONFIG_PATH: &str = "RECOMMENDER_CONFIG_PATH";
pub const ENV_RULES_PATH: &str = "RECOMMENDER_RULES_PATH";
pub const ENV_TAGGING_PATH: &str = "RECOMMENDER_TAGGING_PATH";
pub const ENV_CATALOG_PATH: &str = "RECOMMENDER_CATALOG_PATH";

pub const DEFAULT_CONFIG_PATH: &str = "config/engine.toml";
const BUILTIN_CONFIG: &str = include_str!("../../config/engine.toml");

/// Resolve a config file: `$env_var` (must exist if set) → `default_path` if present → `None`.
pub(crate) fn locate(env_var: &str, default_path: &str) -> anyhow::Result<Option<PathBuf>> {
    if let Ok(p) = std::env::var(env_var) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(Some(pb));
        }
        return Err(anyhow!(
            "{env_var} points to non-existent path {}",
            pb.display()
        ));
    }
    let pb = PathBuf::from(default_path);
    if pb.exists() {
        return Ok(Some(pb));
    }
    Ok(None)
}

/// Profile Resolver thresholds and branch confidences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    pub classifier_low: f32,
    pub classifier_high: f32,
    pub coherence_margin: f32,
    pub hybrid_threshold: f32,
    /// Validation score a base profile needs to beat a low-confidence classifier.
    pub low_confidence_validation: f32,
    /// Validation score above which a High-coherence base keeps full confidence.
    pub high_coherence_validation: f32,
    pub confidence_high_coherence: f32,
    pub confidence_high_coherence_unvalidated: f32,
    pub confidence_base_preferred: f32,
    pub low_confidence_discount: f32,
    pub confidence_hybrid: f32,
    pub confidence_unavailable: f32,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            classifier_low: 0.4,
            classifier_high: 0.8,
            coherence_margin: 0.2,
            hybrid_threshold: 0.7,
            low_confidence_validation: 0.6,
            high_coherence_validation: 0.5,
            confidence_high_coherence: 0.95,
            confidence_high_coherence_unvalidated: 0.85,
            confidence_base_preferred: 0.75,
            low_confidence_discount: 0.6,
            confidence_hybrid: 0.8,
            confidence_unavailable: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorSettings {
    pub declared_confidence: f32,
    pub low_confidence: f32,
    pub low_confidence_discount: f32,
}

impl Default for SectorSettings {
    fn default() -> Self {
        Self {
            declared_confidence: 0.95,
            low_confidence: 0.4,
            low_confidence_discount: 0.5,
        }
    }
}

/// Academic-fit scale (grades on 0–5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcademicSettings {
    /// Grade assumed for a subject with no recorded average.
    pub neutral_grade: f32,
    pub no_requirements_fit: f32,
    pub high_threshold: f32,
    pub medium_threshold: f32,
    pub low_threshold: f32,
    /// Credit lost per grade point below the threshold.
    pub decay_per_point: f32,
}

impl Default for AcademicSettings {
    fn default() -> Self {
        Self {
            neutral_grade: 3.0,
            no_requirements_fit: 0.6,
            high_threshold: 4.0,
            medium_threshold: 3.0,
            low_threshold: 2.0,
            decay_per_point: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingSettings {
    pub score_floor: f32,
    pub score_ceiling: f32,
    pub subfield_cap: usize,
    pub first_sector_bonus: f32,
    pub second_sector_bonus: f32,
    pub balance_bonus: f32,
    pub default_top_n: usize,
    /// Selection pool is `pool_factor * top_n` candidates.
    pub pool_factor: usize,
    pub max_reasons: usize,
    pub max_assessment_reasons: usize,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            score_floor: 0.1,
            score_ceiling: 1.0,
            subfield_cap: 2,
            first_sector_bonus: 0.08,
            second_sector_bonus: 0.04,
            balance_bonus: 0.03,
            default_top_n: 8,
            pool_factor: 2,
            max_reasons: 4,
            max_assessment_reasons: 2,
        }
    }
}

/// Sector-weight refinement (function/value alignment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinementSettings {
    pub strong_threshold: f32,
    pub partial_threshold: f32,
    pub strong_bonus: f32,
    pub partial_bonus: f32,
    pub minimal_bonus: f32,
    /// Alignment assumed for candidates with no configured keywords.
    pub neutral_alignment: f32,
}

impl Default for RefinementSettings {
    fn default() -> Self {
        Self {
            strong_threshold: 0.7,
            partial_threshold: 0.5,
            strong_bonus: 0.15,
            partial_bonus: 0.08,
            minimal_bonus: 0.03,
            neutral_alignment: 0.5,
        }
    }
}

/// Computed affinity bonuses appended after the rule table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffinitySettings {
    /// "Muy Coherente" students: base archetype in the candidate's tags.
    pub coherence_base_bonus: f32,
    /// ... another resolved archetype in the tags.
    pub coherence_profile_bonus: f32,
    /// ... neither.
    pub coherence_other_bonus: f32,
    /// Technical profile on a technical-application candidate.
    pub technical_bonus: f32,
    /// Liked activity echoed by the candidate's daily work.
    pub work_focus_bonus: f32,
    pub artistic_listed_bonus: f32,
    pub artistic_sector_bonus: f32,
    pub creative_field_step: f32,
    pub creative_field_cap: f32,
    pub artistic_cap: f32,
    pub artistic_scale: f32,
    pub artistic_sectors: Vec<String>,
    /// Employment fields mentioning any of these count as creative.
    pub creative_keywords: Vec<String>,
    /// Environment/sector bonus: `min(env·share + social·share + focus·share, max) · scale`.
    pub environment_max: f32,
    pub environment_share: f32,
    pub social_share: f32,
    pub focus_share: f32,
    pub environment_scale: f32,
    pub focus_step: f32,
    pub focus_cap: f32,
    /// Liked activities and the words that show them in a candidate's work.
    pub work_focus: Vec<FocusKeywords>,
    /// Desired work focus and the words that show it in a candidate's work.
    pub focus_areas: Vec<FocusKeywords>,
}

impl Default for AffinitySettings {
    fn default() -> Self {
        Self {
            coherence_base_bonus: 0.12,
            coherence_profile_bonus: 0.08,
            coherence_other_bonus: 0.05,
            technical_bonus: 0.03,
            work_focus_bonus: 0.03,
            artistic_listed_bonus: 0.15,
            artistic_sector_bonus: 0.10,
            creative_field_step: 0.03,
            creative_field_cap: 0.08,
            artistic_cap: 0.25,
            artistic_scale: 0.6,
            artistic_sectors: vec!["Cultural".to_string()],
            creative_keywords: Vec::new(),
            environment_max: 0.20,
            environment_share: 0.4,
            social_share: 0.3,
            focus_share: 0.3,
            environment_scale: 0.7,
            focus_step: 0.2,
            focus_cap: 0.8,
            work_focus: Vec::new(),
            focus_areas: Vec::new(),
        }
    }
}

/// Signals paired with words searched (word-prefix, folded) in a candidate's
/// description and employment fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusKeywords {
    pub signals: Vec<Signal>,
    pub keywords: Vec<String>,
}

/// One row of the base-profile scoring table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasePoint {
    pub signal: Signal,
    pub archetype: Archetype,
    pub points: f32,
}

/// Function (future-work) and value (self-description) signals a candidate asks for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Alignment {
    pub functions: Vec<Signal>,
    pub values: Vec<Signal>,
}

/// Personalized reason: fires when the student has any of `signals` and the
/// candidate name contains any of `name_contains`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasonTemplate {
    pub signals: Vec<Signal>,
    pub name_contains: Vec<String>,
    /// `{career}` is replaced with the candidate name.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub weights: CompatibilityWeights,
    #[serde(default)]
    pub profile: ProfileSettings,
    #[serde(default)]
    pub sector: SectorSettings,
    #[serde(default)]
    pub academic: AcademicSettings,
    #[serde(default)]
    pub ranking: RankingSettings,
    #[serde(default)]
    pub refinement: RefinementSettings,
    #[serde(default)]
    pub affinity: AffinitySettings,
    #[serde(default)]
    pub base_points: Vec<BasePoint>,
    /// Named candidate groups referenced by rules and evaluators.
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
    /// Similar sub-field groups capped by the finalizer.
    #[serde(default)]
    pub subfields: BTreeMap<String, Vec<String>>,
    /// Candidate names containing any of these count as technical application.
    #[serde(default)]
    pub technical_name_markers: Vec<String>,
    #[serde(default)]
    pub alignment: BTreeMap<String, Alignment>,
    #[serde(default)]
    pub reason_templates: Vec<ReasonTemplate>,
    #[serde(default)]
    pub sectors: SectorVocabulary,
}

/// Group holding the applied/technical candidates.
pub const GROUP_TECHNICAL_APPLICATION: &str = "technical_application";
/// Group holding explicitly artistic candidates.
pub const GROUP_ARTISTIC: &str = "artistic";

impl EngineConfig {
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let mut cfg: EngineConfig = toml::from_str(toml_str)?;
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading engine config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing engine config at {}", path.display()))
    }

    /// Configuration shipped with the crate.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_toml_str(BUILTIN_CONFIG).context("parsing built-in engine config")
    }

    /// $RECOMMENDER_CONFIG_PATH → config/engine.toml → built-in.
    pub fn load_default() -> anyhow::Result<Self> {
        match locate(ENV_CONFIG_PATH, DEFAULT_CONFIG_PATH)? {
            Some(path) => Self::from_path(&path),
            None => Self::builtin(),
        }
    }

    /// Members of a named group (empty when the group is not configured).
    pub fn group(&self, name: &str) -> &[String] {
        self.groups.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn in_group(&self, group: &str, candidate: &str) -> bool {
        self.group(group).iter().any(|n| n == candidate)
    }

    /// Sub-field group a candidate belongs to, if any.
    pub fn subfield_of(&self, candidate: &str) -> Option<&str> {
        self.subfields
            .iter()
            .find(|(_, members)| members.iter().any(|m| m == candidate))
            .map(|(k, _)| k.as_str())
    }

    pub fn is_technical(&self, candidate: &str) -> bool {
        if self.in_group(GROUP_TECHNICAL_APPLICATION, candidate) {
            return true;
        }
        let name = fold(candidate);
        self.technical_name_markers
            .iter()
            .any(|m| name.contains(&fold(m)))
    }

    /// Warn about names that do not exist in `catalog`. Never fails.
    pub fn check_against(&self, catalog: &Catalog) {
        let lists = self
            .groups
            .iter()
            .chain(self.subfields.iter())
            .flat_map(|(g, names)| names.iter().map(move |n| (g.as_str(), n.as_str())))
            .chain(self.alignment.keys().map(|n| ("alignment", n.as_str())));
        for (group, name) in lists {
            if catalog.get(name).is_none() {
                warn!(target: "recommender::config", %group, candidate = %name, "unknown candidate in config");
            }
        }
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > 1e-3 {
            warn!(target: "recommender::config", %sum, "compatibility weights do not sum to 1.0");
        }
    }

    // Keep thresholds inside their meaningful ranges.
    fn sanitize(&mut self) {
        let r = &mut self.ranking;
        if !(0.0..=1.0).contains(&r.score_floor) {
            r.score_floor = RankingSettings::default().score_floor;
        }
        if !(0.0..=1.0).contains(&r.score_ceiling) || r.score_ceiling < r.score_floor {
            r.score_ceiling = RankingSettings::default().score_ceiling;
        }
        r.subfield_cap = r.subfield_cap.max(1);
        r.default_top_n = r.default_top_n.max(1);
        r.pool_factor = r.pool_factor.max(1);
        r.max_reasons = r.max_reasons.max(1);

        let p = &mut self.profile;
        if p.classifier_low > p.classifier_high {
            std::mem::swap(&mut p.classifier_low, &mut p.classifier_high);
        }
        if self.academic.decay_per_point <= 0.0 {
            self.academic.decay_per_point = AcademicSettings::default().decay_per_point;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_config_parses_with_expected_defaults() {
        let cfg = EngineConfig::builtin().expect("built-in config parses");
        assert!((cfg.weights.sum() - 1.0).abs() < 1e-6);
        assert_eq!(cfg.ranking.subfield_cap, 2);
        assert!(!cfg.base_points.is_empty());
        assert!(cfg.in_group("very_high_interaction", "Psicología"));
        assert_eq!(cfg.subfield_of("Ingeniería de Software"), Some("sistemas"));
        assert!(cfg.is_technical("Ingeniería Civil"));
        assert!(!cfg.is_technical("Derecho"));
        assert!(cfg.in_group(GROUP_ARTISTIC, "Música"));
        assert!(!cfg.affinity.work_focus.is_empty());
        assert!(!cfg.affinity.focus_areas.is_empty());
        assert!((cfg.affinity.artistic_scale - 0.6).abs() < 1e-6);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg = EngineConfig::from_toml_str(
            r#"
[ranking]
default_top_n = 5
"#,
        )
        .unwrap();
        assert_eq!(cfg.ranking.default_top_n, 5);
        assert_eq!(cfg.ranking.subfield_cap, 2);
        assert!((cfg.profile.classifier_high - 0.8).abs() < 1e-6);
        assert!(cfg.groups.is_empty());
        assert_eq!(cfg.sectors, SectorVocabulary::default_seed());
    }

    #[test]
    fn sanitize_repairs_out_of_range_values() {
        let cfg = EngineConfig::from_toml_str(
            r#"
[ranking]
score_floor = -3.0
subfield_cap = 0
[profile]
classifier_low = 0.9
classifier_high = 0.3
"#,
        )
        .unwrap();
        assert!((cfg.ranking.score_floor - 0.1).abs() < 1e-6);
        assert_eq!(cfg.ranking.subfield_cap, 1);
        assert!(cfg.profile.classifier_low < cfg.profile.classifier_high);
    }

    #[test]
    fn technical_marker_matches_name() {
        let cfg = EngineConfig::from_toml_str(r#"technical_name_markers = ["Tecnología"]"#).unwrap();
        assert!(cfg.is_technical("Tecnología en Desarrollo de Software"));
    }
}
