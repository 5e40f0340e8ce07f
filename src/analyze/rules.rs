//! Post-resolution logic layer (rule table from `config/rules.json`).
//!
//! Minimal JSON DSL over structured signals, never raw text:
//! - `candidate_in`:      candidate belongs to ANY of these config groups
//! - `all_of`:            student has ALL of these signals
//! - `none_of`:           student has NONE of these signals
//! - `any_of`:            student has AT LEAST ONE of these signals
//! - `count_of` + `min_count` / `max_count`: number of held signals in range
//! - `profile_match` / `sector_match`: assessment flags
//! - `declared_sector`:   "match" | "mismatch" (only when sectors were declared)
//!
//! Outcomes when a rule matches:
//! - `exclude: true`  drop the candidate; first exclusion short-circuits
//! - `adjust`:        signed delta added to the score
//! - `reason`:        text with a `{career}` placeholder
//!
//! Rules sharing a `name` describe one contradiction at different severities:
//! only the first matching rule of each name applies, so nothing is penalized twice.
//! Rules run in file order. Sector-weight refinement is computed after the table.

use super::compat::CompatibilityAssessment;
use crate::catalog::CareerCandidate;
use crate::config::{locate, EngineConfig, ENV_RULES_PATH};
use crate::profile::{Signal, StudentProfile};
use crate::recommendation::{Exclusion, ScoreAdjustment};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::{fs, io, path::Path};
use tracing::{debug, warn};

pub const DEFAULT_RULES_PATH: &str = "config/rules.json";
const BUILTIN_RULES: &str = include_str!("../../config/rules.json");

/// Name used for the computed sector-weight refinement adjustment.
pub const SECTOR_REFINEMENT: &str = "sector_refinement";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    #[serde(default)]
    pub when: When,
    #[serde(default)]
    pub then: Then,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct When {
    pub candidate_in: Vec<String>,
    pub all_of: Vec<Signal>,
    pub none_of: Vec<Signal>,
    pub any_of: Vec<Signal>,
    pub count_of: Vec<Signal>,
    pub min_count: Option<usize>,
    pub max_count: Option<usize>,
    pub profile_match: Option<bool>,
    pub sector_match: Option<bool>,
    pub declared_sector: Option<DeclaredSector>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclaredSector {
    Match,
    Mismatch,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Then {
    pub exclude: bool,
    pub adjust: Option<f32>,
    pub reason: String,
}

/// Everything a rule may look at for one candidate.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub student: &'a StudentProfile,
    pub candidate: &'a CareerCandidate,
    pub assessment: &'a CompatibilityAssessment,
    pub config: &'a EngineConfig,
}

/// Result of the logic layer for one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    Excluded(Exclusion),
    Adjusted(Vec<ScoreAdjustment>),
}

impl RuleSet {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rules shipped with the crate.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json_str(BUILTIN_RULES).context("parsing built-in rules")
    }

    /// $RECOMMENDER_RULES_PATH → config/rules.json → built-in.
    pub fn load_default() -> anyhow::Result<Self> {
        match locate(ENV_RULES_PATH, DEFAULT_RULES_PATH)? {
            Some(path) => load_rules_file(&path)
                .with_context(|| format!("loading rules from {}", path.display())),
            None => Self::builtin(),
        }
    }

    /// Warn about rules that reference unknown groups or do nothing.
    pub fn check_against(&self, cfg: &EngineConfig) {
        for rule in &self.rules {
            for g in &rule.when.candidate_in {
                if !cfg.groups.contains_key(g) {
                    warn!(target: "recommender::config", rule = %rule.name, group = %g, "rule references unknown group");
                }
            }
            if !rule.then.exclude && rule.then.adjust.is_none() {
                warn!(target: "recommender::config", rule = %rule.name, "rule has no outcome");
            }
        }
    }
}

pub fn load_rules_file(path: &Path) -> io::Result<RuleSet> {
    let bytes = fs::read(path)?;
    let rules: RuleSet = serde_json::from_slice(&bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(rules)
}

/// Run the table for one candidate, then append the sector refinement.
pub fn apply_rules(ctx: &RuleContext<'_>, rules: &RuleSet) -> RuleOutcome {
    let name = ctx.candidate.name.as_str();
    let mut fired: BTreeSet<&str> = BTreeSet::new();
    let mut adjustments = Vec::new();

    for rule in &rules.rules {
        if fired.contains(rule.name.as_str()) || !matches_when(ctx, &rule.when) {
            continue;
        }
        fired.insert(rule.name.as_str());
        let reason = rule.then.reason.replace("{career}", name);

        if rule.then.exclude {
            debug!(target: "recommender::rules", candidate = %name, rule = %rule.name, "excluded");
            return RuleOutcome::Excluded(Exclusion {
                candidate: name.to_string(),
                rule: rule.name.clone(),
                reason,
            });
        }
        if let Some(delta) = rule.then.adjust {
            adjustments.push(ScoreAdjustment::new(rule.name.clone(), delta, reason));
        }
    }

    if let Some(adj) = sector_refinement(ctx) {
        adjustments.push(adj);
    }
    RuleOutcome::Adjusted(adjustments)
}

/// Fraction of `wanted` signals the student holds; `None` when nothing is configured.
fn alignment(student: &StudentProfile, wanted: &[Signal]) -> Option<f32> {
    if wanted.is_empty() {
        return None;
    }
    Some(student.count(wanted) as f32 / wanted.len() as f32)
}

/// Extra weight for a sector match, graded by function and value alignment.
pub fn sector_refinement(ctx: &RuleContext<'_>) -> Option<ScoreAdjustment> {
    if !ctx.assessment.sector_match {
        return None;
    }
    let s = &ctx.config.refinement;
    let cfg = ctx.config.alignment.get(&ctx.candidate.name);
    let function = cfg
        .and_then(|a| alignment(ctx.student, &a.functions))
        .unwrap_or(s.neutral_alignment);
    let values = cfg
        .and_then(|a| alignment(ctx.student, &a.values))
        .unwrap_or(s.neutral_alignment);

    let name = &ctx.candidate.name;
    let (delta, reason) = if function > s.strong_threshold && values > s.strong_threshold {
        (
            s.strong_bonus,
            format!("What you want to do and how you describe yourself both fit {name}"),
        )
    } else if function > s.partial_threshold || values > s.partial_threshold {
        (
            s.partial_bonus,
            format!("Part of what you want to do fits {name}"),
        )
    } else {
        (s.minimal_bonus, format!("{name} is in your sector"))
    };
    Some(ScoreAdjustment::new(SECTOR_REFINEMENT, delta, reason))
}

// --- internals ---

fn matches_when(ctx: &RuleContext<'_>, w: &When) -> bool {
    let student = ctx.student;
    if !w.candidate_in.is_empty()
        && !w
            .candidate_in
            .iter()
            .any(|g| ctx.config.in_group(g, &ctx.candidate.name))
    {
        return false;
    }
    if !w.all_of.iter().all(|s| student.has(*s)) {
        return false;
    }
    if w.none_of.iter().any(|s| student.has(*s)) {
        return false;
    }
    if !w.any_of.is_empty() && !w.any_of.iter().any(|s| student.has(*s)) {
        return false;
    }
    if !w.count_of.is_empty() {
        let n = student.count(&w.count_of);
        if w.min_count.is_some_and(|min| n < min) || w.max_count.is_some_and(|max| n > max) {
            return false;
        }
    }
    if w
        .profile_match
        .is_some_and(|want| ctx.assessment.profile_match != want)
    {
        return false;
    }
    if w
        .sector_match
        .is_some_and(|want| ctx.assessment.sector_match != want)
    {
        return false;
    }
    if let Some(want) = w.declared_sector {
        match (want, ctx.assessment.declared_sector_match) {
            (DeclaredSector::Match, Some(true)) | (DeclaredSector::Mismatch, Some(false)) => {}
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Level, Subject};

    fn assessment() -> CompatibilityAssessment {
        CompatibilityAssessment {
            profile_match: false,
            sector_match: false,
            declared_sector_match: None,
            academic_fit: 0.6,
            environment_fit: 0.5,
            social_fit: 0.8,
            technical_application: false,
            overall: 0.3,
            justifications: vec![],
        }
    }

    fn cfg() -> EngineConfig {
        EngineConfig::from_toml_str(
            r#"
[groups]
very_high_interaction = ["Psicología"]
math_heavy = ["Física"]
"#,
        )
        .unwrap()
    }

    fn run(student: &StudentProfile, name: &str, a: &CompatibilityAssessment, rules: &RuleSet) -> RuleOutcome {
        let cfg = cfg();
        let candidate = CareerCandidate::new(name);
        let ctx = RuleContext {
            student,
            candidate: &candidate,
            assessment: a,
            config: &cfg,
        };
        apply_rules(&ctx, rules)
    }

    #[test]
    fn exclusion_short_circuits_with_reason() {
        let rules = RuleSet {
            rules: vec![
                Rule {
                    name: "quiet vs people".into(),
                    when: When {
                        candidate_in: vec!["very_high_interaction".into()],
                        all_of: vec![Signal::LowInteraction],
                        count_of: vec![Signal::Introverted, Signal::Reading],
                        min_count: Some(1),
                        ..Default::default()
                    },
                    then: Then {
                        exclude: true,
                        reason: "{career} is social".into(),
                        ..Default::default()
                    },
                },
                Rule {
                    name: "never reached".into(),
                    when: When::default(),
                    then: Then {
                        adjust: Some(0.5),
                        ..Default::default()
                    },
                },
            ],
        };
        let student = StudentProfile::new()
            .with_interaction(Level::Low)
            .with_signal(Signal::Reading);
        match run(&student, "Psicología", &assessment(), &rules) {
            RuleOutcome::Excluded(e) => {
                assert_eq!(e.rule, "quiet vs people");
                assert_eq!(e.reason, "Psicología is social");
            }
            other => panic!("expected exclusion, got {other:?}"),
        }
        // Not in the group: only the unconditional adjustment applies.
        match run(&student, "Física", &assessment(), &rules) {
            RuleOutcome::Adjusted(adj) => {
                assert_eq!(adj.len(), 1);
                assert!((adj[0].delta - 0.5).abs() < 1e-6);
            }
            other => panic!("expected adjustments, got {other:?}"),
        }
    }

    #[test]
    fn same_name_applies_once() {
        let rules = RuleSet::builtin().unwrap();
        // Two negative math signals on a math-heavy candidate: exclusion only.
        let student = StudentProfile::new()
            .with_weak(Subject::Mathematics)
            .with_weak(Subject::Physics);
        assert!(matches!(
            run(&student, "Física", &assessment(), &rules),
            RuleOutcome::Excluded(_)
        ));
        // One signal: a single penalty.
        let student = StudentProfile::new().with_weak(Subject::Physics);
        match run(&student, "Física", &assessment(), &rules) {
            RuleOutcome::Adjusted(adj) => {
                let math: Vec<_> = adj.iter().filter(|a| a.rule == "math_heavy_negative").collect();
                assert_eq!(math.len(), 1);
                assert!((math[0].delta + 0.35).abs() < 1e-6);
            }
            other => panic!("expected adjustments, got {other:?}"),
        }
    }

    #[test]
    fn declared_sector_predicates_need_declarations() {
        let rules = RuleSet::builtin().unwrap();
        let student = StudentProfile::new();
        match run(&student, "Derecho", &assessment(), &rules) {
            RuleOutcome::Adjusted(adj) => assert!(adj.is_empty()),
            other => panic!("unexpected {other:?}"),
        }
        let mut a = assessment();
        a.declared_sector_match = Some(false);
        let student = StudentProfile::new().with_sector("Salud");
        match run(&student, "Derecho", &a, &rules) {
            RuleOutcome::Adjusted(adj) => {
                assert_eq!(adj.len(), 1);
                assert_eq!(adj[0].rule, "declared_sector_mismatch");
                assert_eq!(adj[0].reason, "Derecho is outside the sectors you declared");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn sector_refinement_grades_alignment() {
        let cfg = EngineConfig::builtin().unwrap();
        let candidate = CareerCandidate::new("Derecho");
        let mut a = assessment();
        a.sector_match = true;

        let aligned = StudentProfile::new()
            .with_signal(Signal::Justice)
            .with_signal(Signal::Communicative)
            .with_signal(Signal::Decisive)
            .with_signal(Signal::Leader);
        let ctx = RuleContext {
            student: &aligned,
            candidate: &candidate,
            assessment: &a,
            config: &cfg,
        };
        let adj = sector_refinement(&ctx).unwrap();
        assert!((adj.delta - 0.15).abs() < 1e-6);

        let partial = StudentProfile::new().with_signal(Signal::Justice);
        let ctx = RuleContext { student: &partial, ..ctx };
        assert!((sector_refinement(&ctx).unwrap().delta - 0.08).abs() < 1e-6);

        let none = StudentProfile::new();
        let ctx = RuleContext { student: &none, ..ctx };
        assert!((sector_refinement(&ctx).unwrap().delta - 0.03).abs() < 1e-6);

        let mut off = a.clone();
        off.sector_match = false;
        let ctx = RuleContext { assessment: &off, ..ctx };
        assert!(sector_refinement(&ctx).is_none());
    }

    #[test]
    fn builtin_rules_reference_known_groups() {
        let cfg = EngineConfig::builtin().unwrap();
        let rules = RuleSet::builtin().unwrap();
        for rule in &rules.rules {
            for g in &rule.when.candidate_in {
                assert!(cfg.groups.contains_key(g), "{} uses unknown group {g}", rule.name);
            }
            assert!(rule.then.exclude || rule.then.adjust.is_some(), "{}", rule.name);
        }
    }
}
