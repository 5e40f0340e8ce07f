// src/analyze/mod.rs
//! Evaluation pipeline entry: assess every candidate, run the logic layer, then
//! add the computed affinity bonuses to the survivors.

pub mod affinity;
pub mod compat;
pub mod rank;
pub mod rules;
pub mod scoring;
pub mod weights;

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::metrics::record_exclusion;
use crate::profile::StudentProfile;
use crate::recommendation::{Exclusion, ResolvedProfile, ResolvedSector};

pub use affinity::affinity_bonuses;
pub use compat::{evaluate, CompatibilityAssessment};
pub use rank::{Ranked, Scored};
pub use rules::{apply_rules, RuleContext, RuleOutcome, RuleSet};
pub use weights::CompatibilityWeights;

/// Candidates split by the logic layer, both in catalog order.
#[derive(Debug, Clone, Default)]
pub struct Evaluation<'a> {
    pub survivors: Vec<Scored<'a>>,
    /// Excluded candidates keep their assessment (without adjustments) for the fallback ranking.
    pub excluded: Vec<(Scored<'a>, Exclusion)>,
}

impl<'a> Evaluation<'a> {
    pub fn exclusions(&self) -> Vec<Exclusion> {
        self.excluded.iter().map(|(_, e)| e.clone()).collect()
    }
}

/// Compatibility Evaluator + Post-Resolution Logic Layer over the whole catalog.
pub fn evaluate_catalog<'a>(
    student: &StudentProfile,
    profile: &ResolvedProfile,
    sector: &ResolvedSector,
    catalog: &'a Catalog,
    rules: &RuleSet,
    cfg: &EngineConfig,
) -> Evaluation<'a> {
    let mut out = Evaluation::default();
    for candidate in catalog.iter() {
        let assessment = evaluate(student, profile, sector, candidate, cfg);
        let ctx = RuleContext {
            student,
            candidate,
            assessment: &assessment,
            config: cfg,
        };
        match apply_rules(&ctx, rules) {
            RuleOutcome::Excluded(exclusion) => {
                record_exclusion(&exclusion.rule);
                out.excluded.push((
                    Scored {
                        candidate,
                        assessment,
                        adjustments: Vec::new(),
                    },
                    exclusion,
                ));
            }
            RuleOutcome::Adjusted(mut adjustments) => {
                adjustments.extend(affinity_bonuses(&ctx, profile));
                out.survivors.push(Scored {
                    candidate,
                    assessment,
                    adjustments,
                })
            }
        }
    }
    out
}
