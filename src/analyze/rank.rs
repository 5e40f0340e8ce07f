// src/analyze/rank.rs
//! Diversity & ranking finalizer.
//!
//! - Pre-bonus score = overall compatibility + Σ adjustments.
//! - Diversity bonus, assigned walking candidates by descending pre-bonus score:
//!   first / second candidate of a main sector, technical/traditional balance,
//!   plus a stable SHA-256 tie-break on the name (no randomness).
//! - Sub-field cap, then a pool of `pool_factor * top_n`; the best candidate of
//!   each main sector is taken first, remaining slots are filled by score.
//!   The cap is never relaxed: too few survivors means a shorter list.
//! - Ordering uses the unclamped score; emitted scores are clamped to [floor, ceiling].

use super::compat::CompatibilityAssessment;
use crate::catalog::CareerCandidate;
use crate::config::EngineConfig;
use crate::profile::{Archetype, Signal, StudentProfile};
use crate::recommendation::{
    ProfileSource, Reason, Recommendation, ResolvedProfile, ResolvedSector, ScoreAdjustment,
};
use crate::text::fold;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Candidate that survived the logic layer.
#[derive(Debug, Clone)]
pub struct Scored<'a> {
    pub candidate: &'a CareerCandidate,
    pub assessment: CompatibilityAssessment,
    pub adjustments: Vec<ScoreAdjustment>,
}

impl Scored<'_> {
    pub fn pre_bonus(&self) -> f32 {
        self.assessment.overall + self.adjustments.iter().map(|a| a.delta).sum::<f32>()
    }
}

#[derive(Debug, Clone)]
pub struct Ranked<'a> {
    pub scored: Scored<'a>,
    pub diversity_bonus: f32,
    /// Unclamped ordering score.
    pub score: f32,
}

impl Ranked<'_> {
    fn name(&self) -> &str {
        &self.scored.candidate.name
    }
}

/// Stable per-name jitter in [0, 0.0099].
pub fn tie_break(name: &str) -> f32 {
    let digest = Sha256::digest(name.as_bytes());
    let n = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    (n % 100) as f32 / 10_000.0
}

fn by_score_then_name(a: f32, an: &str, b: f32, bn: &str) -> Ordering {
    b.total_cmp(&a).then_with(|| an.cmp(bn))
}

/// Diversity bonus per input index.
pub fn diversity_bonuses(scored: &[Scored<'_>], cfg: &EngineConfig) -> Vec<f32> {
    let r = &cfg.ranking;
    let pre: Vec<f32> = scored.iter().map(Scored::pre_bonus).collect();
    let mut order: Vec<usize> = (0..scored.len()).collect();
    order.sort_by(|&i, &j| {
        by_score_then_name(pre[i], &scored[i].candidate.name, pre[j], &scored[j].candidate.name)
    });

    let mut bonuses = vec![0.0; scored.len()];
    let mut per_sector: HashMap<&str, usize> = HashMap::new();
    let (mut technical, mut traditional) = (0usize, 0usize);
    for i in order {
        let c = scored[i].candidate;
        let mut bonus = tie_break(&c.name);
        if let Some(sector) = c.main_sector() {
            let seen = per_sector.entry(sector).or_default();
            bonus += match *seen {
                0 => r.first_sector_bonus,
                1 => r.second_sector_bonus,
                _ => 0.0,
            };
            *seen += 1;
        }
        let is_technical = cfg.is_technical(&c.name);
        if (is_technical && technical < traditional) || (!is_technical && traditional < technical)
        {
            bonus += r.balance_bonus;
        }
        if is_technical {
            technical += 1;
        } else {
            traditional += 1;
        }
        bonuses[i] = bonus;
    }
    bonuses
}

/// Apply bonuses, caps and the sector pass; returns at most `top_n` items sorted by score.
pub fn select<'a>(scored: Vec<Scored<'a>>, top_n: usize, cfg: &EngineConfig) -> Vec<Ranked<'a>> {
    let r = &cfg.ranking;
    let bonuses = diversity_bonuses(&scored, cfg);
    let mut ranked: Vec<Ranked<'a>> = scored
        .into_iter()
        .zip(bonuses)
        .map(|(s, b)| {
            let score = s.pre_bonus() + b;
            Ranked {
                scored: s,
                diversity_bonus: b,
                score,
            }
        })
        .collect();
    ranked.sort_by(|a, b| by_score_then_name(a.score, a.name(), b.score, b.name()));

    // Sub-field cap.
    let mut per_subfield: HashMap<&str, usize> = HashMap::new();
    let mut kept: Vec<usize> = Vec::new();
    let mut capped = 0usize;
    for (i, item) in ranked.iter().enumerate() {
        match cfg.subfield_of(item.name()) {
            Some(group) => {
                let n = per_subfield.entry(group).or_default();
                if *n >= r.subfield_cap {
                    capped += 1;
                } else {
                    *n += 1;
                    kept.push(i);
                }
            }
            None => kept.push(i),
        }
    }

    // Sector pass over the pool, then fill by score.
    let pool: Vec<usize> = kept.into_iter().take(r.pool_factor * top_n).collect();
    let mut chosen: HashSet<usize> = HashSet::new();
    let mut sectors: HashSet<&str> = HashSet::new();
    for &i in &pool {
        if chosen.len() == top_n {
            break;
        }
        if let Some(s) = ranked[i].scored.candidate.main_sector() {
            if sectors.insert(s) {
                chosen.insert(i);
            }
        }
    }
    for &i in &pool {
        if chosen.len() == top_n {
            break;
        }
        chosen.insert(i);
    }

    let items: Vec<Ranked<'a>> = ranked
        .into_iter()
        .enumerate()
        .filter(|(i, _)| chosen.contains(i))
        .map(|(_, item)| item)
        .collect();
    debug!(target: "recommender::rank", selected = items.len(), capped, "selection done");
    items
}

/// Rank on overall compatibility alone (every candidate was excluded).
pub fn fallback_select<'a>(scored: Vec<Scored<'a>>, top_n: usize) -> Vec<Ranked<'a>> {
    let mut ranked: Vec<Ranked<'a>> = scored
        .into_iter()
        .map(|s| Ranked {
            score: s.assessment.overall,
            scored: s,
            diversity_bonus: 0.0,
        })
        .collect();
    ranked.sort_by(|a, b| by_score_then_name(a.score, a.name(), b.score, b.name()));
    ranked.truncate(top_n);
    ranked
}

/// Shared inputs for the per-item justification lines.
#[derive(Debug, Clone, Copy)]
pub struct ReasonContext<'a> {
    pub student: &'a StudentProfile,
    pub profile: &'a ResolvedProfile,
    pub sector: &'a ResolvedSector,
    pub config: &'a EngineConfig,
    pub fallback: bool,
}

const ARTISTIC_SIGNALS: [Signal; 4] = [
    Signal::ArtisticActivities,
    Signal::Designing,
    Signal::Imaginative,
    Signal::Creative,
];
const STRONG_ACADEMIC_FIT: f32 = 0.7;

/// Personalized templates → compatibility lines → transparency notes, de-duplicated and capped.
pub fn reasons_for(item: &Ranked<'_>, ctx: &ReasonContext<'_>) -> Vec<Reason> {
    let c = item.scored.candidate;
    let a = &item.scored.assessment;
    let r = &ctx.config.ranking;
    let folded_name = fold(&c.name);

    let mut all: Vec<Reason> = Vec::new();
    if ctx.fallback {
        all.push(Reason::transparency(
            "Shown as a fallback: your answers ruled out every career, so this is ranked on compatibility alone",
        ));
    }
    for t in &ctx.config.reason_templates {
        let signal_hit = t.signals.iter().any(|s| ctx.student.has(*s));
        let name_hit = t.name_contains.iter().any(|m| folded_name.contains(&fold(m)));
        if signal_hit && name_hit {
            all.push(Reason::personalized(t.text.replace("{career}", &c.name)));
        }
    }
    all.extend(
        a.justifications
            .iter()
            .take(r.max_assessment_reasons)
            .map(|j| Reason::compatibility(j.as_str())),
    );

    let p = ctx.profile;
    if a.profile_match
        && p.source == ProfileSource::Classifier
        && p.confidence < ctx.config.profile.classifier_low
    {
        all.push(Reason::transparency(
            "Suggested from a low-confidence personality estimate",
        ));
    }
    let has_sector = ctx.sector.sector.is_some() || !ctx.student.declared_sectors.is_empty();
    if has_sector && !a.sector_match && a.academic_fit > STRONG_ACADEMIC_FIT {
        all.push(Reason::transparency(
            "Included despite sector mismatch due to strong academic fit",
        ));
    }
    let model_differs = p
        .classifier
        .as_ref()
        .and_then(|pred| Archetype::from_label(&pred.label))
        .is_some_and(|m| m != p.base);
    if model_differs && !p.label.contains(p.base) && c.personality_tags.contains(&p.base) {
        all.push(Reason::transparency(format!(
            "Fits the {} profile your answers suggest, which differs from the model's estimate",
            p.base
        )));
    }
    if c.personality_tags.contains(&Archetype::Artistic)
        && !p.label.contains(Archetype::Artistic)
        && ctx.student.count(&ARTISTIC_SIGNALS) > 0
    {
        all.push(Reason::transparency("Reflects the artistic interests you declared"));
    }

    let mut seen: HashSet<String> = HashSet::new();
    all.into_iter()
        .filter(|reason| seen.insert(reason.message.clone()))
        .take(r.max_reasons)
        .collect()
}

/// Turn ranked items into clamped, annotated recommendations.
pub fn into_recommendations(items: Vec<Ranked<'_>>, ctx: &ReasonContext<'_>) -> Vec<Recommendation> {
    let r = &ctx.config.ranking;
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let reasons = reasons_for(&item, ctx);
            Recommendation {
                rank: i + 1,
                final_score: item.score.clamp(r.score_floor, r.score_ceiling),
                reasons,
                diversity_bonus: item.diversity_bonus,
                candidate: item.scored.candidate.clone(),
                assessment: item.scored.assessment,
                adjustments: item.scored.adjustments,
            }
        })
        .collect()
}
