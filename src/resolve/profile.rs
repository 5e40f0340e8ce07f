//! Profile Resolver: rule-derived base archetype vs. the profile classifier.
//!
//! Policy, in order:
//! 1. High coherence → base profile (confidence lowered when validation is weak).
//! 2. Classifier confidence < low → base if its validation is strong, else discounted classifier.
//! 3. Classifier confidence ≥ high → classifier.
//! 4. Otherwise compare answer coherence of both labels; a clear winner takes it,
//!    distinct labels with a strongly coherent base become a hybrid (base first),
//!    anything else defaults to the classifier.
//!
//! A failing gateway or an unknown label falls back to the base profile.

use crate::classifier::{ClassifierGateway, ClassifierPrediction, FeatureVector, GatewayError};
use crate::config::{BasePoint, EngineConfig, ProfileSettings};
use crate::metrics::record_gateway_fallback;
use crate::profile::{Archetype, Coherence, Signal, StudentProfile, Subject};
use crate::recommendation::{ProfileLabel, ProfileSource, ResolvedProfile};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Answers that support an archetype.
struct Support {
    favorites: &'static [Subject],
    leisure: &'static [Signal],
    traits: &'static [Signal],
    /// Subjects whose best average drives academic alignment; empty → general average.
    academic: &'static [Subject],
    primary_work: Option<Signal>,
    secondary_work: Option<Signal>,
    sectors: &'static [&'static str],
    sector_weight: f32,
}

fn support(a: Archetype) -> Support {
    use Signal::*;
    use Subject::*;
    match a {
        Archetype::Technical => Support {
            favorites: &[Mathematics, Physics],
            leisure: &[BuildsThings],
            traits: &[Skilled, Logical],
            academic: &[Mathematics, Physics],
            primary_work: Some(Technology),
            secondary_work: Some(Creating),
            sectors: &["Tecnología", "Industrial"],
            sector_weight: 0.3,
        },
        Archetype::Social => Support {
            favorites: &[SocialSciences, Language],
            leisure: &[ChatsWithFriends, TeamActivities],
            traits: &[Sociable, Empathetic, Communicative],
            academic: &[SocialSciences],
            primary_work: Some(Helping),
            secondary_work: Some(Teaching),
            sectors: &["Salud", "Educativo", "Social"],
            sector_weight: 0.3,
        },
        Archetype::Investigative => Support {
            favorites: &[BiologyChemistry, Physics, Sciences],
            leisure: &[Experiments, Reading],
            traits: &[Curious],
            academic: &[BiologyChemistry, Physics],
            primary_work: Some(Research),
            secondary_work: Some(DataWork),
            sectors: &["Investigación"],
            sector_weight: 0.3,
        },
        Archetype::Artistic => Support {
            favorites: &[Arts],
            leisure: &[ArtisticActivities, Designing],
            traits: &[Imaginative, Creative],
            academic: &[Arts],
            primary_work: Some(ArtWork),
            secondary_work: None,
            sectors: &["Cultural"],
            sector_weight: 0.6,
        },
        Archetype::Organizer => Support {
            favorites: &[Mathematics, Economics],
            leisure: &[TidiesSpace],
            traits: &[Organized],
            academic: &[],
            primary_work: Some(Management),
            secondary_work: None,
            sectors: &["Financiero", "Comercial", "Administrativo"],
            sector_weight: 0.3,
        },
        Archetype::Leader => Support {
            favorites: &[SocialSciences, Economics],
            leisure: &[TeamActivities],
            traits: &[Leader, Decisive],
            academic: &[],
            primary_work: Some(Management),
            secondary_work: Some(Justice),
            sectors: &["Administrativo", "Comercial"],
            sector_weight: 0.3,
        },
    }
}

/// Points per archetype from the base scoring table.
pub fn base_scores(student: &StudentProfile, table: &[BasePoint]) -> BTreeMap<Archetype, f32> {
    let mut scores: BTreeMap<Archetype, f32> = Archetype::ALL.iter().map(|a| (*a, 0.0)).collect();
    for row in table {
        if student.has(row.signal) {
            *scores.entry(row.archetype).or_default() += row.points;
        }
    }
    scores
}

/// Highest-scoring archetype; ties go to the earlier one in `Archetype::ALL`.
pub fn base_profile(student: &StudentProfile, table: &[BasePoint]) -> Archetype {
    let scores = base_scores(student, table);
    let mut best = Archetype::ALL[0];
    let mut best_score = f32::MIN;
    for a in Archetype::ALL {
        let s = scores.get(&a).copied().unwrap_or(0.0);
        if s > best_score {
            best = a;
            best_score = s;
        }
    }
    best
}

/// Structural check of an archetype against the raw answers, in [0,1].
pub fn validation_score(student: &StudentProfile, a: Archetype) -> f32 {
    let sup = support(a);
    let mut score = 0.0;
    if sup.favorites.iter().any(|s| student.favorite_subjects.contains(s)) {
        score += 0.3;
    }
    if sup.leisure.iter().any(|s| student.has(*s)) {
        score += 0.3;
    }
    if sup.traits.iter().any(|s| student.has(*s)) {
        score += 0.2;
    }
    score += 0.2 * academic_alignment(student, &sup);
    score.min(1.0)
}

fn academic_alignment(student: &StudentProfile, sup: &Support) -> f32 {
    if sup.academic.is_empty() {
        return match student.general_average() {
            Some(g) if g >= 4.0 => 0.7,
            Some(g) if g >= 3.5 => 0.5,
            _ => 0.0,
        };
    }
    let best = sup
        .academic
        .iter()
        .filter_map(|s| student.average(*s))
        .fold(None, |acc: Option<f32>, g| Some(acc.map_or(g, |a| a.max(g))));
    match best {
        Some(g) if g >= 4.0 => 0.8,
        Some(g) if g >= 3.5 => 0.6,
        _ => 0.0,
    }
}

/// How well the future-work narrative and declared sectors fit an archetype.
pub fn work_coherence(student: &StudentProfile, a: Archetype) -> f32 {
    let sup = support(a);
    let mut score = 0.0;
    if sup.primary_work.is_some_and(|s| student.has(s)) {
        score += 0.4;
    }
    if sup.secondary_work.is_some_and(|s| student.has(s)) {
        score += 0.3;
    }
    if student
        .declared_sectors
        .iter()
        .any(|d| sup.sectors.contains(&d.as_str()))
    {
        score += sup.sector_weight;
    }
    score.min(1.0)
}

/// Coherence of a label with the full answer set.
pub fn profile_coherence(student: &StudentProfile, a: Archetype) -> f32 {
    0.6 * validation_score(student, a) + 0.4 * work_coherence(student, a)
}

/// Reconcile the base profile with a classifier outcome. Pure.
pub fn reconcile(
    student: &StudentProfile,
    base: Archetype,
    prediction: Result<ClassifierPrediction, GatewayError>,
    s: &ProfileSettings,
) -> ResolvedProfile {
    let validation = validation_score(student, base);
    let resolved = |label: ProfileLabel,
                    confidence: f32,
                    justification: String,
                    source: ProfileSource,
                    classifier: Option<ClassifierPrediction>| {
        ResolvedProfile {
            label,
            confidence: confidence.clamp(0.0, 1.0),
            justification,
            source,
            base,
            classifier,
        }
    };

    if student.coherence == Coherence::High {
        let confidence = if validation > s.high_coherence_validation {
            s.confidence_high_coherence
        } else {
            s.confidence_high_coherence_unvalidated
        };
        return resolved(
            ProfileLabel::single(base),
            confidence,
            format!("Your likes and strengths are very coherent, so your answers decide: {base}"),
            ProfileSource::Base,
            prediction.ok(),
        );
    }

    let (prediction, predicted) = match prediction {
        Ok(p) => match Archetype::from_label(&p.label) {
            Some(a) => (p, a),
            None => {
                warn!(target: "recommender::profile", label = %p.label, "unknown profile label from classifier");
                record_gateway_fallback("profile");
                return resolved(
                    ProfileLabel::single(base),
                    s.confidence_unavailable,
                    format!("The model answered an unknown profile; using your answers: {base}"),
                    ProfileSource::BaseFallback,
                    Some(p),
                );
            }
        },
        Err(e) => {
            warn!(target: "recommender::profile", error = %e, "profile model unavailable");
            record_gateway_fallback("profile");
            return resolved(
                ProfileLabel::single(base),
                s.confidence_unavailable,
                format!("Profile derived from your answers only: {base}"),
                ProfileSource::BaseFallback,
                None,
            );
        }
    };
    let conf = prediction.confidence;

    if conf < s.classifier_low {
        if validation > s.low_confidence_validation {
            return resolved(
                ProfileLabel::single(base),
                s.confidence_base_preferred,
                format!("The model was unsure ({conf:.2}); your answers clearly point to {base}"),
                ProfileSource::Base,
                Some(prediction),
            );
        }
        return resolved(
            ProfileLabel::single(predicted),
            conf * s.low_confidence_discount,
            format!("Low-confidence model estimate: {predicted}"),
            ProfileSource::Classifier,
            Some(prediction),
        );
    }

    if conf >= s.classifier_high {
        return resolved(
            ProfileLabel::single(predicted),
            conf,
            format!("Model estimate with high confidence: {predicted}"),
            ProfileSource::Classifier,
            Some(prediction),
        );
    }

    let base_coh = profile_coherence(student, base);
    let model_coh = profile_coherence(student, predicted);
    debug!(target: "recommender::profile", %base, %predicted, base_coh, model_coh, "intermediate confidence");

    if base_coh - model_coh > s.coherence_margin {
        return resolved(
            ProfileLabel::single(base),
            s.confidence_base_preferred,
            format!("Your answers fit {base} clearly better than the model's {predicted}"),
            ProfileSource::Base,
            Some(prediction),
        );
    }
    if model_coh - base_coh <= s.coherence_margin
        && base != predicted
        && base_coh > s.hybrid_threshold
    {
        return resolved(
            ProfileLabel::hybrid(base, predicted),
            s.confidence_hybrid,
            format!("Both {base} and {predicted} describe you well"),
            ProfileSource::Hybrid,
            Some(prediction),
        );
    }
    resolved(
        ProfileLabel::single(predicted),
        conf,
        format!("Model estimate: {predicted}"),
        ProfileSource::Classifier,
        Some(prediction),
    )
}

/// Query the gateway and reconcile.
pub fn resolve_profile(
    student: &StudentProfile,
    gateway: &dyn ClassifierGateway,
    cfg: &EngineConfig,
) -> ResolvedProfile {
    let base = base_profile(student, &cfg.base_points);
    let features = FeatureVector::build(student, &gateway.feature_names());
    let resolved = reconcile(student, base, gateway.predict(&features), &cfg.profile);
    debug!(
        target: "recommender::profile",
        label = %resolved.label,
        confidence = resolved.confidence,
        source = ?resolved.source,
        "profile resolved"
    );
    resolved
}
