//! Computed affinity bonuses, appended after the rule table.
//!
//! Unlike table rules these look at the resolved profile and at catalog text
//! (description and employment fields). Student input is still read as signals only.
//!
//! - coherence: "Muy Coherente" students, graded by how the candidate's tags meet the profile
//! - artistic: Artistic profiles on explicitly artistic candidates, capped then scaled
//! - work focus: a liked activity echoed by the candidate's daily work
//! - environment/sector: environment fit, social fit and desired work focus, capped then scaled
//! - technical: Technical profiles on technical-application candidates

use super::rules::RuleContext;
use crate::catalog::CareerCandidate;
use crate::config::GROUP_ARTISTIC;
use crate::profile::{Archetype, Coherence};
use crate::recommendation::{ResolvedProfile, ScoreAdjustment};
use crate::text::fold;

pub const COHERENCE_BONUS: &str = "coherence_bonus";
pub const ARTISTIC_BONUS: &str = "artistic_bonus";
pub const WORK_FOCUS_BONUS: &str = "work_focus_bonus";
pub const ENVIRONMENT_BONUS: &str = "environment_sector_bonus";
pub const TECHNICAL_BONUS: &str = "technical_bonus";

/// Every affinity bonus that applies to one surviving candidate.
pub fn affinity_bonuses(ctx: &RuleContext<'_>, profile: &ResolvedProfile) -> Vec<ScoreAdjustment> {
    [
        coherence_bonus(ctx, profile),
        artistic_bonus(ctx, profile),
        work_focus_bonus(ctx),
        environment_bonus(ctx),
        technical_bonus(ctx, profile),
    ]
    .into_iter()
    .flatten()
    .collect()
}

pub fn coherence_bonus(ctx: &RuleContext<'_>, profile: &ResolvedProfile) -> Option<ScoreAdjustment> {
    if ctx.student.coherence != Coherence::High {
        return None;
    }
    let a = &ctx.config.affinity;
    let tags = &ctx.candidate.personality_tags;
    let name = &ctx.candidate.name;
    let (delta, reason) = if tags.contains(&profile.base) {
        (
            a.coherence_base_bonus,
            format!("Your likes match your strengths, and {name} fits your base profile"),
        )
    } else if profile.label.archetypes().any(|p| tags.contains(&p)) {
        (
            a.coherence_profile_bonus,
            format!("Your likes match your strengths, and {name} fits your profile"),
        )
    } else {
        (
            a.coherence_other_bonus,
            "Your likes match your strengths".to_string(),
        )
    };
    Some(ScoreAdjustment::new(COHERENCE_BONUS, delta, reason))
}

pub fn artistic_bonus(ctx: &RuleContext<'_>, profile: &ResolvedProfile) -> Option<ScoreAdjustment> {
    if !profile.label.contains(Archetype::Artistic) {
        return None;
    }
    let a = &ctx.config.affinity;
    let c = ctx.candidate;

    let mut raw = 0.0;
    if ctx.config.in_group(GROUP_ARTISTIC, &c.name) {
        raw += a.artistic_listed_bonus;
    }
    if c.sector_tags.iter().any(|s| a.artistic_sectors.contains(s)) {
        raw += a.artistic_sector_bonus;
    }
    let creative = c
        .employment_fields
        .iter()
        .filter(|f| keyword_hits(f, &a.creative_keywords) > 0)
        .count();
    if creative > 0 {
        raw += (creative as f32 * a.creative_field_step).min(a.creative_field_cap);
    }
    if raw <= 0.0 {
        return None;
    }

    Some(ScoreAdjustment::new(
        ARTISTIC_BONUS,
        raw.min(a.artistic_cap) * a.artistic_scale,
        format!("{} rewards the artistic side you describe", c.name),
    ))
}

pub fn work_focus_bonus(ctx: &RuleContext<'_>) -> Option<ScoreAdjustment> {
    let a = &ctx.config.affinity;
    let text = work_text(ctx.candidate);
    a.work_focus
        .iter()
        .find(|f| ctx.student.count(&f.signals) > 0 && keyword_hits(&text, &f.keywords) > 0)?;
    Some(ScoreAdjustment::new(
        WORK_FOCUS_BONUS,
        a.work_focus_bonus,
        format!("What you enjoy doing shows up in the daily work of {}", ctx.candidate.name),
    ))
}

pub fn environment_bonus(ctx: &RuleContext<'_>) -> Option<ScoreAdjustment> {
    let a = &ctx.config.affinity;
    let text = work_text(ctx.candidate);
    let focus = a
        .focus_areas
        .iter()
        .filter(|f| ctx.student.count(&f.signals) > 0)
        .map(|f| (keyword_hits(&text, &f.keywords) as f32 * a.focus_step).min(a.focus_cap))
        .sum::<f32>()
        .min(1.0);

    let max = a.environment_max;
    let raw = ctx.assessment.environment_fit * max * a.environment_share
        + ctx.assessment.social_fit * max * a.social_share
        + focus * max * a.focus_share;
    let delta = raw.min(max) * a.environment_scale;
    (delta > 0.0).then(|| {
        ScoreAdjustment::new(
            ENVIRONMENT_BONUS,
            delta,
            format!("{} suits where and how you want to work", ctx.candidate.name),
        )
    })
}

pub fn technical_bonus(ctx: &RuleContext<'_>, profile: &ResolvedProfile) -> Option<ScoreAdjustment> {
    if !ctx.assessment.technical_application || !profile.label.contains(Archetype::Technical) {
        return None;
    }
    Some(ScoreAdjustment::new(
        TECHNICAL_BONUS,
        ctx.config.affinity.technical_bonus,
        format!("{} is applied, hands-on work for a technical profile", ctx.candidate.name),
    ))
}

// --- internals ---

fn work_text(c: &CareerCandidate) -> String {
    let mut text = c.description.clone();
    for f in &c.employment_fields {
        text.push(' ');
        text.push_str(f);
    }
    text
}

/// Keywords that start a word of `text`, both folded ("diseño" matches "Diseños", not "rediseño").
fn keyword_hits(text: &str, keywords: &[String]) -> usize {
    let padded = format!(" {}", fold(text));
    keywords
        .iter()
        .map(|k| fold(k))
        .filter(|k| !k.is_empty() && padded.contains(&format!(" {k}")))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::compat::CompatibilityAssessment;
    use crate::config::EngineConfig;
    use crate::profile::{Signal, StudentProfile};
    use crate::recommendation::{ProfileLabel, ProfileSource};

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

    fn resolved(label: ProfileLabel, base: Archetype) -> ResolvedProfile {
        ResolvedProfile {
            label,
            confidence: 0.8,
            justification: String::new(),
            source: ProfileSource::Hybrid,
            base,
            classifier: None,
        }
    }

    fn ctx<'a>(
        student: &'a StudentProfile,
        candidate: &'a CareerCandidate,
        assessment: &'a CompatibilityAssessment,
        config: &'a EngineConfig,
    ) -> RuleContext<'a> {
        RuleContext {
            student,
            candidate,
            assessment,
            config,
        }
    }

    #[test]
    fn coherence_bonus_grades_tag_overlap() {
        let cfg = EngineConfig::builtin().unwrap();
        let a = assessment();
        let student = StudentProfile::new().with_coherence(Coherence::High);
        let profile = resolved(
            ProfileLabel::hybrid(Archetype::Technical, Archetype::Investigative),
            Archetype::Technical,
        );

        let base = CareerCandidate::new("A").with_tags(&[Archetype::Technical]);
        let other = CareerCandidate::new("B").with_tags(&[Archetype::Investigative]);
        let none = CareerCandidate::new("C").with_tags(&[Archetype::Social]);
        let delta = |c: &CareerCandidate| coherence_bonus(&ctx(&student, c, &a, &cfg), &profile).unwrap().delta;
        assert!((delta(&base) - 0.12).abs() < 1e-6);
        assert!((delta(&other) - 0.08).abs() < 1e-6);
        assert!((delta(&none) - 0.05).abs() < 1e-6);

        let medium = StudentProfile::new().with_coherence(Coherence::Medium);
        assert!(coherence_bonus(&ctx(&medium, &base, &a, &cfg), &profile).is_none());
    }

    #[test]
    fn artistic_bonus_is_capped_then_scaled() {
        let cfg = EngineConfig::builtin().unwrap();
        let a = assessment();
        let student = StudentProfile::new();
        let artistic = resolved(ProfileLabel::single(Archetype::Artistic), Archetype::Artistic);

        let mut music = CareerCandidate::new("Música").with_sectors(&["Cultural"]);
        music.employment_fields = vec![
            "Producción musical".into(),
            "Diseño sonoro".into(),
            "Docencia en arte".into(),
            "Gestión cultural".into(),
        ];
        // 0.15 listed + 0.10 sector + min(3 * 0.03, 0.08) = 0.33 → 0.25 * 0.6
        let adj = artistic_bonus(&ctx(&student, &music, &a, &cfg), &artistic).unwrap();
        assert!((adj.delta - 0.15).abs() < 1e-6);
        assert_eq!(adj.rule, ARTISTIC_BONUS);

        let mut fields_only = CareerCandidate::new("Mercadeo");
        fields_only.employment_fields = vec!["Publicidad".into()];
        let adj = artistic_bonus(&ctx(&student, &fields_only, &a, &cfg), &artistic).unwrap();
        assert!((adj.delta - 0.03 * 0.6).abs() < 1e-6);

        let plain = CareerCandidate::new("Derecho");
        assert!(artistic_bonus(&ctx(&student, &plain, &a, &cfg), &artistic).is_none());

        let social = resolved(ProfileLabel::single(Archetype::Social), Archetype::Social);
        assert!(artistic_bonus(&ctx(&student, &music, &a, &cfg), &social).is_none());
    }

    #[test]
    fn work_focus_needs_liked_activity_and_matching_work() {
        let cfg = EngineConfig::builtin().unwrap();
        let a = assessment();
        let mut c = CareerCandidate::new("Ingeniería Civil");
        c.description = "Desarrollar e implementar proyectos de infraestructura".into();

        let builder = StudentProfile::new().with_signal(Signal::BuildsThings);
        let adj = work_focus_bonus(&ctx(&builder, &c, &a, &cfg)).unwrap();
        assert!((adj.delta - 0.03).abs() < 1e-6);

        let reader = StudentProfile::new().with_signal(Signal::Reading);
        assert!(work_focus_bonus(&ctx(&reader, &c, &a, &cfg)).is_none());
    }

    #[test]
    fn environment_bonus_blends_fits_and_focus() {
        let cfg = EngineConfig::builtin().unwrap();
        let a = assessment();
        let mut c = CareerCandidate::new("Ingeniería de Software");
        c.description = "Desarrollo de software y sistemas digitales".into();

        // (0.5 * 0.2 * 0.4 + 0.8 * 0.2 * 0.3) * 0.7
        let idle = StudentProfile::new();
        let adj = environment_bonus(&ctx(&idle, &c, &a, &cfg)).unwrap();
        assert!((adj.delta - 0.0616).abs() < 1e-5);

        // software, sistemas, digital → focus 0.6, adds 0.6 * 0.2 * 0.3 before scaling
        let techie = StudentProfile::new()
            .with_signal(Signal::Technology)
            .with_signal(Signal::DataWork);
        let adj = environment_bonus(&ctx(&techie, &c, &a, &cfg)).unwrap();
        assert!((adj.delta - 0.0868).abs() < 1e-5);

        let perfect = CompatibilityAssessment {
            environment_fit: 1.0,
            social_fit: 1.0,
            ..assessment()
        };
        let adj = environment_bonus(&ctx(&techie, &c, &perfect, &cfg)).unwrap();
        assert!(adj.delta <= 0.2 * 0.7 + 1e-6);

        let zero = CompatibilityAssessment {
            environment_fit: 0.0,
            social_fit: 0.0,
            ..assessment()
        };
        assert!(environment_bonus(&ctx(&idle, &c, &zero, &cfg)).is_none());
    }

    #[test]
    fn technical_bonus_needs_profile_and_application() {
        let cfg = EngineConfig::builtin().unwrap();
        let student = StudentProfile::new();
        let c = CareerCandidate::new("Ingeniería Civil");
        let applied = CompatibilityAssessment {
            technical_application: true,
            ..assessment()
        };
        let hybrid = resolved(
            ProfileLabel::hybrid(Archetype::Social, Archetype::Technical),
            Archetype::Social,
        );
        let adj = technical_bonus(&ctx(&student, &c, &applied, &cfg), &hybrid).unwrap();
        assert!((adj.delta - 0.03).abs() < 1e-6);

        let social = resolved(ProfileLabel::single(Archetype::Social), Archetype::Social);
        assert!(technical_bonus(&ctx(&student, &c, &applied, &cfg), &social).is_none());
        assert!(technical_bonus(&ctx(&student, &c, &assessment(), &cfg), &hybrid).is_none());
    }

    #[test]
    fn keywords_match_word_starts_only() {
        let kw = vec!["arte".to_string()];
        assert_eq!(keyword_hits("Historia del Arte", &kw), 1);
        assert_eq!(keyword_hits("Artesanías", &kw), 1);
        assert_eq!(keyword_hits("Departamento de compras", &kw), 0);
    }
}
