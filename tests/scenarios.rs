// tests/scenarios.rs
use career_recommender::analyze::RuleSet;
use career_recommender::classifier::{DynGateway, StaticGateway, UnavailableGateway};
use career_recommender::profile::Level;
use career_recommender::recommendation::{ProfileLabel, SectorSource};
use career_recommender::resolve::base_profile;
use career_recommender::{
    Catalog, Coherence, EngineConfig, Recommender, Signal, StudentProfile, Subject,
};
use std::sync::Arc;

fn recommender(profile: DynGateway, sector: DynGateway) -> Recommender {
    Recommender::new(
        EngineConfig::builtin().unwrap(),
        RuleSet::builtin().unwrap(),
        Arc::new(Catalog::builtin().unwrap()),
        profile,
        sector,
    )
}

#[test]
fn math_dislike_keeps_math_teaching_out_of_top_five() {
    let r = recommender(
        StaticGateway::shared("Técnico", 0.9),
        UnavailableGateway::shared("sector"),
    );
    let student = StudentProfile::new()
        .with_disliked(Subject::Mathematics)
        .with_signal(Signal::BuildsThings)
        .with_signal(Signal::Curious)
        .with_coherence(Coherence::Medium);

    let out = r.recommend(&student, 5);

    assert!(!out.fallback);
    assert!(r.catalog().len() - out.exclusions.len() >= 10, "need 10+ alternatives");
    assert!(!out.names().contains(&"Licenciatura en Matemáticas"));
    let ex = out
        .exclusions
        .iter()
        .find(|e| e.candidate == "Licenciatura en Matemáticas")
        .expect("math teaching excluded");
    assert_eq!(ex.rule, "dislikes_foundational_math");
    assert_eq!(out.sector.source, SectorSource::Unresolved);
}

#[test]
fn declared_salud_beats_confident_technology_model() {
    let r = recommender(
        UnavailableGateway::shared("profile"),
        StaticGateway::shared("Tecnología", 0.95),
    );
    let student = StudentProfile::new()
        .with_sector("Salud")
        .with_signal(Signal::Helping)
        .with_signal(Signal::Empathetic)
        .with_signal(Signal::Sociable)
        .with_signal(Signal::ChatsWithFriends);

    let out = r.recommend(&student, 5);

    assert_eq!(out.sector.sector.as_deref(), Some("Salud"));
    assert_eq!(out.sector.source, SectorSource::Declared);
    assert!((out.sector.confidence - 0.95).abs() < 1e-6);
    assert!(out.items[0].candidate.has_sector("Salud"));
    assert!(out.items[0].assessment.sector_match);
}

#[test]
fn high_coherence_overrides_classifier_across_confidence_sweep() {
    let cfg = EngineConfig::builtin().unwrap();
    let student = StudentProfile::new()
        .with_signal(Signal::ArtisticActivities)
        .with_signal(Signal::Imaginative)
        .with_favorite(Subject::Arts)
        .with_strong(Subject::Arts)
        .with_coherence(Coherence::High);
    let base = base_profile(&student, &cfg.base_points);

    for step in 0..=20 {
        let conf = step as f32 / 20.0;
        let r = recommender(
            StaticGateway::shared("Técnico", conf),
            UnavailableGateway::shared("sector"),
        );
        let out = r.recommend(&student, 3);
        assert_eq!(out.profile.label, ProfileLabel::single(base), "confidence {conf}");
    }
}

#[test]
fn declared_sector_wins_for_any_model_sector() {
    for model in ["Tecnología", "Financiero", "Cultural", "Investigación"] {
        let r = recommender(
            UnavailableGateway::shared("profile"),
            StaticGateway::shared(model, 0.99),
        );
        let student = StudentProfile::new().with_sector("Educativo");
        let out = r.recommend(&student, 3);
        assert_eq!(out.sector.sector.as_deref(), Some("Educativo"), "model said {model}");
    }
}

#[test]
fn low_interaction_quiet_student_never_gets_people_careers() {
    let r = recommender(
        UnavailableGateway::shared("profile"),
        UnavailableGateway::shared("sector"),
    );
    let student = StudentProfile::new()
        .with_interaction(Level::Low)
        .with_signal(Signal::Introverted)
        .with_signal(Signal::Reading);
    let out = r.recommend(&student, 8);
    let cfg = r.config();
    for name in out.names() {
        assert!(
            !cfg.in_group("very_high_interaction", name),
            "{name} should have been excluded"
        );
    }
}

#[test]
fn tiny_catalog_never_exceeds_subfield_cap() {
    let full = Catalog::builtin().unwrap();
    let picked = ["Ingeniería de Sistemas", "Ingeniería de Software", "Ingeniería en Telecomunicaciones"]
        .iter()
        .map(|n| full.get(n).cloned().expect("career in builtin catalog"))
        .collect();
    let cfg = EngineConfig::builtin().unwrap();
    let r = Recommender::new(
        cfg.clone(),
        RuleSet::builtin().unwrap(),
        Arc::new(Catalog::from_candidates(picked).unwrap()),
        UnavailableGateway::shared("profile"),
        UnavailableGateway::shared("sector"),
    );
    let student = StudentProfile::new()
        .with_signal(Signal::Logical)
        .with_signal(Signal::BuildsThings)
        .with_favorite(Subject::Mathematics);

    let out = r.recommend(&student, 5);

    assert!(!out.fallback);
    assert_eq!(out.items.len(), 2);
    assert!(out
        .names()
        .iter()
        .all(|n| cfg.subfield_of(n) == Some("sistemas")));
}

#[test]
fn coherent_technical_student_collects_affinity_bonuses() {
    let r = recommender(
        StaticGateway::shared("Técnico", 0.9),
        UnavailableGateway::shared("sector"),
    );
    let student = StudentProfile::new()
        .with_signal(Signal::BuildsThings)
        .with_signal(Signal::Skilled)
        .with_favorite(Subject::Mathematics)
        .with_strong(Subject::Mathematics)
        .with_coherence(Coherence::High);

    let out = r.recommend(&student, 5);

    assert!(!out.fallback);
    for item in &out.items {
        let rules: Vec<&str> = item.adjustments.iter().map(|a| a.rule.as_str()).collect();
        assert!(rules.contains(&"coherence_bonus"), "{}: {rules:?}", item.candidate.name);
        if item.assessment.technical_application {
            assert!(rules.contains(&"technical_bonus"), "{}: {rules:?}", item.candidate.name);
        }
    }
}
