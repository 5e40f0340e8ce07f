// tests/batch.rs
use career_recommender::analyze::RuleSet;
use career_recommender::classifier::{StaticGateway, UnavailableGateway};
use career_recommender::profile::Level;
use career_recommender::{
    Catalog, Coherence, EngineConfig, Recommender, Signal, StudentProfile, Subject,
};
use std::sync::Arc;

fn students() -> Vec<StudentProfile> {
    vec![
        StudentProfile::new()
            .with_signal(Signal::BuildsThings)
            .with_signal(Signal::Logical)
            .with_favorite(Subject::Mathematics)
            .with_average(Subject::Mathematics, 4.6),
        StudentProfile::new()
            .with_sector("Salud")
            .with_signal(Signal::Helping)
            .with_interaction(Level::High),
        StudentProfile::new()
            .with_disliked(Subject::Mathematics)
            .with_signal(Signal::ArtisticActivities)
            .with_coherence(Coherence::High),
        StudentProfile::new(),
        StudentProfile::new()
            .with_interaction(Level::Low)
            .with_signal(Signal::Introverted)
            .with_sector("Investigación"),
    ]
}

#[test]
fn batch_matches_sequential_in_input_order() {
    let r = Recommender::new(
        EngineConfig::builtin().unwrap(),
        RuleSet::builtin().unwrap(),
        Arc::new(Catalog::builtin().unwrap()),
        StaticGateway::shared("Investigador", 0.7),
        UnavailableGateway::shared("sector"),
    );
    let input = students();

    let batch = r.recommend_batch(&input, 6);
    let sequential: Vec<_> = input.iter().map(|s| r.recommend(s, 6)).collect();

    assert_eq!(batch.len(), input.len());
    for (i, (b, s)) in batch.iter().zip(&sequential).enumerate() {
        assert_eq!(
            serde_json::to_string(b).unwrap(),
            serde_json::to_string(s).unwrap(),
            "student #{i}"
        );
    }
}

#[test]
fn empty_batch_is_empty() {
    let r = Recommender::new(
        EngineConfig::builtin().unwrap(),
        RuleSet::builtin().unwrap(),
        Arc::new(Catalog::builtin().unwrap()),
        UnavailableGateway::shared("profile"),
        UnavailableGateway::shared("sector"),
    );
    assert!(r.recommend_batch(&[], 3).is_empty());
}
