// src/lib.rs
// Public library surface for integration tests and the demo binary.

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod profile;
pub mod recommendation;
pub mod report;
pub mod sectors;
pub mod tagging;
pub mod text;

// Resolution and evaluation stages
pub mod analyze;
pub mod resolve;

// ---- Re-exports for stable public API ----
pub use crate::catalog::{CareerCandidate, Catalog, CatalogError};
pub use crate::classifier::{
    ClassifierGateway, ClassifierPrediction, FeatureVector, GatewayError, HttpGateway,
    StaticGateway, UnavailableGateway,
};
pub use crate::config::EngineConfig;
pub use crate::engine::Recommender;
pub use crate::profile::{Archetype, Coherence, Signal, StudentProfile, Subject, SurveyAnswers};
pub use crate::recommendation::{Recommendation, RecommendationResult};
pub use crate::tagging::Tagger;
