//! Classifier gateway: model abstraction + feature vector + static/unavailable/HTTP models.
//!
//! The two statistical models (personality profile, preferred sector) sit behind
//! the same blocking `predict(features) -> (label, confidence)` contract. Failures
//! are returned as `GatewayError` and the resolvers fall back to rule-derived values.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::gateway::GatewayConfig;
use crate::profile::{Level, Signal, StudentProfile, Subject};

/// Value used for any feature the profile cannot provide.
pub const NEUTRAL_FEATURE_VALUE: f32 = 3.0;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

/// `(label, confidence)` returned by a model. Confidence is clamped to [0,1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierPrediction {
    pub label: String,
    pub confidence: f32,
}

impl ClassifierPrediction {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            label: label.into(),
            confidence,
        }
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum GatewayError {
    #[error("model `{0}` is not available")]
    Unavailable(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("model returned HTTP {0}")]
    Status(u16),
    #[error("invalid model response: {0}")]
    InvalidResponse(String),
}

/// Blocking request/response model interface.
pub trait ClassifierGateway: Send + Sync {
    /// Model name for diagnostics.
    fn name(&self) -> &str;
    /// Ordered feature names the model expects.
    fn feature_names(&self) -> Vec<String> {
        default_feature_names()
    }
    fn predict(&self, features: &FeatureVector) -> Result<ClassifierPrediction, GatewayError>;
}

pub type DynGateway = Arc<dyn ClassifierGateway>;

// ------------------------------------------------------------
// Feature vector
// ------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f32),
    Category(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    pub name: String,
    pub value: FeatureValue,
}

/// Ordered, named feature values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureVector {
    pub features: Vec<Feature>,
}

impl FeatureVector {
    /// Build the vector in `names` order. Unknown or absent features get
    /// [`NEUTRAL_FEATURE_VALUE`].
    ///
    /// Recognised names:
    /// - `avg_<subject>` / `performance_<subject>`
    /// - `general_average` / `general_performance`
    /// - `coherence`, `work_environment`, `social_interaction`
    /// - `declared_sector_count`
    /// - `signal_<signal>` (1.0 / 0.0)
    pub fn build(profile: &StudentProfile, names: &[String]) -> Self {
        let features = names
            .iter()
            .map(|name| Feature {
                name: name.clone(),
                value: lookup(profile, name)
                    .unwrap_or(FeatureValue::Number(NEUTRAL_FEATURE_VALUE)),
            })
            .collect();
        Self { features }
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.features
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

const FEATURE_SUBJECTS: [Subject; 8] = [
    Subject::Mathematics,
    Subject::Physics,
    Subject::BiologyChemistry,
    Subject::SocialSciences,
    Subject::Language,
    Subject::Economics,
    Subject::Arts,
    Subject::PhysicalEducation,
];

static DEFAULT_FEATURES: Lazy<Vec<String>> = Lazy::new(build_default_feature_names);

/// Schema used when a model does not declare its own.
pub fn default_feature_names() -> Vec<String> {
    DEFAULT_FEATURES.clone()
}

fn build_default_feature_names() -> Vec<String> {
    let mut names = Vec::new();
    for s in FEATURE_SUBJECTS {
        let key = serde_key(&s);
        names.push(format!("avg_{key}"));
        names.push(format!("performance_{key}"));
    }
    names.extend(
        [
            "general_average",
            "general_performance",
            "coherence",
            "work_environment",
            "social_interaction",
            "declared_sector_count",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    for s in [
        Signal::BuildsThings,
        Signal::ArtisticActivities,
        Signal::ChatsWithFriends,
        Signal::Experiments,
        Signal::TidiesSpace,
        Signal::Skilled,
        Signal::Imaginative,
        Signal::Sociable,
        Signal::Curious,
        Signal::Organized,
        Signal::Leader,
    ] {
        names.push(format!("signal_{}", serde_key(&s)));
    }
    names
}

fn serde_key<T: Serialize>(v: &T) -> String {
    serde_json::to_value(v)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn level_key(l: Level) -> FeatureValue {
    FeatureValue::Category(serde_key(&l))
}

fn subject_for(key: &str) -> Option<Subject> {
    FEATURE_SUBJECTS
        .iter()
        .chain([Subject::Sciences, Subject::Philosophy].iter())
        .copied()
        .find(|s| serde_key(s) == key)
}

fn lookup(p: &StudentProfile, name: &str) -> Option<FeatureValue> {
    if let Some(key) = name.strip_prefix("avg_") {
        return p.average(subject_for(key)?).map(FeatureValue::Number);
    }
    if let Some(key) = name.strip_prefix("performance_") {
        return p.average(subject_for(key)?).map(|g| level_key(Level::from_grade(g)));
    }
    if let Some(key) = name.strip_prefix("signal_") {
        let hit = p.signals.iter().any(|s| serde_key(s) == key);
        return Some(FeatureValue::Number(if hit { 1.0 } else { 0.0 }));
    }
    match name {
        "general_average" => p.general_average().map(FeatureValue::Number),
        "general_performance" => p.general_average().map(|g| level_key(Level::from_grade(g))),
        "coherence" => Some(FeatureValue::Category(serde_key(&p.coherence))),
        "work_environment" => p
            .work_environment
            .map(|e| FeatureValue::Category(serde_key(&e))),
        "social_interaction" => p.social_interaction.map(level_key),
        "declared_sector_count" => Some(FeatureValue::Number(p.declared_sectors.len() as f32)),
        _ => None,
    }
}

// ------------------------------------------------------------
// Concrete gateways
// ------------------------------------------------------------

/// Always returns the same prediction. Deterministic; for tests and demos.
#[derive(Debug, Clone)]
pub struct StaticGateway {
    name: String,
    prediction: ClassifierPrediction,
}

impl StaticGateway {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            name: "static".to_string(),
            prediction: ClassifierPrediction::new(label, confidence),
        }
    }

    pub fn shared(label: impl Into<String>, confidence: f32) -> DynGateway {
        Arc::new(Self::new(label, confidence))
    }
}

impl ClassifierGateway for StaticGateway {
    fn name(&self) -> &str {
        &self.name
    }
    fn predict(&self, _features: &FeatureVector) -> Result<ClassifierPrediction, GatewayError> {
        Ok(self.prediction.clone())
    }
}

/// Model artifact is missing: every call fails closed.
#[derive(Debug, Clone)]
pub struct UnavailableGateway {
    model: String,
}

impl UnavailableGateway {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    pub fn shared(model: impl Into<String>) -> DynGateway {
        Arc::new(Self::new(model))
    }
}

impl ClassifierGateway for UnavailableGateway {
    fn name(&self) -> &str {
        &self.model
    }
    fn predict(&self, _features: &FeatureVector) -> Result<ClassifierPrediction, GatewayError> {
        Err(GatewayError::Unavailable(self.model.clone()))
    }
}

/// Model served over HTTP: `POST {url}` with `{"features":[{name,value}…]}`,
/// expecting `{"label": "...", "confidence": 0.0..1.0}`.
pub struct HttpGateway {
    name: String,
    url: String,
    http: reqwest::blocking::Client,
}

impl HttpGateway {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        cfg: &GatewayConfig,
    ) -> Result<Self, GatewayError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("career-recommender/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            name: name.into(),
            url: url.into(),
            http,
        })
    }
}

impl ClassifierGateway for HttpGateway {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureVector) -> Result<ClassifierPrediction, GatewayError> {
        #[derive(Deserialize)]
        struct Resp {
            label: String,
            confidence: f32,
        }

        let resp = self
            .http
            .post(&self.url)
            .json(features)
            .send()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }
        let body: Resp = resp
            .json()
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        if body.label.trim().is_empty() {
            return Err(GatewayError::InvalidResponse("empty label".into()));
        }
        Ok(ClassifierPrediction::new(body.label.trim(), body.confidence))
    }
}

/// Profile and sector gateways according to config. Models without a URL
/// (or whose HTTP client cannot be built) are unavailable.
pub fn build_gateways_from_config(cfg: &GatewayConfig) -> (DynGateway, DynGateway) {
    (
        build_one("profile", cfg.profile_url.as_deref(), cfg),
        build_one("sector", cfg.sector_url.as_deref(), cfg),
    )
}

fn build_one(model: &str, url: Option<&str>, cfg: &GatewayConfig) -> DynGateway {
    match url {
        Some(url) => match HttpGateway::new(model, url, cfg) {
            Ok(g) => Arc::new(g),
            Err(e) => {
                warn!(target: "recommender::config", %model, error = %e, "model gateway disabled");
                UnavailableGateway::shared(model)
            }
        },
        None => UnavailableGateway::shared(model),
    }
}
