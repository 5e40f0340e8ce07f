//! Sector Resolver: a declared sector always wins; the classifier is a fallback.

use crate::classifier::{ClassifierGateway, ClassifierPrediction, FeatureVector, GatewayError};
use crate::config::{EngineConfig, SectorSettings};
use crate::metrics::record_gateway_fallback;
use crate::profile::StudentProfile;
use crate::recommendation::{ResolvedSector, SectorSource};
use crate::sectors::SectorVocabulary;
use tracing::{debug, warn};

/// First declared sector, if any, in canonical form.
pub fn declared_sector(student: &StudentProfile, vocab: &SectorVocabulary) -> Option<String> {
    student
        .declared_sectors
        .iter()
        .find(|s| !s.trim().is_empty())
        .map(|s| vocab.normalize(s))
}

/// Resolution from a classifier outcome when nothing was declared. Pure.
pub fn from_prediction(
    prediction: Result<ClassifierPrediction, GatewayError>,
    vocab: &SectorVocabulary,
    s: &SectorSettings,
) -> ResolvedSector {
    match prediction {
        Ok(p) => {
            let sector = vocab.normalize(&p.label);
            let (confidence, justification) = if p.confidence < s.low_confidence {
                (
                    p.confidence * s.low_confidence_discount,
                    format!("Low-confidence model estimate: {sector}"),
                )
            } else {
                (p.confidence, format!("Model estimate: {sector}"))
            };
            ResolvedSector {
                sector: Some(sector),
                confidence,
                justification,
                source: SectorSource::Classifier,
            }
        }
        Err(e) => {
            warn!(target: "recommender::sector", error = %e, "sector model unavailable");
            record_gateway_fallback("sector");
            ResolvedSector {
                sector: None,
                confidence: 0.0,
                justification: "No sector declared and no model estimate available".to_string(),
                source: SectorSource::Unresolved,
            }
        }
    }
}

/// Resolve the student's sector. The gateway is only queried when nothing was declared.
pub fn resolve_sector(
    student: &StudentProfile,
    gateway: &dyn ClassifierGateway,
    cfg: &EngineConfig,
) -> ResolvedSector {
    let resolved = match declared_sector(student, &cfg.sectors) {
        Some(sector) => ResolvedSector {
            justification: format!("You declared interest in {sector}"),
            sector: Some(sector),
            confidence: cfg.sector.declared_confidence,
            source: SectorSource::Declared,
        },
        None => {
            let features = FeatureVector::build(student, &gateway.feature_names());
            from_prediction(gateway.predict(&features), &cfg.sectors, &cfg.sector)
        }
    };
    debug!(
        target: "recommender::sector",
        sector = ?resolved.sector,
        confidence = resolved.confidence,
        source = ?resolved.source,
        "sector resolved"
    );
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{StaticGateway, UnavailableGateway};

    #[test]
    fn declared_sector_beats_confident_classifier() {
        let cfg = EngineConfig::builtin().unwrap();
        let student = StudentProfile::new().with_sector("Salud");
        let r = resolve_sector(&student, &StaticGateway::new("Tecnología", 0.95), &cfg);
        assert_eq!(r.sector.as_deref(), Some("Salud"));
        assert!((r.confidence - 0.95).abs() < 1e-6);
        assert_eq!(r.source, SectorSource::Declared);
    }

    #[test]
    fn classifier_is_used_and_discounted_when_unsure() {
        let cfg = EngineConfig::builtin().unwrap();
        let student = StudentProfile::new();
        let r = resolve_sector(&student, &StaticGateway::new("Tecnología", 0.9), &cfg);
        assert_eq!(r.sector.as_deref(), Some("Tecnología"));
        assert!((r.confidence - 0.9).abs() < 1e-6);

        let r = resolve_sector(&student, &StaticGateway::new("tecnologia", 0.3), &cfg);
        assert_eq!(r.sector.as_deref(), Some("Tecnología"));
        assert!((r.confidence - 0.15).abs() < 1e-6);
    }

    #[test]
    fn unavailable_model_without_declaration_is_unresolved() {
        let cfg = EngineConfig::builtin().unwrap();
        let r = resolve_sector(&StudentProfile::new(), &UnavailableGateway::new("sector"), &cfg);
        assert_eq!(r.sector, None);
        assert_eq!(r.confidence, 0.0);
        assert_eq!(r.source, SectorSource::Unresolved);
    }
}
