//! Compatibility weights for the overall score.
//!
//! TOML shape (section `[weights]` of `config/engine.toml`):
//! ```toml
//! profile_match = 0.25
//! sector_match = 0.25
//! academic_fit = 0.20
//! environment_fit = 0.15
//! social_fit = 0.10
//! technical_application = 0.05
//! ```

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatibilityWeights {
    pub profile_match: f32,
    pub sector_match: f32,
    pub academic_fit: f32,
    pub environment_fit: f32,
    pub social_fit: f32,
    pub technical_application: f32,
}

impl Default for CompatibilityWeights {
    fn default() -> Self {
        Self {
            profile_match: 0.25,
            sector_match: 0.25,
            academic_fit: 0.20,
            environment_fit: 0.15,
            social_fit: 0.10,
            technical_application: 0.05,
        }
    }
}

impl CompatibilityWeights {
    pub fn sum(&self) -> f32 {
        self.profile_match
            + self.sector_match
            + self.academic_fit
            + self.environment_fit
            + self.social_fit
            + self.technical_application
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let w = CompatibilityWeights::default();
        assert!((w.sum() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn missing_fields_keep_defaults() {
        let w: CompatibilityWeights = toml::from_str("social_fit = 0.2").unwrap();
        assert!((w.social_fit - 0.2).abs() < f32::EPSILON);
        assert!((w.profile_match - 0.25).abs() < f32::EPSILON);
    }
}
