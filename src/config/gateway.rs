// src/config/gateway.rs
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

pub const ENV_PROFILE_MODEL_URL: &str = "RECOMMENDER_PROFILE_MODEL_URL";
pub const ENV_SECTOR_MODEL_URL: &str = "RECOMMENDER_SECTOR_MODEL_URL";
pub const ENV_MODEL_TIMEOUT_MS: &str = "RECOMMENDER_MODEL_TIMEOUT_MS";
pub const ENV_GATEWAY_PATH: &str = "RECOMMENDER_GATEWAY_PATH";
pub const DEFAULT_GATEWAY_PATH: &str = "config/gateway.json";

fn default_timeout_ms() -> u64 {
    3_000
}
fn default_connect_timeout_ms() -> u64 {
    1_000
}

/// Where the two classifier models are served. A missing URL means the model
/// artifact is unavailable and the resolvers fall back to rule-derived values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// "ENV" means: read from RECOMMENDER_PROFILE_MODEL_URL
    pub profile_url: Option<String>,
    /// "ENV" means: read from RECOMMENDER_SECTOR_MODEL_URL
    pub sector_url: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            profile_url: None,
            sector_url: None,
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl GatewayConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: GatewayConfig = serde_json::from_str(&data)?;

        if is_env_marker(cfg.profile_url.as_deref()) {
            cfg.profile_url = Some(
                env::var(ENV_PROFILE_MODEL_URL)
                    .map_err(|_| anyhow::anyhow!("Missing {ENV_PROFILE_MODEL_URL} env var"))?,
            );
        }
        if is_env_marker(cfg.sector_url.as_deref()) {
            cfg.sector_url = Some(
                env::var(ENV_SECTOR_MODEL_URL)
                    .map_err(|_| anyhow::anyhow!("Missing {ENV_SECTOR_MODEL_URL} env var"))?,
            );
        }

        cfg.sanitize();
        Ok(cfg)
    }

    /// $RECOMMENDER_GATEWAY_PATH → config/gateway.json → environment variables only.
    pub fn load_default() -> anyhow::Result<Self> {
        match super::locate(ENV_GATEWAY_PATH, DEFAULT_GATEWAY_PATH)? {
            Some(path) => Self::load_from_file(&path)
                .with_context(|| format!("loading gateway config from {}", path.display())),
            None => Ok(Self::from_env()),
        }
    }

    /// Build purely from environment variables; unset URLs stay `None`.
    pub fn from_env() -> Self {
        let mut cfg = Self {
            profile_url: non_empty(env::var(ENV_PROFILE_MODEL_URL).ok()),
            sector_url: non_empty(env::var(ENV_SECTOR_MODEL_URL).ok()),
            ..Self::default()
        };
        if let Some(ms) = env::var(ENV_MODEL_TIMEOUT_MS)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
        {
            cfg.timeout_ms = ms;
        }
        cfg.sanitize();
        cfg
    }

    fn sanitize(&mut self) {
        self.profile_url = non_empty(self.profile_url.take());
        self.sector_url = non_empty(self.sector_url.take());
        if self.timeout_ms == 0 {
            self.timeout_ms = default_timeout_ms();
        }
        if self.connect_timeout_ms == 0 || self.connect_timeout_ms > self.timeout_ms {
            self.connect_timeout_ms = default_connect_timeout_ms().min(self.timeout_ms);
        }
    }
}

fn is_env_marker(v: Option<&str>) -> bool {
    v.map(|s| s.trim().eq_ignore_ascii_case("env")).unwrap_or(false)
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn env_marker_resolves_from_environment() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("gateway.json");
        fs::write(&p, r#"{"profile_url":"ENV","sector_url":null,"timeout_ms":0}"#).unwrap();

        env::set_var(ENV_PROFILE_MODEL_URL, "http://127.0.0.1:9000/profile");
        let cfg = GatewayConfig::load_from_file(&p).unwrap();
        env::remove_var(ENV_PROFILE_MODEL_URL);

        assert_eq!(cfg.profile_url.as_deref(), Some("http://127.0.0.1:9000/profile"));
        assert_eq!(cfg.sector_url, None);
        assert_eq!(cfg.timeout_ms, default_timeout_ms());
    }

    #[serial_test::serial]
    #[test]
    fn env_marker_without_variable_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("gateway.json");
        fs::write(&p, r#"{"profile_url":"env","sector_url":null}"#).unwrap();
        env::remove_var(ENV_PROFILE_MODEL_URL);
        assert!(GatewayConfig::load_from_file(&p).is_err());
    }

    #[serial_test::serial]
    #[test]
    fn from_env_ignores_blank_urls() {
        env::set_var(ENV_PROFILE_MODEL_URL, "   ");
        env::remove_var(ENV_SECTOR_MODEL_URL);
        let cfg = GatewayConfig::from_env();
        env::remove_var(ENV_PROFILE_MODEL_URL);
        assert_eq!(cfg.profile_url, None);
        assert_eq!(cfg.sector_url, None);
    }
}
