//! # Recommendation Engine
//! Single-pass pipeline per request: Resolve → Evaluate → Adjust → Finalize.
//!
//! The `Recommender` owns only immutable, `Arc`-shared state (config, rule
//! table, catalog, gateways), so one instance serves any number of threads.

use crate::analyze::rank::{fallback_select, into_recommendations, select, ReasonContext};
use crate::analyze::{evaluate_catalog, RuleSet};
use crate::catalog::Catalog;
use crate::classifier::{build_gateways_from_config, DynGateway};
use crate::config::gateway::GatewayConfig;
use crate::config::EngineConfig;
use crate::metrics::{record_request, record_result_fallback};
use crate::profile::StudentProfile;
use crate::recommendation::RecommendationResult;
use crate::resolve::{resolve_profile, resolve_sector};
use crate::text::anon_hash;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct Recommender {
    config: Arc<EngineConfig>,
    rules: Arc<RuleSet>,
    catalog: Arc<Catalog>,
    profile_gateway: DynGateway,
    sector_gateway: DynGateway,
}

impl Recommender {
    pub fn new(
        config: EngineConfig,
        rules: RuleSet,
        catalog: Arc<Catalog>,
        profile_gateway: DynGateway,
        sector_gateway: DynGateway,
    ) -> Self {
        config.check_against(&catalog);
        rules.check_against(&config);
        Self {
            config: Arc::new(config),
            rules: Arc::new(rules),
            catalog,
            profile_gateway,
            sector_gateway,
        }
    }

    /// Load config, rules, catalog and gateways from env vars / `config/` / built-ins.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = EngineConfig::load_default()?;
        let rules = RuleSet::load_default()?;
        let catalog = Arc::new(Catalog::load_default()?);
        let gateways = GatewayConfig::load_default()?;
        let (profile_gateway, sector_gateway) = build_gateways_from_config(&gateways);
        info!(
            target: "recommender::config",
            candidates = catalog.len(),
            rules = rules.rules.len(),
            profile_model = gateways.profile_url.is_some(),
            sector_model = gateways.sector_url.is_some(),
            "recommender ready"
        );
        Ok(Self::new(config, rules, catalog, profile_gateway, sector_gateway))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Ranked, explained shortlist for one student. `top_n == 0` uses the configured default.
    pub fn recommend(&self, student: &StudentProfile, top_n: usize) -> RecommendationResult {
        record_request();
        let cfg = self.config.as_ref();
        let top_n = if top_n == 0 {
            cfg.ranking.default_top_n
        } else {
            top_n
        };
        let id = student_id(student);

        // Resolve
        let profile = resolve_profile(student, self.profile_gateway.as_ref(), cfg);
        let sector = resolve_sector(student, self.sector_gateway.as_ref(), cfg);

        // Evaluate + Adjust
        let evaluation = evaluate_catalog(student, &profile, &sector, &self.catalog, &self.rules, cfg);
        let exclusions = evaluation.exclusions();

        // Finalize
        let fallback = evaluation.survivors.is_empty();
        let ranked = if fallback {
            warn!(target: "recommender::rank", %id, excluded = exclusions.len(), "every candidate excluded; ranking on compatibility only");
            record_result_fallback();
            let all = evaluation.excluded.into_iter().map(|(s, _)| s).collect();
            fallback_select(all, top_n)
        } else {
            select(evaluation.survivors, top_n, cfg)
        };

        let ctx = ReasonContext {
            student,
            profile: &profile,
            sector: &sector,
            config: cfg,
            fallback,
        };
        let items = into_recommendations(ranked, &ctx);

        info!(
            target: "recommender::rank",
            %id,
            profile = %profile.label,
            sector = ?sector.sector,
            excluded = exclusions.len(),
            emitted = items.len(),
            fallback,
            "recommendation done"
        );

        RecommendationResult {
            student: id,
            profile,
            sector,
            items,
            exclusions,
            fallback,
        }
    }

    /// `recommend` for many students in parallel; output order matches input order.
    pub fn recommend_batch(
        &self,
        students: &[StudentProfile],
        top_n: usize,
    ) -> Vec<RecommendationResult> {
        students
            .par_iter()
            .map(|s| self.recommend(s, top_n))
            .collect()
    }
}

/// Anonymized id for logs and results. Unserializable input hashes as empty.
fn student_id<T: Serialize>(student: &T) -> String {
    match serde_json::to_string(student) {
        Ok(json) => anon_hash(&json),
        Err(e) => {
            warn!(target: "recommender::rank", error = %e, "student not serializable; hashing empty id");
            anon_hash("")
        }
    }
}
