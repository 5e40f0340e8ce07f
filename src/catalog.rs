// src/catalog.rs
//! Catalog Store: read-only, name-unique collection of career candidates.
//!
//! Loaded once (env path → `config/catalog.json` → embedded seed) and shared
//! behind an `Arc` by every request; nothing mutates it after construction.

use crate::config::{locate, ENV_CATALOG_PATH};
use crate::profile::{Archetype, InteractionLevel, Level, WorkEnvironment};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::info;

pub const DEFAULT_CATALOG_PATH: &str = "config/catalog.json";
const BUILTIN_CATALOG: &str = include_str!("../config/catalog.json");

/// Static catalog entity, identified by its unique `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerCandidate {
    pub name: String,
    #[serde(default)]
    pub personality_tags: BTreeSet<Archetype>,
    /// Ordered; the first entry is the candidate's main sector.
    #[serde(default)]
    pub sector_tags: Vec<String>,
    /// Subject key (e.g. "matematicas") → required level.
    #[serde(default)]
    pub academic_requirements: BTreeMap<String, Level>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub typical_duration: String,
    #[serde(default)]
    pub modalities: Vec<String>,
    #[serde(default)]
    pub institutions: Vec<String>,
    #[serde(default)]
    pub employment_fields: Vec<String>,
    #[serde(default)]
    pub salary_range: String,
    #[serde(default)]
    pub work_environment_affinity: BTreeSet<WorkEnvironment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_interaction_affinity: Option<InteractionLevel>,
}

impl CareerCandidate {
    /// Minimal candidate; remaining fields empty.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            personality_tags: BTreeSet::new(),
            sector_tags: Vec::new(),
            academic_requirements: BTreeMap::new(),
            description: String::new(),
            typical_duration: String::new(),
            modalities: Vec::new(),
            institutions: Vec::new(),
            employment_fields: Vec::new(),
            salary_range: String::new(),
            work_environment_affinity: BTreeSet::new(),
            social_interaction_affinity: None,
        }
    }

    pub fn with_tags(mut self, tags: &[Archetype]) -> Self {
        self.personality_tags.extend(tags.iter().copied());
        self
    }

    pub fn with_sectors(mut self, sectors: &[&str]) -> Self {
        self.sector_tags.extend(sectors.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_requirement(mut self, subject: &str, level: Level) -> Self {
        self.academic_requirements.insert(subject.to_string(), level);
        self
    }

    /// First sector tag, used for diversity accounting.
    pub fn main_sector(&self) -> Option<&str> {
        self.sector_tags.first().map(String::as_str)
    }

    pub fn has_sector(&self, sector: &str) -> bool {
        self.sector_tags.iter().any(|s| s == sector)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog contains no candidates")]
    Empty,
    #[error("candidate at position {0} has an empty name")]
    BlankName(usize),
    #[error("duplicate candidate name `{0}`")]
    DuplicateCandidate(String),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    careers: Vec<CareerCandidate>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    candidates: Vec<CareerCandidate>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Validate and index a fully materialized collection.
    pub fn from_candidates(candidates: Vec<CareerCandidate>) -> Result<Self, CatalogError> {
        if candidates.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut index = HashMap::with_capacity(candidates.len());
        for (i, c) in candidates.iter().enumerate() {
            if c.name.trim().is_empty() {
                return Err(CatalogError::BlankName(i));
            }
            if index.insert(c.name.clone(), i).is_some() {
                return Err(CatalogError::DuplicateCandidate(c.name.clone()));
            }
        }
        Ok(Self { candidates, index })
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Ok(Self::from_candidates(file.careers)?)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading catalog from {}", path.display()))?;
        let catalog = Self::from_json_str(&content)
            .with_context(|| format!("parsing catalog at {}", path.display()))?;
        info!(target: "recommender::config", path = %path.display(), candidates = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Catalog shipped with the crate.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json_str(BUILTIN_CATALOG).context("parsing built-in catalog")
    }

    /// $RECOMMENDER_CATALOG_PATH → config/catalog.json → built-in.
    pub fn load_default() -> anyhow::Result<Self> {
        match locate(ENV_CATALOG_PATH, DEFAULT_CATALOG_PATH)? {
            Some(path) => Self::from_path(&path),
            None => Self::builtin(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CareerCandidate> {
        self.index.get(name).map(|&i| &self.candidates[i])
    }

    /// Candidates in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &CareerCandidate> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
