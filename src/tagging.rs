// src/tagging.rs
//! Tagging step: raw survey answers → structured `StudentProfile`.
//!
//! This is the only module that looks at free text. Patterns come from a TOML
//! table (`config/tagging.toml`, embedded as the default) and are compiled once;
//! each pattern maps one answer field to one closed `Signal`.

use crate::config::{locate, ENV_TAGGING_PATH};
use crate::profile::{
    interaction_from_answer, Coherence, Signal, StudentProfile, Subject, SurveyAnswers,
    WorkEnvironment,
};
use crate::sectors::SectorVocabulary;
use crate::text::{fold, split_items};
use anyhow::Context;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_TAGGING_PATH: &str = "config/tagging.toml";
const BUILTIN_TAGGING: &str = include_str!("../config/tagging.toml");

/// Which survey answer a pattern reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerField {
    Leisure,
    SelfDescription,
    FutureWork,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatternCfg {
    pub field: AnswerField,
    pub signal: Signal,
    pub pattern: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaggingRoot {
    #[serde(default)]
    pub patterns: Vec<PatternCfg>,
}

#[derive(Debug)]
struct CompiledPattern {
    field: AnswerField,
    signal: Signal,
    re: Regex,
}

#[derive(Debug)]
pub struct Tagger {
    patterns: Vec<CompiledPattern>,
}

impl Tagger {
    /// Load from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let cfg: TaggingRoot = toml::from_str(toml_str)?;
        let patterns = cfg
            .patterns
            .into_iter()
            .map(|p| {
                if is_derived(p.signal) {
                    anyhow::bail!(
                        "pattern for `{:?}` targets a signal derived from structured answers",
                        p.signal
                    );
                }
                let re = Regex::new(&p.pattern)
                    .map_err(|e| anyhow::anyhow!("pattern `{:?}` regex error: {}", p.signal, e))?;
                Ok(CompiledPattern {
                    field: p.field,
                    signal: p.signal,
                    re,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading tagging patterns from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing tagging patterns at {}", path.display()))
    }

    /// Patterns shipped with the crate.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_toml_str(BUILTIN_TAGGING).context("parsing built-in tagging patterns")
    }

    /// $RECOMMENDER_TAGGING_PATH → config/tagging.toml → built-in.
    pub fn load_default() -> anyhow::Result<Self> {
        match locate(ENV_TAGGING_PATH, DEFAULT_TAGGING_PATH)? {
            Some(path) => Self::from_path(&path),
            None => Self::builtin(),
        }
    }

    /// Signals found in `answers` for one field.
    pub fn tag<'a, I>(&self, field: AnswerField, answers: I) -> BTreeSet<Signal>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let texts: Vec<String> = answers.into_iter().map(|a| fold(a)).collect();
        self.patterns
            .iter()
            .filter(|p| p.field == field)
            .filter(|p| texts.iter().any(|t| p.re.is_match(t)))
            .map(|p| p.signal)
            .collect()
    }

    /// Build the immutable profile for one request.
    pub fn profile(&self, answers: &SurveyAnswers, sectors: &SectorVocabulary) -> StudentProfile {
        let mut signals = self.tag(AnswerField::Leisure, &answers.free_time);
        signals.extend(self.tag(AnswerField::SelfDescription, &answers.self_description));
        signals.extend(self.tag(AnswerField::FutureWork, &answers.future_work));

        let favorite_subjects = subjects(&answers.favorite_subjects);
        let strong_subjects = subjects(&answers.strong_subjects);

        let coherence = answers
            .coherence
            .as_deref()
            .and_then(Coherence::from_label)
            .unwrap_or_else(|| Coherence::from_overlap(&favorite_subjects, &strong_subjects));

        let mut averages: BTreeMap<Subject, f32> = BTreeMap::new();
        for (raw, grade) in &answers.averages {
            match Subject::from_alias(raw) {
                Some(s) if grade.is_finite() => {
                    averages.insert(s, grade.clamp(0.0, 5.0));
                }
                _ => debug!(target: "recommender::tagging", subject = %raw, "ignoring average"),
            }
        }

        StudentProfile {
            name: answers.name.clone(),
            signals,
            favorite_subjects,
            disliked_subjects: subjects(&answers.disliked_subjects),
            strong_subjects,
            weak_subjects: subjects(&answers.weak_subjects),
            declared_sectors: sectors.normalize_answers(&answers.sectors),
            work_environment: answers
                .work_environment
                .as_deref()
                .and_then(WorkEnvironment::from_answer),
            social_interaction: answers
                .social_interaction
                .as_deref()
                .and_then(interaction_from_answer),
            averages,
            general_average: answers
                .general_average
                .filter(|g| g.is_finite())
                .map(|g| g.clamp(0.0, 5.0)),
            coherence,
        }
    }
}

fn subjects(raw: &[String]) -> BTreeSet<Subject> {
    split_items(raw)
        .iter()
        .filter_map(|s| Subject::from_alias(s))
        .collect()
}

/// Signals computed from structured answers rather than free text.
fn is_derived(signal: Signal) -> bool {
    matches!(
        signal,
        Signal::Likes(_)
            | Signal::Dislikes(_)
            | Signal::Strong(_)
            | Signal::Weak(_)
            | Signal::LowInteraction
            | Signal::MediumInteraction
            | Signal::HighInteraction
            | Signal::OfficeWork
            | Signal::OutdoorWork
            | Signal::RemoteWork
            | Signal::DeclaredSectors
    )
}
