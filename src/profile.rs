// src/profile.rs
//! Student-side data model.
//!
//! `SurveyAnswers` is the raw, free-text shape a survey front-end produces.
//! `StudentProfile` is the structured record the pipeline consumes: closed
//! `Signal`s, normalized subject sets, numeric averages and declared preferences.
//! The conversion between the two lives in `tagging`.

use crate::text::fold;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Personality archetypes, in tie-break (declaration) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Archetype {
    #[serde(rename = "Técnico", alias = "Tecnico", alias = "Technical")]
    Technical,
    #[serde(rename = "Social")]
    Social,
    #[serde(rename = "Investigador", alias = "Investigative")]
    Investigative,
    #[serde(rename = "Artístico", alias = "Artistico", alias = "Artistic")]
    Artistic,
    #[serde(rename = "Organizador", alias = "Organizer")]
    Organizer,
    #[serde(rename = "Líder", alias = "Lider", alias = "Leader")]
    Leader,
}

impl Archetype {
    pub const ALL: [Archetype; 6] = [
        Archetype::Technical,
        Archetype::Social,
        Archetype::Investigative,
        Archetype::Artistic,
        Archetype::Organizer,
        Archetype::Leader,
    ];

    /// Catalog-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Archetype::Technical => "Técnico",
            Archetype::Social => "Social",
            Archetype::Investigative => "Investigador",
            Archetype::Artistic => "Artístico",
            Archetype::Organizer => "Organizador",
            Archetype::Leader => "Líder",
        }
    }

    /// Parse a classifier or catalog label (accent/case-insensitive, Spanish or English).
    pub fn from_label(raw: &str) -> Option<Self> {
        match fold(raw).as_str() {
            "tecnico" | "technical" => Some(Archetype::Technical),
            "social" => Some(Archetype::Social),
            "investigador" | "investigative" => Some(Archetype::Investigative),
            "artistico" | "artistic" => Some(Archetype::Artistic),
            "organizador" | "organizer" => Some(Archetype::Organizer),
            "lider" | "leader" => Some(Archetype::Leader),
            _ => None,
        }
    }
}

impl std::fmt::Display for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// School subjects known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Mathematics,
    Physics,
    BiologyChemistry,
    /// General sciences requirement; graded from physics and biology/chemistry when absent.
    Sciences,
    SocialSciences,
    Language,
    Economics,
    Arts,
    PhysicalEducation,
    Philosophy,
}

impl Subject {
    /// Map a raw subject name (survey answer or catalog requirement key) to a subject.
    pub fn from_alias(raw: &str) -> Option<Self> {
        let f = fold(raw);
        let s = f.as_str();
        let subject = match s {
            "matematicas" | "matematica" | "mathematics" | "math" | "numeros" | "calculo"
            | "algebra" | "geometria" | "estadistica" => Subject::Mathematics,
            "fisica" | "physics" => Subject::Physics,
            "biologia y quimica" | "biologia" | "quimica" | "ciencias naturales"
            | "biology chemistry" | "biology" | "chemistry" => Subject::BiologyChemistry,
            "ciencias" | "sciences" => Subject::Sciences,
            "ciencias sociales" | "sociales" | "historia" | "social sciences" => {
                Subject::SocialSciences
            }
            "lengua castellana" | "espanol" | "castellano" | "lenguaje" | "language" => {
                Subject::Language
            }
            "ciencias economicas" | "economia" | "economics" => Subject::Economics,
            "educacion artistica" | "artes" | "arte" | "artistica" | "arts" => Subject::Arts,
            "educacion fisica" | "deportes" | "physical education" => Subject::PhysicalEducation,
            "filosofia" | "philosophy" => Subject::Philosophy,
            _ => return None,
        };
        Some(subject)
    }
}

/// Declared or required level on a three-step scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[serde(alias = "Bajo", alias = "bajo", alias = "Low")]
    Low,
    #[serde(alias = "Medio", alias = "medio", alias = "Medium")]
    Medium,
    #[serde(alias = "Alto", alias = "alto", alias = "High")]
    High,
}

impl Level {
    /// Performance bucket of a 0–5 grade.
    pub fn from_grade(grade: f32) -> Self {
        if grade >= 4.0 {
            Level::High
        } else if grade >= 3.0 {
            Level::Medium
        } else {
            Level::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkEnvironment {
    Office,
    Outdoor,
    Remote,
}

impl WorkEnvironment {
    pub fn from_answer(raw: &str) -> Option<Self> {
        let f = fold(raw);
        if f.contains("remot") || f.contains("casa") || f.contains("home") {
            Some(WorkEnvironment::Remote)
        } else if f.contains("exterior") || f.contains("aire libre") || f.contains("campo")
            || f.contains("outdoor")
        {
            Some(WorkEnvironment::Outdoor)
        } else if f.contains("oficina") || f.contains("office") {
            Some(WorkEnvironment::Office)
        } else {
            None
        }
    }
}

/// Desired amount of interaction with other people.
pub type InteractionLevel = Level;

/// Parse "Baja" / "Media" / "Alta" (and English equivalents).
pub fn interaction_from_answer(raw: &str) -> Option<InteractionLevel> {
    let f = fold(raw);
    if f.starts_with("baj") || f.starts_with("low") || f.contains("poca") {
        Some(Level::Low)
    } else if f.starts_with("alt") || f.starts_with("high") || f.contains("mucha") {
        Some(Level::High)
    } else if f.starts_with("medi") {
        Some(Level::Medium)
    } else {
        None
    }
}

/// How well declared likes line up with declared strengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coherence {
    #[default]
    Low,
    Medium,
    High,
}

impl Coherence {
    pub fn from_label(raw: &str) -> Option<Self> {
        match fold(raw).as_str() {
            "muy coherente" | "high" | "alta" => Some(Coherence::High),
            "coherente" | "medium" | "media" => Some(Coherence::Medium),
            "poco coherente" | "low" | "baja" => Some(Coherence::Low),
            _ => None,
        }
    }

    /// Share of favorite subjects that are also strong subjects.
    pub fn from_overlap(favorites: &BTreeSet<Subject>, strong: &BTreeSet<Subject>) -> Self {
        if favorites.is_empty() {
            return Coherence::Low;
        }
        let shared = favorites.intersection(strong).count() as f32;
        let ratio = shared / favorites.len() as f32;
        if ratio >= 0.7 {
            Coherence::High
        } else if ratio >= 0.4 {
            Coherence::Medium
        } else {
            Coherence::Low
        }
    }
}

/// Closed set of structured facts about a student.
///
/// Text-derived variants are produced by the tagging step and stored on the
/// profile; the preference and subject variants are derived on demand by
/// [`StudentProfile::has`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    // leisure
    BuildsThings,
    ArtisticActivities,
    ChatsWithFriends,
    Experiments,
    TidiesSpace,
    Reading,
    Solitary,
    TeamActivities,
    Sports,
    Designing,
    // self-description
    Skilled,
    Imaginative,
    Sociable,
    Curious,
    Organized,
    Leader,
    Decisive,
    Reserved,
    Introverted,
    Independent,
    Empathetic,
    Communicative,
    Extroverted,
    Creative,
    Logical,
    Follower,
    // future-work narrative
    Teaching,
    Helping,
    DataWork,
    Creating,
    Technology,
    Justice,
    Management,
    ArtWork,
    Research,
    // declared preferences
    LowInteraction,
    MediumInteraction,
    HighInteraction,
    OfficeWork,
    OutdoorWork,
    RemoteWork,
    DeclaredSectors,
    // subject sets
    Likes(Subject),
    Dislikes(Subject),
    Strong(Subject),
    Weak(Subject),
}

/// Immutable per-request student record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentProfile {
    pub name: Option<String>,
    /// Text-derived signals (leisure, self-description, future work).
    pub signals: BTreeSet<Signal>,
    pub favorite_subjects: BTreeSet<Subject>,
    pub disliked_subjects: BTreeSet<Subject>,
    pub strong_subjects: BTreeSet<Subject>,
    pub weak_subjects: BTreeSet<Subject>,
    /// Canonical sector tags in declaration order.
    pub declared_sectors: Vec<String>,
    pub work_environment: Option<WorkEnvironment>,
    pub social_interaction: Option<InteractionLevel>,
    /// Per-subject averages on a 0–5 scale.
    pub averages: BTreeMap<Subject, f32>,
    pub general_average: Option<f32>,
    pub coherence: Coherence,
}

impl StudentProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signals.insert(signal);
        self
    }

    pub fn with_favorite(mut self, subject: Subject) -> Self {
        self.favorite_subjects.insert(subject);
        self
    }

    pub fn with_disliked(mut self, subject: Subject) -> Self {
        self.disliked_subjects.insert(subject);
        self
    }

    pub fn with_strong(mut self, subject: Subject) -> Self {
        self.strong_subjects.insert(subject);
        self
    }

    pub fn with_weak(mut self, subject: Subject) -> Self {
        self.weak_subjects.insert(subject);
        self
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        let sector = sector.into();
        if !self.declared_sectors.contains(&sector) {
            self.declared_sectors.push(sector);
        }
        self
    }

    pub fn with_environment(mut self, env: WorkEnvironment) -> Self {
        self.work_environment = Some(env);
        self
    }

    pub fn with_interaction(mut self, level: InteractionLevel) -> Self {
        self.social_interaction = Some(level);
        self
    }

    pub fn with_average(mut self, subject: Subject, grade: f32) -> Self {
        self.averages.insert(subject, grade.clamp(0.0, 5.0));
        self
    }

    pub fn with_coherence(mut self, coherence: Coherence) -> Self {
        self.coherence = coherence;
        self
    }

    /// Whether the student carries `signal`, including derived preference/subject signals.
    pub fn has(&self, signal: Signal) -> bool {
        match signal {
            Signal::Likes(s) => self.favorite_subjects.contains(&s),
            Signal::Dislikes(s) => self.disliked_subjects.contains(&s),
            Signal::Strong(s) => self.strong_subjects.contains(&s),
            Signal::Weak(s) => self.weak_subjects.contains(&s),
            Signal::LowInteraction => self.social_interaction == Some(Level::Low),
            Signal::MediumInteraction => self.social_interaction == Some(Level::Medium),
            Signal::HighInteraction => self.social_interaction == Some(Level::High),
            Signal::OfficeWork => self.work_environment == Some(WorkEnvironment::Office),
            Signal::OutdoorWork => self.work_environment == Some(WorkEnvironment::Outdoor),
            Signal::RemoteWork => self.work_environment == Some(WorkEnvironment::Remote),
            Signal::DeclaredSectors => !self.declared_sectors.is_empty(),
            other => self.signals.contains(&other),
        }
    }

    /// Number of `signals` the student carries.
    pub fn count(&self, signals: &[Signal]) -> usize {
        signals.iter().filter(|s| self.has(**s)).count()
    }

    /// Average for `subject`. General sciences fall back to the mean of physics
    /// and biology/chemistry.
    pub fn average(&self, subject: Subject) -> Option<f32> {
        if let Some(&g) = self.averages.get(&subject) {
            return Some(g);
        }
        if subject == Subject::Sciences {
            let parts: Vec<f32> = [Subject::Physics, Subject::BiologyChemistry]
                .iter()
                .filter_map(|s| self.averages.get(s).copied())
                .collect();
            if !parts.is_empty() {
                return Some(parts.iter().sum::<f32>() / parts.len() as f32);
            }
        }
        None
    }

    /// Explicit general average, else the mean of all subject averages.
    pub fn general_average(&self) -> Option<f32> {
        if self.general_average.is_some() {
            return self.general_average;
        }
        if self.averages.is_empty() {
            return None;
        }
        Some(self.averages.values().sum::<f32>() / self.averages.len() as f32)
    }
}

/// Raw survey answers, as produced by a form front-end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyAnswers {
    pub name: Option<String>,
    pub free_time: Vec<String>,
    pub self_description: Vec<String>,
    /// "In ten years I see myself…", main topic of interest, work focus.
    pub future_work: Vec<String>,
    pub favorite_subjects: Vec<String>,
    pub disliked_subjects: Vec<String>,
    pub strong_subjects: Vec<String>,
    pub weak_subjects: Vec<String>,
    pub sectors: Vec<String>,
    pub work_environment: Option<String>,
    pub social_interaction: Option<String>,
    /// Subject name → 0–5 average.
    pub averages: BTreeMap<String, f32>,
    pub general_average: Option<f32>,
    pub coherence: Option<String>,
}
