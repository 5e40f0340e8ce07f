//! # Sector Vocabulary
//!
//! Maps raw declared sectors (survey wording such as
//! "TIC (Tecnologías de la información y la comunicación) y telecomunicaciones")
//! to the canonical sector tags used by the catalog ("Tecnología").
//!
//! - Accent/case-insensitive lookup on folded text.
//! - Fallback order: aliases → canonical match → whole-word substring → fuzzy match → passthrough.
//! - Includes a built-in `default_seed()` with the survey vocabulary.

use crate::text::{fold, split_items};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strsim::normalized_levenshtein;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorVocabulary {
    /// Canonical tags, as written in the catalog.
    #[serde(default)]
    pub canonical: Vec<String>,
    /// Raw wording → canonical tag. Keys are folded on lookup.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    /// Minimum `normalized_levenshtein` similarity for the fuzzy step.
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
}

fn default_fuzzy_threshold() -> f64 {
    0.85
}

impl Default for SectorVocabulary {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl SectorVocabulary {
    /// Canonical tag for a declared sector; unknown wording is passed through trimmed.
    pub fn normalize(&self, raw: &str) -> String {
        let f = fold(raw);
        if f.is_empty() {
            return raw.trim().to_string();
        }

        // 1) Alias, 2) canonical tag written differently (case/accents).
        if let Some(c) = self.exact(&f) {
            return c.clone();
        }

        // 3) Whole-word substring, longest key first.
        let padded = format!(" {f} ");
        let mut best: Option<(usize, &String)> = None;
        let keys = self
            .aliases
            .iter()
            .map(|(k, c)| (fold(k), c))
            .chain(self.canonical.iter().map(|c| (fold(c), c)));
        for (key, canon) in keys {
            if key.is_empty() || !padded.contains(&format!(" {key} ")) {
                continue;
            }
            if best.map_or(true, |(len, _)| key.len() > len) {
                best = Some((key.len(), canon));
            }
        }
        if let Some((_, c)) = best {
            return c.clone();
        }

        // 4) Typos ("Tecnologia" without accent is already handled; "Tecnolgía" is not).
        let mut fuzzy: Option<(f64, &String)> = None;
        for canon in &self.canonical {
            let sim = normalized_levenshtein(&f, &fold(canon));
            if sim >= self.fuzzy_threshold && fuzzy.map_or(true, |(s, _)| sim > s) {
                fuzzy = Some((sim, canon));
            }
        }
        if let Some((_, c)) = fuzzy {
            return c.clone();
        }

        raw.trim().to_string()
    }

    /// Alias or canonical tag equal to already folded text.
    fn exact(&self, folded: &str) -> Option<&String> {
        self.aliases
            .iter()
            .find(|(k, _)| fold(k) == folded)
            .map(|(_, c)| c)
            .or_else(|| self.canonical.iter().find(|c| fold(c) == folded))
    }

    /// Normalize raw survey answers. An answer that is a known option as a whole
    /// keeps its commas ("Distribución y suministro de electricidad, agua y gas");
    /// anything else is split on `,` / `;` first.
    pub fn normalize_answers(&self, answers: &[String]) -> Vec<String> {
        let mut items: Vec<String> = Vec::new();
        for a in answers {
            if self.exact(&fold(a)).is_some() {
                items.push(a.trim().to_string());
            } else {
                items.extend(split_items(std::iter::once(a)));
            }
        }
        self.normalize_all(&items)
    }

    /// Normalize a list, dropping empties and duplicates while keeping declaration order.
    pub fn normalize_all<'a, I>(&self, raw: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut out: Vec<String> = Vec::new();
        for r in raw {
            if r.trim().is_empty() {
                continue;
            }
            let c = self.normalize(r);
            if !out.contains(&c) {
                out.push(c);
            }
        }
        out
    }

    /// Built-in vocabulary covering the survey's sector options.
    pub fn default_seed() -> Self {
        let canonical = [
            "Tecnología",
            "Industrial",
            "Salud",
            "Educativo",
            "Cultural",
            "Investigación",
            "Financiero",
            "Servicios",
            "Comercial",
            "Agropecuario",
            "Logística",
            "Administrativo",
            "Social",
            "Ambiental",
            "Seguridad",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let mut aliases = BTreeMap::new();
        for (a, c) in [
            ("tic", "Tecnología"),
            ("tecnologias de la informacion y la comunicacion", "Tecnología"),
            ("telecomunicaciones", "Tecnología"),
            ("industrial manufacturero", "Industrial"),
            ("manufactura", "Industrial"),
            ("construccion", "Industrial"),
            ("minero y energetico", "Industrial"),
            ("mineria", "Industrial"),
            ("distribucion y suministro de electricidad agua y gas", "Industrial"),
            ("educacion", "Educativo"),
            ("cultural y artistico", "Cultural"),
            ("arte y comunicacion", "Cultural"),
            ("artes y comunicacion", "Cultural"),
            ("artistico", "Cultural"),
            ("cultura", "Cultural"),
            ("investigacion en ciencias basicas y aplicadas", "Investigación"),
            ("ciencias basicas", "Investigación"),
            ("comercio", "Comercial"),
            ("finanzas", "Financiero"),
            ("banca", "Financiero"),
            ("logistica y transporte", "Logística"),
            ("transporte", "Logística"),
            ("hoteleria restaurantes y turismo", "Servicios"),
            ("hoteleria", "Servicios"),
            ("turismo", "Servicios"),
            ("administracion publica", "Administrativo"),
            ("desarrollo humano y social", "Social"),
            ("servicios a la comunidad", "Social"),
            ("servicios a la comunidad recreacion y bienestar", "Social"),
            ("medio ambiente", "Ambiental"),
            ("seguridad y defensa", "Seguridad"),
        ] {
            aliases.insert(a.to_string(), c.to_string());
        }

        Self {
            canonical,
            aliases,
            fuzzy_threshold: default_fuzzy_threshold(),
        }
    }
}
