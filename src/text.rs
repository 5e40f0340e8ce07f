// src/text.rs
//! Text folding shared by the tagging step and the sector vocabulary.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Lowercase, strip diacritics, turn separators/punctuation into spaces and
/// collapse runs of whitespace. `"Matemáticas,  Física"` → `"matematicas fisica"`.
pub fn fold(input: &str) -> String {
    let stripped: String = input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    let mut out = String::with_capacity(stripped.len());
    let mut last_space = true;
    for ch in stripped.chars() {
        let keep = ch.is_alphanumeric();
        if keep {
            out.push(ch);
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Split list-like survey answers (`"Leer, Dibujar"`) into trimmed, non-empty items.
pub fn split_items<'a, I>(answers: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    answers
        .into_iter()
        .flat_map(|a| a.split([',', ';']))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Short, non-reversible identifier for logs (first 6 bytes of SHA-256, hex).
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_accents_case_and_punctuation() {
        assert_eq!(fold("  Matemáticas,  FÍSICA "), "matematicas fisica");
        assert_eq!(fold("TIC (Tecnologías de la información)"), "tic tecnologias de la informacion");
        assert_eq!(fold("Diseño—Gráfico"), "diseno grafico");
    }

    #[test]
    fn splits_comma_lists() {
        let answers = vec!["Leer, Dibujar".to_string(), " ; Experimentos".to_string()];
        assert_eq!(split_items(&answers), vec!["Leer", "Dibujar", "Experimentos"]);
    }

    #[test]
    fn anon_hash_is_stable_and_short() {
        assert_eq!(anon_hash("ana"), anon_hash("ana"));
        assert_ne!(anon_hash("ana"), anon_hash("ana "));
        assert_eq!(anon_hash("ana").len(), 12);
    }
}
