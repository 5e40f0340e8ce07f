//! Human-readable rendering of a `RecommendationResult`. Pure formatting, no I/O.

use crate::recommendation::{Recommendation, RecommendationResult};
use std::fmt::Write as _;

const MAX_INSTITUTIONS: usize = 3;

pub fn render(result: &RecommendationResult) -> String {
    let mut out = String::new();
    let p = &result.profile;
    let s = &result.sector;

    let _ = writeln!(out, "CAREER RECOMMENDATIONS");
    let _ = writeln!(out, "======================");
    let _ = writeln!(
        out,
        "Profile: {} ({:.0}% confidence). {}",
        p.label,
        p.confidence * 100.0,
        p.justification
    );
    match &s.sector {
        Some(sector) => {
            let _ = writeln!(
                out,
                "Sector: {} ({:.0}% confidence). {}",
                sector,
                s.confidence * 100.0,
                s.justification
            );
        }
        None => {
            let _ = writeln!(out, "Sector: not determined. {}", s.justification);
        }
    }
    if result.fallback {
        let _ = writeln!(
            out,
            "Note: every career conflicted with some answer; showing the closest matches anyway."
        );
    }
    if !result.exclusions.is_empty() {
        let _ = writeln!(out, "Ruled out: {} career(s).", result.exclusions.len());
    }

    if result.items.is_empty() {
        let _ = writeln!(out, "\nNo recommendations available.");
        return out;
    }
    for item in &result.items {
        out.push('\n');
        render_item(&mut out, item);
    }
    out
}

fn render_item(out: &mut String, item: &Recommendation) {
    let c = &item.candidate;
    let _ = writeln!(
        out,
        "{}. {} ({:.0}% match)",
        item.rank,
        c.name,
        item.final_score * 100.0
    );
    if !c.description.is_empty() {
        let _ = writeln!(out, "   {}", c.description);
    }
    if !c.typical_duration.is_empty() {
        let _ = writeln!(out, "   Duration: {}", c.typical_duration);
    }
    if !c.modalities.is_empty() {
        let _ = writeln!(out, "   Modalities: {}", c.modalities.join(", "));
    }
    if !c.institutions.is_empty() {
        let top: Vec<&str> = c
            .institutions
            .iter()
            .take(MAX_INSTITUTIONS)
            .map(String::as_str)
            .collect();
        let _ = writeln!(out, "   Institutions: {}", top.join(", "));
    }
    if !c.employment_fields.is_empty() {
        let _ = writeln!(out, "   Employment: {}", c.employment_fields.join(", "));
    }
    if !c.salary_range.is_empty() {
        let _ = writeln!(out, "   Salary range: {}", c.salary_range);
    }
    if !item.reasons.is_empty() {
        let _ = writeln!(out, "   Why:");
        for r in &item.reasons {
            let _ = writeln!(out, "   - {}", r.message);
        }
    }
}
