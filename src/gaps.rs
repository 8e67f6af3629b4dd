use std::collections::HashSet;

use tracing::debug;

use crate::models::{Gap, Theme};

pub const MAX_GAPS: usize = 10;
const FALLBACK_GAPS: usize = 5;

type GapStrategy = fn(&[Theme], &[Theme]) -> Vec<Gap>;

/// Tried in order; the first strategy that yields any gap wins.
const STRATEGIES: &[(&str, GapStrategy)] = &[
    ("unmatched_negatives", unmatched_negatives),
    ("overlapping_negatives", overlapping_negatives),
    ("positive_improvements", positive_improvements),
];

pub fn identify_gaps(positive: &[Theme], negative: &[Theme]) -> Vec<Gap> {
    for (name, strategy) in STRATEGIES {
        let mut gaps = strategy(positive, negative);
        if !gaps.is_empty() {
            debug!(strategy = *name, gaps = gaps.len(), "single-app gaps identified");
            gaps.truncate(MAX_GAPS);
            return gaps;
        }
    }
    Vec::new()
}

pub fn complaint_score(count: usize) -> u8 {
    scaled(count, 10.0).min(10)
}

pub fn improvement_score(count: usize) -> u8 {
    scaled(count, 8.0).min(8)
}

fn scaled(count: usize, scale: f64) -> u8 {
    (count as f64 / 3.0 * scale).round().min(u8::MAX as f64) as u8
}

fn complaint(theme: &Theme) -> Gap {
    Gap {
        feature: theme.word.clone(),
        pain_point: format!("complain about \"{}\"", theme.word),
        count: theme.count,
        opportunity_score: complaint_score(theme.count),
        ..Gap::default()
    }
}

pub fn unmatched_negatives(positive: &[Theme], negative: &[Theme]) -> Vec<Gap> {
    let liked: HashSet<&str> = positive.iter().map(|t| t.word.as_str()).collect();
    negative
        .iter()
        .filter(|theme| !liked.contains(theme.word.as_str()))
        .map(complaint)
        .collect()
}

pub fn overlapping_negatives(_positive: &[Theme], negative: &[Theme]) -> Vec<Gap> {
    negative.iter().take(FALLBACK_GAPS).map(complaint).collect()
}

pub fn positive_improvements(positive: &[Theme], negative: &[Theme]) -> Vec<Gap> {
    if !negative.is_empty() {
        return Vec::new();
    }
    positive
        .iter()
        .take(FALLBACK_GAPS)
        .map(|theme| Gap {
            feature: theme.word.clone(),
            pain_point: format!(
                "users like \"{}\" but it could be improved further",
                theme.word
            ),
            count: theme.count,
            opportunity_score: improvement_score(theme.count),
            ..Gap::default()
        })
        .collect()
}
