//! Smart Router (4.E): computes the 13 content signals and produces an
//! ordered source list per claim.
//!
//! Grounded on the reference pipeline's per-category scoring-table style in
//! `evidence.rs` (additive signal contributions summed per candidate),
//! adapted here to score *sources* instead of evidence candidates.

use crate::config::Config;
use crate::tokenizer;
use crate::types::{Category, Claim, SourceId};
use std::collections::HashMap;

const MAX_SOURCES: usize = 6;

/// All 13 content signals from §4.E, in a fixed, stable order so routing
/// remains a pure function of claim text and config (§8 invariant 9).
const STRUCTURAL_SIGNALS: [&str; 3] = ["date_present", "number_present", "named_entity_present"];

/// Compute which of the 13 content signals fire for a claim's text.
pub fn compute_signals(claim_text: &str, config: &Config) -> Vec<String> {
    let lower = claim_text.to_lowercase();
    let mut fired = Vec::new();

    for (signal, keywords) in &config.routing_signal_keywords {
        if keywords.iter().any(|kw| lower.contains(kw.as_str())) {
            fired.push(signal.clone());
        }
    }

    if !tokenizer::detect_dates(claim_text).is_empty() {
        fired.push("date_present".to_string());
    }
    if !tokenizer::detect_numbers(claim_text).is_empty() {
        fired.push("number_present".to_string());
    }
    if !tokenizer::detect_entities(claim_text, config).is_empty() {
        fired.push("named_entity_present".to_string());
    }

    fired.sort();
    fired.dedup();
    fired
}

/// Produce the ordered evidence-source id list for a claim: start from the
/// category's default sources, apply per-signal boosts, sort by descending
/// score with a fixed tie-break order, cap at 6, and never drop the
/// category's first default source.
pub fn route(claim: &Claim, config: &Config) -> Vec<SourceId> {
    let default_sources = config
        .category_default_sources
        .get(&claim.category)
        .cloned()
        .unwrap_or_default();
    let always_include = default_sources.first().copied();

    let mut scores: HashMap<SourceId, i32> = HashMap::new();
    for source in &default_sources {
        *scores.entry(*source).or_insert(0) += 1;
    }

    let signals = compute_signals(&claim.text, config);
    for signal in &signals {
        if let Some(boosts) = config.signal_boosts.get(signal) {
            for (source, boost) in boosts {
                *scores.entry(*source).or_insert(0) += boost;
            }
        }
    }

    let mut ranked: Vec<SourceId> = scores.keys().copied().collect();
    ranked.sort_by(|a, b| {
        let score_a = scores[a];
        let score_b = scores[b];
        score_b
            .cmp(&score_a)
            .then_with(|| tie_break_index(a, config).cmp(&tie_break_index(b, config)))
    });

    let mut capped: Vec<SourceId> = ranked.into_iter().take(MAX_SOURCES).collect();

    if let Some(first) = always_include {
        if !capped.contains(&first) {
            capped.pop();
            capped.insert(0, first);
        }
    }

    capped
}

fn tie_break_index(source: &SourceId, config: &Config) -> usize {
    config
        .source_order
        .iter()
        .position(|s| s == source)
        .unwrap_or(usize::MAX)
}

/// All 13 signal names, kept as a constant for reference/tests ensuring
/// the signal catalogue stays at the spec's fixed count.
pub fn all_signal_names(config: &Config) -> Vec<String> {
    let mut names: Vec<String> = config.routing_signal_keywords.keys().cloned().collect();
    names.extend(STRUCTURAL_SIGNALS.iter().map(|s| s.to_string()));
    names.sort();
    names.dedup();
    names
}
