//! Scorer (4.G): weighted multi-signal evidence scoring plus the
//! SUPPORTED/PARTIAL/UNKNOWN auto-status guardrails.
//!
//! Grounded on the reference pipeline's `claim-extraction/src/evidence.rs`
//! (`EvidenceCollector`'s per-method severity/quality scores, e.g.
//! `run_clippy_analysis`'s weighted error/warning tally) and
//! `claim-extraction/src/verification/verifier.rs`
//! (`MultiModalVerificationEngine`'s additive per-signal checks feeding one
//! verdict); adapted here to the spec's six named signals and fixed weights
//! instead of the reference's dynamically configured signal set.

use crate::config::Config;
use crate::tokenizer;
use crate::types::{Claim, ClaimStatus, EvidenceCandidate, EvidenceType, ScoredEvidence};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;

const WEIGHT_TOKEN_OVERLAP: f64 = 20.0;
const WEIGHT_ENTITY_MATCH: f64 = 20.0;
const WEIGHT_NUMBER_MATCH: f64 = 25.0;
const BONUS_NUMBER_SCALE: f64 = 10.0;
const WEIGHT_KEYPHRASE: f64 = 15.0;
const WEIGHT_EVIDENCE_TYPE: f64 = 10.0;
const WEIGHT_TEMPORAL: f64 = 10.0;
const TEMPORAL_PENALTY_STALE: f64 = -5.0;
const TEMPORAL_FULL_WINDOW_DAYS: i64 = 90;
const TEMPORAL_DECAY_HORIZON_DAYS: i64 = 365 * 3;

const NUMBER_EPSILON_RELATIVE: f64 = 1e-6;

/// Categories where an out-of-date match is treated as actively misleading
/// rather than merely less relevant, per §4.G "time-sensitive categories".
const TIME_SENSITIVE_CATEGORIES: [crate::types::Category; 4] = [
    crate::types::Category::Finance,
    crate::types::Category::Politics,
    crate::types::Category::Military,
    crate::types::Category::EnergyClimate,
];

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "of", "in", "on", "for", "to", "and", "or", "is", "are", "was", "were",
    "be", "been", "by", "at", "with", "as", "that", "this", "it", "its", "from", "than",
];

/// Score one claim/candidate pair and return the persisted evidence record
/// with its breakdown (§4.G "The `breakdown` map is persisted verbatim").
pub fn score(claim: &Claim, candidate: &EvidenceCandidate, config: &Config) -> ScoredEvidence {
    let candidate_text = format!("{} {}", candidate.title, candidate.snippet);

    let token_overlap = token_overlap_signal(&claim.text, &candidate_text);
    let entity_match = entity_match_signal(&claim.text, &candidate_text, config);
    let (number_match, matched_number) = number_match_signal(&claim.text, candidate, &candidate_text);
    let (keyphrase, matched_keyphrase) = keyphrase_signal(&claim.text, &candidate_text);
    let evidence_type_weight = evidence_type_signal(claim, candidate, config);
    let temporal = temporal_signal(claim, candidate);

    let raw_total = token_overlap + entity_match + number_match + keyphrase + evidence_type_weight + temporal;
    let total = raw_total.clamp(0.0, 100.0);

    // §8 invariant 10: the persisted breakdown must sum to the score it
    // explains. The number-match signal's scale bonus can push a strong
    // primary match's raw total past 100, and the temporal penalty alone
    // can push it below 0; rescale every entry by the same factor so the
    // clamp never desyncs breakdown from score.
    let scale = if raw_total != 0.0 { total / raw_total } else { 1.0 };
    let mut breakdown = HashMap::new();
    breakdown.insert("token_overlap".to_string(), token_overlap * scale);
    breakdown.insert("entity_match".to_string(), entity_match * scale);
    breakdown.insert("number_match".to_string(), number_match * scale);
    breakdown.insert("keyphrase_alignment".to_string(), keyphrase * scale);
    breakdown.insert("evidence_type_weight".to_string(), evidence_type_weight * scale);
    breakdown.insert("temporal_alignment".to_string(), temporal * scale);

    ScoredEvidence {
        claim_id: claim.id,
        candidate: candidate.clone(),
        score: total,
        breakdown,
        matched_keyphrase,
        matched_number,
    }
}

fn stem(word: &str) -> String {
    let lower = word.to_lowercase();
    let trimmed = lower.trim_matches(|c: char| !c.is_alphanumeric());
    for suffix in ["ing", "ed", "es", "s"] {
        if trimmed.len() > suffix.len() + 2 {
            if let Some(stripped) = trimmed.strip_suffix(suffix) {
                return stripped.to_string();
            }
        }
    }
    trimmed.to_string()
}

fn stemmed_token_set(text: &str) -> std::collections::HashSet<String> {
    tokenizer::tokenize(text)
        .into_iter()
        .map(|t| stem(t.text))
        .filter(|w| !STOPWORDS.contains(&w.as_str()) && !w.is_empty())
        .collect()
}

/// Jaccard of stop-word-filtered, stemmed token sets (§4.G, weight 20).
fn token_overlap_signal(claim_text: &str, candidate_text: &str) -> f64 {
    let a = stemmed_token_set(claim_text);
    let b = stemmed_token_set(candidate_text);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    WEIGHT_TOKEN_OVERLAP * (intersection as f64 / union as f64)
}

/// Fraction of claim entities appearing case-insensitively in candidate
/// text; 0 if the claim has no entities (§4.G, weight 20).
fn entity_match_signal(claim_text: &str, candidate_text: &str, config: &Config) -> f64 {
    let entities = tokenizer::detect_entities(claim_text, config);
    if entities.is_empty() {
        return 0.0;
    }
    let candidate_lower = candidate_text.to_lowercase();
    let matched = entities
        .iter()
        .filter(|e| candidate_lower.contains(&e.text.to_lowercase()))
        .count();
    WEIGHT_ENTITY_MATCH * (matched as f64 / entities.len() as f64)
}

/// Exact canonical-numeric equality between any claim number and any
/// candidate number, plus a scale-agreement bonus (§4.G, weight 25 total).
///
/// `candidate.numbers` only carries canonical values, so the scale tag for
/// the matched candidate-side number is re-derived from `candidate_text`
/// itself (the same text the other signals already scan) rather than from
/// the already-equal canonical values — two surfaces can parse to the same
/// value (`"1000000"` vs `"1m"`) while disagreeing on scale.
fn number_match_signal(claim_text: &str, candidate: &EvidenceCandidate, candidate_text: &str) -> (f64, Option<f64>) {
    let claim_numbers = tokenizer::detect_numbers(claim_text);
    if claim_numbers.is_empty() || candidate.numbers.is_empty() {
        return (0.0, None);
    }
    let candidate_surfaces = tokenizer::detect_numbers(candidate_text);

    let mut best_match: Option<f64> = None;
    let mut scale_agrees = false;

    for claim_number in &claim_numbers {
        for candidate_value in &candidate.numbers {
            let tolerance = claim_number.value.abs().max(1.0) * NUMBER_EPSILON_RELATIVE;
            if (claim_number.value - candidate_value).abs() <= tolerance {
                best_match = Some(claim_number.value);
                let candidate_scale = candidate_surfaces
                    .iter()
                    .find(|c| (c.value - candidate_value).abs() <= tolerance)
                    .map(|c| c.scale);
                if candidate_scale == Some(claim_number.scale) {
                    scale_agrees = true;
                }
            }
        }
    }

    match best_match {
        Some(value) => {
            let bonus = if scale_agrees { BONUS_NUMBER_SCALE } else { 0.0 };
            (WEIGHT_NUMBER_MATCH + bonus, Some(value))
        }
        None => (0.0, None),
    }
}

/// Longest contiguous word n-gram (n>=3) from the claim appearing verbatim
/// in the candidate text, normalized by claim word count (§4.G, weight 15).
fn keyphrase_signal(claim_text: &str, candidate_text: &str) -> (f64, Option<String>) {
    let claim_words: Vec<String> = claim_text.split_whitespace().map(|w| w.to_lowercase()).collect();
    let candidate_lower = candidate_text.to_lowercase();

    if claim_words.len() < 3 {
        return (0.0, None);
    }

    let mut best_len = 0usize;
    let mut best_phrase: Option<String> = None;

    for start in 0..claim_words.len() {
        for end in (start + 3..=claim_words.len()).rev() {
            if end - start <= best_len {
                break;
            }
            let phrase = claim_words[start..end].join(" ");
            if candidate_lower.contains(&phrase) {
                best_len = end - start;
                best_phrase = Some(phrase);
                break;
            }
        }
    }

    if best_len == 0 {
        return (0.0, None);
    }

    let ratio = best_len as f64 / claim_words.len() as f64;
    (WEIGHT_KEYPHRASE * ratio.min(1.0), best_phrase)
}

/// Per-category evidence-type weight, looked up from static configuration
/// (§4.G, weight 10).
fn evidence_type_signal(claim: &Claim, candidate: &EvidenceCandidate, config: &Config) -> f64 {
    config
        .evidence_type_weights
        .get(&claim.category)
        .and_then(|weights| weights.get(&candidate.evidence_type))
        .copied()
        .unwrap_or(0.0)
        .min(WEIGHT_EVIDENCE_TYPE)
}

/// §4.G "Temporal alignment": compares the claim's own resolved reference
/// date (if any) against the candidate's `published_at`.
fn temporal_signal(claim: &Claim, candidate: &EvidenceCandidate) -> f64 {
    let (Some(claim_date), Some(published_at)) = (resolve_reference_date(&claim.text), candidate.published_at)
    else {
        return 0.0;
    };

    let diff_days = (published_at - claim_date).num_days().abs();

    if diff_days <= TEMPORAL_FULL_WINDOW_DAYS {
        return WEIGHT_TEMPORAL;
    }

    if diff_days <= TEMPORAL_DECAY_HORIZON_DAYS {
        let span = (TEMPORAL_DECAY_HORIZON_DAYS - TEMPORAL_FULL_WINDOW_DAYS) as f64;
        let progress = (diff_days - TEMPORAL_FULL_WINDOW_DAYS) as f64 / span;
        return (WEIGHT_TEMPORAL * (1.0 - progress)).max(0.0);
    }

    if TIME_SENSITIVE_CATEGORIES.contains(&claim.category) {
        TEMPORAL_PENALTY_STALE
    } else {
        0.0
    }
}

/// Resolves the claim's own referenced date (not its extraction timestamp)
/// from the first resolved date marker in its text: ISO dates parse
/// exactly, fiscal quarters map to the first day of the quarter, and bare
/// years fall back to January 1st.
fn resolve_reference_date(claim_text: &str) -> Option<DateTime<Utc>> {
    let dates = tokenizer::detect_dates(claim_text);
    for date in dates.iter().filter(|d| d.resolved) {
        if let Ok(naive) = NaiveDate::parse_from_str(&date.surface, "%Y-%m-%d") {
            return Utc.from_utc_datetime(&naive.and_hms_opt(0, 0, 0)?).into();
        }
        if let Some(resolved) = parse_fiscal_quarter(&date.surface) {
            return Some(resolved);
        }
        if let Ok(year) = date.surface.parse::<i32>() {
            if (1500..=2100).contains(&year) {
                let naive = NaiveDate::from_ymd_opt(year, 1, 1)?;
                return Some(Utc.from_utc_datetime(&naive.and_hms_opt(0, 0, 0)?));
            }
        }
    }
    None
}

fn parse_fiscal_quarter(surface: &str) -> Option<DateTime<Utc>> {
    let upper = surface.to_uppercase();
    let mut parts = upper.split_whitespace();
    let quarter = parts.next()?;
    let year: i32 = parts.next()?.parse().ok()?;
    let month = match quarter {
        "Q1" => 1,
        "Q2" => 4,
        "Q3" => 7,
        "Q4" => 10,
        _ => return None,
    };
    let naive = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(Utc.from_utc_datetime(&naive.and_hms_opt(0, 0, 0)?))
}

/// §4.G "Auto-status guardrails": derives one candidate's verdict from its
/// score and breakdown. Never returns `Contradicted` (§8 invariant 8).
pub fn auto_status(evidence: &ScoredEvidence) -> ClaimStatus {
    let number_match = evidence.breakdown.get("number_match").copied().unwrap_or(0.0);
    let keyphrase = evidence.breakdown.get("keyphrase_alignment").copied().unwrap_or(0.0);
    let entity_match = evidence.breakdown.get("entity_match").copied().unwrap_or(0.0);
    let is_primary = evidence.candidate.evidence_type.is_primary();

    if evidence.score >= 85.0 && is_primary && (number_match > 0.0 || keyphrase > 0.0) {
        return ClaimStatus::Supported;
    }
    if (70.0..85.0).contains(&evidence.score) && entity_match > 0.0 {
        return ClaimStatus::Partial;
    }
    ClaimStatus::Unknown
}

/// A claim's auto-status is the highest-ranked verdict across all of its
/// scored candidates (§4.G, `Supported > Partial > Unknown`); an empty
/// candidate set is `Unknown` with no error (§7 "Scorer degenerate input").
pub fn claim_auto_status(evidence: &[ScoredEvidence]) -> ClaimStatus {
    evidence
        .iter()
        .map(auto_status)
        .max()
        .unwrap_or(ClaimStatus::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, ClaimStatus, ConfidenceLanguage};
    use chrono::Utc as ChronoUtc;
    use uuid::Uuid;

    fn claim(text: &str, category: Category) -> Claim {
        Claim {
            id: Uuid::new_v4(),
            source_id: Uuid::new_v4(),
            text: text.to_string(),
            start_s: 0.0,
            end_s: 1.0,
            content_hash: String::new(),
            global_hash: String::new(),
            confidence_language: ConfidenceLanguage::Definitive,
            category,
            signal_log: vec![],
            status: ClaimStatus::Unknown,
            created_at: ChronoUtc::now(),
        }
    }

    fn candidate(evidence_type: EvidenceType, text: &str, numbers: Vec<f64>) -> EvidenceCandidate {
        EvidenceCandidate {
            source_api: "test".to_string(),
            evidence_type,
            title: text.to_string(),
            snippet: text.to_string(),
            url: "https://example.invalid".to_string(),
            identifier: None,
            published_at: None,
            entities: vec![],
            numbers,
            keyphrases: vec![],
        }
    }

    #[test]
    fn degenerate_empty_candidate_scores_near_zero_and_unknown() {
        let config = Config::embedded_default();
        let c = claim("Alphabet reported revenue of $96.5 billion in Q4 2024.", Category::Finance);
        let cand = candidate(EvidenceType::Secondary, "", vec![]);
        let scored = score(&c, &cand, &config);
        // Only the per-category evidence-type weight survives: an empty
        // snippet carries no textual or numeric signal whatsoever, but a
        // Secondary source is still a plausible (low-weight) fit for Finance.
        assert!(scored.score < 5.0, "score was {}", scored.score);
        assert_eq!(auto_status(&scored), ClaimStatus::Unknown);
    }

    #[test]
    fn strong_primary_match_yields_supported() {
        let config = Config::embedded_default();
        let c = claim("Alphabet reported revenue of $96.5 billion in Q4 2024.", Category::Finance);
        let cand = EvidenceCandidate {
            source_api: "test".to_string(),
            evidence_type: EvidenceType::Filing,
            title: "SEC Filing".to_string(),
            snippet: "Alphabet reported revenue of $96.5 billion in Q4 2024.".to_string(),
            url: "https://example.invalid".to_string(),
            identifier: None,
            published_at: Some(ChronoUtc.with_ymd_and_hms(2024, 10, 15, 0, 0, 0).unwrap()),
            entities: vec![],
            numbers: vec![96_500_000_000.0],
            keyphrases: vec![],
        };
        let scored = score(&c, &cand, &config);
        assert!(scored.score >= 85.0, "score was {}", scored.score);
        assert_eq!(auto_status(&scored), ClaimStatus::Supported);
    }

    #[test]
    fn number_match_requires_exact_canonical_equality() {
        let config = Config::embedded_default();
        let c = claim("Alphabet reported revenue of $96.5 billion in Q4 2024.", Category::Finance);
        let cand = candidate(EvidenceType::Secondary, "unrelated text with no shared terms", vec![1.0]);
        let scored = score(&c, &cand, &config);
        assert_eq!(scored.breakdown["number_match"], 0.0);
        assert!(scored.matched_number.is_none());
    }

    #[test]
    fn claim_status_takes_highest_across_candidates() {
        let unknown = ScoredEvidence {
            claim_id: Uuid::new_v4(),
            candidate: candidate(EvidenceType::Secondary, "x", vec![]),
            score: 10.0,
            breakdown: HashMap::new(),
            matched_keyphrase: None,
            matched_number: None,
        };
        let mut partial_breakdown = HashMap::new();
        partial_breakdown.insert("entity_match".to_string(), 5.0);
        let partial = ScoredEvidence {
            claim_id: unknown.claim_id,
            candidate: candidate(EvidenceType::Secondary, "x", vec![]),
            score: 75.0,
            breakdown: partial_breakdown,
            matched_keyphrase: None,
            matched_number: None,
        };
        assert_eq!(claim_auto_status(&[unknown, partial]), ClaimStatus::Partial);
    }

    #[test]
    fn empty_evidence_list_is_unknown_with_no_error() {
        assert_eq!(claim_auto_status(&[]), ClaimStatus::Unknown);
    }

    #[test]
    fn keyphrase_alignment_finds_longest_contiguous_ngram() {
        let (score, phrase) = keyphrase_signal(
            "Alphabet reported revenue of ninety six billion dollars",
            "coverage noted that alphabet reported revenue of ninety six billion dollars today",
        );
        assert!(score > 0.0);
        assert_eq!(phrase.unwrap(), "alphabet reported revenue of ninety six billion dollars");
    }
}
