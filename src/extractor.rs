//! Claim Extractor (4.B): stitch -> split -> detect -> filter -> classify
//! -> dedup. Pure and deterministic — given identical segments and lexicons
//! the output claim sequence, hashes, signals, and categories are
//! byte-identical (§8 invariant 1).
//!
//! Grounded on the reference pipeline's `decomposition.rs`, which performs
//! an analogous sentence-split -> clause-split -> subject-propagation walk;
//! here the walk is simplified to the spec's exact stitch/split/filter
//! rules rather than clause recombination.

use crate::classifier;
use crate::config::Config;
use crate::dedup::{content_hash, LocalDedupIndex};
use crate::error::ExtractionError;
use crate::tokenizer;
use crate::types::{Claim, ClaimStatus};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

const WINDOW_MIN_CHARS: usize = 80;
const WINDOW_MAX_CHARS: usize = 600;
const SENTENCE_MIN_WORDS: usize = 7;
const SENTENCE_MIN_CHARS: usize = 40;
const SENTENCE_MAX_CHARS: usize = 240;
const TERMINAL_PUNCTUATION: [char; 4] = ['.', '!', '?', ';'];

#[derive(Debug, Clone)]
struct Window {
    text: String,
    start_s: f64,
    end_s: f64,
}

/// Merge segments into windows per §4.B "Segment stitching": concatenate
/// until sentence-terminal punctuation has been seen AND the accumulated
/// character count is >= 80, or the 600-char window cap is reached.
fn stitch_segments(segments: &[crate::types::TimedSegment]) -> Result<Vec<Window>, ExtractionError> {
    if segments.is_empty() {
        return Err(ExtractionError::EmptySegments);
    }

    let mut prev_end: Option<f64> = None;
    for (i, seg) in segments.iter().enumerate() {
        if seg.text.trim().is_empty() {
            return Err(ExtractionError::EmptySegmentText(i));
        }
        if seg.end_s < seg.start_s {
            return Err(ExtractionError::SegmentsOutOfOrder {
                index: i,
                prev_end: seg.start_s,
                start: seg.end_s,
            });
        }
        if let Some(pe) = prev_end {
            if seg.start_s < pe {
                return Err(ExtractionError::SegmentsOutOfOrder {
                    index: i,
                    prev_end: pe,
                    start: seg.start_s,
                });
            }
        }
        prev_end = Some(seg.end_s);
    }

    let mut windows = Vec::new();
    let mut buf = String::new();
    let mut window_start: Option<f64> = None;
    let mut window_end = 0.0;

    for seg in segments {
        if window_start.is_none() {
            window_start = Some(seg.start_s);
        }
        if !buf.is_empty() {
            buf.push(' ');
        }
        buf.push_str(seg.text.trim());
        window_end = seg.end_s;

        let has_terminal = buf.contains(TERMINAL_PUNCTUATION);
        if (has_terminal && buf.len() >= WINDOW_MIN_CHARS) || buf.len() >= WINDOW_MAX_CHARS {
            windows.push(Window {
                text: std::mem::take(&mut buf),
                start_s: window_start.take().unwrap(),
                end_s: window_end,
            });
        }
    }

    if !buf.is_empty() {
        windows.push(Window {
            text: buf,
            start_s: window_start.unwrap(),
            end_s: window_end,
        });
    }

    Ok(windows)
}

/// §4.B "Sentence splitting": split at `.`, `!`, `?`, `;` followed by
/// whitespace + uppercase, or end-of-window; preserve the terminator;
/// guard against abbreviations and lone initials.
fn split_into_sentences(text: &str, config: &Config) -> Vec<String> {
    static WS_UPPER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s+\p{Lu}").unwrap());

    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        if TERMINAL_PUNCTUATION.contains(&chars[i]) {
            if chars[i] == '.' && is_abbreviation_boundary(&chars, i, config) {
                i += 1;
                continue;
            }
            let rest: String = chars[i + 1..].iter().collect();
            let at_window_end = i + 1 >= chars.len();
            let followed_by_upper = WS_UPPER_RE.is_match(&rest);
            if at_window_end || followed_by_upper {
                let sentence: String = chars[start..=i].iter().collect();
                let trimmed = sentence.trim();
                if !trimmed.is_empty() {
                    sentences.push(trimmed.to_string());
                }
                start = i + 1;
            }
        }
        i += 1;
    }

    if start < chars.len() {
        let remainder: String = chars[start..].iter().collect();
        let trimmed = remainder.trim();
        if !trimmed.is_empty() {
            sentences.push(trimmed.to_string());
        }
    }

    sentences
}

/// `true` when the `.` at `pos` is inside a configured abbreviation, or
/// between two single capital letters (a lone-initial run like "U.S.").
fn is_abbreviation_boundary(chars: &[char], pos: usize, config: &Config) -> bool {
    // Lone-initial case: <non-letter-or-start> <upper> '.' <upper>
    let prev_is_single_capital = pos >= 1
        && chars[pos - 1].is_uppercase()
        && (pos < 2 || !chars[pos - 2].is_alphanumeric());
    let next_is_capital = chars.get(pos + 1).map(|c| c.is_uppercase()).unwrap_or(false);
    if prev_is_single_capital && next_is_capital {
        return true;
    }

    // Abbreviation-list case: walk back to the start of the current word
    // (including the '.' itself) and compare against the lexicon.
    let mut word_start = pos;
    while word_start > 0 && (chars[word_start - 1].is_alphanumeric() || chars[word_start - 1] == '.') {
        word_start -= 1;
    }
    let word: String = chars[word_start..=pos].iter().collect();
    let word_lower = word.to_lowercase();
    config.abbreviations.iter().any(|a| *a == word_lower)
}

fn passes_length_gate(sentence: &str) -> bool {
    let words = tokenizer::word_count(sentence);
    let chars = sentence.chars().count();
    (SENTENCE_MIN_WORDS..).contains(&words) && (SENTENCE_MIN_CHARS..=SENTENCE_MAX_CHARS).contains(&chars)
}

struct CandidateSignals {
    signal_log: Vec<String>,
    has_subject_anchor: bool,
}

/// §4.B "Candidate detection": a signal must fire AND a subject-like
/// anchor must be present.
fn detect_candidate(sentence: &str, config: &Config) -> Option<CandidateSignals> {
    let mut signal_log = Vec::new();

    let numbers = tokenizer::detect_numbers(sentence);
    if !numbers.is_empty() {
        signal_log.push("num".to_string());
    }
    let dates = tokenizer::detect_dates(sentence);
    if !dates.is_empty() {
        signal_log.push("date".to_string());
    }
    let entities = tokenizer::detect_entities(sentence, config);
    for e in &entities {
        let tag = if e.is_org { "entity:ORG" } else { "entity:PROPER" };
        if !signal_log.contains(&tag.to_string()) {
            signal_log.push(tag.to_string());
        }
    }
    let verbs = tokenizer::detect_assertion_verbs(sentence, config);
    for v in &verbs {
        signal_log.push(format!("verb:assert={v}"));
    }

    if signal_log.is_empty() {
        return None;
    }

    let sentence_len = sentence.chars().count().max(1);
    let has_proper_noun_anchor = entities
        .iter()
        .any(|e| (e.start as f64) < 0.4 * sentence_len as f64);

    let first_word = sentence
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    let has_pronoun_anchor = config.pronouns_first_third.iter().any(|p| *p == first_word);

    let has_leading_number = numbers.iter().any(|n| n.start == 0)
        || sentence.trim_start().starts_with(|c: char| c.is_ascii_digit())
        || sentence.trim_start().starts_with(['$', '€', '£']);

    let has_subject_anchor = has_proper_noun_anchor || has_pronoun_anchor || has_leading_number;
    if !has_subject_anchor {
        return None;
    }

    if !signal_log.contains(&"anchor:proper".to_string()) && has_proper_noun_anchor {
        signal_log.push("anchor:proper".to_string());
    }

    Some(CandidateSignals {
        signal_log,
        has_subject_anchor: true,
    })
}

/// §4.B "Fragment filtering": leading conjunctions, boilerplate, and
/// bare questions are rejected.
fn passes_fragment_filter(sentence: &str, config: &Config) -> bool {
    let first_word = sentence
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    if config.conjunctions.iter().any(|c| *c == first_word) {
        return false;
    }

    let lower = sentence.to_lowercase();
    if config.boilerplate.iter().any(|b| lower.contains(b.as_str())) {
        return false;
    }

    if sentence.trim_end().ends_with('?') {
        return false;
    }

    true
}

/// Namespace for deriving claim ids; arbitrary but fixed so the same
/// `(source_id, index, content_hash)` always produces the same `Uuid`
/// (§8 invariant 1 — no `Uuid::new_v4` in the pure core).
const CLAIM_ID_NAMESPACE: Uuid = Uuid::from_bytes([
    0x5f, 0x3c, 0x9e, 0x21, 0x7a, 0x4b, 0x4a, 0x8d, 0x9d, 0x02, 0x6e, 0x1a, 0xf3, 0xc4, 0x7b, 0x10,
]);

fn claim_id(source_id: Uuid, index: usize, content_hash: &str) -> Uuid {
    let name = format!("{source_id}:{index}:{content_hash}");
    Uuid::new_v5(&CLAIM_ID_NAMESPACE, name.as_bytes())
}

/// Run the complete 4.B pipeline over one source's ordered segments.
/// Classification (4.C) and local dedup (4.D) are applied inline, as the
/// spec describes them as stages of extraction rather than separate passes.
/// Pure and deterministic: `now` stands in for the wall clock so the caller
/// (the orchestrator) supplies the one non-deterministic value this stage
/// would otherwise need, and the core itself never touches `Uuid::new_v4` or
/// `Utc::now` (§8 invariant 1).
pub fn extract(
    source_id: Uuid,
    segments: &[crate::types::TimedSegment],
    config: &Config,
    now: DateTime<Utc>,
) -> Result<Vec<Claim>, ExtractionError> {
    let windows = stitch_segments(segments)?;
    let mut dedup_index = LocalDedupIndex::new();
    let mut claims = Vec::new();
    let mut index = 0usize;

    for window in &windows {
        let sentences = split_into_sentences(&window.text, config);
        for sentence in sentences {
            if !passes_length_gate(&sentence) {
                continue;
            }
            let Some(candidate) = detect_candidate(&sentence, config) else {
                continue;
            };
            if !passes_fragment_filter(&sentence, config) {
                continue;
            }
            if !dedup_index.admit(&sentence) {
                continue;
            }

            let verbs = tokenizer::detect_assertion_verbs(&sentence, config);
            let confidence_language = classifier::classify_confidence_language(
                &sentence,
                &verbs,
                candidate.has_subject_anchor,
                config,
            );
            let category = classifier::classify_category(&sentence, config);
            let hash = content_hash(&sentence);

            claims.push(Claim {
                id: claim_id(source_id, index, &hash),
                source_id,
                text: sentence.clone(),
                start_s: window.start_s,
                end_s: window.end_s,
                content_hash: hash.clone(),
                global_hash: hash,
                confidence_language,
                category,
                signal_log: candidate.signal_log,
                status: ClaimStatus::Unknown,
                created_at: now,
            });
            index += 1;
        }
    }

    Ok(claims)
}
