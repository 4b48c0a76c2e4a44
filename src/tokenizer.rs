//! Tokenizer & Signal Detectors (4.A).
//!
//! Pure functions over text: word tokenization plus number/date/entity/
//! assertion-verb detection. Case- and whitespace-normalized, locale-
//! agnostic (English), fully deterministic — no ML, no network, no clock.
//! Grounded on the reference pipeline's keyword/regex matching utilities
//! (`verification/keyword_matcher.rs`) and static-lexicon entity detection
//! (`disambiguation/entities.rs`), adapted from fuzzy NLP heuristics to the
//! exact rule set this spec requires.

use crate::config::Config;
use once_cell::sync::Lazy;
use regex::Regex;

/// A single word token with its original byte offsets, preserved so
/// detectors can report spans without re-scanning the source string.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Split on Unicode word boundaries, preserving original offsets.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}\p{N}][\p{L}\p{N}'.-]*").unwrap());
    WORD_RE
        .find_iter(text)
        .map(|m| Token {
            text: m.as_str(),
            start: m.start(),
            end: m.end(),
        })
        .collect()
}

/// Count of whitespace-separated words, used by the length gate (§4.B).
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberMatch {
    pub surface: String,
    pub value: f64,
    pub start: usize,
    pub end: usize,
    /// Scale tag the surface text itself carries ("percent", "trillion",
    /// ..., "bare"), independent of `value`'s magnitude. Two numbers can be
    /// numerically equal (`1000000` vs `"1m"`) while disagreeing on scale.
    pub scale: &'static str,
}

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[$€£]?\d{1,3}(?:,\d{3})+(?:\.\d+)?\s?(?:%|percent|k|m|b|bn|mm|trillion|billion|million|thousand)?|[$€£]?\d+(?:\.\d+)?\s?(?:%|percent|k|m|b|bn|mm|trillion|billion|million|thousand)?",
    )
    .unwrap()
});

/// Matches integer, decimal, percentage, currency-prefixed, suffix-scaled
/// (`k, m, b, trillion`), and comma-grouped numeric forms. Returns the
/// canonical numeric value alongside the matched surface text.
pub fn detect_numbers(text: &str) -> Vec<NumberMatch> {
    let mut out = Vec::new();
    for m in NUMBER_RE.find_iter(text) {
        let surface = m.as_str();
        // Reject bare punctuation / empty digit runs the regex can still match.
        if !surface.chars().any(|c| c.is_ascii_digit()) {
            continue;
        }
        if let Some((value, scale)) = numeric_value_and_scale(surface) {
            out.push(NumberMatch {
                surface: surface.to_string(),
                value,
                start: m.start(),
                end: m.end(),
                scale,
            });
        }
    }
    out
}

/// Parses a number's canonical value and the scale tag its surface text
/// carries. Two surfaces can parse to the same `value` (`"1000000"` vs
/// `"1m"`) while tagging different scales — callers that need to tell
/// those apart (the scorer's scale-agreement bonus) use the tag, not a
/// re-derived order of magnitude.
fn numeric_value_and_scale(surface: &str) -> Option<(f64, &'static str)> {
    let lower = surface.trim().to_lowercase();
    let lower = lower.trim_start_matches(['$', '€', '£']);
    let (numeric_part, multiplier, scale) = if let Some(stripped) = lower.strip_suffix('%') {
        (stripped.trim(), 1.0, "percent")
    } else if let Some(stripped) = lower.strip_suffix("percent") {
        (stripped.trim(), 1.0, "percent")
    } else if let Some(stripped) = lower.strip_suffix("trillion") {
        (stripped.trim(), 1_000_000_000_000.0, "trillion")
    } else if let Some(stripped) = lower.strip_suffix("billion") {
        (stripped.trim(), 1_000_000_000.0, "billion")
    } else if let Some(stripped) = lower.strip_suffix("million") {
        (stripped.trim(), 1_000_000.0, "million")
    } else if let Some(stripped) = lower.strip_suffix("thousand") {
        (stripped.trim(), 1_000.0, "thousand")
    } else if let Some(stripped) = lower.strip_suffix("bn") {
        (stripped.trim(), 1_000_000_000.0, "billion")
    } else if let Some(stripped) = lower.strip_suffix("mm") {
        (stripped.trim(), 1_000_000.0, "million")
    } else if let Some(stripped) = lower.strip_suffix('b') {
        (stripped.trim(), 1_000_000_000.0, "billion")
    } else if let Some(stripped) = lower.strip_suffix('m') {
        (stripped.trim(), 1_000_000.0, "million")
    } else if let Some(stripped) = lower.strip_suffix('k') {
        (stripped.trim(), 1_000.0, "thousand")
    } else {
        (lower.as_str(), 1.0, "bare")
    };

    let cleaned: String = numeric_part.chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().map(|v| (v * multiplier, scale))
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateMatch {
    pub surface: String,
    pub start: usize,
    pub end: usize,
    pub resolved: bool,
}

static ISO_DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap());
static MONTH_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2}(?:st|nd|rd|th)?(?:,\s*\d{4})?\b").unwrap()
});
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(1[5-9]\d{2}|20\d{2}|21\d{2})\b").unwrap());
static FISCAL_QUARTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bQ[1-4]\s+\d{4}\b").unwrap());
static RELATIVE_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(last|next|this)\s+(quarter|year|month|week)\b").unwrap());

/// Matches ISO dates, `Month DD[, YYYY]`, bare 4-digit years in [1500,
/// 2100], fiscal quarters (`Q1 2024`), and relative forms (`last quarter`)
/// as unresolved markers.
pub fn detect_dates(text: &str) -> Vec<DateMatch> {
    let mut out = Vec::new();
    let mut covered: Vec<(usize, usize)> = Vec::new();

    for m in ISO_DATE_RE.find_iter(text) {
        out.push(DateMatch {
            surface: m.as_str().to_string(),
            start: m.start(),
            end: m.end(),
            resolved: true,
        });
        covered.push((m.start(), m.end()));
    }
    for m in FISCAL_QUARTER_RE.find_iter(text) {
        out.push(DateMatch {
            surface: m.as_str().to_string(),
            start: m.start(),
            end: m.end(),
            resolved: true,
        });
        covered.push((m.start(), m.end()));
    }
    for m in MONTH_DATE_RE.find_iter(text) {
        out.push(DateMatch {
            surface: m.as_str().to_string(),
            start: m.start(),
            end: m.end(),
            resolved: true,
        });
        covered.push((m.start(), m.end()));
    }
    for m in YEAR_RE.find_iter(text) {
        if covered.iter().any(|(s, e)| m.start() >= *s && m.end() <= *e) {
            continue;
        }
        out.push(DateMatch {
            surface: m.as_str().to_string(),
            start: m.start(),
            end: m.end(),
            resolved: true,
        });
    }
    for m in RELATIVE_DATE_RE.find_iter(text) {
        out.push(DateMatch {
            surface: m.as_str().to_string(),
            start: m.start(),
            end: m.end(),
            resolved: false,
        });
    }

    out.sort_by_key(|d| d.start);
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityMatch {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub is_org: bool,
}

/// Rule-based proper-noun detection: runs of capitalized tokens not at
/// sentence start, plus a static list of organization suffixes and a
/// known-entity allow-list. No ML.
pub fn detect_entities(text: &str, config: &Config) -> Vec<EntityMatch> {
    let tokens = tokenize(text);
    let mut out = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let tok = &tokens[i];
        let is_capitalized = tok
            .text
            .chars()
            .next()
            .map(|c| c.is_uppercase())
            .unwrap_or(false);
        let at_sentence_start = i == 0;

        if is_capitalized && !at_sentence_start {
            let mut j = i + 1;
            while j < tokens.len()
                && tokens[j]
                    .text
                    .chars()
                    .next()
                    .map(|c| c.is_uppercase())
                    .unwrap_or(false)
            {
                j += 1;
            }
            let start = tok.start;
            let end = tokens[j - 1].end;
            let surface = &text[start..end];
            let is_org = config
                .org_suffixes
                .iter()
                .any(|suffix| surface.to_lowercase().ends_with(&suffix.to_lowercase()));
            out.push(EntityMatch {
                text: surface.to_string(),
                start,
                end,
                is_org,
            });
            i = j;
            continue;
        }
        i += 1;
    }

    // Known-entity allow-list: catches lowercase-at-start-of-sentence cases
    // the capitalization scan above structurally excludes, e.g. "fed".
    let lower_text = text.to_lowercase();
    for known in &config.known_entities {
        if let Some(pos) = lower_text.find(known.as_str()) {
            let already_found = out.iter().any(|e| e.start <= pos && pos < e.end);
            if !already_found {
                out.push(EntityMatch {
                    text: text[pos..pos + known.len()].to_string(),
                    start: pos,
                    end: pos + known.len(),
                    is_org: true,
                });
            }
        }
    }

    out.sort_by_key(|e| e.start);
    out
}

/// Static lexicon scan for present/past tense assertive verbs.
pub fn detect_assertion_verbs(text: &str, config: &Config) -> Vec<String> {
    let tokens = tokenize(text);
    let mut found = Vec::new();
    for tok in &tokens {
        let lower = tok.text.to_lowercase();
        if config.assertion_verbs.iter().any(|v| *v == lower) && !found.contains(&lower) {
            found.push(lower);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_preserving_offsets() {
        let toks = tokenize("Alphabet reported revenue.");
        assert_eq!(toks[0].text, "Alphabet");
        assert_eq!(toks[0].start, 0);
    }

    #[test]
    fn detects_currency_suffix_scaled_numbers() {
        let nums = detect_numbers("Alphabet reported revenue of $96.5 billion in Q4 2024.");
        assert!(nums.iter().any(|n| (n.value - 96_500_000_000.0).abs() < 1.0));
    }

    #[test]
    fn detects_percentage() {
        let nums = detect_numbers("LDL cholesterol rose 2.8%.");
        assert!(nums.iter().any(|n| (n.value - 2.8).abs() < 0.001));
    }

    #[test]
    fn detects_fiscal_quarter_and_iso_date() {
        let dates = detect_dates("Reported in Q4 2024 and again on 2024-01-05.");
        assert!(dates.iter().any(|d| d.surface.eq_ignore_ascii_case("Q4 2024")));
        assert!(dates.iter().any(|d| d.surface == "2024-01-05"));
    }

    #[test]
    fn bare_year_out_of_range_is_not_matched() {
        let dates = detect_dates("The score was 3000 to nothing.");
        assert!(dates.is_empty());
    }

    #[test]
    fn relative_dates_are_unresolved() {
        let dates = detect_dates("Revenue grew last quarter compared to this year.");
        assert!(dates.iter().all(|d| !d.resolved));
        assert_eq!(dates.len(), 2);
    }

    #[test]
    fn detects_org_suffixed_entity_not_at_sentence_start() {
        let config = Config::embedded_default();
        let entities = detect_entities("Shares of Acme Corp rose sharply.", &config);
        assert!(entities.iter().any(|e| e.text.contains("Acme Corp")));
    }

    #[test]
    fn known_entity_allow_list_matches_lowercase() {
        let config = Config::embedded_default();
        let entities = detect_entities("The fed raised interest rates.", &config);
        assert!(entities.iter().any(|e| e.text == "fed"));
    }

    #[test]
    fn detects_assertion_verbs() {
        let config = Config::embedded_default();
        let verbs = detect_assertion_verbs("Alphabet reported revenue and announced layoffs.", &config);
        assert!(verbs.contains(&"reported".to_string()));
        assert!(verbs.contains(&"announced".to_string()));
    }
}
