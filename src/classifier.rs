//! Classifier (4.C): confidence-language tagging and category assignment.
//!
//! Keyword-bag scoring over a fixed priority order, grounded on the
//! reference pipeline's `qualification.rs` verifiability-detection style
//! (static markers scanned over the sentence, no statistical modeling).

use crate::config::Config;
use crate::types::{Category, ConfidenceLanguage, CATEGORY_PRIORITY};

/// Scan for hedge markers first; otherwise an assertion verb with a
/// definite subject (approximated here as a detected entity or leading
/// pronoun ahead of the verb) yields `definitive`; otherwise `unknown`.
pub fn classify_confidence_language(
    text: &str,
    assertion_verbs_found: &[String],
    has_subject_anchor: bool,
    config: &Config,
) -> ConfidenceLanguage {
    let lower = text.to_lowercase();
    if config.hedges.iter().any(|h| contains_whole(&lower, h)) {
        return ConfidenceLanguage::Hedged;
    }
    if !assertion_verbs_found.is_empty() && has_subject_anchor {
        return ConfidenceLanguage::Definitive;
    }
    ConfidenceLanguage::Unknown
}

/// Keyword-bag lookup across the ten fixed categories (§4.C). Score is the
/// count of category keywords present (case-insensitive, whole-word);
/// highest score wins, ties broken by `CATEGORY_PRIORITY`; an all-zero
/// score assigns `general`.
pub fn classify_category(text: &str, config: &Config) -> Category {
    let lower = text.to_lowercase();
    let mut best = Category::General;
    let mut best_score = 0usize;

    for category in CATEGORY_PRIORITY {
        if category == Category::General {
            continue;
        }
        let Some(keywords) = config.category_keywords.get(&category) else {
            continue;
        };
        let score = keywords.iter().filter(|kw| contains_whole(&lower, kw)).count();
        if score > best_score {
            best_score = score;
            best = category;
        }
    }

    if best_score == 0 {
        Category::General
    } else {
        best
    }
}

/// Whole-word, case-insensitive substring containment. `needle` may itself
/// contain spaces (multi-word phrases like "market cap"), in which case it
/// is matched as a literal substring rather than tokenized.
fn contains_whole(haystack_lower: &str, needle: &str) -> bool {
    let needle_lower = needle.to_lowercase();
    if needle_lower.contains(' ') {
        return haystack_lower.contains(&needle_lower);
    }
    haystack_lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == needle_lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hedged_language_detected() {
        let config = Config::embedded_default();
        let result = classify_confidence_language(
            "Revenue may have grown roughly 5% last quarter.",
            &["grown".to_string()],
            true,
            &config,
        );
        assert_eq!(result, ConfidenceLanguage::Hedged);
    }

    #[test]
    fn definitive_language_requires_verb_and_subject() {
        let config = Config::embedded_default();
        let result = classify_confidence_language(
            "Alphabet reported revenue of $96.5 billion.",
            &["reported".to_string()],
            true,
            &config,
        );
        assert_eq!(result, ConfidenceLanguage::Definitive);
    }

    #[test]
    fn finance_category_wins_on_keyword_density() {
        let config = Config::embedded_default();
        let category = classify_category(
            "Alphabet reported revenue and earnings ahead of fiscal guidance, boosting market cap.",
            &config,
        );
        assert_eq!(category, Category::Finance);
    }

    #[test]
    fn health_category_matches_clinical_terms() {
        let config = Config::embedded_default();
        let category = classify_category(
            "LDL cholesterol levels above 160 mg/dL are associated with cardiovascular risk.",
            &config,
        );
        assert_eq!(category, Category::Health);
    }

    #[test]
    fn no_keyword_hits_falls_back_to_general() {
        let config = Config::embedded_default();
        let category = classify_category("The weather was pleasant yesterday afternoon.", &config);
        assert_eq!(category, Category::General);
    }

    #[test]
    fn tie_break_prefers_earlier_priority_category() {
        // Construct text with one finance keyword and one health keyword;
        // finance must win per CATEGORY_PRIORITY ordering.
        let config = Config::embedded_default();
        let category = classify_category("The patient discussed revenue with their doctor.", &config);
        assert_eq!(category, Category::Finance);
    }
}
