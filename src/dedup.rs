//! Deduper (4.D): exact content-hash dedup plus fuzzy token-similarity
//! dedup, scoped local (within a source) vs. global (across sources).
//!
//! The normalization step is isolated behind a single pure function per the
//! Design Notes ("Hash-stable normalization: isolate normalization behind a
//! single pure function; all hashes and fuzzy comparisons must consume its
//! output, never raw text"). Grounded on the reference pipeline's
//! similarity-cached coreference matching (`verification/coreference.rs`),
//! which also layers an exact check before a cached fuzzy one.

use sha2::{Digest, Sha256};

/// Token-ratio similarity threshold above which a new local candidate is
/// rejected as a near-duplicate (§4.D).
pub const FUZZY_THRESHOLD: f64 = 0.85;

const LEADING_ARTICLES: [&str; 3] = ["the", "a", "an"];

/// Lowercase; collapse whitespace; strip trailing punctuation; strip
/// leading articles; remove non-alphanumeric except digits and spaces.
///
/// Every hash and fuzzy comparison in this module consumes this function's
/// output, never the raw claim text, so hash stability (§8 invariant 5) is
/// guaranteed by construction.
pub fn normalize(text: &str) -> String {
    let lower = text.to_lowercase();
    let stripped: String = lower
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    let mut words: Vec<&str> = stripped.split_whitespace().collect();

    if let Some(first) = words.first() {
        if LEADING_ARTICLES.contains(first) {
            words.remove(0);
        }
    }

    words.join(" ")
}

/// Stable SHA-256 of normalized text, as required for `Claim::content_hash`
/// and `Claim::global_hash` (both are the same function applied to the
/// same normalization; they differ only in the scope the caller dedups
/// against).
pub fn content_hash(text: &str) -> String {
    let normalized = normalize(text);
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Longest-common-subsequence over tokens, normalized by the longer
/// token-sequence length. 1.0 means identical token sequences.
pub fn token_similarity(a: &str, b: &str) -> f64 {
    let na = normalize(a);
    let nb = normalize(b);
    let ta: Vec<&str> = na.split_whitespace().collect();
    let tb: Vec<&str> = nb.split_whitespace().collect();

    if ta.is_empty() && tb.is_empty() {
        return 1.0;
    }
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let lcs = lcs_len(&ta, &tb);
    let longer = ta.len().max(tb.len());
    lcs as f64 / longer as f64
}

fn lcs_len(a: &[&str], b: &[&str]) -> usize {
    let mut dp = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            dp[i][j] = if a[i - 1] == b[j - 1] {
                dp[i - 1][j - 1] + 1
            } else {
                dp[i - 1][j].max(dp[i][j - 1])
            };
        }
    }
    dp[a.len()][b.len()]
}

/// In-source dedup index: exact hashes and the set of existing claim texts
/// used for the fuzzy pass. Local only per §4.D ("Applied only locally, not
/// globally").
#[derive(Debug, Default, Clone)]
pub struct LocalDedupIndex {
    hashes: std::collections::HashSet<String>,
    texts: Vec<String>,
}

impl LocalDedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` and records the claim if it is not a local exact or
    /// fuzzy duplicate; returns `false` (rejecting the claim) otherwise.
    pub fn admit(&mut self, text: &str) -> bool {
        let hash = content_hash(text);
        if self.hashes.contains(&hash) {
            return false;
        }
        if self
            .texts
            .iter()
            .any(|existing| token_similarity(text, existing) >= FUZZY_THRESHOLD)
        {
            return false;
        }
        self.hashes.insert(hash);
        self.texts.push(text.to_string());
        true
    }
}
