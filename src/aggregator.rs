//! Cross-Source Aggregator (4.H): exact + fuzzy claim grouping, timelines,
//! top-claims ranking, and advisory contradiction flags.
//!
//! Grounded on the reference pipeline's
//! `claim-extraction/src/verification/historical.rs` (`HistoricalLookup`
//! grouping claims by search term/source over time) and
//! `claim-extraction/src/multi_modal_verification.rs` (cross-claim
//! consistency checking); the fuzzy merge pass is a second, independently
//! specified use of [[dedup]]'s `token_similarity`, scoped globally here
//! rather than per-source.

use crate::dedup::{token_similarity, FUZZY_THRESHOLD};
use crate::types::{Category, Claim, ClaimGroup, ContradictionFlag, Source};
use chrono::{DateTime, Datelike, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Minimum shared entities for two groups to be eligible for a
/// contradiction flag (§4.H).
const CONTRADICTION_MIN_SHARED_ENTITIES: usize = 2;
/// A number differing by at least this factor (or in sign) between two
/// group representatives counts as a numeric disagreement.
const CONTRADICTION_NUMBER_FACTOR: f64 = 1.25;
/// Below this keyphrase-alignment score the two representatives are
/// considered to be "about the same specific thing" for contradiction
/// purposes (§4.H point (d)).
const CONTRADICTION_KEYPHRASE_CEILING: f64 = 0.3;

/// Builds `ClaimGroup`s from all claims seen so far: exact grouping by
/// `global_hash`, then a fuzzy merge pass within each (ISO week, category)
/// bucket for groups whose representative texts are >= 0.85 similar.
pub fn group_claims(claims: &[Claim], sources: &HashMap<Uuid, Source>) -> Vec<ClaimGroup> {
    let mut by_hash: HashMap<String, Vec<&Claim>> = HashMap::new();
    for claim in claims {
        by_hash.entry(claim.global_hash.clone()).or_default().push(claim);
    }

    let mut groups: Vec<ClaimGroup> = by_hash
        .into_iter()
        .map(|(hash, members)| build_group(hash, &members, sources))
        .collect();

    groups.sort_by_key(|g| g.first_seen);
    merge_fuzzy_groups(groups, claims)
}

fn build_group(global_hash: String, members: &[&Claim], sources: &HashMap<Uuid, Source>) -> ClaimGroup {
    let claim_ids: Vec<Uuid> = members.iter().map(|c| c.id).collect();
    let source_ids: Vec<Uuid> = {
        let mut ids: Vec<Uuid> = members.iter().map(|c| c.source_id).collect();
        ids.sort();
        ids.dedup();
        ids
    };
    let first_seen = members
        .iter()
        .map(|c| ingested_at_or_created(c, sources))
        .min()
        .unwrap_or_else(Utc::now);
    let category = members[0].category;

    ClaimGroup {
        id: Uuid::new_v4(),
        global_hash,
        claim_ids,
        source_ids,
        first_seen,
        category,
    }
}

fn ingested_at_or_created(claim: &Claim, sources: &HashMap<Uuid, Source>) -> DateTime<Utc> {
    sources.get(&claim.source_id).map(|s| s.ingested_at).unwrap_or(claim.created_at)
}

/// Second pass over exact groups: within the same (ISO week of first_seen,
/// category) bucket, merge group pairs whose representative claim texts are
/// fuzzy-similar (>= `FUZZY_THRESHOLD`). This is deliberately independent of
/// the extractor's local dedup (§9 Open Questions: scope resolution).
fn merge_fuzzy_groups(mut groups: Vec<ClaimGroup>, claims: &[Claim]) -> Vec<ClaimGroup> {
    let text_by_id: HashMap<Uuid, &str> = claims.iter().map(|c| (c.id, c.text.as_str())).collect();

    let mut merged = true;
    while merged {
        merged = false;
        'outer: for i in 0..groups.len() {
            for j in (i + 1)..groups.len() {
                if groups[i].category != groups[j].category {
                    continue;
                }
                if iso_week(groups[i].first_seen) != iso_week(groups[j].first_seen) {
                    continue;
                }
                let rep_a = groups[i].claim_ids.first().and_then(|id| text_by_id.get(id));
                let rep_b = groups[j].claim_ids.first().and_then(|id| text_by_id.get(id));
                let (Some(a), Some(b)) = (rep_a, rep_b) else { continue };

                // A high token-similarity score can still hide a diverging
                // figure ("...$10 million..." vs "...$50 million..." is 90%
                // token-identical) — that pair is a contradiction candidate,
                // not a restatement, so leave the groups separate here and
                // let `contradiction_flags` see them as distinct groups.
                if numbers_disagree(a, b) {
                    continue;
                }

                if token_similarity(a, b) >= FUZZY_THRESHOLD {
                    let absorbed = groups.remove(j);
                    let target = &mut groups[i];
                    target.claim_ids.extend(absorbed.claim_ids);
                    target.source_ids.extend(absorbed.source_ids);
                    target.source_ids.sort();
                    target.source_ids.dedup();
                    target.first_seen = target.first_seen.min(absorbed.first_seen);
                    merged = true;
                    break 'outer;
                }
            }
        }
    }

    groups
}

fn iso_week(ts: DateTime<Utc>) -> (i32, u32) {
    let iso = ts.iso_week();
    (iso.year(), iso.week())
}

/// Per-group timeline: source occurrences ordered by `ingested_at` (or
/// `start_s` within a source when available), per §4.H "Timeline".
pub fn timeline(group: &ClaimGroup, claims: &[Claim], sources: &HashMap<Uuid, Source>) -> Vec<Uuid> {
    let mut members: Vec<&Claim> = claims.iter().filter(|c| group.claim_ids.contains(&c.id)).collect();
    members.sort_by(|a, b| {
        let ts_a = ingested_at_or_created(a, sources);
        let ts_b = ingested_at_or_created(b, sources);
        ts_a.cmp(&ts_b).then_with(|| a.start_s.partial_cmp(&b.start_s).unwrap_or(std::cmp::Ordering::Equal))
    });
    members.into_iter().map(|c| c.source_id).collect()
}

/// Ranks groups by (distinct source count desc, total occurrences desc,
/// first-seen asc), per §4.H "Top claims".
pub fn top_claims<'a>(groups: &'a [ClaimGroup]) -> Vec<&'a ClaimGroup> {
    let mut ranked: Vec<&ClaimGroup> = groups.iter().collect();
    ranked.sort_by(|a, b| {
        b.source_ids
            .len()
            .cmp(&a.source_ids.len())
            .then_with(|| b.claim_ids.len().cmp(&a.claim_ids.len()))
            .then_with(|| a.first_seen.cmp(&b.first_seen))
    });
    ranked
}

/// Flags pairs of groups as advisory contradictions (§4.H "Contradiction
/// flag"). Never mutates either group's claims' status.
pub fn contradiction_flags(groups: &[ClaimGroup], claims: &[Claim]) -> Vec<ContradictionFlag> {
    let text_by_id: HashMap<Uuid, &Claim> = claims.iter().map(|c| (c.id, c)).collect();
    let mut flags = Vec::new();

    for i in 0..groups.len() {
        for j in (i + 1)..groups.len() {
            let a = &groups[i];
            let b = &groups[j];
            if a.category != b.category {
                continue;
            }
            let Some(rep_a) = a.claim_ids.first().and_then(|id| text_by_id.get(id)) else { continue };
            let Some(rep_b) = b.claim_ids.first().and_then(|id| text_by_id.get(id)) else { continue };

            let entities_a = crate::tokenizer::detect_entities(&rep_a.text, &default_config_hint());
            let entities_b = crate::tokenizer::detect_entities(&rep_b.text, &default_config_hint());
            let shared_entities = shared_entity_texts(&entities_a, &entities_b);
            if shared_entities.len() < CONTRADICTION_MIN_SHARED_ENTITIES {
                continue;
            }

            let numbers_disagree = numbers_disagree(&rep_a.text, &rep_b.text);
            if !numbers_disagree {
                continue;
            }

            let keyphrase_alignment = representative_keyphrase_alignment(&rep_a.text, &rep_b.text);
            if keyphrase_alignment >= CONTRADICTION_KEYPHRASE_CEILING {
                continue;
            }

            flags.push(ContradictionFlag {
                group_a: a.id,
                group_b: b.id,
                shared_entities,
                category: a.category,
            });
        }
    }

    flags
}

fn shared_entity_texts(a: &[crate::tokenizer::EntityMatch], b: &[crate::tokenizer::EntityMatch]) -> Vec<String> {
    let b_lower: Vec<String> = b.iter().map(|e| e.text.to_lowercase()).collect();
    let mut shared: Vec<String> = a
        .iter()
        .filter(|e| b_lower.contains(&e.text.to_lowercase()))
        .map(|e| e.text.clone())
        .collect();
    shared.sort();
    shared.dedup();
    shared
}

fn numbers_disagree(text_a: &str, text_b: &str) -> bool {
    let numbers_a = crate::tokenizer::detect_numbers(text_a);
    let numbers_b = crate::tokenizer::detect_numbers(text_b);
    for na in &numbers_a {
        for nb in &numbers_b {
            if na.value.signum() != nb.value.signum() {
                return true;
            }
            let (small, big) = if na.value.abs() < nb.value.abs() {
                (na.value.abs(), nb.value.abs())
            } else {
                (nb.value.abs(), na.value.abs())
            };
            if small > 0.0 && big / small >= CONTRADICTION_NUMBER_FACTOR {
                return true;
            }
        }
    }
    false
}

fn representative_keyphrase_alignment(text_a: &str, text_b: &str) -> f64 {
    token_similarity(text_a, text_b)
}

/// Entity/number detection inside the aggregator is advisory only (no claim
/// mutation), so it is intentionally decoupled from any caller-supplied
/// lexicon and uses the embedded default — a contradiction scan over
/// already-extracted claims does not need per-run configuration.
fn default_config_hint() -> crate::config::Config {
    crate::config::Config::embedded_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClaimStatus, ConfidenceLanguage, SourceKind};
    use chrono::TimeZone;

    fn claim(text: &str, source_id: Uuid, global_hash: &str, category: Category, start_s: f64) -> Claim {
        Claim {
            id: Uuid::new_v4(),
            source_id,
            text: text.to_string(),
            start_s,
            end_s: start_s + 1.0,
            content_hash: global_hash.to_string(),
            global_hash: global_hash.to_string(),
            confidence_language: ConfidenceLanguage::Definitive,
            category,
            signal_log: vec![],
            status: ClaimStatus::Unknown,
            created_at: Utc::now(),
        }
    }

    fn source(id: Uuid, ingested_at: DateTime<Utc>) -> Source {
        Source { id, kind: SourceKind::Text, title: "t".to_string(), origin_url: None, ingested_at }
    }

    #[test]
    fn exact_global_hash_groups_merge_into_one() {
        let source_a = Uuid::new_v4();
        let source_b = Uuid::new_v4();
        let claims = vec![
            claim("Alphabet reported revenue growth.", source_a, "hash1", Category::Finance, 0.0),
            claim("Alphabet reported revenue growth.", source_b, "hash1", Category::Finance, 0.0),
        ];
        let mut sources = HashMap::new();
        sources.insert(source_a, source(source_a, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        sources.insert(source_b, source(source_b, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()));

        let groups = group_claims(&claims, &sources);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].source_ids.len(), 2);
    }

    #[test]
    fn top_claims_ranks_by_distinct_source_count_first() {
        let group_wide = ClaimGroup {
            id: Uuid::new_v4(),
            global_hash: "a".to_string(),
            claim_ids: vec![Uuid::new_v4()],
            source_ids: vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()],
            first_seen: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            category: Category::Finance,
        };
        let group_narrow = ClaimGroup {
            id: Uuid::new_v4(),
            global_hash: "b".to_string(),
            claim_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
            source_ids: vec![Uuid::new_v4()],
            first_seen: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            category: Category::Finance,
        };
        let ranked = top_claims(&[group_narrow.clone(), group_wide.clone()]);
        assert_eq!(ranked[0].id, group_wide.id);
    }

    #[test]
    fn contradiction_requires_shared_entities_and_diverging_numbers() {
        let source_a = Uuid::new_v4();
        let source_b = Uuid::new_v4();
        let claims = vec![
            claim(
                "According to a filing, Acme Corp revenue climbed sharply to $10 million \
                 during the Q4 2024 earnings call this week.",
                source_a,
                "ha",
                Category::Finance,
                0.0,
            ),
            claim(
                "Analysts at Acme Corp flagged a steep decline after booking $50M for \
                 Q4 2024 amid market turmoil.",
                source_b,
                "hb",
                Category::Finance,
                0.0,
            ),
        ];
        let mut sources = HashMap::new();
        sources.insert(source_a, source(source_a, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        sources.insert(source_b, source(source_b, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));

        let groups = group_claims(&claims, &sources);
        let flags = contradiction_flags(&groups, &claims);
        assert!(!flags.is_empty(), "expected a contradiction flag between diverging revenue figures");
    }

    #[test]
    fn no_contradiction_when_numbers_agree() {
        let source_a = Uuid::new_v4();
        let source_b = Uuid::new_v4();
        let claims = vec![
            claim(
                "According to a filing, Acme Corp reported revenue of $10 million in Q4 2024.",
                source_a,
                "ha",
                Category::Finance,
                0.0,
            ),
            claim(
                "Analysts at Acme Corp confirmed revenue of $10 million in Q4 2024.",
                source_b,
                "hb",
                Category::Finance,
                0.0,
            ),
        ];
        let mut sources = HashMap::new();
        sources.insert(source_a, source(source_a, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        sources.insert(source_b, source(source_b, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));

        let groups = group_claims(&claims, &sources);
        let flags = contradiction_flags(&groups, &claims);
        assert!(flags.is_empty());
    }
}
