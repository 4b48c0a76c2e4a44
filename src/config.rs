//! Immutable pipeline configuration: lexicons, boilerplate, category
//! keywords, routing tables, evidence-type weights (§6 "Static
//! configuration").
//!
//! Loaded once and threaded explicitly through every component constructor
//! (Design Notes: "Global mutable state ... expose as an immutable `Config`
//! value"). Never mutated after construction.

use crate::error::ConfigError;
use crate::types::{Category, EvidenceType, SourceId};
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;

const DEFAULT_CONFIG_TOML: &str = include_str!("config_data/default.toml");

#[derive(Debug, Deserialize)]
struct RawConfig {
    lexicons: RawLexicons,
    routing_signal_keywords: HashMap<String, Vec<String>>,
    category_keywords: HashMap<String, Vec<String>>,
    category_default_sources: HashMap<String, Vec<String>>,
    signal_boosts: HashMap<String, HashMap<String, i32>>,
    source_order: Vec<String>,
    evidence_type_weights: HashMap<String, HashMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
struct RawLexicons {
    hedges: Vec<String>,
    assertion_verbs: Vec<String>,
    abbreviations: Vec<String>,
    org_suffixes: Vec<String>,
    known_entities: Vec<String>,
    conjunctions: Vec<String>,
    boilerplate: Vec<String>,
    pronouns_first_third: Vec<String>,
}

/// Fully parsed, typed, read-only configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub hedges: Vec<String>,
    pub assertion_verbs: Vec<String>,
    pub abbreviations: Vec<String>,
    pub org_suffixes: Vec<String>,
    pub known_entities: Vec<String>,
    pub conjunctions: Vec<String>,
    pub boilerplate: Vec<String>,
    pub pronouns_first_third: Vec<String>,
    pub routing_signal_keywords: HashMap<String, Vec<String>>,
    pub category_keywords: HashMap<Category, Vec<String>>,
    pub category_default_sources: HashMap<Category, Vec<SourceId>>,
    pub signal_boosts: HashMap<String, HashMap<SourceId, i32>>,
    pub source_order: Vec<SourceId>,
    pub evidence_type_weights: HashMap<Category, HashMap<EvidenceType, f64>>,
}

impl Config {
    /// Parse and validate a TOML configuration string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(toml_str)?;

        let mut category_keywords = HashMap::new();
        for (k, v) in raw.category_keywords {
            let category = Category::from_str(&k)
                .map_err(|_| ConfigError::MissingTable("category_keywords"))?;
            category_keywords.insert(category, v);
        }

        let mut category_default_sources = HashMap::new();
        for (k, v) in raw.category_default_sources {
            let category = Category::from_str(&k)
                .map_err(|_| ConfigError::MissingTable("category_default_sources"))?;
            let sources: Vec<SourceId> = v
                .iter()
                .map(|s| SourceId::from_str(s))
                .collect::<Result<_, _>>()
                .map_err(|_| ConfigError::MissingTable("category_default_sources"))?;
            if sources.is_empty() {
                return Err(ConfigError::EmptyCategoryKeywords(format!(
                    "{:?} has no default sources",
                    category
                )));
            }
            category_default_sources.insert(category, sources);
        }

        let mut signal_boosts = HashMap::new();
        for (signal, boosts) in raw.signal_boosts {
            let mut by_source = HashMap::new();
            for (source, boost) in boosts {
                let source_id = SourceId::from_str(&source)
                    .map_err(|_| ConfigError::MissingTable("signal_boosts"))?;
                by_source.insert(source_id, boost);
            }
            signal_boosts.insert(signal, by_source);
        }

        let source_order: Vec<SourceId> = raw
            .source_order
            .iter()
            .map(|s| SourceId::from_str(s))
            .collect::<Result<_, _>>()
            .map_err(|_| ConfigError::MissingTable("source_order"))?;

        let mut evidence_type_weights = HashMap::new();
        for (k, v) in raw.evidence_type_weights {
            let category = Category::from_str(&k)
                .map_err(|_| ConfigError::MissingTable("evidence_type_weights"))?;
            let mut weights = HashMap::new();
            for (et, weight) in v {
                let evidence_type = EvidenceType::from_str(&et)
                    .map_err(|_| ConfigError::MissingTable("evidence_type_weights"))?;
                weights.insert(evidence_type, weight);
            }
            evidence_type_weights.insert(category, weights);
        }

        let config = Config {
            hedges: raw.lexicons.hedges,
            assertion_verbs: raw.lexicons.assertion_verbs,
            abbreviations: raw.lexicons.abbreviations,
            org_suffixes: raw.lexicons.org_suffixes,
            known_entities: raw.lexicons.known_entities,
            conjunctions: raw.lexicons.conjunctions,
            boilerplate: raw.lexicons.boilerplate,
            pronouns_first_third: raw.lexicons.pronouns_first_third,
            routing_signal_keywords: raw.routing_signal_keywords,
            category_keywords,
            category_default_sources,
            signal_boosts,
            source_order,
            evidence_type_weights,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for category in crate::types::CATEGORY_PRIORITY {
            if category != Category::General
                && !self.category_default_sources.contains_key(&category)
            {
                return Err(ConfigError::MissingTable("category_default_sources"));
            }
        }
        Ok(())
    }

    /// The embedded default configuration, parsed once per call. Cheap
    /// enough (a few hundred keyword entries) that callers are expected to
    /// build it once at startup and share it via `Arc`.
    pub fn embedded_default() -> Self {
        Self::from_toml_str(DEFAULT_CONFIG_TOML)
            .expect("embedded default config must parse and validate")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::embedded_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_default_parses() {
        let config = Config::embedded_default();
        assert!(!config.hedges.is_empty());
        assert!(config.category_default_sources.contains_key(&Category::Finance));
        assert_eq!(
            config.category_default_sources[&Category::Finance][0],
            SourceId::YahooFinance
        );
    }

    #[test]
    fn every_category_has_default_sources() {
        let config = Config::embedded_default();
        for category in crate::types::CATEGORY_PRIORITY {
            assert!(
                config.category_default_sources.contains_key(&category),
                "{:?} missing default sources",
                category
            );
        }
    }

    #[test]
    fn source_order_has_no_duplicates() {
        let config = Config::embedded_default();
        let mut seen = std::collections::HashSet::new();
        for source in &config.source_order {
            assert!(seen.insert(source), "duplicate source in source_order");
        }
    }
}
