//! Shared data model for the claim extraction and verification pipeline.
//!
//! Field shapes follow §3 of the spec verbatim; this is the crate's single
//! source of truth for the types every stage passes between each other, the
//! way `claim-extraction::types` anchors the reference pipeline's stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier for a pluggable evidence-source adapter (§4.F). A flat,
/// tagged-variant registry key rather than a trait-object hierarchy, per
/// the Design Notes ("avoid deep inheritance; prefer a flat registry keyed
/// by source id").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    YahooFinance,
    SecEdgar,
    Fred,
    WorldBank,
    Wikipedia,
    PubMed,
    OpenFda,
    ClinicalTrials,
    Arxiv,
    Nasa,
    Ieee,
    Patents,
    Bls,
    Eia,
    UnData,
    FactcheckOrg,
    GovinfoUs,
    Cdc,
}

impl FromStr for SourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yahoo_finance" => Ok(SourceId::YahooFinance),
            "sec_edgar" => Ok(SourceId::SecEdgar),
            "fred" => Ok(SourceId::Fred),
            "world_bank" => Ok(SourceId::WorldBank),
            "wikipedia" => Ok(SourceId::Wikipedia),
            "pubmed" => Ok(SourceId::PubMed),
            "openfda" => Ok(SourceId::OpenFda),
            "clinical_trials" => Ok(SourceId::ClinicalTrials),
            "arxiv" => Ok(SourceId::Arxiv),
            "nasa" => Ok(SourceId::Nasa),
            "ieee" => Ok(SourceId::Ieee),
            "patents" => Ok(SourceId::Patents),
            "bls" => Ok(SourceId::Bls),
            "eia" => Ok(SourceId::Eia),
            "un_data" => Ok(SourceId::UnData),
            "factcheck_org" => Ok(SourceId::FactcheckOrg),
            "govinfo_us" => Ok(SourceId::GovinfoUs),
            "cdc" => Ok(SourceId::Cdc),
            other => Err(format!("unknown source id `{other}`")),
        }
    }
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::YahooFinance => "yahoo_finance",
            SourceId::SecEdgar => "sec_edgar",
            SourceId::Fred => "fred",
            SourceId::WorldBank => "world_bank",
            SourceId::Wikipedia => "wikipedia",
            SourceId::PubMed => "pubmed",
            SourceId::OpenFda => "openfda",
            SourceId::ClinicalTrials => "clinical_trials",
            SourceId::Arxiv => "arxiv",
            SourceId::Nasa => "nasa",
            SourceId::Ieee => "ieee",
            SourceId::Patents => "patents",
            SourceId::Bls => "bls",
            SourceId::Eia => "eia",
            SourceId::UnData => "un_data",
            SourceId::FactcheckOrg => "factcheck_org",
            SourceId::GovinfoUs => "govinfo_us",
            SourceId::Cdc => "cdc",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "finance" => Ok(Category::Finance),
            "health" => Ok(Category::Health),
            "science" => Ok(Category::Science),
            "tech" => Ok(Category::Tech),
            "politics" => Ok(Category::Politics),
            "military" => Ok(Category::Military),
            "education" => Ok(Category::Education),
            "energy_climate" => Ok(Category::EnergyClimate),
            "labor" => Ok(Category::Labor),
            "general" => Ok(Category::General),
            other => Err(format!("unknown category `{other}`")),
        }
    }
}

impl FromStr for EvidenceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filing" => Ok(EvidenceType::Filing),
            "dataset" => Ok(EvidenceType::Dataset),
            "paper" => Ok(EvidenceType::Paper),
            "gov" => Ok(EvidenceType::Gov),
            "secondary" => Ok(EvidenceType::Secondary),
            "factcheck" => Ok(EvidenceType::Factcheck),
            other => Err(format!("unknown evidence type `{other}`")),
        }
    }
}

/// A timed slice of transcript text, ordered and non-overlapping within a
/// source. Non-audio inputs assign synthetic uniform timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimedSegment {
    pub text: String,
    pub start_s: f64,
    pub end_s: f64,
}

/// External collaborator record; the core only ever references it by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub kind: SourceKind,
    pub title: String,
    pub origin_url: Option<String>,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Audio,
    Video,
    Text,
    Pdf,
    Web,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLanguage {
    Hedged,
    Definitive,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Finance,
    Health,
    Science,
    Tech,
    Politics,
    Military,
    Education,
    EnergyClimate,
    Labor,
    General,
}

/// Fixed tie-break priority for category assignment (§4.C). Index order is
/// the authoritative ranking: lower index wins on equal keyword-hit count.
pub const CATEGORY_PRIORITY: [Category; 10] = [
    Category::Finance,
    Category::Health,
    Category::Science,
    Category::Tech,
    Category::Politics,
    Category::Military,
    Category::Education,
    Category::EnergyClimate,
    Category::Labor,
    Category::General,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Unknown,
    Partial,
    Supported,
    // CONTRADICTED is never set by any code path in the core (§8 invariant 8);
    // the variant exists so a human-review layer outside the core can record it.
    Contradicted,
}

/// An atomic, checkable factual assertion extracted from a source.
///
/// Immutable in `text`/span/hash once created; only `status` and the
/// attached evidence set (tracked by the orchestrator, not inline here)
/// mutate after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub id: Uuid,
    pub source_id: Uuid,
    pub text: String,
    pub start_s: f64,
    pub end_s: f64,
    pub content_hash: String,
    pub global_hash: String,
    pub confidence_language: ConfidenceLanguage,
    pub category: Category,
    pub signal_log: Vec<String>,
    pub status: ClaimStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    Filing,
    Dataset,
    Paper,
    Gov,
    Secondary,
    Factcheck,
}

impl EvidenceType {
    /// Primary sources per the GLOSSARY: an authoritative issuer (regulatory
    /// filing, government dataset, peer-reviewed paper, accredited
    /// fact-check). Used by the SUPPORTED guardrail (§4.G).
    pub fn is_primary(&self) -> bool {
        matches!(
            self,
            EvidenceType::Filing
                | EvidenceType::Dataset
                | EvidenceType::Gov
                | EvidenceType::Paper
                | EvidenceType::Factcheck
        )
    }
}

/// Normalized output of an evidence-source adapter fetch (§4.F).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceCandidate {
    pub source_api: String,
    pub evidence_type: EvidenceType,
    pub title: String,
    pub snippet: String,
    pub url: String,
    pub identifier: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub entities: Vec<String>,
    pub numbers: Vec<f64>,
    pub keyphrases: Vec<String>,
}

/// A scored candidate, persisted verbatim with its signal breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredEvidence {
    pub claim_id: Uuid,
    pub candidate: EvidenceCandidate,
    pub score: f64,
    pub breakdown: HashMap<String, f64>,
    pub matched_keyphrase: Option<String>,
    pub matched_number: Option<f64>,
}

/// Cross-source grouping of claims sharing a `global_hash` or fuzzy match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimGroup {
    pub id: Uuid,
    pub global_hash: String,
    pub claim_ids: Vec<Uuid>,
    pub source_ids: Vec<Uuid>,
    pub first_seen: DateTime<Utc>,
    pub category: Category,
}

/// Advisory contradiction flag between two groups (§4.H). Never mutates
/// status on either side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContradictionFlag {
    pub group_a: Uuid,
    pub group_b: Uuid,
    pub shared_entities: Vec<String>,
    pub category: Category,
}

/// Per-claim error tag recorded when a stage fails without poisoning the
/// whole run (§7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimErrorTag {
    pub claim_id: Uuid,
    pub stage: String,
    pub reason: String,
}

/// Per-source run summary (§7 "user-visible failure behaviour").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunCounts {
    pub extracted: u32,
    pub evidenced: u32,
    pub supported: u32,
    pub partial: u32,
    pub unknown: u32,
    pub errored: u32,
}
