//! Wire-level data models for the intelligence backend.
//!
//! Every type here deserializes defensively: missing arrays become empty,
//! missing scalars become `None` or a default, and a backend-reported
//! `{"error": "..."}` body is data, not a fault. The orchestration layer
//! never crashes on an incomplete payload.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A year label on a chart axis.
///
/// The backend emits years as either JSON strings or numbers depending on
/// which pipeline produced the record. Labels are opaque to the alignment
/// contract, so we keep the original text instead of parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "YearRepr")]
pub struct Year(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum YearRepr {
    Text(String),
    Int(i64),
    Float(f64),
}

impl From<YearRepr> for Year {
    fn from(repr: YearRepr) -> Self {
        match repr {
            YearRepr::Text(s) => Year(s),
            YearRepr::Int(n) => Year(n.to_string()),
            YearRepr::Float(n) => Year(n.to_string()),
        }
    }
}

impl From<&str> for Year {
    fn from(s: &str) -> Self {
        Year(s.to_string())
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cross-document signal synthesis for a topic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynthesisResult {
    /// One-paragraph summary across all analyzed documents.
    #[serde(default)]
    pub overall_summary: String,
    /// Weak signals the backend flagged as emerging.
    #[serde(default)]
    pub emerging_signals: Vec<String>,
    /// Organizations and groups driving the topic.
    #[serde(default)]
    pub key_players: Vec<String>,
    /// Backend-reported semantic error ("not enough data"), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SynthesisResult {
    /// True when the backend returned an error body instead of a synthesis.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A detected relationship between two technologies.
///
/// Pairs are unordered sets; rendering order is arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergencePair {
    pub tech_1: String,
    pub tech_2: String,
    /// Co-occurrence strength score.
    pub strength: f64,
}

/// One point on the cumulative-adoption (S-curve) axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SCurvePoint {
    pub year: Year,
    /// Documents published in this year alone (not always present).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    /// Running total of documents up to and including this year.
    #[serde(default)]
    pub cumulative_count: u64,
}

/// One point on the TRL-over-time axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrlPoint {
    pub year: Year,
    pub avg_trl: f64,
}

/// Observed and projected average TRL for a topic.
///
/// `history` and `forecast` are disjoint except that the forecast may
/// repeat the final historical point as its transition anchor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrlSeries {
    #[serde(default)]
    pub history: Vec<TrlPoint>,
    #[serde(default)]
    pub forecast: Vec<TrlPoint>,
}

/// A subject-relationship-object triple extracted from a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub relationship: String,
    #[serde(default)]
    pub object: String,
}

/// The consolidated briefing returned by the live `GET /api/analyze` path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Briefing {
    #[serde(default)]
    pub strategic_summary: String,
    /// Aggregate maturity rating across the analyzed documents (0-9).
    #[serde(default, rename = "aggregate_TRL")]
    pub aggregate_trl: Option<u8>,
    #[serde(default, rename = "TRL_justification")]
    pub trl_justification: String,
    #[serde(default)]
    pub key_technologies: Vec<String>,
    #[serde(default)]
    pub emerging_convergences: Vec<Relationship>,
    /// Backend-reported failure ("could not fetch enough documents").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Briefing {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Acknowledgement for a background analysis job submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionAck {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmissionAck {
    /// Whether the backend accepted the job.
    pub fn accepted(&self) -> bool {
        self.error.is_none() && !self.status.eq_ignore_ascii_case("error")
    }
}

/// Per-document analysis record from the background pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Source identifier (arXiv URL, patent URL, ...).
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Technology Readiness Level, 0-9. Absent when analysis was skipped.
    #[serde(default, rename = "TRL")]
    pub trl: Option<u8>,
    #[serde(default, rename = "TRL_justification")]
    pub trl_justification: String,
    #[serde(default)]
    pub strategic_summary: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    // Provenance
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub provider_company: Option<String>,
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub funding: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
}

impl DocumentRecord {
    /// TRL formatted for tabular display.
    pub fn trl_display(&self) -> String {
        match self.trl {
            Some(level) => level.to_string(),
            None => "N/A".to_string(),
        }
    }

    /// Provenance field formatted for tabular display.
    pub fn field_display(field: &Option<String>) -> &str {
        field.as_deref().unwrap_or("N/A")
    }
}
