//! Briefing report assembly and rendering.

pub mod generator;

use crate::analytics::AnalyticsBundle;
use crate::models::{Briefing, DocumentRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Metadata about one briefing run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub topic: String,
    pub backend_url: String,
    pub generated_at: DateTime<Utc>,
    pub duration_seconds: f64,
    /// Analytics sources that populated their slice.
    pub sources_succeeded: usize,
    /// Analytics sources that failed or were skipped.
    pub sources_failed: usize,
    pub documents_analyzed: usize,
}

/// Everything a single briefing run produced.
#[derive(Debug, Clone, Serialize)]
pub struct BriefingReport {
    pub metadata: ReportMetadata,
    /// Live fast-path briefing, when requested and reachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub briefing: Option<Briefing>,
    pub bundle: AnalyticsBundle,
    pub documents: Vec<DocumentRecord>,
}

/// Apply the report's document settings to the session's document list.
///
/// Returns the documents to render and the analyzed count, taken before
/// any trimming so the metadata reflects what the backend actually
/// processed rather than what the report shows.
pub fn select_documents(
    mut documents: Vec<DocumentRecord>,
    include: bool,
    max: usize,
) -> (Vec<DocumentRecord>, usize) {
    let analyzed = documents.len();
    if !include {
        documents.clear();
    }
    documents.truncate(max);
    (documents, analyzed)
}
