//! Markdown and JSON briefing rendering.
//!
//! This is the external-sink side of the data contract: it consumes the
//! aggregator's bundle, the live briefing, and the workflow's document
//! list, and renders them. Absent slices become an explicit
//! "not enough data" line rather than an omission.

use crate::analytics::{AnalyticsBundle, ChartSeries, TrlChart};
use crate::models::{Briefing, DocumentRecord, SynthesisResult};
use crate::report::{BriefingReport, ReportMetadata};
use anyhow::Result;
use std::io::Write;
use std::path::Path;

const NO_DATA: &str = "_Not enough data for this section._";

/// Generate the complete Markdown briefing.
pub fn generate_markdown_report(report: &BriefingReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "# Intelligence Briefing: {}\n\n",
        report.metadata.topic
    ));

    output.push_str(&generate_metadata_section(&report.metadata));

    if let Some(ref briefing) = report.briefing {
        output.push_str(&generate_briefing_section(briefing));
    }

    output.push_str(&generate_synthesis_section(report.bundle.synthesis.as_ref()));
    output.push_str(&generate_convergence_section(&report.bundle));
    output.push_str(&generate_scurve_section(report.bundle.scurve_chart()));
    output.push_str(&generate_trl_section(report.bundle.trl_chart()));
    output.push_str(&generate_documents_section(&report.documents));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Topic:** {}\n", metadata.topic));
    section.push_str(&format!("- **Backend:** {}\n", metadata.backend_url));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Analytics Sources:** {} succeeded, {} unavailable\n",
        metadata.sources_succeeded, metadata.sources_failed
    ));
    section.push_str(&format!(
        "- **Documents Analyzed:** {}\n",
        metadata.documents_analyzed
    ));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n\n",
        metadata.duration_seconds
    ));

    section
}

/// Generate the strategic briefing card (live fast path).
fn generate_briefing_section(briefing: &Briefing) -> String {
    let mut section = String::new();

    section.push_str("## Strategic Briefing\n\n");

    if let Some(ref error) = briefing.error {
        section.push_str(&format!("_Briefing unavailable: {}_\n\n", error));
        return section;
    }

    section.push_str("### Executive Summary\n\n");
    section.push_str(&briefing.strategic_summary);
    section.push_str("\n\n");

    section.push_str("### Aggregate TRL\n\n");
    match briefing.aggregate_trl {
        Some(level) => section.push_str(&format!("**TRL {}**", level)),
        None => section.push_str("**TRL N/A**"),
    }
    if !briefing.trl_justification.is_empty() {
        section.push_str(&format!(" - {}", briefing.trl_justification));
    }
    section.push_str("\n\n");

    if !briefing.key_technologies.is_empty() {
        section.push_str("### Key Technologies\n\n");
        for tech in &briefing.key_technologies {
            section.push_str(&format!("- {}\n", tech));
        }
        section.push('\n');
    }

    if !briefing.emerging_convergences.is_empty() {
        section.push_str("### Emerging Convergences\n\n");
        for relation in &briefing.emerging_convergences {
            section.push_str(&format!(
                "- **{}** {} **{}**\n",
                relation.subject, relation.relationship, relation.object
            ));
        }
        section.push('\n');
    }

    section
}

/// Generate the signal synthesis section.
fn generate_synthesis_section(synthesis: Option<&SynthesisResult>) -> String {
    let mut section = String::new();

    section.push_str("## Signal Analysis\n\n");

    let Some(synthesis) = synthesis else {
        section.push_str(NO_DATA);
        section.push_str("\n\n");
        return section;
    };

    if synthesis.is_error() {
        section.push_str(NO_DATA);
        section.push_str("\n\n");
        return section;
    }

    section.push_str(&format!("**Summary:** {}\n\n", synthesis.overall_summary));

    if !synthesis.emerging_signals.is_empty() {
        section.push_str("**Emerging Signals:**\n\n");
        for signal in &synthesis.emerging_signals {
            section.push_str(&format!("- {}\n", signal));
        }
        section.push('\n');
    }

    if !synthesis.key_players.is_empty() {
        section.push_str("**Key Players:**\n\n");
        for player in &synthesis.key_players {
            section.push_str(&format!("- {}\n", player));
        }
        section.push('\n');
    }

    section
}

/// Generate the technology convergence section, in arrival order.
fn generate_convergence_section(bundle: &AnalyticsBundle) -> String {
    let mut section = String::new();

    section.push_str("## Technology Convergence\n\n");

    match bundle.convergence {
        Some(ref pairs) if !pairs.is_empty() => {
            section.push_str("| Technology | Technology | Strength |\n");
            section.push_str("|:---|:---|:---:|\n");
            for pair in pairs {
                section.push_str(&format!(
                    "| {} | {} | {} |\n",
                    pair.tech_1, pair.tech_2, pair.strength
                ));
            }
            section.push('\n');
        }
        _ => {
            section.push_str(NO_DATA);
            section.push_str("\n\n");
        }
    }

    section
}

/// Generate the S-curve (adoption) section.
fn generate_scurve_section(chart: Option<ChartSeries>) -> String {
    let mut section = String::new();

    section.push_str("## S-Curve (Adoption Rate)\n\n");

    match chart {
        Some(chart) if !chart.labels.is_empty() => {
            section.push_str("| Year | Cumulative Publications |\n");
            section.push_str("|:---|:---:|\n");
            for (label, value) in chart.labels.iter().zip(chart.values.iter()) {
                section.push_str(&format!("| {} | {} |\n", label, value));
            }
            section.push('\n');
        }
        _ => {
            section.push_str(NO_DATA);
            section.push_str("\n\n");
        }
    }

    section
}

/// Generate the TRL progression section with aligned history/forecast rows.
fn generate_trl_section(chart: Option<TrlChart>) -> String {
    let mut section = String::new();

    section.push_str("## TRL Progression & Forecast\n\n");

    match chart {
        Some(chart) if !chart.labels.is_empty() => {
            section.push_str("| Year | Historical Avg. TRL | Forecasted Avg. TRL |\n");
            section.push_str("|:---|:---:|:---:|\n");
            for index in 0..chart.labels.len() {
                section.push_str(&format!(
                    "| {} | {} | {} |\n",
                    chart.labels[index],
                    format_cell(chart.history_values[index]),
                    format_cell(chart.forecast_values[index]),
                ));
            }
            section.push('\n');
        }
        _ => {
            section.push_str(NO_DATA);
            section.push_str("\n\n");
        }
    }

    section
}

/// Format one aligned chart cell; the gap marker is what lets a reader see
/// where history stops and forecast begins.
fn format_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}", v),
        None => "—".to_string(),
    }
}

/// Generate the per-document analysis section.
fn generate_documents_section(documents: &[DocumentRecord]) -> String {
    let mut section = String::new();

    section.push_str("## Analyzed Documents\n\n");

    if documents.is_empty() {
        section.push_str("_No document analyses available yet._\n\n");
        return section;
    }

    section.push_str("| Title | TRL | Company | Published | Country |\n");
    section.push_str("|:---|:---:|:---|:---|:---|\n");
    for doc in documents {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            doc.title,
            doc.trl_display(),
            DocumentRecord::field_display(&doc.provider_company),
            DocumentRecord::field_display(&doc.published),
            DocumentRecord::field_display(&doc.country),
        ));
    }
    section.push('\n');

    for doc in documents {
        if doc.strategic_summary.is_empty() && doc.technologies.is_empty() {
            continue;
        }

        section.push_str(&format!("### {}\n\n", doc.title));
        if !doc.strategic_summary.is_empty() {
            section.push_str(&format!("{}\n\n", doc.strategic_summary));
        }
        if !doc.trl_justification.is_empty() {
            section.push_str(&format!(
                "**TRL {}:** {}\n\n",
                doc.trl_display(),
                doc.trl_justification
            ));
        }
        if !doc.technologies.is_empty() {
            section.push_str(&format!(
                "**Technologies:** {}\n\n",
                doc.technologies.join(", ")
            ));
        }
        for relation in &doc.relationships {
            section.push_str(&format!(
                "- **{}** {} **{}**\n",
                relation.subject, relation.relationship, relation.object
            ));
        }
        if !doc.relationships.is_empty() {
            section.push('\n');
        }
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by techwatch*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &BriefingReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write a rendered report to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
