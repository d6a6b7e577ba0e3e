//! Reporting and output generation
//!
//! Global invariants enforced:
//! - Deterministic output ordering
//! - Byte-for-byte identical output across runs

use crate::consensus::ConsensusResult;
use crate::engine::ClaimCheck;
use crate::result::{Approach, ComplexityResult, Correction};
use serde::Serialize;

/// Analysis of one file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub file: String,
    pub language: String,
    pub result: ComplexityResult,
}

/// Sort reports deterministically (file path ascending)
pub fn sort_reports(mut reports: Vec<FileReport>) -> Vec<FileReport> {
    reports.sort_by(|a, b| a.file.cmp(&b.file).then_with(|| a.language.cmp(&b.language)));
    reports
}

/// Render reports as a text table, corrections indented under their file
pub fn render_text(reports: &[FileReport]) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:<14} {:<14} {:<6} {:<24} {}\n",
        "TIME", "SPACE", "CONF", "SOURCE", "FILE"
    ));

    for report in reports {
        let r = &report.result;
        output.push_str(&format!(
            "{:<14} {:<14} {:<6} {:<24} {}\n",
            r.time_complexity.as_str(),
            r.space_complexity.as_str(),
            format!("{:.2}", r.confidence),
            truncate_or_pad(&r.source, 24),
            report.file,
        ));
        push_corrections(&mut output, &r.corrections_applied);
    }

    output
}

/// Render reports as JSON output
pub fn render_json(reports: &[FileReport]) -> String {
    to_json(reports)
}

/// Pretty JSON for any report value
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

/// One verdict with its reasons
pub fn render_result_text(result: &ComplexityResult) -> String {
    let mut output = String::new();
    output.push_str(&format!("time:   {}  ({})\n", result.time_complexity, result.time_complexity_reason));
    output.push_str(&format!("space:  {}  ({})\n", result.space_complexity, result.space_complexity_reason));
    if result.space_metrics.total != result.space_metrics.peak {
        output.push_str(&format!(
            "        peak {}, total {}\n",
            result.space_metrics.peak, result.space_metrics.total
        ));
    }
    if let Some(ref pattern) = result.pattern {
        output.push_str(&format!("pattern: {}\n", pattern));
    }
    output.push_str(&format!("source: {} (confidence {:.2})\n", result.source, result.confidence));
    push_corrections(&mut output, &result.corrections_applied);
    output
}

pub fn render_claim_text(check: &ClaimCheck) -> String {
    let verdict = if check.valid { "VALID" } else { "CORRECTED" };
    format!("{}\n{}", verdict, render_result_text(&check.corrected_result))
}

pub fn render_consensus_text(result: &ConsensusResult) -> String {
    let mut output = String::new();
    let verdict = if result.valid { "VALID" } else { "CORRECTED" };
    output.push_str(&format!(
        "{} (source {}, confidence {:.2})\n",
        verdict, result.source, result.confidence
    ));
    output.push_str(&format!("{:<12} {:<14} {:<14} {}\n", "APPROACH", "TIME", "SPACE", "SOURCE"));
    for approach in [Approach::BruteForce, Approach::Better, Approach::Optimal] {
        match result.solution.get(approach) {
            Some(a) => output.push_str(&format!(
                "{:<12} {:<14} {:<14} {}\n",
                approach.as_str(),
                a.time_complexity.as_str(),
                a.space_complexity.as_str(),
                a.source,
            )),
            None => output.push_str(&format!("{:<12} {:<14} {:<14} -\n", approach.as_str(), "-", "-")),
        }
    }
    push_corrections(&mut output, &result.corrections);
    for note in &result.notes {
        output.push_str(&format!("  note: {}\n", note));
    }
    output
}

fn push_corrections(output: &mut String, corrections: &[Correction]) {
    for c in corrections {
        let field = match c.field {
            crate::result::CorrectedField::TimeComplexity => "time",
            crate::result::CorrectedField::SpaceComplexity => "space",
            crate::result::CorrectedField::Presence => "presence",
        };
        output.push_str(&format!(
            "  corrected {} {}: {} -> {} ({})\n",
            c.approach, field, c.old_value, c.new_value, c.reason
        ));
    }
}

/// Truncate or pad string to fixed width
fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        format!("{:<width$}", s, width = width)
    }
}
