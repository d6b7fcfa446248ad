//! Report Command
//!
//! Renders a [`PageReport`] saved as JSON or YAML.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use fieldcheck_common::{PageReport, Verdict};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::output::{print_error, print_list, print_structured, print_success, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct ReportArgs {
    /// Saved report (.json, .yaml or .yml)
    pub report: PathBuf,

    /// Show failing fields only
    #[arg(long)]
    pub failed: bool,
}

/// One verdict, flattened for display
#[derive(Debug, Serialize, Clone)]
pub struct VerdictRow {
    pub field: String,
    pub ok: bool,
    pub failure: Option<String>,
    pub message: String,
    pub diagnostics: String,
}

impl VerdictRow {
    fn new(field: &str, verdict: &Verdict) -> Self {
        let diagnostics = verdict
            .diagnostics
            .iter()
            .filter(|(key, _)| key.as_str() != "field_id")
            .map(|(key, value)| match value.as_str() {
                Some(text) => format!("{}={}", key, text),
                None => format!("{}={}", key, value),
            })
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            field: field.to_string(),
            ok: verdict.ok,
            failure: verdict.failure.map(|kind| kind.to_string()),
            message: verdict.message.clone(),
            diagnostics,
        }
    }
}

impl TableDisplay for VerdictRow {
    fn headers() -> Vec<&'static str> {
        vec!["Field", "Result", "Failure", "Message", "Diagnostics"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.field.clone(),
            if self.ok { "✅".to_string() } else { "❌".to_string() },
            self.failure.clone().unwrap_or_default(),
            self.message.clone(),
            self.diagnostics.clone(),
        ]
    }
}

pub fn load_report(path: &Path) -> Result<PageReport> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);
    debug!(path = %path.display(), yaml = is_yaml, "loading report");
    let report = if is_yaml {
        serde_yaml::from_str(&content).with_context(|| format!("Invalid YAML report {}", path.display()))?
    } else {
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON report {}", path.display()))?
    };
    Ok(report)
}

/// Returns whether the page passed.
pub fn execute(args: ReportArgs, format: OutputFormat) -> Result<bool> {
    let report = load_report(&args.report)?;

    if print_structured(&report, format) {
        return Ok(report.all_ok);
    }

    let rows: Vec<VerdictRow> = report
        .verdicts
        .iter()
        .filter(|(_, verdict)| !args.failed || !verdict.ok)
        .map(|(field, verdict)| VerdictRow::new(field, verdict))
        .collect();
    print_list(&rows, format);

    let failed = report.failed().count();
    let checked_at = report.checked_at.format("%Y-%m-%d %H:%M:%S UTC");
    if report.all_ok {
        print_success(&format!("Page '{}' passed ({} fields, {})", report.page.bold(), report.verdicts.len(), checked_at));
    } else {
        print_error(&format!(
            "Page '{}' failed: {} of {} fields ({})",
            report.page.bold(),
            failed.to_string().red(),
            report.verdicts.len(),
            checked_at
        ));
    }
    Ok(report.all_ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldcheck_common::FailureKind;
    use std::fs;
    use tempfile::TempDir;

    fn sample() -> PageReport {
        let mut report = PageReport::new("Contact");
        report.record("Dear", Verdict::pass("field is valid").with_detail("field_id", "Dear"));
        report.record(
            "Type",
            Verdict::fail(FailureKind::OptionsMissing, "choice options missing values")
                .with_detail("missing_options", vec!["D"]),
        );
        report
    }

    #[test]
    fn test_report_loaded_from_json_and_yaml() {
        let dir = TempDir::new().unwrap();
        let json = dir.path().join("report.json");
        let yaml = dir.path().join("report.yml");
        fs::write(&json, serde_json::to_string(&sample()).unwrap()).unwrap();
        fs::write(&yaml, serde_yaml::to_string(&sample()).unwrap()).unwrap();

        for path in [json, yaml] {
            let report = load_report(&path).unwrap();
            assert!(!report.all_ok);
            assert_eq!(report.verdicts.len(), 2);
            assert_eq!(report.verdicts["Type"].failure, Some(FailureKind::OptionsMissing));
        }
    }

    #[test]
    fn test_row_hides_field_id_and_flattens_details() {
        let report = sample();
        let dear = VerdictRow::new("Dear", &report.verdicts["Dear"]);
        let kind = VerdictRow::new("Type", &report.verdicts["Type"]);

        assert_eq!(dear.diagnostics, "");
        assert_eq!(kind.failure.as_deref(), Some("options_missing"));
        assert_eq!(kind.diagnostics, r#"missing_options=["D"]"#);
    }
}
