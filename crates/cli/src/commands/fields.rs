//! Fields Command

use anyhow::{Context, Result};
use clap::Args;
use fieldcheck_common::{FieldSpec, PageConfig};
use serde::Serialize;
use std::path::PathBuf;

use crate::output::{print_info, print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct FieldsArgs {
    /// Page configuration file
    pub config: PathBuf,
}

/// One field spec, flattened for display
#[derive(Debug, Serialize, Clone)]
pub struct FieldRow {
    pub id: String,
    pub kind: String,
    pub label: Option<String>,
    pub label_match: String,
    pub readonly: Option<bool>,
    pub required: Option<bool>,
    pub options: Vec<String>,
    pub wait_timeout_sec: Option<f64>,
}

impl From<&FieldSpec> for FieldRow {
    fn from(spec: &FieldSpec) -> Self {
        Self {
            id: spec.id().to_string(),
            kind: spec.kind().to_string(),
            label: spec.label().map(str::to_string),
            label_match: spec.label_match().to_string(),
            readonly: spec.readonly(),
            required: spec.required(),
            options: spec.options().to_vec(),
            wait_timeout_sec: spec.wait_timeout().map(|d| d.as_secs_f64()),
        }
    }
}

fn tri_state(value: Option<bool>) -> String {
    match value {
        Some(true) => "yes".to_string(),
        Some(false) => "no".to_string(),
        None => "-".to_string(),
    }
}

impl TableDisplay for FieldRow {
    fn headers() -> Vec<&'static str> {
        vec!["Field", "Kind", "Label", "Match", "Readonly", "Required", "Options", "Wait"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.kind.clone(),
            self.label.clone().unwrap_or_else(|| "-".to_string()),
            self.label_match.clone(),
            tri_state(self.readonly),
            tri_state(self.required),
            self.options.join(", "),
            self.wait_timeout_sec.map(|s| format!("{}s", s)).unwrap_or_else(|| "-".to_string()),
        ]
    }
}

pub fn execute(args: FieldsArgs, format: OutputFormat) -> Result<bool> {
    let config = PageConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    let (settings, specs) = config
        .into_specs()
        .with_context(|| format!("Invalid page configuration {}", args.config.display()))?;

    let rows: Vec<FieldRow> = specs.iter().map(FieldRow::from).collect();
    if matches!(format, OutputFormat::Table | OutputFormat::Plain) {
        print_info(&format!(
            "Page '{}': {} field(s), wait {}s, poll {}ms",
            settings.name,
            rows.len(),
            settings.wait_timeout.as_secs(),
            settings.poll_interval.as_millis()
        ));
    }
    print_list(&rows, format);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldcheck_common::{FieldKind, LabelMatch};
    use std::time::Duration;

    #[test]
    fn test_row_flattens_spec() {
        let spec = FieldSpec::new("Type", FieldKind::Choice)
            .with_label("Type", LabelMatch::Substring)
            .with_readonly(false)
            .with_options(["Customer", "Employee"])
            .with_wait_timeout(Duration::from_secs(10));

        let row = FieldRow::from(&spec).row();

        assert_eq!(
            row,
            vec!["Type", "choice", "Type", "substring", "no", "-", "Customer, Employee", "10s"]
        );
    }
}
