//! Lint Command
//!
//! Loads every page configuration it is pointed at and reports whether each
//! one yields a valid set of field specs.

use anyhow::{bail, Result};
use clap::Args;
use fieldcheck_common::{ConfigFormat, PageConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::output::{print_error, print_list, print_success, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct LintArgs {
    /// Configuration files, or directories searched recursively
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

/// Lint outcome for one file
#[derive(Debug, Serialize, Clone)]
pub struct LintResult {
    pub path: String,
    pub ok: bool,
    pub page: Option<String>,
    pub fields: usize,
    pub error: Option<String>,
}

impl TableDisplay for LintResult {
    fn headers() -> Vec<&'static str> {
        vec!["File", "Status", "Page", "Fields", "Error"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.path.clone(),
            if self.ok { "✅ ok".to_string() } else { "❌ invalid".to_string() },
            self.page.clone().unwrap_or_default(),
            self.fields.to_string(),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

/// Expand directories into the configuration files below them, sorted.
pub fn collect_configs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut files: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| ConfigFormat::from_path(p).is_some())
                .collect();
            files.sort();
            debug!(dir = %path.display(), count = files.len(), "configs found");
            found.extend(files);
        } else {
            found.push(path.clone());
        }
    }
    found
}

pub fn lint_file(path: &Path) -> LintResult {
    let loaded = PageConfig::load(path).and_then(|config| config.into_specs());
    match loaded {
        Ok((settings, specs)) => LintResult {
            path: path.display().to_string(),
            ok: true,
            page: Some(settings.name),
            fields: specs.len(),
            error: None,
        },
        Err(e) => LintResult {
            path: path.display().to_string(),
            ok: false,
            page: None,
            fields: 0,
            error: Some(e.to_string()),
        },
    }
}

/// Returns whether every file passed.
pub fn execute(args: LintArgs, format: OutputFormat) -> Result<bool> {
    let files = collect_configs(&args.paths);
    if files.is_empty() {
        bail!("no configuration files found");
    }

    let results: Vec<LintResult> = files.iter().map(|f| lint_file(f)).collect();
    let failed = results.iter().filter(|r| !r.ok).count();
    print_list(&results, format);

    if matches!(format, OutputFormat::Table | OutputFormat::Plain) {
        if failed == 0 {
            print_success(&format!("{} configuration(s) valid", results.len()));
        } else {
            print_error(&format!("{} of {} configuration(s) invalid", failed, results.len()));
        }
    }
    Ok(failed == 0)
}
