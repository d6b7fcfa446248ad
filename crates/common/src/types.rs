//! Core types for fieldcheck

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Field kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    DateTime,
    Choice,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::DateTime => "datetime",
            FieldKind::Choice => "choice",
        }
    }

    /// Parse a kind name as written in page configurations.
    ///
    /// `LOOKUP` is accepted as an alias of `CHOICE`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "TEXT" => Some(FieldKind::Text),
            "NUMBER" => Some(FieldKind::Number),
            "BOOLEAN" => Some(FieldKind::Boolean),
            "DATETIME" => Some(FieldKind::DateTime),
            "CHOICE" | "LOOKUP" => Some(FieldKind::Choice),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a resolved label is compared with the expected one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMatch {
    /// String equality
    Exact,
    /// Expected text contained in the resolved text
    Substring,
}

impl Default for LabelMatch {
    fn default() -> Self {
        Self::Exact
    }
}

impl LabelMatch {
    pub fn matches(&self, expected: &str, actual: &str) -> bool {
        match self {
            LabelMatch::Exact => actual == expected,
            LabelMatch::Substring => actual.contains(expected),
        }
    }
}

impl std::fmt::Display for LabelMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelMatch::Exact => write!(f, "exact"),
            LabelMatch::Substring => write!(f, "substring"),
        }
    }
}

/// Expected shape of one form field.
///
/// Built once (from configuration or by hand) and never mutated afterwards;
/// every `with_*` method consumes the spec and returns the extended one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    id: String,
    kind: FieldKind,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    label_match: LabelMatch,
    #[serde(default)]
    readonly: Option<bool>,
    #[serde(default)]
    required: Option<bool>,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default, with = "opt_secs")]
    wait_timeout: Option<Duration>,
}

impl FieldSpec {
    pub fn new(id: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            kind,
            label: None,
            label_match: LabelMatch::Exact,
            readonly: None,
            required: None,
            options: Vec::new(),
            wait_timeout: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>, mode: LabelMatch) -> Self {
        self.label = Some(label.into());
        self.label_match = mode;
        self
    }

    pub fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = Some(readonly);
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Expected label; `None` skips the label check
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn label_match(&self) -> LabelMatch {
        self.label_match
    }

    /// Expected readonly state; `None` skips the check
    pub fn readonly(&self) -> Option<bool> {
        self.readonly
    }

    /// Expected required state; `None` skips the check
    pub fn required(&self) -> Option<bool> {
        self.required
    }

    /// Expected choice options; empty skips the check
    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout
    }
}

/// A value written to or read from a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Interpret the value as a checkbox state.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            FieldValue::Text(s) => crate::config::parse_flag(s),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Flag(b) => write!(f, "{}", b),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// Why a check failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Expected control or overlay never appeared
    StructuralNotFound,
    LabelMismatch,
    /// Readonly or required expectation violated
    StateMismatch,
    /// Expected choice values absent
    OptionsMissing,
    /// No fallback path could focus, click or assign
    InteractionFailure,
    /// A polling loop exhausted its deadline
    Timeout,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::StructuralNotFound => write!(f, "structural_not_found"),
            FailureKind::LabelMismatch => write!(f, "label_mismatch"),
            FailureKind::StateMismatch => write!(f, "state_mismatch"),
            FailureKind::OptionsMissing => write!(f, "options_missing"),
            FailureKind::InteractionFailure => write!(f, "interaction_failure"),
            FailureKind::Timeout => write!(f, "timeout"),
        }
    }
}

/// Diagnostic key -> value pairs attached to a verdict
pub type Diagnostics = BTreeMap<String, serde_json::Value>;

/// Outcome of one field check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub ok: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(default)]
    pub diagnostics: Diagnostics,
}

impl Verdict {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            failure: None,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn fail(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            failure: Some(kind),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Verdict for an identifier that never resolved to a live container
    pub fn not_found(field_id: &str) -> Self {
        Self::fail(FailureKind::StructuralNotFound, "field not found").with_detail("field_id", field_id)
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.diagnostics.insert(key.into(), value.into());
        self
    }

    pub fn detail(&self, key: &str) -> Option<&serde_json::Value> {
        self.diagnostics.get(key)
    }
}

/// Result of checking every registered field of a page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    pub page: String,
    pub all_ok: bool,
    pub checked_at: chrono::DateTime<chrono::Utc>,
    pub verdicts: BTreeMap<String, Verdict>,
}

impl PageReport {
    pub fn new(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            all_ok: true,
            checked_at: chrono::Utc::now(),
            verdicts: BTreeMap::new(),
        }
    }

    /// Record a verdict; the page only passes if every field passes.
    pub fn record(&mut self, field_id: impl Into<String>, verdict: Verdict) {
        self.all_ok &= verdict.ok;
        self.verdicts.insert(field_id.into(), verdict);
    }

    pub fn failed(&self) -> impl Iterator<Item = (&String, &Verdict)> {
        self.verdicts.iter().filter(|(_, v)| !v.ok)
    }
}

mod opt_secs {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs = Option::<f64>::deserialize(d)?;
        match secs {
            None => Ok(None),
            Some(s) => Duration::try_from_secs_f64(s).map(Some).map_err(D::Error::custom),
        }
    }
}
