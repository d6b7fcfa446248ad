//! Page configuration loading
//!
//! A page configuration names a page and lists the fields expected on it.
//! JSON, YAML and TOML are accepted, chosen by file extension. Parsing is
//! tolerant about how booleans are spelled and strict about everything else:
//! the result is a list of immutable [`FieldSpec`]s or a configuration error.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{FieldKind, FieldSpec, LabelMatch};

/// Page-level settings derived from a configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSettings {
    pub name: String,
    /// Default per-field wait used by awaited checks
    pub wait_timeout: Duration,
    pub poll_interval: Duration,
    pub debug: bool,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            name: default_name(),
            wait_timeout: Duration::from_secs(default_wait_timeout_sec()),
            poll_interval: Duration::from_millis(default_poll_interval_ms()),
            debug: false,
        }
    }
}

/// Supported configuration encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// A page configuration as written on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_wait_timeout_sec")]
    pub wait_timeout_sec: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub debug: Option<RawFlag>,

    #[serde(default)]
    pub fields: Vec<RawField>,
}

/// One field entry as written on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawField {
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub code: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub readonly: Option<RawFlag>,

    #[serde(default)]
    pub required: Option<RawFlag>,

    #[serde(default)]
    pub strict_title: Option<RawFlag>,

    #[serde(default, alias = "options")]
    pub lookup_values: Option<Vec<String>>,

    #[serde(default)]
    pub wait_timeout_sec: Option<u64>,
}

/// A boolean written loosely: `true`, `1`, `"yes"`, `"off"`...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFlag {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawFlag {
    pub fn resolve(&self) -> Option<bool> {
        match self {
            RawFlag::Bool(b) => Some(*b),
            RawFlag::Int(i) => Some(*i != 0),
            RawFlag::Float(f) => Some(*f != 0.0),
            RawFlag::Text(s) => parse_flag(s),
        }
    }
}

/// Parse a loosely written boolean.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn default_name() -> String {
    "Page".to_string()
}

fn default_wait_timeout_sec() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    250
}

impl PageConfig {
    /// Load a configuration file, picking the decoder from its extension
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.display().to_string()));
        }
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), ?format, "loading page config");
        Self::parse(&content, format)
    }

    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Toml => toml::from_str(content)?,
        };
        Ok(config)
    }

    /// Validate the configuration and produce page settings plus field specs
    pub fn into_specs(self) -> Result<(PageSettings, Vec<FieldSpec>)> {
        let name = match self.name.trim() {
            "" => default_name(),
            trimmed => trimmed.to_string(),
        };
        let debug = match &self.debug {
            None => false,
            Some(flag) => flag
                .resolve()
                .ok_or_else(|| Error::InvalidConfig(format!("invalid debug flag: {:?}", flag)))?,
        };
        if self.poll_interval_ms == 0 {
            return Err(Error::InvalidConfig("poll_interval_ms must be positive".to_string()));
        }
        let settings = PageSettings {
            name,
            wait_timeout: Duration::from_secs(self.wait_timeout_sec),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            debug,
        };

        if self.fields.is_empty() {
            return Err(Error::InvalidConfig("fields array is empty".to_string()));
        }

        let mut seen = HashSet::new();
        let mut specs = Vec::with_capacity(self.fields.len());
        for (index, raw) in self.fields.into_iter().enumerate() {
            let spec = raw.into_spec(index)?;
            if !seen.insert(spec.id().to_string()) {
                return Err(Error::DuplicateField(spec.id().to_string()));
            }
            specs.push(spec);
        }
        Ok((settings, specs))
    }
}

impl RawField {
    fn into_spec(self, index: usize) -> Result<FieldSpec> {
        let kind = FieldKind::parse(&self.kind).ok_or_else(|| Error::UnknownFieldKind {
            index,
            raw: self.kind.trim().to_ascii_uppercase(),
        })?;

        let code = self.code.trim().to_string();
        if code.is_empty() {
            return Err(Error::InvalidConfig(format!("missing code for field at index {}", index)));
        }

        let flag = |name: &str, raw: &Option<RawFlag>| -> Result<Option<bool>> {
            match raw {
                None => Ok(None),
                Some(f) => f
                    .resolve()
                    .map(Some)
                    .ok_or_else(|| Error::InvalidConfig(format!("invalid {} for field {}", name, code))),
            }
        };
        let readonly = flag("readonly", &self.readonly)?;
        let required = flag("required", &self.required)?;
        let strict = flag("strict_title", &self.strict_title)?.unwrap_or(true);

        let mut spec = FieldSpec::new(code.clone(), kind);
        if let Some(title) = self.title {
            let mode = if strict { LabelMatch::Exact } else { LabelMatch::Substring };
            spec = spec.with_label(title, mode);
        }
        if let Some(ro) = readonly {
            spec = spec.with_readonly(ro);
        }
        if let Some(rq) = required {
            spec = spec.with_required(rq);
        }
        if let Some(values) = self.lookup_values {
            if kind != FieldKind::Choice {
                return Err(Error::InvalidConfig(format!(
                    "lookup_values only apply to choice fields, field {} is {}",
                    code, kind
                )));
            }
            spec = spec.with_options(values);
        }
        if let Some(secs) = self.wait_timeout_sec {
            spec = spec.with_wait_timeout(Duration::from_secs(secs));
        }
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const CONTACTS_YAML: &str = r#"
name: Contacts
wait_timeout_sec: 45
debug: "yes"
fields:
  - type: TEXT
    code: Dear
    title: "Recipient's name"
    readonly: true
  - type: lookup
    code: Type
    title: Type
    strict_title: "off"
    readonly: 0
    lookup_values: [Customer, Employee]
    wait_timeout_sec: 10
  - type: BOOLEAN
    code: DoNotUseEmail
    required: "n"
"#;

    #[test]
    fn test_parse_yaml_page() {
        let config = PageConfig::parse(CONTACTS_YAML, ConfigFormat::Yaml).unwrap();
        let (settings, specs) = config.into_specs().unwrap();
        assert_eq!(settings.name, "Contacts");
        assert_eq!(settings.wait_timeout, Duration::from_secs(45));
        assert!(settings.debug);
        assert_eq!(specs.len(), 3);

        let dear = &specs[0];
        assert_eq!(dear.kind(), FieldKind::Text);
        assert_eq!(dear.label(), Some("Recipient's name"));
        assert_eq!(dear.label_match(), LabelMatch::Exact);
        assert_eq!(dear.readonly(), Some(true));
        assert_eq!(dear.required(), None);

        let ty = &specs[1];
        assert_eq!(ty.kind(), FieldKind::Choice);
        assert_eq!(ty.label_match(), LabelMatch::Substring);
        assert_eq!(ty.readonly(), Some(false));
        assert_eq!(ty.options(), ["Customer".to_string(), "Employee".to_string()]);
        assert_eq!(ty.wait_timeout(), Some(Duration::from_secs(10)));

        assert_eq!(specs[2].required(), Some(false));
    }

    #[test]
    fn test_parse_toml_page() {
        let toml = r#"
name = "Accounts"

[[fields]]
type = "NUMBER"
code = "Employees"
title = "Employees"
readonly = false
"#;
        let (settings, specs) = PageConfig::parse(toml, ConfigFormat::Toml)
            .unwrap()
            .into_specs()
            .unwrap();
        assert_eq!(settings.name, "Accounts");
        assert_eq!(settings.wait_timeout, Duration::from_secs(30));
        assert_eq!(specs[0].kind(), FieldKind::Number);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let json = r#"{"fields": [{"type": "slider", "code": "Volume"}]}"#;
        let err = PageConfig::parse(json, ConfigFormat::Json)
            .unwrap()
            .into_specs()
            .unwrap_err();
        assert!(matches!(err, Error::UnknownFieldKind { index: 0, .. }));
    }

    #[test]
    fn test_empty_fields_rejected() {
        let json = r#"{"name": "Empty"}"#;
        let err = PageConfig::parse(json, ConfigFormat::Json)
            .unwrap()
            .into_specs()
            .unwrap_err();
        assert!(err.to_string().contains("fields array is empty"));
    }

    #[test]
    fn test_missing_code_rejected() {
        let json = r#"{"fields": [{"type": "TEXT", "code": "  "}]}"#;
        let err = PageConfig::parse(json, ConfigFormat::Json)
            .unwrap()
            .into_specs()
            .unwrap_err();
        assert!(err.to_string().contains("missing code for field at index 0"));
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let json = r#"{"fields": [{"type": "TEXT", "code": "Dear"}, {"type": "NUMBER", "code": "Dear"}]}"#;
        let err = PageConfig::parse(json, ConfigFormat::Json)
            .unwrap()
            .into_specs()
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateField(id) if id == "Dear"));
    }

    #[test]
    fn test_options_on_text_field_rejected() {
        let json = r#"{"fields": [{"type": "TEXT", "code": "Dear", "options": ["a"]}]}"#;
        let err = PageConfig::parse(json, ConfigFormat::Json)
            .unwrap()
            .into_specs()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_invalid_flag_names_field() {
        let json = r#"{"fields": [{"type": "TEXT", "code": "Dear", "readonly": "sometimes"}]}"#;
        let err = PageConfig::parse(json, ConfigFormat::Json)
            .unwrap()
            .into_specs()
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid configuration: invalid readonly for field Dear");
    }

    #[test_case("true", Some(true))]
    #[test_case(" Yes ", Some(true))]
    #[test_case("ON", Some(true))]
    #[test_case("0", Some(false))]
    #[test_case("n", Some(false))]
    #[test_case("perhaps", None)]
    fn test_parse_flag(raw: &str, expected: Option<bool>) {
        assert_eq!(parse_flag(raw), expected);
    }

    #[test]
    fn test_load_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.yml");
        std::fs::write(&path, CONTACTS_YAML).unwrap();
        let config = PageConfig::load(&path).unwrap();
        assert_eq!(config.name, "Contacts");

        let missing = dir.path().join("absent.json");
        assert!(matches!(PageConfig::load(&missing), Err(Error::ConfigNotFound(_))));

        let odd = dir.path().join("page.ini");
        std::fs::write(&odd, "").unwrap();
        assert!(matches!(PageConfig::load(&odd), Err(Error::UnsupportedFormat(_))));
    }
}
