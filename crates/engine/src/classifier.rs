//! Readonly and required classification
//!
//! Both classifiers work in two halves: collection turns markup into a bag of
//! named boolean signals, and a pure aggregation turns the bag into a
//! [`Classification`]. No single signal is authoritative.
//!
//! Readonly is an OR over every restrictive signal, except that a host
//! explicitly marked `readonly="false"` is editable when nothing else fires.
//! Required is a plain OR: there is no reliable "explicitly not required"
//! signal, so it has no override.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::driver::{find_first, ElementHandle, PageDriver, ScriptArg};
use crate::error::{Failure, StepResult};
use crate::scripts;
use crate::selectors;

/// Aggregated verdict plus every signal that contributed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub restricted: bool,
    pub signals: Vec<&'static str>,
    pub reason: String,
}

/// Raw readonly state as returned by [`scripts::READONLY_SIGNALS`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawReadonlyState {
    pub host_readonly: Option<String>,
    pub host_disabled: Option<String>,
    pub has_lock_icon: bool,
    pub inputs: Vec<RawControlState>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawControlState {
    pub readonly_attr: Option<String>,
    pub disabled_attr: Option<String>,
    pub aria_readonly: Option<String>,
    pub aria_disabled: Option<String>,
    pub read_only_prop: bool,
    pub disabled_prop: bool,
}

/// An attribute is set when present and empty, `true`, `1` or its own name.
pub fn attr_true(value: Option<&str>, attr_name: &str) -> bool {
    match value {
        None => false,
        Some(v) => {
            let v = v.trim().to_ascii_lowercase();
            v.is_empty() || v == "true" || v == "1" || v == attr_name
        }
    }
}

/// An attribute is explicitly unset only when its value is `false`.
pub fn attr_false(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("false"))
}

pub(crate) fn aria_true(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadonlySignals {
    pub lock_icon: bool,
    pub host_readonly: bool,
    /// Host carries `readonly="false"`
    pub host_editable: bool,
    pub host_disabled: bool,
    pub control_readonly_attr: bool,
    pub control_disabled_attr: bool,
    pub aria_readonly: bool,
    pub aria_disabled: bool,
    pub readonly_prop: bool,
    pub disabled_prop: bool,
}

impl ReadonlySignals {
    pub fn from_raw(raw: &RawReadonlyState) -> Self {
        let mut signals = Self {
            lock_icon: raw.has_lock_icon,
            host_readonly: attr_true(raw.host_readonly.as_deref(), "readonly"),
            host_editable: attr_false(raw.host_readonly.as_deref()),
            host_disabled: attr_true(raw.host_disabled.as_deref(), "disabled"),
            ..Self::default()
        };
        for input in &raw.inputs {
            signals.control_readonly_attr |= attr_true(input.readonly_attr.as_deref(), "readonly");
            signals.control_disabled_attr |= attr_true(input.disabled_attr.as_deref(), "disabled");
            signals.aria_readonly |= aria_true(input.aria_readonly.as_deref());
            signals.aria_disabled |= aria_true(input.aria_disabled.as_deref());
            signals.readonly_prop |= input.read_only_prop;
            signals.disabled_prop |= input.disabled_prop;
        }
        signals
    }

    /// Names of every restrictive signal that fired, in a fixed order
    pub fn fired(&self) -> Vec<&'static str> {
        [
            (self.lock_icon, "lock icon"),
            (self.host_readonly, "host readonly"),
            (self.host_disabled, "host disabled"),
            (self.control_readonly_attr, "input readonly attr"),
            (self.control_disabled_attr, "input disabled attr"),
            (self.aria_readonly, "aria-readonly=true"),
            (self.aria_disabled, "aria-disabled=true"),
            (self.readonly_prop, "input.readOnly"),
            (self.disabled_prop, "input.disabled"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }

    pub fn classify(&self) -> Classification {
        let fired = self.fired();
        if fired.is_empty() {
            let reason = if self.host_editable {
                "editable (host readonly='false')"
            } else {
                "no readonly signals"
            };
            return Classification {
                restricted: false,
                signals: fired,
                reason: reason.to_string(),
            };
        }
        Classification {
            restricted: true,
            reason: fired.join(", "),
            signals: fired,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequiredSignals {
    pub aria_required: bool,
    pub required_attr: bool,
    pub label_marker: bool,
}

impl RequiredSignals {
    pub fn fired(&self) -> Vec<&'static str> {
        [
            (self.aria_required, "aria-required=true"),
            (self.required_attr, "required attr"),
            (self.label_marker, "required label marker"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }

    pub fn classify(&self) -> Classification {
        let fired = self.fired();
        if fired.is_empty() {
            return Classification {
                restricted: false,
                signals: fired,
                reason: "no required signals".to_string(),
            };
        }
        Classification {
            restricted: true,
            reason: fired.join(", "),
            signals: fired,
        }
    }
}

/// Collect readonly signals for a container in one batched in-page query.
pub async fn readonly_signals(driver: &dyn PageDriver, container: &ElementHandle) -> StepResult<ReadonlySignals> {
    let value = driver
        .execute(&scripts::READONLY_SIGNALS, &[ScriptArg::from(container)])
        .await
        .map_err(|e| Failure::interaction(format!("cannot read readonly signals: {}", e)))?;
    let raw: RawReadonlyState = serde_json::from_value(value)
        .map_err(|e| Failure::interaction(format!("unexpected readonly signal payload: {}", e)))?;
    Ok(ReadonlySignals::from_raw(&raw))
}

pub async fn detect_readonly(driver: &dyn PageDriver, container: &ElementHandle) -> StepResult<Classification> {
    let signals = readonly_signals(driver, container).await?;
    let verdict = signals.classify();
    debug!(container = %container, readonly = verdict.restricted, reason = %verdict.reason, "readonly classified");
    Ok(verdict)
}

/// Collect required signals from the container's controls and labels.
///
/// Lookup failures count as "signal absent".
pub async fn required_signals(driver: &dyn PageDriver, container: &ElementHandle) -> RequiredSignals {
    let mut signals = RequiredSignals::default();
    let controls = driver
        .find_all(Some(container), selectors::LABELLED_CONTROL)
        .await
        .unwrap_or_default();
    for control in &controls {
        if aria_true(driver.attribute(control, "aria-required").await.ok().flatten().as_deref()) {
            signals.aria_required = true;
        }
        if matches!(driver.attribute(control, "required").await, Ok(Some(_))) {
            signals.required_attr = true;
        }
        if !signals.label_marker {
            signals.label_marker = labelled_by_required(driver, control).await;
        }
    }
    if !signals.label_marker {
        signals.label_marker = find_first(driver, Some(container), selectors::REQUIRED_LABEL).await.is_some();
    }
    signals
}

/// Whether any label referenced through `aria-labelledby` carries a `required` class
async fn labelled_by_required(driver: &dyn PageDriver, control: &ElementHandle) -> bool {
    let Ok(Some(ids)) = driver.attribute(control, "aria-labelledby").await else {
        return false;
    };
    for id in ids.split_whitespace() {
        let Ok(Some(label)) = driver.find_by_id(id).await else {
            continue;
        };
        if let Ok(Some(class)) = driver.attribute(&label, "class").await {
            if class.split_whitespace().any(|c| c == "required") {
                return true;
            }
        }
    }
    false
}

pub async fn detect_required(driver: &dyn PageDriver, container: &ElementHandle) -> Classification {
    let verdict = required_signals(driver, container).await.classify();
    debug!(container = %container, required = verdict.restricted, reason = %verdict.reason, "required classified");
    verdict
}
