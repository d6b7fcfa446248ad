//! Choice (lookup) fields backed by an option overlay
//!
//! The option check is containment: every expected value must be offered,
//! extra offered values are fine.

use async_trait::async_trait;
use fieldcheck_common::{Diagnostics, FailureKind, FieldSpec, FieldValue};
use tracing::{debug, info};

use super::{FieldContext, FormField};
use crate::driver::{click_with_fallback, find_first, safe_text, ElementHandle, ScriptArg};
use crate::error::{Failure, StepResult};
use crate::overlay::OptionOverlay;
use crate::scripts;
use crate::selectors;

pub struct ChoiceField {
    spec: FieldSpec,
    context: FieldContext,
}

impl ChoiceField {
    pub fn new(spec: FieldSpec, context: FieldContext) -> Self {
        Self { spec, context }
    }

    fn overlay(&self) -> OptionOverlay<'_> {
        OptionOverlay::new(self.context.driver(), self.context.settings())
    }
}

/// Expected values absent from `observed`, in expected order
pub fn missing_options(expected: &[String], observed: &[String]) -> Vec<String> {
    expected
        .iter()
        .map(|value| value.trim())
        .filter(|value| !observed.iter().any(|o| o == value))
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl FormField for ChoiceField {
    fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    fn context(&self) -> &FieldContext {
        &self.context
    }

    async fn probe_control(&self, container: &ElementHandle) -> StepResult<ElementHandle> {
        find_first(self.context.driver(), Some(container), selectors::CHOICE_CONTROL)
            .await
            .ok_or_else(|| Failure::not_found("choice control not found"))
    }

    /// Combobox input value, else the selected chip text.
    async fn get_value(&self, container: &ElementHandle) -> StepResult<FieldValue> {
        let driver = self.context.driver();
        if let Some(combobox) = find_first(driver, Some(container), selectors::COMBOBOX).await {
            if let Ok(Some(value)) = driver.attribute(&combobox, "value").await {
                let value = value.trim();
                if !value.is_empty() {
                    return Ok(FieldValue::text(value));
                }
            }
        }
        let chip = match find_first(driver, Some(container), selectors::SELECTED_CHIP).await {
            Some(chip) => safe_text(driver, &chip).await,
            None => String::new(),
        };
        Ok(FieldValue::text(chip))
    }

    async fn set_value(&self, container: &ElementHandle, value: &FieldValue) -> StepResult<String> {
        let target = value.to_string();
        if target.trim().is_empty() {
            return Err(Failure::interaction("value is empty"));
        }
        self.overlay().choose(container, &target).await?;
        info!(field = %self.spec.id(), value = %target.trim(), "option chosen");
        Ok("value set".to_string())
    }

    /// Clear icon when present, else clear the combobox itself.
    async fn clear_value(&self, container: &ElementHandle) -> StepResult<String> {
        let driver = self.context.driver();
        if let Some(icon) = find_first(driver, Some(container), selectors::CHOICE_CLEAR).await {
            match click_with_fallback(driver, &icon).await {
                Ok(path) => return Ok(format!("value cleared via clear icon ({})", path)),
                Err(e) => debug!(field = %self.spec.id(), error = %e, "clear icon unusable"),
            }
        }
        let combobox = find_first(driver, Some(container), selectors::COMBOBOX)
            .await
            .ok_or_else(|| Failure::not_found("editable control not found"))?;
        match driver.clear(&combobox).await {
            Ok(()) => Ok("value cleared".to_string()),
            Err(e) => {
                debug!(field = %self.spec.id(), error = %e, "clear failed, assigning empty value");
                driver
                    .execute(
                        &scripts::ASSIGN_VALUE,
                        &[ScriptArg::from(&combobox), ScriptArg::Text(String::new())],
                    )
                    .await
                    .map_err(|e| Failure::interaction(format!("cannot clear value: {}", e)))?;
                Ok("value cleared via script".to_string())
            }
        }
    }

    async fn check_extra(&self, container: &ElementHandle) -> StepResult<Diagnostics> {
        let mut details = Diagnostics::new();
        let expected = self.spec.options();
        if expected.is_empty() {
            return Ok(details);
        }
        let observed = self.overlay().read_options(container).await?;
        let missing = missing_options(expected, &observed);
        if !missing.is_empty() {
            return Err(Failure::new(
                FailureKind::OptionsMissing,
                format!("choice options missing values: {:?}; actual: {:?}", missing, observed),
            )
            .with_detail("missing_options", missing)
            .with_detail("options", observed));
        }
        debug!(field = %self.spec.id(), count = observed.len(), "expected options offered");
        details.insert("options".into(), observed.into());
        Ok(details)
    }
}
