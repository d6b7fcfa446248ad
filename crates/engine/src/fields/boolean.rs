//! Checkbox fields

use async_trait::async_trait;
use fieldcheck_common::{FieldSpec, FieldValue};
use tracing::debug;

use super::{FieldContext, FormField};
use crate::driver::{click_with_fallback, find_first, ClickPath, ElementHandle};
use crate::error::{Failure, StepResult};
use crate::selectors;

pub struct BooleanField {
    spec: FieldSpec,
    context: FieldContext,
}

impl BooleanField {
    pub fn new(spec: FieldSpec, context: FieldContext) -> Self {
        Self { spec, context }
    }

    async fn checkbox(&self, container: &ElementHandle) -> StepResult<ElementHandle> {
        find_first(self.context.driver(), Some(container), selectors::CHECKBOX_CONTROL)
            .await
            .ok_or_else(|| Failure::not_found("checkbox control not found"))
    }
}

#[async_trait]
impl FormField for BooleanField {
    fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    fn context(&self) -> &FieldContext {
        &self.context
    }

    async fn probe_control(&self, container: &ElementHandle) -> StepResult<ElementHandle> {
        self.checkbox(container).await
    }

    async fn get_value(&self, container: &ElementHandle) -> StepResult<FieldValue> {
        let checkbox = self.checkbox(container).await?;
        self.context
            .driver()
            .is_selected(&checkbox)
            .await
            .map(FieldValue::Flag)
            .map_err(|e| Failure::interaction(format!("cannot read checkbox state: {}", e)))
    }

    /// Toggle only when the current state differs from `value`, so repeating
    /// the same target is a no-op.
    async fn set_value(&self, container: &ElementHandle, value: &FieldValue) -> StepResult<String> {
        let target = value
            .as_flag()
            .ok_or_else(|| Failure::interaction(format!("not a checkbox value: {:?}", value.to_string())))?;
        let driver = self.context.driver();
        let checkbox = self.checkbox(container).await?;
        let current = driver.is_selected(&checkbox).await.unwrap_or(false);
        if current == target {
            debug!(field = %self.spec.id(), state = current, "checkbox already in target state");
            return Ok("value unchanged".to_string());
        }
        let path = click_with_fallback(driver, &checkbox)
            .await
            .map_err(|e| Failure::interaction(format!("cannot toggle: {}", e)))?;
        debug!(field = %self.spec.id(), %path, state = target, "checkbox toggled");
        Ok(match path {
            ClickPath::Direct => "value toggled".to_string(),
            ClickPath::Scripted => "value toggled via script".to_string(),
        })
    }

    async fn clear_value(&self, container: &ElementHandle) -> StepResult<String> {
        self.set_value(container, &FieldValue::Flag(false)).await
    }
}
