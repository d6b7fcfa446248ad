//! Numeric input fields
//!
//! Values are typed as text; the application does its own parsing.

use async_trait::async_trait;
use fieldcheck_common::{FieldSpec, FieldValue};

use super::editable::{enter_text, read_text};
use super::{FieldContext, FormField};
use crate::driver::{find_first, ElementHandle};
use crate::error::{Failure, StepResult};
use crate::selectors;

pub struct NumberField {
    spec: FieldSpec,
    context: FieldContext,
}

impl NumberField {
    pub fn new(spec: FieldSpec, context: FieldContext) -> Self {
        Self { spec, context }
    }
}

#[async_trait]
impl FormField for NumberField {
    fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    fn context(&self) -> &FieldContext {
        &self.context
    }

    async fn probe_control(&self, container: &ElementHandle) -> StepResult<ElementHandle> {
        find_first(self.context.driver(), Some(container), selectors::NUMBER_CONTROL)
            .await
            .ok_or_else(|| Failure::not_found("number control not found"))
    }

    async fn get_value(&self, container: &ElementHandle) -> StepResult<FieldValue> {
        read_text(self.context.driver(), container, selectors::NUMBER_CONTROL).await
    }

    async fn set_value(&self, container: &ElementHandle, value: &FieldValue) -> StepResult<String> {
        enter_text(self.context.driver(), container, &value.to_string()).await
    }

    async fn clear_value(&self, container: &ElementHandle) -> StepResult<String> {
        enter_text(self.context.driver(), container, "").await
    }
}
