//! Polymorphic field model
//!
//! Every field kind implements [`FormField`]. A kind only decides how its
//! control is recognized and how values are read and written; the composite
//! check is the shared pipeline in [`pipeline`], so every kind validates
//! label, readonly and required state the same way.
//!
//! # Check order
//!
//! ```text
//! probe_control ──► label ──► readonly ──► required ──► check_extra ──► pass
//!       │             │           │            │             │
//!       └─────────────┴───────────┴────────────┴─────────────┴──► first failure
//! ```
//!
//! Fields never hold on to a container. Every operation takes a handle the
//! caller has just re-resolved.

mod boolean;
mod choice;
mod datetime;
mod editable;
mod number;
pub mod pipeline;
mod text;

use std::sync::Arc;

use async_trait::async_trait;
use fieldcheck_common::{Diagnostics, FieldKind, FieldSpec, FieldValue, Verdict};

use crate::driver::{ElementHandle, PageDriver};
use crate::error::StepResult;
use crate::poll::PollPolicy;
use crate::settings::CheckSettings;

pub use boolean::BooleanField;
pub use choice::ChoiceField;
pub use datetime::DateTimeField;
pub use number::NumberField;
pub use pipeline::ResolveHandle;
pub use text::TextField;

/// Driver and tuning shared by every field of a page
#[derive(Clone)]
pub struct FieldContext {
    driver: Arc<dyn PageDriver>,
    settings: Arc<CheckSettings>,
}

impl FieldContext {
    pub fn new(driver: Arc<dyn PageDriver>, settings: CheckSettings) -> Self {
        Self {
            driver,
            settings: Arc::new(settings),
        }
    }

    pub fn driver(&self) -> &dyn PageDriver {
        self.driver.as_ref()
    }

    pub fn settings(&self) -> &CheckSettings {
        &self.settings
    }
}

impl std::fmt::Debug for FieldContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldContext").field("settings", &self.settings).finish_non_exhaustive()
    }
}

#[async_trait]
pub trait FormField: Send + Sync {
    fn spec(&self) -> &FieldSpec;

    fn context(&self) -> &FieldContext;

    /// Find the kind-specific control inside `container`.
    async fn probe_control(&self, container: &ElementHandle) -> StepResult<ElementHandle>;

    async fn get_value(&self, container: &ElementHandle) -> StepResult<FieldValue>;

    /// Write `value`. The message says which path took effect.
    async fn set_value(&self, container: &ElementHandle, value: &FieldValue) -> StepResult<String>;

    async fn clear_value(&self, container: &ElementHandle) -> StepResult<String>;

    /// Checks specific to the kind, run after the shared ones pass.
    async fn check_extra(&self, _container: &ElementHandle) -> StepResult<Diagnostics> {
        Ok(Diagnostics::new())
    }

    async fn check(&self, container: &ElementHandle) -> Verdict {
        pipeline::run_check(self, container).await
    }

    /// Re-resolve and re-check until a check passes or `policy` runs out.
    async fn await_for_check(&self, resolver: &dyn ResolveHandle, policy: PollPolicy) -> Verdict {
        pipeline::await_check(self, resolver, policy).await
    }
}

/// Build the field implementation for `spec.kind()`.
pub fn build(spec: FieldSpec, context: FieldContext) -> Box<dyn FormField> {
    match spec.kind() {
        FieldKind::Text => Box::new(TextField::new(spec, context)),
        FieldKind::Number => Box::new(NumberField::new(spec, context)),
        FieldKind::Boolean => Box::new(BooleanField::new(spec, context)),
        FieldKind::DateTime => Box::new(DateTimeField::new(spec, context)),
        FieldKind::Choice => Box::new(ChoiceField::new(spec, context)),
    }
}
