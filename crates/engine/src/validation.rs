//! Required-validation trigger
//!
//! Some forms only reveal required state after interaction. Clearing the
//! field and moving focus away makes the application validate it; the first
//! of `aria-invalid="true"` on the control or a non-empty message in the
//! subscript region counts as the field being required.

use tracing::{debug, info, warn};

use crate::classifier::aria_true;
use crate::driver::{find_first, safe_text, ElementHandle, PageDriver, ScriptArg};
use crate::error::{Failure, StepResult};
use crate::fields::FormField;
use crate::poll::{poll_until, Polled};
use crate::scripts;
use crate::selectors;

/// Clear, blur, then wait for a validation signal. Returns the signal seen.
pub async fn trigger_required_validation(field: &dyn FormField, container: &ElementHandle) -> StepResult<String> {
    let id = field.spec().id();
    let driver = field.context().driver();
    let policy = field.context().settings().required_validation;

    let cleared = field.clear_value(container).await?;
    debug!(field = %id, %cleared, "value cleared for validation");

    let control = find_first(driver, Some(container), selectors::LABELLED_CONTROL).await;
    if let Some(control) = &control {
        if let Err(e) = driver.execute(&scripts::BLUR, &[ScriptArg::from(control)]).await {
            warn!(field = %id, error = %e, "blur failed");
        }
    }

    let control = control.as_ref();
    let polled = poll_until(
        policy,
        move || async move { validation_signal(driver, container, control).await },
        |_| true,
    )
    .await;

    match polled {
        Polled::Ready(signal) => {
            info!(field = %id, %signal, "required validation detected");
            Ok(signal)
        }
        Polled::TimedOut { .. } => Err(Failure::timeout("no required validation detected")),
    }
}

async fn validation_signal(
    driver: &dyn PageDriver,
    container: &ElementHandle,
    control: Option<&ElementHandle>,
) -> Option<String> {
    if let Some(control) = control {
        let invalid = driver.attribute(control, "aria-invalid").await.ok().flatten();
        if aria_true(invalid.as_deref()) {
            return Some("aria-invalid=true".to_string());
        }
    }
    let messages = driver
        .find_all(Some(container), selectors::VALIDATION_MESSAGE)
        .await
        .unwrap_or_default();
    for message in &messages {
        let text = safe_text(driver, message).await;
        if !text.is_empty() {
            return Some(format!("validation message: {}", text));
        }
    }
    None
}
