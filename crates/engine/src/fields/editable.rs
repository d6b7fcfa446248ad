//! Typing path shared by text-like kinds

use fieldcheck_common::FieldValue;
use tracing::{debug, warn};

use crate::driver::{click_with_fallback, find_first, ElementHandle, KeyInput, PageDriver, ScriptArg};
use crate::error::{Failure, StepResult};
use crate::scripts;
use crate::selectors;

/// Plain input or textarea, else an ARIA combobox.
pub(super) async fn find_editable(driver: &dyn PageDriver, container: &ElementHandle) -> StepResult<ElementHandle> {
    if let Some(control) = find_first(driver, Some(container), selectors::PLAIN_INPUT).await {
        return Ok(control);
    }
    find_first(driver, Some(container), selectors::COMBOBOX)
        .await
        .ok_or_else(|| Failure::not_found("editable control not found"))
}

/// Replace the control's content with `value`; an empty value clears it.
///
/// Keystrokes first, direct assignment plus an `input` event when keystrokes
/// fail. Either way `change` and `blur` are synthesized afterwards.
pub(super) async fn enter_text(driver: &dyn PageDriver, container: &ElementHandle, value: &str) -> StepResult<String> {
    let control = find_editable(driver, container).await?;
    click_with_fallback(driver, &control)
        .await
        .map_err(|e| Failure::interaction(format!("cannot focus control: {}", e)))?;

    let (action, done) = if value.is_empty() { ("clear", "cleared") } else { ("set", "set") };
    let mut keys = vec![KeyInput::SelectAll, KeyInput::Delete];
    if !value.is_empty() {
        keys.push(KeyInput::Text(value.to_string()));
    }

    let message = match driver.send_keys(&control, &keys).await {
        Ok(()) => format!("value {}", done),
        Err(e) => {
            debug!(control = %control, error = %e, "keystrokes failed, assigning value");
            driver
                .execute(
                    &scripts::ASSIGN_VALUE,
                    &[ScriptArg::from(&control), ScriptArg::Text(value.to_string())],
                )
                .await
                .map_err(|e| Failure::interaction(format!("cannot {} value: {}", action, e)))?;
            format!("value {} via script", done)
        }
    };

    if let Err(e) = driver.execute(&scripts::CHANGE_AND_BLUR, &[ScriptArg::from(&control)]).await {
        warn!(control = %control, error = %e, "change/blur synthesis failed");
    }
    Ok(message)
}

/// Current `value` of the first control matching `selector`, else of the editable control.
pub(super) async fn read_text(
    driver: &dyn PageDriver,
    container: &ElementHandle,
    selector: &str,
) -> StepResult<FieldValue> {
    let control = match find_first(driver, Some(container), selector).await {
        Some(control) => control,
        None => find_editable(driver, container).await?,
    };
    let value = driver
        .attribute(&control, "value")
        .await
        .map_err(|e| Failure::interaction(format!("cannot read value: {}", e)))?;
    Ok(FieldValue::text(value.unwrap_or_default()))
}
