//! Label resolution for a field container
//!
//! First success wins:
//! 1. `aria-label` on the inner control
//! 2. elements referenced by the control's `aria-labelledby`, joined by spaces
//! 3. the first label-bearing element inside the container with text
//!
//! An empty string means "label not found". Any lookup error just fails that
//! step.

use tracing::debug;

use crate::driver::{find_first, safe_text, ElementHandle, PageDriver};
use crate::selectors;

pub async fn resolve_label(driver: &dyn PageDriver, container: &ElementHandle) -> String {
    if let Some(control) = find_first(driver, Some(container), selectors::LABELLED_CONTROL).await {
        if let Ok(Some(aria)) = driver.attribute(&control, "aria-label").await {
            let aria = aria.trim();
            if !aria.is_empty() {
                debug!(container = %container, "label from aria-label");
                return aria.to_string();
            }
        }

        if let Ok(Some(ids)) = driver.attribute(&control, "aria-labelledby").await {
            let mut parts = Vec::new();
            for id in ids.split_whitespace() {
                if let Ok(Some(referenced)) = driver.find_by_id(id).await {
                    let text = safe_text(driver, &referenced).await;
                    if !text.is_empty() {
                        parts.push(text);
                    }
                }
            }
            let joined = parts.join(" ");
            let joined = joined.trim();
            if !joined.is_empty() {
                debug!(container = %container, "label from aria-labelledby");
                return joined.to_string();
            }
        }
    }

    for selector in selectors::LABELS {
        let Ok(candidates) = driver.find_all(Some(container), selector).await else {
            continue;
        };
        for candidate in &candidates {
            let text = safe_text(driver, candidate).await;
            if !text.is_empty() {
                debug!(container = %container, selector, "label from container");
                return text;
            }
        }
    }

    String::new()
}
