//! Page driver port
//!
//! The engine never talks to a browser directly. Whoever owns the browser
//! session implements [`PageDriver`] and hands it to the engine as an
//! `Arc<dyn PageDriver>`. The driver is a single shared resource; the engine
//! never issues two interactions against it concurrently.
//!
//! Containers are re-resolved through [`PageDriver::field_fresh`] before every
//! check. Handles are never cached across checks because the application under
//! test tears containers down and re-renders them on its own schedule.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DriverResult;
use crate::scripts::Script;

/// Opaque reference to a live element, as issued by the driver
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementHandle(String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keyboard input sent to an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyInput {
    /// Ctrl+A
    SelectAll,
    Delete,
    Escape,
    PageDown,
    Tab,
    Text(String),
}

/// Argument passed to a scripted execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptArg {
    Element(ElementHandle),
    Text(String),
}

impl From<&ElementHandle> for ScriptArg {
    fn from(el: &ElementHandle) -> Self {
        ScriptArg::Element(el.clone())
    }
}

#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Re-resolve the container registered under `field_id`
    async fn field_fresh(&self, field_id: &str) -> DriverResult<Option<ElementHandle>>;

    /// Find every element matching `selector` below `scope` (whole document when `None`)
    async fn find_all(
        &self,
        scope: Option<&ElementHandle>,
        selector: &str,
    ) -> DriverResult<Vec<ElementHandle>>;

    async fn find_by_id(&self, id: &str) -> DriverResult<Option<ElementHandle>>;

    /// Rendered (visible) text
    async fn text(&self, el: &ElementHandle) -> DriverResult<String>;

    async fn attribute(&self, el: &ElementHandle, name: &str) -> DriverResult<Option<String>>;

    async fn is_selected(&self, el: &ElementHandle) -> DriverResult<bool>;

    async fn click(&self, el: &ElementHandle) -> DriverResult<()>;

    async fn send_keys(&self, el: &ElementHandle, keys: &[KeyInput]) -> DriverResult<()>;

    async fn clear(&self, el: &ElementHandle) -> DriverResult<()>;

    async fn execute(&self, script: &Script, args: &[ScriptArg]) -> DriverResult<serde_json::Value>;
}

/// First element matching `selector` below `scope`, if any.
///
/// Lookup errors count as "not found".
pub async fn find_first(
    driver: &dyn PageDriver,
    scope: Option<&ElementHandle>,
    selector: &str,
) -> Option<ElementHandle> {
    driver
        .find_all(scope, selector)
        .await
        .ok()
        .and_then(|found| found.into_iter().next())
}

/// Rendered text, falling back to `textContent`, trimmed. Empty on any error.
pub async fn safe_text(driver: &dyn PageDriver, el: &ElementHandle) -> String {
    if let Ok(text) = driver.text(el).await {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    if let Ok(Some(content)) = driver.attribute(el, "textContent").await {
        let trimmed = content.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    String::new()
}

/// Click directly, falling back to a scripted click.
///
/// Returns which path worked.
pub async fn click_with_fallback(driver: &dyn PageDriver, el: &ElementHandle) -> DriverResult<ClickPath> {
    match driver.click(el).await {
        Ok(()) => Ok(ClickPath::Direct),
        Err(direct) => {
            tracing::debug!(element = %el, error = %direct, "direct click failed, using scripted click");
            driver
                .execute(&crate::scripts::CLICK, &[ScriptArg::from(el)])
                .await
                .map(|_| ClickPath::Scripted)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickPath {
    Direct,
    Scripted,
}

impl std::fmt::Display for ClickPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClickPath::Direct => write!(f, "direct"),
            ClickPath::Scripted => write!(f, "scripted"),
        }
    }
}

/// Bring an element into the viewport. Best effort.
pub async fn scroll_into_view(driver: &dyn PageDriver, el: &ElementHandle) {
    if let Err(e) = driver.execute(&crate::scripts::SCROLL_INTO_VIEW, &[ScriptArg::from(el)]).await {
        tracing::warn!(element = %el, error = %e, "scroll into view failed");
    }
}

/// Single-line outer HTML of an element, truncated to `max_len` characters.
pub async fn outer_html(driver: &dyn PageDriver, el: &ElementHandle, max_len: usize) -> String {
    let html = driver
        .execute(&crate::scripts::OUTER_HTML, &[ScriptArg::from(el)])
        .await
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    truncate(&html.trim().replace('\n', ""), max_len)
}

pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_len).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_marks_cut() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
