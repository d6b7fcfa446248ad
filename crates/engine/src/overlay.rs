//! Option overlay handling for choice fields
//!
//! Option panels are virtualized and fill in asynchronously, so a single read
//! is incomplete for long lists. The overlay is read repeatedly, nudging the
//! panel to its end between reads, until the option count holds still.
//!
//! Only one overlay should be open at a time. Whatever opens an overlay
//! closes it before returning; a failed close is logged and ignored.

use tracing::{debug, info, warn};

use crate::driver::{
    click_with_fallback, find_first, safe_text, scroll_into_view, truncate, ElementHandle, KeyInput, PageDriver,
};
use crate::error::{DriverError, DriverResult, Failure, StepResult};
use crate::poll::{poll_until, poll_until_stable, Polled};
use crate::scripts;
use crate::selectors;
use crate::settings::CheckSettings;

pub struct OptionOverlay<'a> {
    driver: &'a dyn PageDriver,
    settings: &'a CheckSettings,
}

impl<'a> OptionOverlay<'a> {
    pub fn new(driver: &'a dyn PageDriver, settings: &'a CheckSettings) -> Self {
        Self { driver, settings }
    }

    /// Open the overlay of `container` and wait for a first option.
    pub async fn open(&self, container: &ElementHandle) -> StepResult<()> {
        let driver = self.driver;
        scroll_into_view(driver, container).await;

        let trigger = match find_first(driver, Some(container), selectors::OVERLAY_EXPANDER).await {
            Some(icon) => icon,
            None => self
                .find_trigger(container)
                .await
                .ok_or_else(|| Failure::not_found("overlay trigger not found"))?,
        };
        let path = click_with_fallback(driver, &trigger)
            .await
            .map_err(|e| Failure::interaction(format!("cannot open overlay: {}", e)))?;
        debug!(trigger = %trigger, %path, "overlay trigger clicked");

        let policy = self.settings.overlay_open;
        let shown = poll_until(
            policy,
            move || async move {
                driver
                    .find_all(None, selectors::VISIBLE_OPTION)
                    .await
                    .ok()
                    .map(|options| options.len())
            },
            |count| *count > 0,
        )
        .await;
        match shown {
            Polled::Ready(_) => {
                debug!("overlay visible");
                Ok(())
            }
            Polled::TimedOut { .. } => Err(Failure::not_found(format!(
                "overlay not visible: no option rendered within {:?}",
                policy.timeout
            ))),
        }
    }

    async fn find_trigger(&self, container: &ElementHandle) -> Option<ElementHandle> {
        match find_first(self.driver, Some(container), selectors::COMBOBOX).await {
            Some(combobox) => Some(combobox),
            None => find_first(self.driver, Some(container), selectors::OVERLAY_TRIGGER).await,
        }
    }

    /// Distinct, trimmed option texts currently rendered, in panel order.
    pub async fn collect_options(&self) -> DriverResult<Vec<String>> {
        let value = self.driver.execute(&scripts::COLLECT_OPTIONS, &[]).await?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        let raw: Vec<String> = serde_json::from_value(value).map_err(|e| DriverError::ScriptResult {
            name: scripts::COLLECT_OPTIONS.name.to_string(),
            reason: e.to_string(),
        })?;
        let mut options: Vec<String> = Vec::with_capacity(raw.len());
        for text in raw {
            let text = text.trim();
            if !text.is_empty() && !options.iter().any(|o| o == text) {
                options.push(text.to_string());
            }
        }
        Ok(options)
    }

    /// Push virtualized panels to render more rows. Best effort.
    async fn nudge(&self) {
        if let Err(e) = self.driver.execute(&scripts::SCROLL_PANELS_TO_END, &[]).await {
            debug!(error = %e, "panel scroll failed");
        }
        if let Some(panel) = find_first(self.driver, None, selectors::VISIBLE_PANEL).await {
            if let Err(e) = self.driver.send_keys(&panel, &[KeyInput::PageDown]).await {
                debug!(error = %e, "page down on panel failed");
            }
        }
    }

    /// Read options until the count is non-zero and unchanged for the
    /// configured stability window.
    pub async fn read_until_stable(&self) -> StepResult<Vec<String>> {
        let this = self;
        let polled = poll_until_stable(
            self.settings.overlay_read,
            self.settings.option_stability_window,
            move || async move {
                let options = match this.collect_options().await {
                    Ok(options) => Some(options),
                    Err(e) => {
                        debug!(error = %e, "option collection failed");
                        None
                    }
                };
                debug!(?options, "options read");
                this.nudge().await;
                options
            },
            |options| options.len(),
            |count| *count >= 1,
        )
        .await;

        match polled {
            Polled::Ready(options) => {
                info!(count = options.len(), "options collected");
                Ok(options)
            }
            Polled::TimedOut { last: Some(options), attempts } if !options.is_empty() => {
                warn!(count = options.len(), attempts, "options still changing at deadline, using last read");
                Ok(options)
            }
            Polled::TimedOut { .. } => {
                let html = self.overlay_html().await;
                Err(Failure::timeout(format!("no options; overlay html: {}", html)))
            }
        }
    }

    async fn overlay_html(&self) -> String {
        let html = self
            .driver
            .execute(&scripts::OVERLAY_HTML, &[])
            .await
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        truncate(&html, self.settings.overlay_html_len)
    }

    /// Click the visible option whose trimmed text equals `value`.
    pub async fn select(&self, value: &str) -> StepResult<()> {
        let target = value.trim();
        let options = self
            .driver
            .find_all(None, selectors::VISIBLE_OPTION)
            .await
            .map_err(|e| Failure::not_found(format!("option not found: {}: {}", target, e)))?;

        let mut chosen = None;
        for option in options {
            if self.option_matches(&option, target).await {
                chosen = Some(option);
                break;
            }
        }
        let option = chosen.ok_or_else(|| Failure::not_found(format!("option not found: {}", target)))?;

        click_with_fallback(self.driver, &option)
            .await
            .map_err(|e| Failure::interaction(format!("cannot click option {}: {}", target, e)))?;
        debug!(option = %option, value = target, "option clicked");
        Ok(())
    }

    async fn option_matches(&self, option: &ElementHandle, target: &str) -> bool {
        if safe_text(self.driver, option).await == target {
            return true;
        }
        let nested = self
            .driver
            .find_all(Some(option), selectors::OPTION_LABEL)
            .await
            .unwrap_or_default();
        for label in &nested {
            if safe_text(self.driver, label).await == target {
                return true;
            }
        }
        false
    }

    /// Dismiss the overlay with Escape. Failures are logged, never raised.
    pub async fn close(&self) {
        match find_first(self.driver, None, selectors::BODY).await {
            Some(body) => match self.driver.send_keys(&body, &[KeyInput::Escape]).await {
                Ok(()) => debug!("overlay closed via escape"),
                Err(e) => warn!(error = %e, "overlay close failed"),
            },
            None => warn!("overlay close failed: no body element"),
        }
    }

    /// Open, read until stable, close.
    pub async fn read_options(&self, container: &ElementHandle) -> StepResult<Vec<String>> {
        if let Err(failure) = self.open(container).await {
            self.close().await;
            return Err(failure);
        }
        let read = self.read_until_stable().await;
        self.close().await;
        read
    }

    /// Open, pick `value`, close.
    pub async fn choose(&self, container: &ElementHandle, value: &str) -> StepResult<()> {
        if let Err(failure) = self.open(container).await {
            self.close().await;
            return Err(failure);
        }
        let picked = self.select(value).await;
        self.close().await;
        picked
    }
}
