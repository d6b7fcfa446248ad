//! Field index
//!
//! Maps each field's stable identifier (its `element-name`) to the handle
//! seen when the page was indexed. The first handle recorded for an
//! identifier wins; later sightings are ignored, since indexing sees the same
//! field on every pass.
//!
//! Handles in the index are a snapshot. Checks always go through
//! [`crate::PageDriver::field_fresh`] instead.

use std::collections::BTreeMap;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::driver::{ElementHandle, PageDriver};
use crate::poll::{Deadline, StabilityWindow};
use crate::selectors;
use crate::settings::CheckSettings;

#[derive(Debug, Clone, Default)]
pub struct FieldIndex {
    fields: BTreeMap<String, ElementHandle>,
}

impl FieldIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `handle` under `id` unless `id` is empty or already known.
    ///
    /// Returns whether the entry was added.
    pub fn add(&mut self, id: &str, handle: ElementHandle) -> bool {
        let id = id.trim();
        if id.is_empty() || self.fields.contains_key(id) {
            return false;
        }
        self.fields.insert(id.to_string(), handle);
        true
    }

    pub fn get(&self, id: &str) -> Option<&ElementHandle> {
        self.fields.get(id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ElementHandle)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// One pass over every field host selector. Returns how many were added.
    async fn scan(&mut self, driver: &dyn PageDriver) -> usize {
        let mut added = 0;
        for selector in selectors::FIELD_HOSTS {
            let hosts = match driver.find_all(None, selector).await {
                Ok(hosts) => hosts,
                Err(e) => {
                    debug!(selector, error = %e, "host lookup failed");
                    continue;
                }
            };
            for host in hosts {
                let id = driver
                    .attribute(&host, selectors::FIELD_ID_ATTR)
                    .await
                    .ok()
                    .flatten()
                    .unwrap_or_default();
                if self.add(&id, host) {
                    added += 1;
                }
            }
        }
        added
    }

    /// Poll the page until the number of indexed fields is non-zero and
    /// unchanged for the configured stability window, or the index timeout
    /// elapses. Whatever was seen by then is returned.
    pub async fn build(driver: &dyn PageDriver, settings: &CheckSettings) -> Self {
        let policy = settings.index;
        let deadline = Deadline::after(policy.timeout);
        let mut window = StabilityWindow::new(settings.index_stability_window);
        let mut index = Self::new();
        loop {
            let added = index.scan(driver).await;
            let total = index.len();
            debug!(total, added, "indexing");
            if window.observe(total, total > 0) {
                break;
            }
            if deadline.expired() {
                warn!(total, "field count still changing at deadline");
                break;
            }
            sleep(policy.interval).await;
        }
        info!(total = index.len(), "fields indexed");
        index
    }
}
