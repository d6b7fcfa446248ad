//! Page registry
//!
//! A [`FormPage`] holds the fields registered for one page and runs their
//! checks one after another against a single shared driver. Every check
//! re-resolves the field's container first; a failing field never stops the
//! rest of the batch.

use std::sync::Arc;
use std::time::Duration;

use fieldcheck_common::{Error, FieldSpec, FieldValue, PageConfig, PageReport, PageSettings, Result, Verdict};
use tracing::{debug, info};

use crate::driver::{ElementHandle, PageDriver};
use crate::error::{Failure, StepResult};
use crate::fields::pipeline::FreshContainer;
use crate::fields::{self, FieldContext, FormField, ResolveHandle};
use crate::index::FieldIndex;
use crate::poll::{poll_until, PollPolicy};
use crate::settings::CheckSettings;
use crate::validation::trigger_required_validation;

pub struct FormPage {
    settings: PageSettings,
    driver: Arc<dyn PageDriver>,
    check_settings: CheckSettings,
    fields: Vec<Box<dyn FormField>>,
}

impl FormPage {
    pub fn new(settings: PageSettings, driver: Arc<dyn PageDriver>) -> Self {
        Self::with_check_settings(settings, driver, CheckSettings::default())
    }

    pub fn with_check_settings(settings: PageSettings, driver: Arc<dyn PageDriver>, check_settings: CheckSettings) -> Self {
        Self {
            settings,
            driver,
            check_settings,
            fields: Vec::new(),
        }
    }

    /// Build a page from a parsed configuration, registering every field.
    pub fn from_config(config: PageConfig, driver: Arc<dyn PageDriver>) -> Result<Self> {
        let (settings, specs) = config.into_specs()?;
        let mut page = Self::new(settings, driver);
        for spec in specs {
            page.register(spec)?;
        }
        Ok(page)
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn settings(&self) -> &PageSettings {
        &self.settings
    }

    /// Register a field. Identifiers must be unique within a page.
    ///
    /// The field's wait timeout, else the page's, also bounds its overlay waits.
    pub fn register(&mut self, spec: FieldSpec) -> Result<()> {
        if self.field(spec.id()).is_some() {
            return Err(Error::DuplicateField(spec.id().to_string()));
        }
        let wait = spec.wait_timeout().unwrap_or(self.settings.wait_timeout);
        let check_settings = self.check_settings.clone().with_overlay_timeout(wait);
        let context = FieldContext::new(Arc::clone(&self.driver), check_settings);
        debug!(page = %self.settings.name, field = %spec.id(), kind = %spec.kind(), "field registered");
        self.fields.push(fields::build(spec, context));
        Ok(())
    }

    pub fn field(&self, id: &str) -> Option<&dyn FormField> {
        self.fields.iter().find(|f| f.spec().id() == id).map(|f| &**f)
    }

    /// Registered identifiers, in registration order
    pub fn field_ids(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.spec().id())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    async fn resolve(&self, id: &str) -> Option<ElementHandle> {
        FreshContainer::new(self.driver.as_ref(), id).resolve().await
    }

    fn unregistered(id: &str) -> Verdict {
        Verdict::not_found(id).with_detail("registered", false)
    }

    fn log_verdict(&self, id: &str, verdict: &Verdict) {
        if self.settings.debug || !verdict.ok {
            info!(page = %self.settings.name, field = %id, ok = verdict.ok, message = %verdict.message, "checked");
        } else {
            debug!(page = %self.settings.name, field = %id, message = %verdict.message, "checked");
        }
    }

    /// Check one field against a freshly resolved container.
    pub async fn check(&self, id: &str) -> Verdict {
        let Some(field) = self.field(id) else {
            return Self::unregistered(id);
        };
        let verdict = match self.resolve(id).await {
            Some(container) => field.check(&container).await,
            None => Verdict::not_found(id),
        };
        self.log_verdict(id, &verdict);
        verdict
    }

    /// Check every registered field, in registration order.
    pub async fn check_all(&self) -> PageReport {
        let mut report = PageReport::new(&self.settings.name);
        for field in &self.fields {
            let id = field.spec().id();
            let verdict = self.check(id).await;
            report.record(id, verdict);
        }
        info!(page = %self.settings.name, all_ok = report.all_ok, fields = report.verdicts.len(), "page checked");
        report
    }

    /// Await policy for a field: explicit `timeout`, else the field's own wait,
    /// else the page default.
    fn await_policy(&self, field: &dyn FormField, timeout: Option<Duration>) -> PollPolicy {
        let timeout = timeout
            .or_else(|| field.spec().wait_timeout())
            .unwrap_or(self.settings.wait_timeout);
        PollPolicy::new(timeout, self.settings.poll_interval)
    }

    /// Re-resolve and re-check one field until it passes or its wait runs out.
    pub async fn await_check(&self, id: &str, timeout: Option<Duration>) -> Verdict {
        let Some(field) = self.field(id) else {
            return Self::unregistered(id);
        };
        let resolver = FreshContainer::new(self.driver.as_ref(), id);
        let verdict = field.await_for_check(&resolver, self.await_policy(field, timeout)).await;
        self.log_verdict(id, &verdict);
        verdict
    }

    /// [`Self::check_all`] with every field awaited, so slow fields get their
    /// full wait before counting as failed.
    pub async fn await_check_all(&self, timeout: Option<Duration>) -> PageReport {
        let mut report = PageReport::new(&self.settings.name);
        for field in &self.fields {
            let id = field.spec().id();
            let verdict = self.await_check(id, timeout).await;
            report.record(id, verdict);
        }
        info!(page = %self.settings.name, all_ok = report.all_ok, fields = report.verdicts.len(), "page checked (awaited)");
        report
    }

    /// Wait for a container to resolve under `id`. Works for unregistered ids.
    pub async fn await_field_present(&self, id: &str, timeout: Duration) -> Option<ElementHandle> {
        let policy = PollPolicy::new(timeout, self.check_settings.await_interval);
        let resolver = FreshContainer::new(self.driver.as_ref(), id);
        let resolver = &resolver;
        poll_until(policy, move || async move { resolver.resolve().await }, |_| true)
            .await
            .ready()
    }

    /// Clear the field, leave it, and report whether the page flags it as required.
    pub async fn reveal_required(&self, id: &str) -> Verdict {
        let Some(field) = self.field(id) else {
            return Self::unregistered(id);
        };
        let Some(container) = self.resolve(id).await else {
            return Verdict::not_found(id);
        };
        let verdict = match trigger_required_validation(field, &container).await {
            Ok(signal) => Verdict::pass("required validation detected")
                .with_detail("field_id", id)
                .with_detail("required_signal", signal),
            Err(failure) => failure.with_detail("field_id", id).into_verdict(),
        };
        self.log_verdict(id, &verdict);
        verdict
    }

    async fn resolve_registered(&self, id: &str) -> StepResult<(&dyn FormField, ElementHandle)> {
        let field = self
            .field(id)
            .ok_or_else(|| Failure::not_found(format!("field not registered: {}", id)))?;
        let container = self
            .resolve(id)
            .await
            .ok_or_else(|| Failure::not_found("field not found").with_detail("field_id", id))?;
        Ok((field, container))
    }

    pub async fn get_value(&self, id: &str) -> StepResult<FieldValue> {
        let (field, container) = self.resolve_registered(id).await?;
        field.get_value(&container).await
    }

    pub async fn set_value(&self, id: &str, value: &FieldValue) -> StepResult<String> {
        let (field, container) = self.resolve_registered(id).await?;
        let message = field.set_value(&container, value).await?;
        debug!(page = %self.settings.name, field = %id, %message, "value written");
        Ok(message)
    }

    pub async fn clear_value(&self, id: &str) -> StepResult<String> {
        let (field, container) = self.resolve_registered(id).await?;
        let message = field.clear_value(&container).await?;
        debug!(page = %self.settings.name, field = %id, %message, "value cleared");
        Ok(message)
    }

    /// Snapshot of every field host currently on the page.
    pub async fn build_index(&self) -> FieldIndex {
        FieldIndex::build(self.driver.as_ref(), &self.check_settings).await
    }
}
