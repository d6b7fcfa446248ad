//! Shared check pipeline
//!
//! Stages run in a fixed order and stop at the first failure. A failing stage
//! attaches what it observed (the label found, the classifier reason, the
//! container markup) so the verdict pinpoints the signal without a second
//! look at the page.

use async_trait::async_trait;
use fieldcheck_common::{Diagnostics, FailureKind, FieldSpec, LabelMatch, Verdict};
use tracing::{debug, info};

use super::FormField;
use crate::classifier::{detect_readonly, detect_required};
use crate::driver::{outer_html, ElementHandle, PageDriver};
use crate::error::{Failure, StepResult};
use crate::label::resolve_label;
use crate::poll::{poll_until, PollPolicy, Polled};

/// Source of a freshly resolved container for one field
#[async_trait]
pub trait ResolveHandle: Send + Sync {
    async fn resolve(&self) -> Option<ElementHandle>;
}

/// Resolves through [`PageDriver::field_fresh`]; lookup errors count as "not yet".
pub struct FreshContainer<'a> {
    driver: &'a dyn PageDriver,
    field_id: &'a str,
}

impl<'a> FreshContainer<'a> {
    pub fn new(driver: &'a dyn PageDriver, field_id: &'a str) -> Self {
        Self { driver, field_id }
    }
}

#[async_trait]
impl<'a> ResolveHandle for FreshContainer<'a> {
    async fn resolve(&self) -> Option<ElementHandle> {
        match self.driver.field_fresh(self.field_id).await {
            Ok(found) => found,
            Err(e) => {
                debug!(field = %self.field_id, error = %e, "field lookup failed");
                None
            }
        }
    }
}

pub async fn run_check<F: FormField + ?Sized>(field: &F, container: &ElementHandle) -> Verdict {
    let id = field.spec().id();
    match run_stages(field, container).await {
        Ok(details) => {
            info!(field = %id, "field is valid");
            let mut verdict = Verdict::pass("field is valid").with_detail("field_id", id);
            verdict.diagnostics.extend(details);
            verdict
        }
        Err(failure) => {
            info!(field = %id, kind = %failure.kind, message = %failure.message, "field check failed");
            failure.with_detail("field_id", id).into_verdict()
        }
    }
}

async fn run_stages<F: FormField + ?Sized>(field: &F, container: &ElementHandle) -> StepResult<Diagnostics> {
    let spec = field.spec();
    let context = field.context();
    let driver = context.driver();
    let mut details = Diagnostics::new();

    if let Err(failure) = field.probe_control(container).await {
        let html = outer_html(driver, container, context.settings().container_html_len).await;
        return Err(failure.with_detail("container_html", html));
    }
    debug!(field = %spec.id(), kind = %spec.kind(), "control present");

    if let Some(found) = check_label(driver, spec, container).await? {
        details.insert("label_found".into(), found.into());
    }
    if let Some(reason) = check_readonly(driver, spec, container).await? {
        details.insert("readonly_reason".into(), reason.into());
    }
    if let Some(reason) = check_required(driver, spec, container).await? {
        details.insert("required_reason".into(), reason.into());
    }

    details.extend(field.check_extra(container).await?);
    Ok(details)
}

/// `Ok(None)` when no label is expected.
async fn check_label(
    driver: &dyn PageDriver,
    spec: &FieldSpec,
    container: &ElementHandle,
) -> StepResult<Option<String>> {
    let Some(expected) = spec.label() else {
        return Ok(None);
    };
    let found = resolve_label(driver, container).await;
    if found.is_empty() {
        return Err(Failure::new(FailureKind::LabelMismatch, "label text is empty").with_detail("label_found", ""));
    }
    if !spec.label_match().matches(expected, &found) {
        let message = match spec.label_match() {
            LabelMatch::Exact => format!("label mismatch: expected '{}', got '{}'", expected, found),
            LabelMatch::Substring => {
                format!("label does not contain expected substring: '{}', got '{}'", expected, found)
            }
        };
        return Err(Failure::new(FailureKind::LabelMismatch, message).with_detail("label_found", found));
    }
    Ok(Some(found))
}

async fn check_readonly(
    driver: &dyn PageDriver,
    spec: &FieldSpec,
    container: &ElementHandle,
) -> StepResult<Option<String>> {
    let Some(expected) = spec.readonly() else {
        return Ok(None);
    };
    let classified = detect_readonly(driver, container).await?;
    state_matches("readonly", expected, classified.restricted, classified.reason)
        .map_err(|failure| failure.with_detail("readonly_signals", classified.signals))
}

async fn check_required(
    driver: &dyn PageDriver,
    spec: &FieldSpec,
    container: &ElementHandle,
) -> StepResult<Option<String>> {
    let Some(expected) = spec.required() else {
        return Ok(None);
    };
    let classified = detect_required(driver, container).await;
    state_matches("required", expected, classified.restricted, classified.reason)
        .map_err(|failure| failure.with_detail("required_signals", classified.signals))
}

fn state_matches(state: &str, expected: bool, actual: bool, reason: String) -> StepResult<Option<String>> {
    match (expected, actual) {
        (true, false) => Err(Failure::new(
            FailureKind::StateMismatch,
            format!("field is not {}: {}", state, reason),
        )
        .with_detail(format!("{}_reason", state), reason)),
        (false, true) => Err(Failure::new(FailureKind::StateMismatch, format!("field is {}: {}", state, reason))
            .with_detail(format!("{}_reason", state), reason)),
        _ => Ok(Some(reason)),
    }
}

/// Returns the first passing verdict, else the last failing one, else
/// "field not found" when no container ever resolved.
pub async fn await_check<F: FormField + ?Sized>(
    field: &F,
    resolver: &dyn ResolveHandle,
    policy: PollPolicy,
) -> Verdict {
    let id = field.spec().id();
    let polled = poll_until(
        policy,
        move || async move {
            match resolver.resolve().await {
                Some(container) => Some(field.check(&container).await),
                None => {
                    debug!(field = %id, "container not resolved yet");
                    None
                }
            }
        },
        |verdict| verdict.ok,
    )
    .await;

    match polled {
        Polled::Ready(verdict) => verdict,
        Polled::TimedOut {
            last: Some(verdict),
            attempts,
        } => {
            info!(field = %id, attempts, message = %verdict.message, "field did not pass before timeout");
            verdict
        }
        Polled::TimedOut { last: None, attempts } => {
            info!(field = %id, attempts, "field never resolved");
            Verdict::not_found(id)
        }
    }
}
