//! Error types for the validation engine
//!
//! [`DriverError`] is what a page driver reports. It never crosses a component
//! boundary: each component converts it into a [`Failure`] on the spot, and
//! the check pipeline folds failures into a failing [`Verdict`].

use fieldcheck_common::{Diagnostics, FailureKind, Verdict};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("no such element: {0}")]
    NoSuchElement(String),

    #[error("stale element reference: {0}")]
    StaleElement(String),

    #[error("element not interactable: {0}")]
    NotInteractable(String),

    #[error("script {name} failed: {reason}")]
    Script { name: String, reason: String },

    #[error("unexpected script result for {name}: {reason}")]
    ScriptResult { name: String, reason: String },

    #[error("driver error: {0}")]
    Other(String),
}

pub type DriverResult<T> = Result<T, DriverError>;

/// A step that could not complete, with whatever it observed on the way
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    pub diagnostics: Diagnostics,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.diagnostics.insert(key.into(), value.into());
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FailureKind::StructuralNotFound, message)
    }

    pub fn interaction(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InteractionFailure, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Timeout, message)
    }

    pub fn into_verdict(self) -> Verdict {
        let mut verdict = Verdict::fail(self.kind, self.message);
        verdict.diagnostics.extend(self.diagnostics);
        verdict
    }
}

pub type StepResult<T> = Result<T, Failure>;
