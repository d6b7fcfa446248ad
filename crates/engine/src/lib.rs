//! Fieldcheck validation engine
//!
//! Checks that the fields of a live, continuously re-rendering web form match
//! their expected shape: label, readonly and required state, and for choice
//! fields the offered options. Every wait is a bounded poll, so a check always
//! ends in a verdict even when the page never settles.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  FormPage                                                    │
//! │    ├── register(FieldSpec)                                   │
//! │    ├── check(id) / check_all() -> PageReport                 │
//! │    └── await_check(id) / await_check_all() -> PageReport     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  FormField (Text, Number, Boolean, DateTime, Choice)         │
//! │    ├── probe_control / get_value / set_value / clear_value   │
//! │    └── check ── pipeline: probe ► label ► readonly ►         │
//! │                           required ► kind extras            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  label::resolve_label   classifier::detect_readonly/required │
//! │  overlay::OptionOverlay validation::trigger_required_...     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  poll: poll_until / poll_until_stable                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PageDriver (supplied by the browser session owner)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod classifier;
pub mod driver;
pub mod error;
pub mod fields;
pub mod index;
pub mod label;
pub mod overlay;
pub mod page;
pub mod poll;
pub mod scripts;
pub mod selectors;
pub mod settings;
pub mod validation;

pub use driver::{ElementHandle, KeyInput, PageDriver, ScriptArg};
pub use error::{DriverError, DriverResult, Failure, StepResult};
pub use fields::{FieldContext, FormField, ResolveHandle};
pub use index::FieldIndex;
pub use page::FormPage;
pub use poll::{PollPolicy, Polled};
pub use scripts::Script;
pub use settings::CheckSettings;
