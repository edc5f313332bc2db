//! Consistency checks over resolved monetary facts.
//!
//! The reconciler classifies mismatches into typed statuses with an alert
//! level; the validator independently re-checks the monetary equation. Both
//! always produce a result, never an error.

mod reconciler;
mod validator;

pub use reconciler::{reconcile, reconcile_external_total};
pub use validator::{detect_gross_as_payable, validate_monetary};
