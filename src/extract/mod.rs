//! Candidate extraction from a loaded document.
//!
//! Two independent candidate sets are produced: issuer custom fields
//! ([`CustomFields`]) and the standard UBL aggregates ([`StandardAmounts`]).
//! Nothing here ranks or combines them; that is the resolver's job.

mod custom;
mod identity;
mod standard;

pub use custom::{CustomField, CustomFieldEntry, CustomFields};
pub use identity::identify;
pub use standard::{StandardAmounts, TaxSubtotal};
