//! # ubl-monetary
//!
//! Monetary extraction and reconciliation for UBL 2.1 electronic invoices,
//! credit notes and debit notes issued by heterogeneous providers.
//!
//! One XML document goes in; one [`InvoiceMonetaryRecord`] comes out, holding
//! the subtotal, tax, retention and amount payable exactly as the document
//! states them, each traced to the element or custom field it came from, plus
//! a reconciliation report that classifies any internal inconsistency.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//! The engine never computes a figure the document does not assert, except a
//! retention inferred from the gross/payable gap, which is always tagged as
//! [`RetentionMethod::MathematicalInference`] with its justification.
//!
//! ## Quick Start
//!
//! ```rust
//! use ubl_monetary::{ReconciliationStatus, process};
//! use rust_decimal_macros::dec;
//!
//! let xml = br#"<Invoice
//!     xmlns:cac="urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2"
//!     xmlns:cbc="urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2">
//!   <cbc:ID>FE-1</cbc:ID>
//!   <cac:WithholdingTaxTotal><cbc:TaxAmount>25.00</cbc:TaxAmount></cac:WithholdingTaxTotal>
//!   <cac:LegalMonetaryTotal>
//!     <cbc:LineExtensionAmount>1000.00</cbc:LineExtensionAmount>
//!     <cbc:TaxInclusiveAmount>1000.00</cbc:TaxInclusiveAmount>
//!     <cbc:PayableAmount>975.00</cbc:PayableAmount>
//!   </cac:LegalMonetaryTotal>
//! </Invoice>"#;
//!
//! let record = process(xml).unwrap();
//! assert_eq!(record.retention.amount, dec!(25.00));
//! assert_eq!(record.reconciliation.status, ReconciliationStatus::Match);
//! assert!(!record.requires_review());
//! ```
//!
//! ## Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`core`] | Record types, errors, amount parsing, monetary policy |
//! | [`xml`] | Document loader, element tree, field locator |
//! | [`extract`] | Custom-field and standard monetary extractors |
//! | [`resolve`] | Total and retention resolvers |
//! | [`reconcile`] | Reconciler and monetary validator |
//! | [`pipeline`] | [`MonetaryEngine`] facade |

pub mod core;
pub mod extract;
pub mod pipeline;
pub mod reconcile;
pub mod resolve;
pub mod xml;

// Re-export core types at crate root for convenience
pub use crate::core::*;
pub use crate::pipeline::{MonetaryEngine, PipelineStage, process};
