use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Invoice-family document types accepted by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    /// Commercial invoice.
    Invoice,
    /// Reduces a previous invoice.
    CreditNote,
    /// Increases a previous invoice.
    DebitNote,
}

impl DocumentKind {
    /// Local name of the document root element.
    pub fn root_name(&self) -> &'static str {
        match self {
            Self::Invoice => "Invoice",
            Self::CreditNote => "CreditNote",
            Self::DebitNote => "DebitNote",
        }
    }

    /// Parse from a root element local name.
    pub fn from_root_name(local: &str) -> Option<Self> {
        match local {
            "Invoice" => Some(Self::Invoice),
            "CreditNote" => Some(Self::CreditNote),
            "DebitNote" => Some(Self::DebitNote),
            _ => None,
        }
    }

    /// Local name of the monetary aggregate for this document type.
    /// Debit notes carry `RequestedMonetaryTotal` instead of `LegalMonetaryTotal`.
    pub fn monetary_total_name(&self) -> &'static str {
        match self {
            Self::DebitNote => "RequestedMonetaryTotal",
            _ => "LegalMonetaryTotal",
        }
    }
}

/// Where in the document a monetary fact was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateSource {
    /// Issuer-specific custom field under `ext:UBLExtensions`.
    CustomField,
    /// Standard `LegalMonetaryTotal` / `RequestedMonetaryTotal` aggregate.
    StandardMonetaryTotal,
    /// Standard document-level `TaxTotal` aggregate.
    StandardTaxTotal,
    /// Standard `WithholdingTaxTotal` aggregate.
    StandardWithholding,
}

/// One place in the document where a monetary fact was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonetaryCandidate {
    pub source: CandidateSource,
    /// Element path or custom-field name the value was read from.
    pub field: String,
    pub value: Decimal,
}

impl MonetaryCandidate {
    pub fn new(source: CandidateSource, field: impl Into<String>, value: Decimal) -> Self {
        Self {
            source,
            field: field.into(),
            value,
        }
    }
}

/// Resolved base monetary facts for one document.
///
/// Every present field is a candidate read from the document; nothing here is
/// the result of arithmetic performed by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSet {
    /// Pre-tax base (line extension amount).
    pub subtotal: Option<MonetaryCandidate>,
    /// Tax amount.
    pub tax: Option<MonetaryCandidate>,
    /// Subtotal plus tax, as stated by the document.
    pub gross_total: Option<MonetaryCandidate>,
    /// Amount payable, as stated by the document.
    pub payable: Option<MonetaryCandidate>,
    /// Advance payments already received, as stated.
    pub prepaid: Option<MonetaryCandidate>,
    /// Document-level discount total, as stated.
    pub allowance_total: Option<MonetaryCandidate>,
}

impl ComponentSet {
    pub fn subtotal_value(&self) -> Option<Decimal> {
        self.subtotal.as_ref().map(|c| c.value)
    }

    pub fn tax_value(&self) -> Option<Decimal> {
        self.tax.as_ref().map(|c| c.value)
    }

    pub fn gross_value(&self) -> Option<Decimal> {
        self.gross_total.as_ref().map(|c| c.value)
    }

    pub fn payable_value(&self) -> Option<Decimal> {
        self.payable.as_ref().map(|c| c.value)
    }

    pub fn prepaid_value(&self) -> Option<Decimal> {
        self.prepaid.as_ref().map(|c| c.value)
    }

    pub fn allowance_value(&self) -> Option<Decimal> {
        self.allowance_total.as_ref().map(|c| c.value)
    }
}

/// Audit payload that must accompany an inferred retention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceJustification {
    /// Base the gap was measured from (subtotal + tax, or stated gross).
    pub base: Decimal,
    /// Payable amount the gap was measured against.
    pub payable: Decimal,
    /// `base - payable`.
    pub gap: Decimal,
    pub note: String,
}

/// How the retention amount was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum RetentionMethod {
    /// Declared in an issuer custom field.
    ExplicitCustomField { field: String },
    /// Declared in the standard withholding aggregate.
    ExplicitStandardAggregate { entries: usize },
    /// Inferred from the gap between gross and payable.
    MathematicalInference(InferenceJustification),
    /// Nothing declared and nothing to infer.
    NoneDeclared,
}

/// The resolved withholding amount plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionResult {
    pub amount: Decimal,
    #[serde(flatten)]
    pub method: RetentionMethod,
}

impl RetentionResult {
    /// Zero retention, nothing declared.
    pub fn none_declared() -> Self {
        Self {
            amount: Decimal::ZERO,
            method: RetentionMethod::NoneDeclared,
        }
    }

    pub fn is_inferred(&self) -> bool {
        matches!(self.method, RetentionMethod::MathematicalInference(_))
    }

    /// `true` when the amount came from the document itself.
    pub fn is_declared(&self) -> bool {
        matches!(
            self.method,
            RetentionMethod::ExplicitCustomField { .. }
                | RetentionMethod::ExplicitStandardAggregate { .. }
        )
    }
}

/// Classification of a reconciliation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReconciliationStatus {
    Match,
    RetentionNotDeclared,
    RetentionExceedsExpectation,
    AdvancePaymentApplied,
    UndeclaredDiscount,
    MissingNetTotalField,
    UnexplainedCriticalDiscrepancy,
}

impl ReconciliationStatus {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::RetentionNotDeclared => "retention-not-declared",
            Self::RetentionExceedsExpectation => "retention-exceeds-expectation",
            Self::AdvancePaymentApplied => "advance-payment-applied",
            Self::UndeclaredDiscount => "undeclared-discount",
            Self::MissingNetTotalField => "missing-net-total-field",
            Self::UnexplainedCriticalDiscrepancy => "unexplained-critical-discrepancy",
        }
    }
}

impl std::fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Alert levels, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertLevel {
    None,
    Info,
    Warning,
    High,
    Critical,
}

/// Outcome of cross-checking resolved monetary facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub status: ReconciliationStatus,
    pub alert: AlertLevel,
    pub requires_review: bool,
    /// Unexplained amount (zero on a match).
    pub discrepancy: Decimal,
    pub explanation: String,
    /// Free-form audit payload.
    pub analysis: serde_json::Value,
}

/// Verdict of the `subtotal + tax - retention = payable` check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "kebab-case")]
pub enum ValidationVerdict {
    Pass {
        difference: Decimal,
    },
    Fail {
        expected: Decimal,
        stated: Decimal,
        difference: Decimal,
    },
    /// A term of the equation is absent from the document.
    NotEvaluable {
        missing: Vec<String>,
    },
}

/// Result of the independent monetary equation check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonetaryValidation {
    #[serde(flatten)]
    pub verdict: ValidationVerdict,
    pub findings: Vec<ValidationError>,
}

impl MonetaryValidation {
    pub fn passed(&self) -> bool {
        matches!(self.verdict, ValidationVerdict::Pass { .. })
    }
}

/// Detection of a payable field that carries the gross figure.
/// `payable` is always the stated value, unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrossPayableCheck {
    pub payable: Decimal,
    pub gross_reported_as_payable: bool,
    pub finding: Option<ValidationError>,
}

/// Name and tax identifier of a party.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyIdentity {
    pub name: Option<String>,
    /// Tax identifier (`CompanyID`), e.g. a NIT.
    pub company_id: Option<String>,
}

/// Identification fields of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIdentification {
    pub kind: DocumentKind,
    pub number: Option<String>,
    /// Unique fiscal identifier (`cbc:UUID`, e.g. CUFE/CUDE).
    pub fiscal_id: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub issue_time: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub type_code: Option<String>,
    pub currency: Option<String>,
    pub supplier: PartyIdentity,
    pub customer: PartyIdentity,
}

/// A custom field the engine did not use, kept for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFieldAudit {
    pub name: String,
    pub value: String,
}

/// Processing metadata attached to every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    pub algorithm_version: String,
    pub elapsed_micros: u64,
    pub processed_at: DateTime<Utc>,
    /// The invoice was unwrapped from an `AttachedDocument`.
    pub from_attached_document: bool,
    pub has_custom_fields: bool,
}

/// Final output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceMonetaryRecord {
    pub identification: DocumentIdentification,
    pub components: ComponentSet,
    pub retention: RetentionResult,
    /// Amount payable exactly as the document states it.
    pub stated_payable: Decimal,
    /// `stated_payable - retention`. Advisory while a review is pending.
    pub corrected_payable: Decimal,
    pub reconciliation: ReconciliationReport,
    pub validation: MonetaryValidation,
    pub gross_payable_check: GrossPayableCheck,
    pub unrecognized_custom_fields: Vec<CustomFieldAudit>,
    pub metadata: ProcessingMetadata,
}

impl InvoiceMonetaryRecord {
    pub fn requires_review(&self) -> bool {
        self.reconciliation.requires_review
    }
}
