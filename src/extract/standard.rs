use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{CandidateSource, ComponentSet, MonetaryCandidate};
use crate::xml::{Locator, NodeId, ParsedDocument};

/// One document-level `cac:TaxSubtotal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSubtotal {
    /// Tax scheme id (e.g. "01" IVA, "04" INC).
    pub scheme: Option<String>,
    pub scheme_name: Option<String>,
    pub percent: Option<Decimal>,
    pub taxable_amount: Option<Decimal>,
    pub tax_amount: Decimal,
}

/// Monetary facts read verbatim from the standard UBL aggregates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandardAmounts {
    /// `LineExtensionAmount`, the subtotal.
    pub line_extension: Option<MonetaryCandidate>,
    pub tax_exclusive: Option<MonetaryCandidate>,
    /// `TaxInclusiveAmount`, the gross total.
    pub tax_inclusive: Option<MonetaryCandidate>,
    pub allowance_total: Option<MonetaryCandidate>,
    pub charge_total: Option<MonetaryCandidate>,
    pub prepaid: Option<MonetaryCandidate>,
    /// `PayableAmount`, the stated total.
    pub payable: Option<MonetaryCandidate>,
    /// Sum of document-level tax subtotals.
    pub tax: Option<MonetaryCandidate>,
    pub tax_subtotals: Vec<TaxSubtotal>,
    /// One entry per `cac:WithholdingTaxTotal`.
    pub withholding: Vec<MonetaryCandidate>,
    pub has_monetary_total: bool,
}

impl StandardAmounts {
    pub fn extract(doc: &ParsedDocument) -> Self {
        let loc = doc.locator();
        let root = doc.root();

        // Debit notes use RequestedMonetaryTotal; some issuers ignore that.
        let preferred = doc.kind().monetary_total_name();
        let total_name = [preferred, "LegalMonetaryTotal", "RequestedMonetaryTotal"]
            .into_iter()
            .find(|name| loc.exists(root, &format!("cac:{name}")));

        let mut amounts = Self {
            has_monetary_total: total_name.is_some(),
            ..Self::default()
        };

        if let Some(total) = total_name {
            let read = |field: &str| {
                let path = format!("cac:{total}/cbc:{field}");
                loc.amount(root, &path).map(|v| {
                    MonetaryCandidate::new(CandidateSource::StandardMonetaryTotal, path, v)
                })
            };
            amounts.line_extension = read("LineExtensionAmount");
            amounts.tax_exclusive = read("TaxExclusiveAmount");
            amounts.tax_inclusive = read("TaxInclusiveAmount");
            amounts.allowance_total = read("AllowanceTotalAmount");
            amounts.charge_total = read("ChargeTotalAmount");
            amounts.prepaid = read("PrepaidAmount");
            amounts.payable = read("PayableAmount");
        }

        amounts.tax_subtotals = read_tax_subtotals(&loc, root);
        amounts.tax = sum_tax(&loc, root, &amounts.tax_subtotals);
        amounts.withholding = read_withholding(&loc, root);
        amounts
    }

    /// Sum of all withholding entries, `None` when the aggregate is absent.
    pub fn withholding_total(&self) -> Option<Decimal> {
        if self.withholding.is_empty() {
            None
        } else {
            Some(self.withholding.iter().map(|c| c.value).sum())
        }
    }

    /// The components as stated by the standard aggregates alone.
    pub fn components(&self) -> ComponentSet {
        ComponentSet {
            subtotal: self.line_extension.clone(),
            tax: self.tax.clone(),
            gross_total: self.tax_inclusive.clone(),
            payable: self.payable.clone(),
            prepaid: self.prepaid.clone(),
            allowance_total: self.allowance_total.clone(),
        }
    }
}

fn read_tax_subtotals(loc: &Locator<'_>, root: NodeId) -> Vec<TaxSubtotal> {
    loc.find_all(root, "cac:TaxTotal/cac:TaxSubtotal")
        .into_iter()
        .filter_map(|node| {
            Some(TaxSubtotal {
                tax_amount: loc.amount(node, "cbc:TaxAmount")?,
                taxable_amount: loc.amount(node, "cbc:TaxableAmount"),
                percent: loc
                    .amount(node, "cac:TaxCategory/cbc:Percent")
                    .or_else(|| loc.amount(node, "cbc:Percent")),
                scheme: loc
                    .text(node, "cac:TaxCategory/cac:TaxScheme/cbc:ID")
                    .map(str::to_string),
                scheme_name: loc
                    .text(node, "cac:TaxCategory/cac:TaxScheme/cbc:Name")
                    .map(str::to_string),
            })
        })
        .collect()
}

/// Tax lines are summed because many of them belong to one document; when a
/// `TaxTotal` carries no subtotals its own `TaxAmount` is used instead.
fn sum_tax(loc: &Locator<'_>, root: NodeId, subtotals: &[TaxSubtotal]) -> Option<MonetaryCandidate> {
    if !subtotals.is_empty() {
        let sum = subtotals.iter().map(|s| s.tax_amount).sum();
        return Some(MonetaryCandidate::new(
            CandidateSource::StandardTaxTotal,
            "cac:TaxTotal/cac:TaxSubtotal/cbc:TaxAmount",
            sum,
        ));
    }
    let totals = loc.amounts(root, "cac:TaxTotal/cbc:TaxAmount");
    if totals.is_empty() {
        return None;
    }
    Some(MonetaryCandidate::new(
        CandidateSource::StandardTaxTotal,
        "cac:TaxTotal/cbc:TaxAmount",
        totals.into_iter().sum(),
    ))
}

fn read_withholding(loc: &Locator<'_>, root: NodeId) -> Vec<MonetaryCandidate> {
    loc.find_all(root, "cac:WithholdingTaxTotal")
        .into_iter()
        .enumerate()
        .filter_map(|(i, node)| {
            if let Some(v) = loc.amount(node, "cbc:TaxAmount") {
                return Some(MonetaryCandidate::new(
                    CandidateSource::StandardWithholding,
                    format!("cac:WithholdingTaxTotal[{}]/cbc:TaxAmount", i + 1),
                    v,
                ));
            }
            let lines = loc.amounts(node, "cac:TaxSubtotal/cbc:TaxAmount");
            if lines.is_empty() {
                return None;
            }
            Some(MonetaryCandidate::new(
                CandidateSource::StandardWithholding,
                format!("cac:WithholdingTaxTotal[{}]/cac:TaxSubtotal/cbc:TaxAmount", i + 1),
                lines.into_iter().sum(),
            ))
        })
        .collect()
}
