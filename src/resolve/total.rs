use serde::{Deserialize, Serialize};

use crate::core::{ComponentSet, MonetaryCandidate};
use crate::extract::{CustomField, CustomFields, StandardAmounts};

type Lookup = fn(&CustomFields, &StandardAmounts) -> Option<MonetaryCandidate>;

fn custom_authoritative(custom: &CustomFields, _: &StandardAmounts) -> Option<MonetaryCandidate> {
    custom.positive(&CustomField::AuthoritativeTotal)
}

fn custom_alternate(custom: &CustomFields, _: &StandardAmounts) -> Option<MonetaryCandidate> {
    custom.positive(&CustomField::AlternateTotal)
}

fn standard_payable(_: &CustomFields, standard: &StandardAmounts) -> Option<MonetaryCandidate> {
    standard.payable.clone()
}

/// Priority order for the amount payable. First success wins.
const PAYABLE_PRIORITY: [(&str, Lookup); 3] = [
    ("custom-authoritative-total", custom_authoritative),
    ("custom-alternate-total", custom_alternate),
    ("standard-payable-amount", standard_payable),
];

/// A payable candidate together with the rule that found it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// 1 is the highest priority.
    pub rank: usize,
    pub rule: String,
    pub candidate: MonetaryCandidate,
}

/// Pick the amount payable as stated, by rank only.
///
/// No averaging and no cross-checking happens here; `None` means the
/// document states no payable figure anywhere.
pub fn resolve_payable(
    custom: &CustomFields,
    standard: &StandardAmounts,
) -> Option<MonetaryCandidate> {
    PAYABLE_PRIORITY
        .iter()
        .find_map(|(_, lookup)| lookup(custom, standard))
}

/// Every payable candidate in priority order, for the audit trail.
pub fn ranked_payable_candidates(
    custom: &CustomFields,
    standard: &StandardAmounts,
) -> Vec<RankedCandidate> {
    PAYABLE_PRIORITY
        .iter()
        .enumerate()
        .filter_map(|(i, (rule, lookup))| {
            lookup(custom, standard).map(|candidate| RankedCandidate {
                rank: i + 1,
                rule: (*rule).to_string(),
                candidate,
            })
        })
        .collect()
}

/// Whether the document carries an explicit net-of-retention total.
pub fn has_net_total_field(custom: &CustomFields) -> bool {
    custom.candidate(&CustomField::AuthoritativeTotal).is_some()
}

/// Assemble the component set. Standard aggregates are preferred for the
/// base facts; custom fields fill in what the standard leaves out.
pub fn resolve_components(
    custom: &CustomFields,
    standard: &StandardAmounts,
    payable: MonetaryCandidate,
) -> ComponentSet {
    ComponentSet {
        subtotal: standard
            .line_extension
            .clone()
            .or_else(|| custom.candidate(&CustomField::Subtotal)),
        tax: standard
            .tax
            .clone()
            .or_else(|| custom.candidate(&CustomField::Tax)),
        gross_total: standard.tax_inclusive.clone(),
        payable: Some(payable),
        prepaid: standard.prepaid.clone(),
        allowance_total: standard
            .allowance_total
            .clone()
            .or_else(|| custom.candidate(&CustomField::Discount)),
    }
}
