use rust_decimal::Decimal;
use serde_json::json;

use crate::core::policy::{ROUNDING_TOLERANCE, within_rounding};
use crate::core::{
    AlertLevel, ComponentSet, InvoiceMonetaryRecord, ReconciliationReport, ReconciliationStatus,
    RetentionResult, format_decimal,
};

fn report(
    status: ReconciliationStatus,
    alert: AlertLevel,
    discrepancy: Decimal,
    explanation: String,
    analysis: serde_json::Value,
) -> ReconciliationReport {
    ReconciliationReport {
        status,
        alert,
        requires_review: status != ReconciliationStatus::Match
            && status != ReconciliationStatus::AdvancePaymentApplied,
        discrepancy,
        explanation,
        analysis,
    }
}

fn method_code(retention: &RetentionResult) -> &'static str {
    use crate::core::RetentionMethod::*;
    match retention.method {
        ExplicitCustomField { .. } => "explicit-custom-field",
        ExplicitStandardAggregate { .. } => "explicit-standard-aggregate",
        MathematicalInference(_) => "mathematical-inference",
        NoneDeclared => "none-declared",
    }
}

/// Cross-check resolved components against the retention.
///
/// The gap the document implies (`gross - payable`) must equal the retention
/// within [`ROUNDING_TOLERANCE`]. Every other outcome is classified, never
/// corrected. `has_net_total_field` tells whether the document carries an
/// explicit net-of-retention total.
pub fn reconcile(
    components: &ComponentSet,
    retention: &RetentionResult,
    has_net_total_field: bool,
) -> ReconciliationReport {
    let stated_gross = components.gross_value();
    let derived_gross = match (components.subtotal_value(), components.tax_value()) {
        (Some(s), Some(t)) => Some(s + t),
        _ => None,
    };
    let (Some(payable), Some(gross)) = (components.payable_value(), stated_gross.or(derived_gross))
    else {
        return report(
            ReconciliationStatus::Match,
            AlertLevel::Info,
            Decimal::ZERO,
            "gross total not available; nothing to cross-check".into(),
            json!({
                "payable": components.payable_value().map(|v| v.to_string()),
                "retention": retention.amount.to_string(),
                "retention_method": method_code(retention),
                "has_net_total_field": has_net_total_field,
            }),
        );
    };

    let expected_gap = gross - payable;
    let actual_gap = retention.amount;
    let residual = expected_gap - actual_gap;
    let prepaid = components.prepaid_value().unwrap_or(Decimal::ZERO);

    let analysis = json!({
        "gross_total": gross.to_string(),
        "gross_source": if stated_gross.is_some() { "stated" } else { "subtotal-plus-tax" },
        "payable": payable.to_string(),
        "retention": actual_gap.to_string(),
        "retention_method": method_code(retention),
        "expected_gap": expected_gap.to_string(),
        "actual_gap": actual_gap.to_string(),
        "residual": residual.to_string(),
        "prepaid": prepaid.to_string(),
        "allowance_total": components.allowance_value().map(|v| v.to_string()),
        "retention_inferred": retention.is_inferred(),
        "tolerance": ROUNDING_TOLERANCE.to_string(),
        "has_net_total_field": has_net_total_field,
    });

    // An inferred retention closes the gap by construction; only a document
    // with no net total field to confirm the figure needs escalating.
    if retention.is_inferred() && !has_net_total_field {
        return report(
            ReconciliationStatus::MissingNetTotalField,
            AlertLevel::High,
            actual_gap,
            format!(
                "retention of {} inferred from the gross/payable gap; document has no net total field to confirm it",
                format_decimal(actual_gap)
            ),
            analysis,
        );
    }

    if residual.abs() <= ROUNDING_TOLERANCE {
        return report(
            ReconciliationStatus::Match,
            AlertLevel::None,
            residual,
            "gross minus payable equals retention".into(),
            analysis,
        );
    }

    if actual_gap > Decimal::ZERO && !has_net_total_field && within_rounding(payable, gross) {
        return report(
            ReconciliationStatus::MissingNetTotalField,
            AlertLevel::High,
            actual_gap,
            format!(
                "payable {} equals gross total; retention {} is not netted and no net total field exists",
                format_decimal(payable),
                format_decimal(actual_gap)
            ),
            analysis,
        );
    }

    if prepaid > Decimal::ZERO && within_rounding(residual, prepaid) {
        return report(
            ReconciliationStatus::AdvancePaymentApplied,
            AlertLevel::Info,
            residual - prepaid,
            format!(
                "gap of {} explained by prepaid amount {}",
                format_decimal(residual),
                format_decimal(prepaid)
            ),
            analysis,
        );
    }

    if actual_gap > Decimal::ZERO && residual < Decimal::ZERO {
        return report(
            ReconciliationStatus::RetentionExceedsExpectation,
            AlertLevel::Warning,
            -residual,
            format!(
                "declared retention {} exceeds the gross/payable gap {} by {}",
                format_decimal(actual_gap),
                format_decimal(expected_gap),
                format_decimal(-residual)
            ),
            analysis,
        );
    }

    report(
        ReconciliationStatus::UnexplainedCriticalDiscrepancy,
        AlertLevel::Critical,
        residual.abs(),
        format!(
            "gross {} minus payable {} leaves {} unexplained by retention {}",
            format_decimal(gross),
            format_decimal(payable),
            format_decimal(residual),
            format_decimal(actual_gap)
        ),
        analysis,
    )
}

/// Compare the document's own payable against a total from another source
/// (e.g. the printed representation of the same invoice).
pub fn reconcile_external_total(
    stated_payable: Decimal,
    retention: &RetentionResult,
    external_total: Decimal,
) -> ReconciliationReport {
    let difference = stated_payable - external_total;
    let analysis = json!({
        "stated_payable": stated_payable.to_string(),
        "external_total": external_total.to_string(),
        "difference": difference.to_string(),
        "retention": retention.amount.to_string(),
        "retention_method": method_code(retention),
        "tolerance": ROUNDING_TOLERANCE.to_string(),
    });

    if difference.abs() <= ROUNDING_TOLERANCE {
        return report(
            ReconciliationStatus::Match,
            AlertLevel::None,
            difference,
            "document total matches external total".into(),
            analysis,
        );
    }

    if difference > Decimal::ZERO {
        if retention.amount > Decimal::ZERO && within_rounding(difference, retention.amount) {
            return report(
                ReconciliationStatus::RetentionNotDeclared,
                AlertLevel::Warning,
                difference,
                format!(
                    "external total is lower by {}, the retention the document payable does not net",
                    format_decimal(difference)
                ),
                analysis,
            );
        }
        return report(
            ReconciliationStatus::UndeclaredDiscount,
            AlertLevel::Warning,
            difference,
            format!(
                "external total is lower by {} with no declared retention or discount to explain it",
                format_decimal(difference)
            ),
            analysis,
        );
    }

    report(
        ReconciliationStatus::UnexplainedCriticalDiscrepancy,
        AlertLevel::Critical,
        -difference,
        format!(
            "external total exceeds document payable by {}",
            format_decimal(-difference)
        ),
        analysis,
    )
}

impl InvoiceMonetaryRecord {
    /// Compare this record's stated payable against an external total.
    pub fn reconcile_external_total(&self, external_total: Decimal) -> ReconciliationReport {
        reconcile_external_total(self.stated_payable, &self.retention, external_total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CandidateSource, InferenceJustification, MonetaryCandidate, RetentionMethod};
    use rust_decimal_macros::dec;

    fn c(value: Decimal) -> Option<MonetaryCandidate> {
        Some(MonetaryCandidate::new(
            CandidateSource::StandardMonetaryTotal,
            "test",
            value,
        ))
    }

    fn set(subtotal: Decimal, tax: Decimal, gross: Decimal, payable: Decimal) -> ComponentSet {
        ComponentSet {
            subtotal: c(subtotal),
            tax: c(tax),
            gross_total: c(gross),
            payable: c(payable),
            ..ComponentSet::default()
        }
    }

    fn declared(amount: Decimal) -> RetentionResult {
        RetentionResult {
            amount,
            method: RetentionMethod::ExplicitCustomField {
                field: "TotalRetenciones".into(),
            },
        }
    }

    fn inferred(amount: Decimal) -> RetentionResult {
        RetentionResult {
            amount,
            method: RetentionMethod::MathematicalInference(InferenceJustification {
                base: dec!(0),
                payable: dec!(0),
                gap: amount,
                note: "test".into(),
            }),
        }
    }

    #[test]
    fn consistent_netting_is_a_match() {
        let r = reconcile(
            &set(dec!(1000), dec!(190), dec!(1190), dec!(1165)),
            &declared(dec!(25)),
            true,
        );
        assert_eq!(r.status, ReconciliationStatus::Match);
        assert_eq!(r.alert, AlertLevel::None);
        assert!(!r.requires_review);
        assert_eq!(r.analysis["expected_gap"], "25");
    }

    #[test]
    fn gross_reported_as_payable_without_net_field() {
        let r = reconcile(
            &set(
                dec!(86420243.28),
                dec!(16460998.72),
                dec!(102881242.00),
                dec!(102881242.00),
            ),
            &declared(dec!(4310724.05)),
            false,
        );
        assert_eq!(r.status, ReconciliationStatus::MissingNetTotalField);
        assert_eq!(r.alert, AlertLevel::High);
        assert!(r.requires_review);
        assert_eq!(r.discrepancy, dec!(4310724.05));
    }

    #[test]
    fn inferred_retention_is_flagged() {
        let components = set(dec!(1860700), dec!(0), dec!(1860700), dec!(1814182));
        let r = reconcile(&components, &inferred(dec!(46518)), false);
        assert_eq!(r.status, ReconciliationStatus::MissingNetTotalField);
        assert_eq!(r.alert, AlertLevel::High);
        assert!(r.requires_review);
        assert_eq!(r.analysis["retention_inferred"], true);
    }

    #[test]
    fn inferred_retention_confirmed_by_net_total_matches() {
        let mut components = set(dec!(1000000), dec!(0), dec!(1000000), dec!(950000));
        components.allowance_total = c(dec!(0));
        let r = reconcile(&components, &inferred(dec!(50000)), true);
        assert_eq!(r.status, ReconciliationStatus::Match);
        assert_eq!(r.alert, AlertLevel::None);
        assert!(!r.requires_review);
        assert_eq!(r.discrepancy, dec!(0));
        assert_eq!(r.analysis["retention_inferred"], true);
        assert_eq!(r.analysis["retention_method"], "mathematical-inference");
        assert_eq!(r.analysis["allowance_total"], "0");
    }

    #[test]
    fn gap_exactly_at_tolerance_matches() {
        let r = reconcile(
            &set(dec!(1001), dec!(0), dec!(1001), dec!(1000)),
            &RetentionResult::none_declared(),
            false,
        );
        assert_eq!(r.status, ReconciliationStatus::Match);
        assert_eq!(r.discrepancy, dec!(1));
    }

    #[test]
    fn prepaid_explains_gap() {
        let mut components = set(dec!(1000), dec!(190), dec!(1190), dec!(690));
        components.prepaid = c(dec!(500));
        let r = reconcile(&components, &RetentionResult::none_declared(), false);
        assert_eq!(r.status, ReconciliationStatus::AdvancePaymentApplied);
        assert_eq!(r.alert, AlertLevel::Info);
        assert!(!r.requires_review);
    }

    #[test]
    fn retention_larger_than_gap() {
        let r = reconcile(
            &set(dec!(1000), dec!(190), dec!(1190), dec!(1180)),
            &declared(dec!(40)),
            true,
        );
        assert_eq!(r.status, ReconciliationStatus::RetentionExceedsExpectation);
        assert_eq!(r.discrepancy, dec!(30));
        assert!(r.requires_review);
    }

    #[test]
    fn unexplained_gap_is_critical() {
        let r = reconcile(
            &set(dec!(1000), dec!(190), dec!(1190), dec!(1000)),
            &declared(dec!(40)),
            true,
        );
        assert_eq!(r.status, ReconciliationStatus::UnexplainedCriticalDiscrepancy);
        assert_eq!(r.alert, AlertLevel::Critical);
        assert_eq!(r.discrepancy, dec!(150));
        insta::assert_snapshot!(
            r.explanation,
            @"gross 1190.00 minus payable 1000.00 leaves 150.00 unexplained by retention 40.00"
        );
    }

    #[test]
    fn derived_gross_when_not_stated() {
        let components = ComponentSet {
            subtotal: c(dec!(100)),
            tax: c(dec!(19)),
            payable: c(dec!(119)),
            ..ComponentSet::default()
        };
        let r = reconcile(&components, &RetentionResult::none_declared(), false);
        assert_eq!(r.status, ReconciliationStatus::Match);
        assert_eq!(r.analysis["gross_source"], "subtotal-plus-tax");

        let only_payable = ComponentSet {
            payable: c(dec!(119)),
            ..ComponentSet::default()
        };
        let r = reconcile(&only_payable, &RetentionResult::none_declared(), false);
        assert_eq!(r.alert, AlertLevel::Info);
        assert!(!r.requires_review);
    }

    #[test]
    fn external_total_comparison() {
        let none = RetentionResult::none_declared();
        let r = reconcile_external_total(dec!(1000), &none, dec!(1000.50));
        assert_eq!(r.status, ReconciliationStatus::Match);
        assert!(!r.requires_review);

        let r = reconcile_external_total(dec!(1190), &declared(dec!(40)), dec!(1150));
        assert_eq!(r.status, ReconciliationStatus::RetentionNotDeclared);
        assert!(r.requires_review);

        let r = reconcile_external_total(dec!(1190), &none, dec!(1100));
        assert_eq!(r.status, ReconciliationStatus::UndeclaredDiscount);
        assert_eq!(r.discrepancy, dec!(90));
        assert!(r.requires_review);

        let r = reconcile_external_total(dec!(1000), &none, dec!(1200));
        assert_eq!(r.status, ReconciliationStatus::UnexplainedCriticalDiscrepancy);
        assert_eq!(r.alert, AlertLevel::Critical);
        assert!(r.requires_review);
    }
}
