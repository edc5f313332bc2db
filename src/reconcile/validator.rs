use rust_decimal::Decimal;

use crate::core::policy::within_cent;
use crate::core::{
    ComponentSet, GrossPayableCheck, MonetaryValidation, RetentionResult, ValidationError,
    ValidationVerdict, format_decimal,
};

/// Check `subtotal + tax - retention = payable` within one cent.
///
/// Independent of the reconciler: it records whether the equation holds and
/// by how much it fails, and never alters any value.
pub fn validate_monetary(
    components: &ComponentSet,
    retention: &RetentionResult,
) -> MonetaryValidation {
    let mut findings = Vec::new();

    // MV-02: stated gross must agree with its parts. Recorded only.
    if let (Some(subtotal), Some(tax), Some(gross)) = (
        components.subtotal_value(),
        components.tax_value(),
        components.gross_value(),
    ) {
        if !within_cent(subtotal + tax, gross) {
            findings.push(ValidationError::with_rule(
                "components.gross_total",
                format!(
                    "subtotal {} + tax {} = {} but gross total states {}",
                    format_decimal(subtotal),
                    format_decimal(tax),
                    format_decimal(subtotal + tax),
                    format_decimal(gross)
                ),
                "MV-02",
            ));
        }
    }

    let terms = [
        ("subtotal", components.subtotal_value()),
        ("tax", components.tax_value()),
        ("payable", components.payable_value()),
    ];
    let missing: Vec<String> = terms
        .iter()
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| (*name).to_string())
        .collect();

    let (Some(subtotal), Some(tax), Some(stated)) = (terms[0].1, terms[1].1, terms[2].1) else {
        for name in &missing {
            findings.push(ValidationError::with_rule(
                format!("components.{name}"),
                "term absent from document; equation not evaluable",
                "MV-00",
            ));
        }
        return MonetaryValidation {
            verdict: ValidationVerdict::NotEvaluable { missing },
            findings,
        };
    };

    let expected = subtotal + tax - retention.amount;
    let difference = stated - expected;
    let verdict = if within_cent(stated, expected) {
        ValidationVerdict::Pass { difference }
    } else {
        findings.push(ValidationError::with_rule(
            "components.payable",
            format!(
                "subtotal + tax - retention = {} but payable states {} (difference {})",
                format_decimal(expected),
                format_decimal(stated),
                format_decimal(difference)
            ),
            "MV-01",
        ));
        ValidationVerdict::Fail {
            expected,
            stated,
            difference,
        }
    };

    MonetaryValidation { verdict, findings }
}

/// Detect a payable field that carries the gross total despite a nonzero
/// retention. The stated payable is returned unchanged; correcting it is a
/// decision for human review.
pub fn detect_gross_as_payable(
    stated_payable: Decimal,
    components: &ComponentSet,
    retention: &RetentionResult,
) -> GrossPayableCheck {
    let gross_reported_as_payable = retention.amount > Decimal::ZERO
        && components
            .gross_value()
            .is_some_and(|gross| within_cent(gross, stated_payable));

    let finding = gross_reported_as_payable.then(|| {
        ValidationError::with_rule(
            "components.payable",
            format!(
                "payable {} equals gross total although retention {} is nonzero; retention not netted",
                format_decimal(stated_payable),
                format_decimal(retention.amount)
            ),
            "MV-03",
        )
    });

    GrossPayableCheck {
        payable: stated_payable,
        gross_reported_as_payable,
        finding,
    }
}
