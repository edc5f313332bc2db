use rust_decimal::Decimal;
use tracing::warn;

use crate::core::policy::ROUNDING_TOLERANCE;
use crate::core::{
    ComponentSet, InferenceJustification, RetentionMethod, RetentionResult, format_decimal,
};
use crate::extract::{CustomField, CustomFields, StandardAmounts};

/// Resolve the withholding amount.
///
/// Order: custom total-retention field, then the standard withholding
/// aggregate, then inference from the gap between gross and payable. Never
/// absent; defaults to zero with [`RetentionMethod::NoneDeclared`].
pub fn resolve_retention(
    custom: &CustomFields,
    standard: &StandardAmounts,
    components: &ComponentSet,
) -> RetentionResult {
    if let Some(declared) = custom.positive(&CustomField::TotalRetention) {
        return RetentionResult {
            amount: declared.value,
            method: RetentionMethod::ExplicitCustomField {
                field: declared.field,
            },
        };
    }

    if let Some(total) = standard.withholding_total().filter(|t| *t > Decimal::ZERO) {
        return RetentionResult {
            amount: total,
            method: RetentionMethod::ExplicitStandardAggregate {
                entries: standard.withholding.len(),
            },
        };
    }

    match infer_from_gap(components) {
        Some(justification) => {
            warn!(
                gap = %justification.gap,
                "no retention declared; inferring retention from gross/payable gap"
            );
            RetentionResult {
                amount: justification.gap,
                method: RetentionMethod::MathematicalInference(justification),
            }
        }
        None => RetentionResult::none_declared(),
    }
}

/// Measure `(subtotal + tax) - payable - prepaid`. The stated gross stands in
/// for `subtotal + tax` when either term is absent. Only a gap strictly
/// greater than the rounding tolerance is returned.
fn infer_from_gap(components: &ComponentSet) -> Option<InferenceJustification> {
    let payable = components.payable_value()?;
    let (base, base_label) = match (components.subtotal_value(), components.tax_value()) {
        (Some(subtotal), Some(tax)) => (subtotal + tax, "subtotal + tax"),
        _ => (components.gross_value()?, "stated gross total"),
    };
    let prepaid = components
        .prepaid_value()
        .filter(|p| *p > Decimal::ZERO)
        .unwrap_or(Decimal::ZERO);

    let gap = base - payable - prepaid;
    if gap <= ROUNDING_TOLERANCE {
        return None;
    }

    let mut note = format!(
        "no retention declared; {} ({base_label}) exceeds stated payable {} by {}",
        format_decimal(base),
        format_decimal(payable),
        format_decimal(gap),
    );
    if prepaid > Decimal::ZERO {
        note.push_str(&format!(
            " after deducting prepaid {}",
            format_decimal(prepaid)
        ));
    }
    // The base does not net document-level discounts.
    if let Some(allowance) = components.allowance_value().filter(|a| *a > Decimal::ZERO) {
        note.push_str(&format!(
            "; stated allowance total {} is not deducted and may account for part of the gap",
            format_decimal(allowance)
        ));
    }
    note.push_str("; gap treated as withheld pending review");

    Some(InferenceJustification {
        base,
        payable,
        gap,
        note,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CandidateSource, MonetaryCandidate};
    use crate::xml::ParsedDocument;
    use rust_decimal_macros::dec;

    fn std_candidate(field: &str, value: Decimal) -> Option<MonetaryCandidate> {
        Some(MonetaryCandidate::new(
            CandidateSource::StandardMonetaryTotal,
            field,
            value,
        ))
    }

    fn components(subtotal: Decimal, tax: Decimal, payable: Decimal) -> ComponentSet {
        ComponentSet {
            subtotal: std_candidate("LineExtensionAmount", subtotal),
            tax: std_candidate("TaxAmount", tax),
            gross_total: std_candidate("TaxInclusiveAmount", subtotal + tax),
            payable: std_candidate("PayableAmount", payable),
            ..ComponentSet::default()
        }
    }

    fn sources(custom: &str, withholding: &str) -> (CustomFields, StandardAmounts) {
        let xml = format!(
            r#"<Invoice xmlns:ext="urn:oasis:names:specification:ubl:schema:xsd:CommonExtensionComponents-2">
  <ext:UBLExtensions><ext:UBLExtension><ext:ExtensionContent>{custom}</ext:ExtensionContent></ext:UBLExtension></ext:UBLExtensions>
  {withholding}
  <cac:LegalMonetaryTotal/>
</Invoice>"#
        );
        let doc = ParsedDocument::load(xml.as_bytes()).unwrap();
        (CustomFields::extract(&doc), StandardAmounts::extract(&doc))
    }

    #[test]
    fn custom_field_beats_any_gap() {
        let (c, s) = sources(
            r#"<CustomField Name="TotalRetenciones" Value="1000"/>"#,
            "<cac:WithholdingTaxTotal><cbc:TaxAmount>2500</cbc:TaxAmount></cac:WithholdingTaxTotal>",
        );
        let r = resolve_retention(&c, &s, &components(dec!(100000), dec!(0), dec!(90000)));
        assert_eq!(r.amount, dec!(1000));
        assert_eq!(
            r.method,
            RetentionMethod::ExplicitCustomField {
                field: "TotalRetenciones".into()
            }
        );
        assert!(r.is_declared());
    }

    #[test]
    fn standard_aggregate_is_second() {
        let (c, s) = sources(
            r#"<CustomField Name="TotalRetenciones" Value="0"/>"#,
            "<cac:WithholdingTaxTotal><cbc:TaxAmount>2500</cbc:TaxAmount></cac:WithholdingTaxTotal>
             <cac:WithholdingTaxTotal><cbc:TaxAmount>500</cbc:TaxAmount></cac:WithholdingTaxTotal>",
        );
        let r = resolve_retention(&c, &s, &components(dec!(100000), dec!(0), dec!(97000)));
        assert_eq!(r.amount, dec!(3000));
        assert_eq!(r.method, RetentionMethod::ExplicitStandardAggregate { entries: 2 });
    }

    #[test]
    fn infers_gap_when_nothing_declared() {
        let (c, s) = sources("", "");
        let r = resolve_retention(&c, &s, &components(dec!(1860700), dec!(0), dec!(1814182)));
        assert_eq!(r.amount, dec!(46518));
        let RetentionMethod::MathematicalInference(j) = &r.method else {
            panic!("expected inference, got {:?}", r.method);
        };
        assert_eq!(j.gap, dec!(46518));
        assert_eq!(j.base, dec!(1860700));
        assert!(j.note.contains("46518.00"));
        assert!(r.is_inferred());
    }

    #[test]
    fn gap_at_tolerance_is_not_inferred() {
        let (c, s) = sources("", "");
        let r = resolve_retention(&c, &s, &components(dec!(1001), dec!(0), dec!(1000)));
        assert_eq!(r, RetentionResult::none_declared());

        let r = resolve_retention(&c, &s, &components(dec!(1001.01), dec!(0), dec!(1000)));
        assert!(r.is_inferred());
    }

    #[test]
    fn negative_gap_and_prepaid_are_not_inferred() {
        let (c, s) = sources("", "");
        let r = resolve_retention(&c, &s, &components(dec!(1000), dec!(0), dec!(1200)));
        assert_eq!(r.method, RetentionMethod::NoneDeclared);

        let mut set = components(dec!(1000), dec!(190), dec!(690));
        set.prepaid = std_candidate("PrepaidAmount", dec!(500));
        let r = resolve_retention(&c, &s, &set);
        assert_eq!(r.method, RetentionMethod::NoneDeclared);
    }

    #[test]
    fn stated_allowance_is_named_in_note() {
        let (c, s) = sources("", "");
        let mut set = components(dec!(1000), dec!(190), dec!(1090));
        set.allowance_total = std_candidate("AllowanceTotalAmount", dec!(100));
        let r = resolve_retention(&c, &s, &set);
        let RetentionMethod::MathematicalInference(j) = r.method else {
            panic!("expected inference");
        };
        assert_eq!(j.gap, dec!(100));
        assert!(j.note.contains("allowance total 100.00"), "{}", j.note);
    }

    #[test]
    fn falls_back_to_stated_gross_for_base() {
        let (c, s) = sources("", "");
        let set = ComponentSet {
            gross_total: std_candidate("TaxInclusiveAmount", dec!(500)),
            payable: std_candidate("PayableAmount", dec!(450)),
            ..ComponentSet::default()
        };
        let r = resolve_retention(&c, &s, &set);
        let RetentionMethod::MathematicalInference(j) = r.method else {
            panic!("expected inference");
        };
        assert!(j.note.contains("stated gross total"));
        assert_eq!(j.gap, dec!(50));
    }
}
