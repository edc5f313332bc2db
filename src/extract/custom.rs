use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{CandidateSource, CustomFieldAudit, MonetaryCandidate, parse_amount};
use crate::xml::{CUSTOM_FIELD_PATH, NodeId, ParsedDocument};

/// Financial meaning of an issuer custom field.
///
/// Names outside the recognized set are kept verbatim under
/// [`CustomField::Unrecognized`] for audit and never take part in resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomField {
    /// Net amount the buyer must pay ("TOTAL A PAGAR").
    AuthoritativeTotal,
    /// Document total under a less specific name ("VALOR TOTAL").
    AlternateTotal,
    Subtotal,
    /// Value-added tax.
    Tax,
    /// National consumption tax (INC).
    ConsumptionTax,
    TotalRetention,
    Discount,
    Unrecognized(String),
}

impl CustomField {
    /// Classify an issuer field name. Matching ignores case, accents,
    /// whitespace and punctuation.
    pub fn classify(name: &str) -> Self {
        match normalize_name(name).as_str() {
            "totalapagar" | "valorapagar" | "netoapagar" | "totalnetoapagar"
            | "valortotalapagar" | "totalneto" | "valorneto" => Self::AuthoritativeTotal,
            "valortotal" | "totalfactura" | "valorfactura" | "totaldocumento" | "total" => {
                Self::AlternateTotal
            }
            "subtotal" | "valorsubtotal" | "valorbruto" | "totalbruto" | "basegravable" => {
                Self::Subtotal
            }
            "iva" | "totaliva" | "valoriva" | "impuestoiva" => Self::Tax,
            "inc" | "totalinc" | "impuestoconsumo" | "impuestoalconsumo" | "impoconsumo" => {
                Self::ConsumptionTax
            }
            "totalretenciones" | "totalretencion" | "retenciones" | "valorretenciones"
            | "totalretenido" => Self::TotalRetention,
            "descuento" | "descuentos" | "totaldescuento" | "totaldescuentos"
            | "valordescuento" => Self::Discount,
            _ => Self::Unrecognized(name.trim().to_string()),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'Á' | 'À' | 'Ä' => 'a',
            'é' | 'è' | 'ë' | 'É' | 'È' | 'Ë' => 'e',
            'í' | 'ì' | 'ï' | 'Í' | 'Ì' | 'Ï' => 'i',
            'ó' | 'ò' | 'ö' | 'Ó' | 'Ò' | 'Ö' => 'o',
            'ú' | 'ù' | 'ü' | 'Ú' | 'Ù' | 'Ü' => 'u',
            'ñ' | 'Ñ' => 'n',
            other => other.to_ascii_lowercase(),
        })
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// One name/value pair read from an extension block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFieldEntry {
    pub field: CustomField,
    /// Name as written by the issuer.
    pub name: String,
    pub raw_value: String,
    /// `None` when the value text is not a readable amount.
    pub amount: Option<Decimal>,
}

/// Every custom field found in a document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomFields {
    entries: Vec<CustomFieldEntry>,
}

impl CustomFields {
    pub fn extract(doc: &ParsedDocument) -> Self {
        let loc = doc.locator();
        let entries = loc
            .find_all(doc.root(), CUSTOM_FIELD_PATH)
            .into_iter()
            .filter_map(|node| read_pair(doc, node))
            .map(|(name, raw_value)| CustomFieldEntry {
                field: CustomField::classify(&name),
                amount: parse_amount(&raw_value),
                name,
                raw_value,
            })
            .collect();
        Self { entries }
    }

    pub fn has_custom_fields(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CustomFieldEntry] {
        &self.entries
    }

    /// First readable amount declared for `field`.
    pub fn candidate(&self, field: &CustomField) -> Option<MonetaryCandidate> {
        self.entries
            .iter()
            .filter(|e| &e.field == field)
            .find_map(|e| {
                e.amount
                    .map(|v| MonetaryCandidate::new(CandidateSource::CustomField, &e.name, v))
            })
    }

    /// First strictly positive amount declared for `field`.
    pub fn positive(&self, field: &CustomField) -> Option<MonetaryCandidate> {
        self.entries
            .iter()
            .filter(|e| &e.field == field)
            .find_map(|e| match e.amount {
                Some(v) if v > Decimal::ZERO => Some(MonetaryCandidate::new(
                    CandidateSource::CustomField,
                    &e.name,
                    v,
                )),
                _ => None,
            })
    }

    pub fn unrecognized(&self) -> impl Iterator<Item = &CustomFieldEntry> {
        self.entries.iter().filter(|e| !e.field.is_recognized())
    }

    /// Unrecognized fields, preserved for the audit trail.
    pub fn audit(&self) -> Vec<CustomFieldAudit> {
        self.unrecognized()
            .map(|e| CustomFieldAudit {
                name: e.name.clone(),
                value: e.raw_value.clone(),
            })
            .collect()
    }
}

/// Read a name/value pair in either attribute form
/// (`<CustomField Name="…" Value="…"/>`), element form
/// (`<CustomField><Name>…</Name><Value>…</Value></CustomField>`), or mixed
/// (`<CustomField Name="…">value</CustomField>`).
fn read_pair(doc: &ParsedDocument, node: NodeId) -> Option<(String, String)> {
    let tree = doc.tree();
    let loc = doc.locator();
    let name = tree
        .attribute(node, "Name")
        .or_else(|| tree.attribute(node, "name"))
        .or_else(|| loc.text(node, "Name"))?
        .trim()
        .to_string();
    let value = tree
        .attribute(node, "Value")
        .or_else(|| tree.attribute(node, "value"))
        .or_else(|| loc.text(node, "Value"))
        .or_else(|| Some(tree.text(node)).filter(|t| !t.is_empty()))
        .unwrap_or_default()
        .trim()
        .to_string();
    if name.is_empty() {
        return None;
    }
    Some((name, value))
}
