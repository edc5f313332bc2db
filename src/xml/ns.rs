//! UBL 2.1 namespace URIs and the fixed prefix table used by locator paths.

pub const INVOICE: &str = "urn:oasis:names:specification:ubl:schema:xsd:Invoice-2";
pub const CREDIT_NOTE: &str = "urn:oasis:names:specification:ubl:schema:xsd:CreditNote-2";
pub const DEBIT_NOTE: &str = "urn:oasis:names:specification:ubl:schema:xsd:DebitNote-2";
pub const ATTACHED_DOCUMENT: &str =
    "urn:oasis:names:specification:ubl:schema:xsd:AttachedDocument-2";
pub const CAC: &str = "urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2";
pub const CBC: &str = "urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2";
pub const EXT: &str = "urn:oasis:names:specification:ubl:schema:xsd:CommonExtensionComponents-2";
/// DIAN structures namespace used by Colombian issuers inside extensions.
pub const STS: &str = "dian:gov:co:facturaelectronica:Structures-2-1";
pub const DS: &str = "http://www.w3.org/2000/09/xmldsig#";

/// Resolve a locator path prefix to its namespace URI.
pub fn uri_for_prefix(prefix: &str) -> Option<&'static str> {
    match prefix {
        "cac" => Some(CAC),
        "cbc" => Some(CBC),
        "ext" => Some(EXT),
        "sts" => Some(STS),
        "ds" => Some(DS),
        _ => None,
    }
}
