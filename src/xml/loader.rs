use tracing::debug;

use super::locator::Locator;
use super::tree::{NodeId, XmlTree};
use crate::core::{DocumentKind, LoadError};
use crate::extract::CustomFields;

/// Wrapper root some issuers send instead of the invoice itself.
const ATTACHED_DOCUMENT: &str = "AttachedDocument";

/// Where a wrapper keeps the embedded invoice markup, most specific first.
const EMBEDDED_DESCRIPTION_PATHS: [&str; 2] = [
    "cac:Attachment/cac:ExternalReference/cbc:Description",
    "//cac:ExternalReference/cbc:Description",
];

/// Issuer custom-field blocks live anywhere under the UBL extensions.
pub(crate) const CUSTOM_FIELD_PATH: &str = "ext:UBLExtensions//CustomField";

/// One recognized invoice-family document, loaded and validated.
///
/// Immutable once produced; every extractor reads it through [`Locator`].
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    tree: XmlTree,
    kind: DocumentKind,
    from_attached_document: bool,
}

impl ParsedDocument {
    /// Parse raw bytes, unwrap an `AttachedDocument` if present, and check
    /// that the result is an invoice, credit note or debit note carrying
    /// monetary content.
    pub fn load(bytes: &[u8]) -> Result<Self, LoadError> {
        let text = String::from_utf8_lossy(bytes);
        let outer = XmlTree::parse(&text)?;
        let outer_root = outer.element(outer.root()).local.clone();

        let (tree, from_attached_document) = if outer_root == ATTACHED_DOCUMENT {
            let inner = unwrap_attached(&outer).ok_or_else(|| {
                LoadError::UnrecognizedDocumentType(
                    "AttachedDocument without an embedded invoice".into(),
                )
            })?;
            debug!("unwrapped invoice embedded in AttachedDocument");
            (inner, true)
        } else {
            (outer, false)
        };

        let root_name = &tree.element(tree.root()).local;
        let kind = DocumentKind::from_root_name(root_name)
            .ok_or_else(|| LoadError::UnrecognizedDocumentType(root_name.clone()))?;

        let doc = Self {
            tree,
            kind,
            from_attached_document,
        };
        if !doc.has_monetary_content() {
            return Err(LoadError::NoMonetaryContent);
        }
        Ok(doc)
    }

    /// A standard monetary aggregate, or at least one custom field whose
    /// name carries a monetary meaning.
    fn has_monetary_content(&self) -> bool {
        let loc = self.locator();
        let root = self.root();
        if loc.exists(root, "cac:LegalMonetaryTotal")
            || loc.exists(root, "cac:RequestedMonetaryTotal")
        {
            return true;
        }
        loc.exists(root, CUSTOM_FIELD_PATH)
            && CustomFields::extract(self)
                .entries()
                .iter()
                .any(|e| e.field.is_recognized())
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn tree(&self) -> &XmlTree {
        &self.tree
    }

    pub fn locator(&self) -> Locator<'_> {
        Locator::new(&self.tree)
    }

    /// `true` when the invoice was unwrapped from an `AttachedDocument`.
    pub fn from_attached_document(&self) -> bool {
        self.from_attached_document
    }
}

/// Find the first embedded Description whose text parses to a recognized
/// document type.
fn unwrap_attached(outer: &XmlTree) -> Option<XmlTree> {
    let loc = Locator::new(outer);
    EMBEDDED_DESCRIPTION_PATHS
        .iter()
        .flat_map(|path| loc.values(outer.root(), path))
        .filter(|text| text.contains('<'))
        .find_map(|text| {
            let inner = XmlTree::parse(text).ok()?;
            let local = &inner.element(inner.root()).local;
            DocumentKind::from_root_name(local).map(|_| inner)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVOICE: &str = r#"<Invoice xmlns="urn:oasis:names:specification:ubl:schema:xsd:Invoice-2"
  xmlns:cac="urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2"
  xmlns:cbc="urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2">
  <cbc:ID>FE-1</cbc:ID>
  <cac:LegalMonetaryTotal><cbc:PayableAmount currencyID="COP">100.00</cbc:PayableAmount></cac:LegalMonetaryTotal>
</Invoice>"#;

    #[test]
    fn loads_plain_invoice() {
        let doc = ParsedDocument::load(INVOICE.as_bytes()).unwrap();
        assert_eq!(doc.kind(), DocumentKind::Invoice);
        assert!(!doc.from_attached_document());
        assert_eq!(doc.locator().text(doc.root(), "cbc:ID"), Some("FE-1"));
    }

    #[test]
    fn unwraps_escaped_attached_document() {
        let escaped = INVOICE
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;");
        let wrapper = format!(
            r#"<AttachedDocument xmlns="urn:oasis:names:specification:ubl:schema:xsd:AttachedDocument-2"
  xmlns:cac="urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2"
  xmlns:cbc="urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2">
  <cbc:ID>WRAP-1</cbc:ID>
  <cac:Attachment><cac:ExternalReference>
    <cbc:MimeCode>text/xml</cbc:MimeCode>
    <cbc:Description>{escaped}</cbc:Description>
  </cac:ExternalReference></cac:Attachment>
</AttachedDocument>"#
        );
        let doc = ParsedDocument::load(wrapper.as_bytes()).unwrap();
        assert!(doc.from_attached_document());
        assert_eq!(doc.locator().text(doc.root(), "cbc:ID"), Some("FE-1"));
    }

    #[test]
    fn wrapper_without_invoice_is_unrecognized() {
        let wrapper = r#"<AttachedDocument><cac:Attachment><cac:ExternalReference>
  <cbc:Description>plain text</cbc:Description></cac:ExternalReference></cac:Attachment></AttachedDocument>"#;
        assert!(matches!(
            ParsedDocument::load(wrapper.as_bytes()),
            Err(LoadError::UnrecognizedDocumentType(_))
        ));
    }

    #[test]
    fn rejects_other_roots_and_empty_invoices() {
        assert_eq!(
            ParsedDocument::load(b"<ApplicationResponse/>").unwrap_err(),
            LoadError::UnrecognizedDocumentType("ApplicationResponse".into())
        );
        assert_eq!(
            ParsedDocument::load(b"<CreditNote><cbc:ID>1</cbc:ID></CreditNote>").unwrap_err(),
            LoadError::NoMonetaryContent
        );
        assert!(matches!(
            ParsedDocument::load(b"\x00\x01 not xml"),
            Err(LoadError::MalformedXml(_))
        ));
    }

    fn with_custom_fields(fields: &str) -> String {
        format!(
            r#"<Invoice xmlns:ext="urn:oasis:names:specification:ubl:schema:xsd:CommonExtensionComponents-2">
  <cbc:ID>FE-2</cbc:ID>
  <ext:UBLExtensions><ext:UBLExtension><ext:ExtensionContent>{fields}</ext:ExtensionContent></ext:UBLExtension></ext:UBLExtensions>
</Invoice>"#
        )
    }

    #[test]
    fn non_monetary_custom_fields_are_not_monetary_content() {
        let xml = with_custom_fields(
            r#"<CustomField Name="Vendedor" Value="Ana"/><CustomField Name="OrdenCompra" Value="OC-9"/>"#,
        );
        assert_eq!(
            ParsedDocument::load(xml.as_bytes()).unwrap_err(),
            LoadError::NoMonetaryContent
        );

        let xml = with_custom_fields(
            r#"<CustomField Name="Vendedor" Value="Ana"/><CustomField Name="TOTAL A PAGAR" Value="$ 500.000"/>"#,
        );
        let doc = ParsedDocument::load(xml.as_bytes()).unwrap();
        assert_eq!(doc.kind(), DocumentKind::Invoice);
    }
}
