use crate::core::{DocumentIdentification, PartyIdentity};
use crate::xml::{Locator, NodeId, ParsedDocument};

const NAME_PATHS: [&str; 3] = [
    "cac:Party/cac:PartyTaxScheme/cbc:RegistrationName",
    "cac:Party/cac:PartyLegalEntity/cbc:RegistrationName",
    "cac:Party/cac:PartyName/cbc:Name",
];

const COMPANY_ID_PATHS: [&str; 3] = [
    "cac:Party/cac:PartyTaxScheme/cbc:CompanyID",
    "cac:Party/cac:PartyLegalEntity/cbc:CompanyID",
    "cac:Party/cac:PartyIdentification/cbc:ID",
];

fn first_text(loc: &Locator<'_>, ctx: NodeId, paths: &[&str]) -> Option<String> {
    paths
        .iter()
        .find_map(|p| loc.text(ctx, p))
        .map(str::to_string)
}

fn party(loc: &Locator<'_>, root: NodeId, wrapper: &str) -> PartyIdentity {
    match loc.find(root, wrapper) {
        Some(node) => PartyIdentity {
            name: first_text(loc, node, &NAME_PATHS),
            company_id: first_text(loc, node, &COMPANY_ID_PATHS),
        },
        None => PartyIdentity::default(),
    }
}

/// Read the identification fields of a document. Missing fields stay `None`.
pub fn identify(doc: &ParsedDocument) -> DocumentIdentification {
    let loc = doc.locator();
    let root = doc.root();
    let text = |path: &str| loc.text(root, path).map(str::to_string);

    DocumentIdentification {
        kind: doc.kind(),
        number: text("cbc:ID"),
        fiscal_id: text("cbc:UUID"),
        issue_date: loc.date(root, "cbc:IssueDate"),
        issue_time: text("cbc:IssueTime"),
        due_date: loc.date(root, "cbc:DueDate"),
        type_code: first_text(
            &loc,
            root,
            &[
                "cbc:InvoiceTypeCode",
                "cbc:CreditNoteTypeCode",
                "cbc:DebitNoteTypeCode",
            ],
        ),
        currency: text("cbc:DocumentCurrencyCode"),
        supplier: party(&loc, root, "cac:AccountingSupplierParty"),
        customer: party(&loc, root, "cac:AccountingCustomerParty"),
    }
}
