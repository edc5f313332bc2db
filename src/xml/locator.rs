//! XPath-like querying over an [`XmlTree`].
//!
//! Supported path syntax:
//!
//! - `cac:LegalMonetaryTotal/cbc:PayableAmount`: child steps from the context node
//! - `//cbc:Description` or `ext:UBLExtensions//CustomField`: descendant steps
//! - `prefix:Local`: namespace-aware; prefixes come from [`ns::uri_for_prefix`]
//! - `Local`: any namespace
//! - `*`: any element
//! - trailing `@Name`: attribute of the selected element
//!
//! Elements whose prefix was never declared match prefixed steps by local name
//! alone, since several issuers emit undeclared `cbc:`/`cac:` prefixes.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::ns;
use super::tree::{Element, NodeId, XmlTree};
use crate::core::parse_xml_decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, Copy)]
struct Step<'p> {
    axis: Axis,
    prefix: Option<&'p str>,
    local: &'p str,
}

impl Step<'_> {
    fn matches(&self, el: &Element) -> bool {
        if self.local != "*" && self.local != el.local {
            return false;
        }
        match self.prefix {
            None => true,
            Some(p) => match (ns::uri_for_prefix(p), el.namespace.as_deref()) {
                (Some(uri), Some(actual)) => uri == actual,
                (Some(_), None) => true,
                (None, _) => el.prefix.as_deref() == Some(p),
            },
        }
    }
}

fn parse_path(path: &str) -> (Vec<Step<'_>>, Option<&str>) {
    let mut steps = Vec::new();
    let mut attribute = None;
    let mut axis = Axis::Child;
    for segment in path.split('/') {
        if segment.is_empty() {
            axis = Axis::Descendant;
            continue;
        }
        if let Some(attr) = segment.strip_prefix('@') {
            attribute = Some(attr);
            break;
        }
        let (prefix, local) = match segment.split_once(':') {
            Some((p, l)) => (Some(p), l),
            None => (None, segment),
        };
        steps.push(Step {
            axis,
            prefix,
            local,
        });
        axis = Axis::Child;
    }
    (steps, attribute)
}

/// Read-only query handle over a tree.
#[derive(Debug, Clone, Copy)]
pub struct Locator<'d> {
    tree: &'d XmlTree,
}

impl<'d> Locator<'d> {
    pub fn new(tree: &'d XmlTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &'d XmlTree {
        self.tree
    }

    /// All elements selected by `path` from `ctx`, in document order.
    pub fn find_all(&self, ctx: NodeId, path: &str) -> Vec<NodeId> {
        let (steps, _) = parse_path(path);
        self.select(ctx, &steps)
    }

    fn select(&self, ctx: NodeId, steps: &[Step<'_>]) -> Vec<NodeId> {
        let mut current = vec![ctx];
        for step in steps {
            let mut next = Vec::new();
            for &node in &current {
                match step.axis {
                    Axis::Child => next.extend(
                        self.tree
                            .children(node)
                            .filter(|&c| step.matches(self.tree.element(c))),
                    ),
                    Axis::Descendant => next.extend(
                        self.tree
                            .descendants(node)
                            .into_iter()
                            .filter(|&c| step.matches(self.tree.element(c))),
                    ),
                }
            }
            // Node ids are allocated in document order.
            next.sort();
            next.dedup();
            if next.is_empty() {
                return next;
            }
            current = next;
        }
        current
    }

    pub fn find(&self, ctx: NodeId, path: &str) -> Option<NodeId> {
        self.find_all(ctx, path).into_iter().next()
    }

    pub fn exists(&self, ctx: NodeId, path: &str) -> bool {
        self.find(ctx, path).is_some()
    }

    /// Non-empty trimmed values selected by `path` (element text or attribute).
    pub fn values(&self, ctx: NodeId, path: &str) -> Vec<&'d str> {
        let (steps, attribute) = parse_path(path);
        let tree = self.tree;
        self.select(ctx, &steps)
            .into_iter()
            .filter_map(|id| match attribute {
                Some(attr) => tree.attribute(id, attr).map(str::trim),
                None => Some(tree.text(id)),
            })
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// First non-empty value selected by `path`.
    pub fn text(&self, ctx: NodeId, path: &str) -> Option<&'d str> {
        self.values(ctx, path).into_iter().next()
    }

    /// First value selected by `path`, read as an amount. Malformed text is `None`.
    pub fn amount(&self, ctx: NodeId, path: &str) -> Option<Decimal> {
        self.text(ctx, path).and_then(parse_xml_decimal)
    }

    /// Every readable amount selected by `path`; malformed entries are skipped.
    pub fn amounts(&self, ctx: NodeId, path: &str) -> Vec<Decimal> {
        self.values(ctx, path)
            .into_iter()
            .filter_map(parse_xml_decimal)
            .collect()
    }

    /// First value selected by `path`, read as an ISO-8601 date.
    pub fn date(&self, ctx: NodeId, path: &str) -> Option<NaiveDate> {
        self.text(ctx, path)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const XML: &str = r#"<Invoice xmlns="urn:oasis:names:specification:ubl:schema:xsd:Invoice-2"
    xmlns:cac="urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2"
    xmlns:cbc="urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2"
    xmlns:other="urn:example:other">
  <cbc:IssueDate>2024-03-15</cbc:IssueDate>
  <cac:TaxTotal>
    <cbc:TaxAmount currencyID="COP">19.00</cbc:TaxAmount>
    <cac:TaxSubtotal><cbc:TaxAmount currencyID="COP">10.00</cbc:TaxAmount></cac:TaxSubtotal>
    <cac:TaxSubtotal><cbc:TaxAmount currencyID="COP">9.00</cbc:TaxAmount></cac:TaxSubtotal>
    <cac:TaxSubtotal><cbc:TaxAmount currencyID="COP">n/a</cbc:TaxAmount></cac:TaxSubtotal>
  </cac:TaxTotal>
  <other:PayableAmount>5</other:PayableAmount>
  <cac:LegalMonetaryTotal>
    <cbc:PayableAmount currencyID="COP">119.00</cbc:PayableAmount>
  </cac:LegalMonetaryTotal>
</Invoice>"#;

    #[test]
    fn child_paths_and_amounts() {
        let tree = XmlTree::parse(XML).unwrap();
        let loc = Locator::new(&tree);
        let root = tree.root();
        assert_eq!(
            loc.amount(root, "cac:LegalMonetaryTotal/cbc:PayableAmount"),
            Some(dec!(119.00))
        );
        assert_eq!(
            loc.amounts(root, "cac:TaxTotal/cac:TaxSubtotal/cbc:TaxAmount"),
            vec![dec!(10.00), dec!(9.00)]
        );
        assert_eq!(
            loc.date(root, "cbc:IssueDate"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
    }

    #[test]
    fn namespace_awareness() {
        let tree = XmlTree::parse(XML).unwrap();
        let loc = Locator::new(&tree);
        let root = tree.root();
        // cbc: does not match an element in another namespace.
        assert_eq!(loc.find_all(root, "//cbc:PayableAmount").len(), 1);
        // A bare name matches any namespace.
        assert_eq!(loc.find_all(root, "//PayableAmount").len(), 2);
        // Unknown prefixes compare literally.
        assert_eq!(loc.amount(root, "other:PayableAmount"), Some(dec!(5)));
    }

    #[test]
    fn attributes_and_wildcards() {
        let tree = XmlTree::parse(XML).unwrap();
        let loc = Locator::new(&tree);
        let root = tree.root();
        assert_eq!(
            loc.text(root, "cac:TaxTotal/cbc:TaxAmount/@currencyID"),
            Some("COP")
        );
        assert_eq!(loc.find_all(root, "cac:TaxTotal/*").len(), 4);
        assert!(!loc.exists(root, "cac:WithholdingTaxTotal"));
    }

    #[test]
    fn undeclared_prefix_matches_by_local_name() {
        let tree = XmlTree::parse("<Invoice><cbc:ID>7</cbc:ID></Invoice>").unwrap();
        let loc = Locator::new(&tree);
        assert_eq!(loc.text(tree.root(), "cbc:ID"), Some("7"));
    }
}
