use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::borrow::Cow;

use crate::core::LoadError;

/// Index of an element inside an [`XmlTree`]. Ids follow document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub struct Attribute {
    pub prefix: Option<String>,
    pub local: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct Element {
    /// Prefix as written in the source.
    pub prefix: Option<String>,
    pub local: String,
    /// Resolved namespace URI, `None` when the prefix was never declared.
    pub namespace: Option<String>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<NodeId>,
    /// Concatenated text and CDATA content of this element.
    pub text: String,
}

impl Element {
    /// Qualified name as written in the source.
    pub fn qualified_name(&self) -> Cow<'_, str> {
        match &self.prefix {
            Some(p) => Cow::Owned(format!("{p}:{}", self.local)),
            None => Cow::Borrowed(&self.local),
        }
    }
}

/// Immutable, namespace-resolved element tree.
#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<Element>,
}

struct Frame {
    id: NodeId,
    qname: String,
    declared: Vec<(Option<String>, String)>,
}

fn split_qname(name: &str) -> (Option<String>, String) {
    match name.split_once(':') {
        Some((p, l)) => (Some(p.to_string()), l.to_string()),
        None => (None, name.to_string()),
    }
}

fn resolve_prefix(stack: &[Frame], prefix: Option<&str>) -> Option<String> {
    stack
        .iter()
        .rev()
        .flat_map(|f| f.declared.iter())
        .find(|(p, _)| p.as_deref() == prefix)
        .map(|(_, uri)| uri.clone())
        .filter(|uri| !uri.is_empty())
}

impl XmlTree {
    /// Parse XML text permissively.
    ///
    /// Leading junk and a BOM are skipped, mismatched end tags are tolerated,
    /// and elements still open at end of input are closed. Only input with no
    /// recoverable root element is rejected.
    pub fn parse(xml: &str) -> Result<Self, LoadError> {
        let xml = xml.trim_start_matches('\u{feff}');
        let start = xml
            .find('<')
            .ok_or_else(|| LoadError::MalformedXml("no markup found".into()))?;

        let mut reader = Reader::from_str(&xml[start..]);
        let config = reader.config_mut();
        config.trim_text(true);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        let mut tree = XmlTree { nodes: Vec::new() };
        let mut stack: Vec<Frame> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let frame = tree.open_element(e, &stack);
                    stack.push(frame);
                }
                Ok(Event::Empty(ref e)) => {
                    tree.open_element(e, &stack);
                    if stack.is_empty() {
                        // A self-closing root is the whole document.
                        break;
                    }
                }
                Ok(Event::End(ref e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    if let Some(pos) = stack.iter().rposition(|f| f.qname == name) {
                        stack.truncate(pos);
                    }
                    if stack.is_empty() && !tree.nodes.is_empty() {
                        break;
                    }
                }
                Ok(Event::Text(ref e)) => {
                    if let Some(top) = stack.last() {
                        let text = match e.unescape() {
                            Ok(t) => t.into_owned(),
                            Err(_) => String::from_utf8_lossy(e).into_owned(),
                        };
                        tree.nodes[top.id.0].text.push_str(&text);
                    }
                }
                Ok(Event::CData(ref e)) => {
                    if let Some(top) = stack.last() {
                        let text = String::from_utf8_lossy(e);
                        tree.nodes[top.id.0].text.push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    if tree.nodes.is_empty() {
                        return Err(LoadError::MalformedXml(e.to_string()));
                    }
                    // Keep what was read so far; truncated documents still
                    // carry useful monetary data.
                    break;
                }
                _ => {}
            }
        }

        if tree.nodes.is_empty() {
            return Err(LoadError::MalformedXml("no root element".into()));
        }
        Ok(tree)
    }

    fn open_element(&mut self, e: &BytesStart<'_>, stack: &[Frame]) -> Frame {
        let qname = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let (prefix, local) = split_qname(&qname);

        let mut declared = Vec::new();
        let mut attributes = Vec::new();
        for attr in e.attributes().with_checks(false).flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = match attr.unescape_value() {
                Ok(v) => v.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            };
            if key == "xmlns" {
                declared.push((None, value));
            } else if let Some(p) = key.strip_prefix("xmlns:") {
                declared.push((Some(p.to_string()), value));
            } else {
                let (prefix, local) = split_qname(&key);
                attributes.push(Attribute {
                    prefix,
                    local,
                    value,
                });
            }
        }

        // The element's own declarations are in scope for its name.
        let namespace = declared
            .iter()
            .find(|(p, _)| p == &prefix)
            .map(|(_, uri)| uri.clone())
            .filter(|uri| !uri.is_empty())
            .or_else(|| resolve_prefix(stack, prefix.as_deref()));

        let id = NodeId(self.nodes.len());
        self.nodes.push(Element {
            prefix,
            local,
            namespace,
            attributes,
            children: Vec::new(),
            text: String::new(),
        });
        if let Some(parent) = stack.last() {
            self.nodes[parent.id.0].children.push(id);
        }

        Frame {
            id,
            qname,
            declared,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn element(&self, id: NodeId) -> &Element {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0].children.iter().copied()
    }

    /// All descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending: Vec<NodeId> = self.nodes[id.0].children.iter().rev().copied().collect();
        while let Some(next) = pending.pop() {
            out.push(next);
            pending.extend(self.nodes[next.0].children.iter().rev().copied());
        }
        out
    }

    /// Trimmed text content of an element.
    pub fn text(&self, id: NodeId) -> &str {
        self.nodes[id.0].text.trim()
    }

    /// Attribute value by local name, ignoring any prefix.
    pub fn attribute(&self, id: NodeId, local: &str) -> Option<&str> {
        self.nodes[id.0]
            .attributes
            .iter()
            .find(|a| a.local == local)
            .map(|a| a.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::ns;

    #[test]
    fn resolves_namespaces_and_text() {
        let xml = r#"<?xml version="1.0"?>
<Invoice xmlns="urn:oasis:names:specification:ubl:schema:xsd:Invoice-2"
         xmlns:cbc="urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2">
  <cbc:ID>SETP990000002</cbc:ID>
  <cbc:Note>a &amp; b</cbc:Note>
</Invoice>"#;
        let tree = XmlTree::parse(xml).unwrap();
        let root = tree.element(tree.root());
        assert_eq!(root.local, "Invoice");
        assert_eq!(root.namespace.as_deref(), Some(ns::INVOICE));

        let children: Vec<_> = tree.children(tree.root()).collect();
        assert_eq!(children.len(), 2);
        let id = tree.element(children[0]);
        assert_eq!(id.qualified_name(), "cbc:ID");
        assert_eq!(id.namespace.as_deref(), Some(ns::CBC));
        assert_eq!(tree.text(children[0]), "SETP990000002");
        assert_eq!(tree.text(children[1]), "a & b");
    }

    #[test]
    fn tolerates_bom_junk_and_unclosed_elements() {
        let xml = "\u{feff}garbage<Invoice><cbc:ID>1</cbc:ID><cac:LegalMonetaryTotal>";
        let tree = XmlTree::parse(xml).unwrap();
        assert_eq!(tree.element(tree.root()).local, "Invoice");
        assert_eq!(tree.len(), 3);
        // Undeclared prefixes resolve to no namespace.
        assert_eq!(tree.element(NodeId(1)).namespace, None);
    }

    #[test]
    fn tolerates_mismatched_end_tags() {
        let xml = "<Invoice><a><b>1</a><c>2</c></Invoice>";
        let tree = XmlTree::parse(xml).unwrap();
        let names: Vec<_> = tree
            .descendants(tree.root())
            .into_iter()
            .map(|id| tree.element(id).local.clone())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(tree.children(tree.root()).count(), 2);
    }

    #[test]
    fn keeps_cdata_and_attributes() {
        let xml = r#"<Wrapper><Description><![CDATA[<Invoice/>]]></Description><CustomField Name="Total" Value="1.000"/></Wrapper>"#;
        let tree = XmlTree::parse(xml).unwrap();
        let kids: Vec<_> = tree.children(tree.root()).collect();
        assert_eq!(tree.text(kids[0]), "<Invoice/>");
        assert_eq!(tree.attribute(kids[1], "Name"), Some("Total"));
        assert_eq!(tree.attribute(kids[1], "Value"), Some("1.000"));
    }

    #[test]
    fn rejects_input_without_markup() {
        assert!(matches!(
            XmlTree::parse("just text"),
            Err(LoadError::MalformedXml(_))
        ));
        assert!(matches!(XmlTree::parse(""), Err(LoadError::MalformedXml(_))));
    }
}
