//! Document loading and XPath-like field location over UBL 2.1 trees.
//!
//! Two real-world shapes are accepted:
//!
//! - the invoice, credit note or debit note is the document root;
//! - the document is embedded as escaped markup (or CDATA) in
//!   `cac:Attachment/cac:ExternalReference/cbc:Description` of an
//!   `AttachedDocument` wrapper.

mod loader;
mod locator;
pub mod ns;
mod tree;

pub(crate) use loader::CUSTOM_FIELD_PATH;
pub use loader::ParsedDocument;
pub use locator::Locator;
pub use tree::{Attribute, Element, NodeId, XmlTree};
