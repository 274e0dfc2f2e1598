#![cfg_attr(docsrs, feature(doc_cfg))]
//! LIGO Light Weight document model: a grammar-checked element tree, the
//! streaming builders that construct it from document events, and the
//! writer that reproduces the format's textual conventions.
//!
//! ```rust
//! use ligolw_core::{attributes::table, Document, ElementKind, WriteOptions};
//!
//! let xml = r#"<LIGO_LW><Table Name="process:table"><Column Name="ifos" Type="lstring"/></Table></LIGO_LW>"#;
//! let doc: Document = xml.parse()?;
//! let tables = doc.get_elements_by_tag_name(doc.root(), ElementKind::Table.tag_name());
//! let name = doc.typed_attribute(tables[0], &table::NAME)?;
//! assert_eq!(name, "process:table");
//! let text = doc.to_xml_string(&WriteOptions::default())?;
//! assert!(text.contains("<Column Name=\"ifos\" Type=\"lstring\"/>"));
//! # Ok::<(), ligolw_core::LigoLwError>(())
//! ```

pub mod attributes;
pub mod builder;
pub mod document;
pub mod element;
pub mod write;

use ligolw_types::TypeError;
use ligolw_xml::XmlError;
use thiserror::Error;

pub use attributes::{AttributeProxy, AttributeType};
pub use builder::{FilteringLigoLwContentHandler, LigoLwContentHandler, PartialLigoLwContentHandler};
pub use document::Document;
pub use element::{Element, ElementKind};
pub use indextree::NodeId;
pub use ligolw_xml::{Attributes, ContentHandler, QName, NAMESPACE};
pub use write::{WriteOptions, HEADER, INDENT};

/// Error type produced by tree construction, mutation and serialization.
#[derive(Debug, Error)]
pub enum LigoLwError {
    /// Attribute names outside the element's declared set.
    #[error("{tag} element does not have attribute(s) {}", quoted(.names))]
    InvalidAttributes {
        tag: &'static str,
        names: Vec<String>,
    },
    /// An enumerated attribute holds a value outside its closed set.
    #[error("invalid {attribute} for {tag}: '{value}'")]
    InvalidAttributeValue {
        tag: &'static str,
        attribute: &'static str,
        value: String,
    },
    /// A child whose tag the parent does not admit.
    #[error("invalid child {child} for {parent}")]
    InvalidChild {
        parent: &'static str,
        child: &'static str,
    },
    /// The children of a Table, an Array or the document root break its
    /// order/arity rules.
    #[error("{reason} in {parent}")]
    ChildOrder {
        parent: &'static str,
        reason: &'static str,
    },
    /// A start tag with no registered constructor.
    #[error("unknown element {name} for namespace {namespace}")]
    UnknownElement { name: String, namespace: String },
    /// A typed attribute was read with no stored value and no default.
    #[error("attribute '{0}' is not set")]
    AttributeNotSet(String),
    /// The reference node is not a child of the given parent.
    #[error("node is not a child of the given parent")]
    NotAChild,
    /// The handle does not belong to this document.
    #[error("node does not belong to this document")]
    UnknownNode,
    /// An end event arrived while the cursor was at the document root.
    #[error("end tag {0} has no matching start tag")]
    UnbalancedEnd(String),
    /// Structural impossibility such as appending an ancestor.
    #[error("tree: {0}")]
    Tree(#[from] indextree::NodeError),
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Xml(#[from] XmlError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("'{name}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
