//! Content handlers that build a [`Document`] from document events.
//!
//! [`LigoLwContentHandler`] constructs every element it sees. The partial
//! and filtering handlers wrap it and decide, one subtree at a time, which
//! events reach it.

use std::collections::HashMap;

use indextree::NodeId;
use ligolw_xml::{Attributes, ContentHandler, QName, NAMESPACE};
use tracing::{debug, trace};

use crate::document::Document;
use crate::element::ElementKind;
use crate::LigoLwError;

/// Custom constructor for one tag name. It receives the document, the
/// node the new element belongs under and the start tag's attributes, and
/// returns the new node. The builder attaches the node unless the handler
/// already did.
pub type StartHandler<'d> =
    Box<dyn FnMut(&mut Document, NodeId, Attributes) -> Result<NodeId, LigoLwError> + 'd>;

/// Builds the full tree from every event it receives.
pub struct LigoLwContentHandler<'d> {
    document: &'d mut Document,
    current: NodeId,
    start_handlers: HashMap<String, StartHandler<'d>>,
}

impl<'d> LigoLwContentHandler<'d> {
    /// Handler appending into `document`, starting at its root.
    pub fn new(document: &'d mut Document) -> Self {
        let current = document.root();
        Self {
            document,
            current,
            start_handlers: HashMap::new(),
        }
    }

    /// Register a constructor for `tag_name`, taking precedence over the
    /// built-in element of that name.
    pub fn with_start_handler<H>(mut self, tag_name: impl Into<String>, handler: H) -> Self
    where
        H: FnMut(&mut Document, NodeId, Attributes) -> Result<NodeId, LigoLwError> + 'd,
    {
        self.start_handlers.insert(tag_name.into(), Box::new(handler));
        self
    }

    /// Node that receives the next child or text.
    pub fn current(&self) -> NodeId {
        self.current
    }
}

impl ContentHandler for LigoLwContentHandler<'_> {
    type Error = LigoLwError;

    fn start_element(&mut self, name: QName<'_>, attrs: Attributes) -> Result<(), LigoLwError> {
        if name.namespace.is_none() {
            let node = if let Some(handler) = self.start_handlers.get_mut(name.local_name) {
                Some(handler(&mut *self.document, self.current, attrs)?)
            } else if let Some(kind) = ElementKind::from_tag_name(name.local_name) {
                Some(self.document.create_element(kind, attrs)?)
            } else {
                None
            };
            if let Some(node) = node {
                if self.document.parent(node) != Some(self.current) {
                    self.document.append_child(self.current, node)?;
                }
                debug!(element = name.local_name, "start element");
                self.current = node;
                return Ok(());
            }
        }
        Err(LigoLwError::UnknownElement {
            name: name.local_name.to_string(),
            namespace: name.namespace.unwrap_or(NAMESPACE).to_string(),
        })
    }

    fn end_element(&mut self, name: QName<'_>) -> Result<(), LigoLwError> {
        let unbalanced = || LigoLwError::UnbalancedEnd(name.local_name.to_string());
        if self.current == self.document.root() {
            return Err(unbalanced());
        }
        if let Some(element) = self.document.element_mut(self.current) {
            element.end_element();
        }
        self.current = self.document.parent(self.current).ok_or_else(unbalanced)?;
        Ok(())
    }

    fn characters(&mut self, content: &str) -> Result<(), LigoLwError> {
        let accepts = self
            .document
            .kind(self.current)
            .is_some_and(ElementKind::accepts_text);
        if accepts {
            trace!(len = content.len(), "append text");
            self.document.append_data(self.current, content)?;
        }
        Ok(())
    }
}

/// Keeps only the subtrees whose start tag matches a predicate.
///
/// The outermost element of the source is always kept so that the selected
/// subtrees have a container to live in. A selected element that the
/// container cannot hold, such as a `Column` lifted out of its `Table`, is
/// rejected with [`LigoLwError::InvalidChild`].
pub struct PartialLigoLwContentHandler<'d, F> {
    inner: LigoLwContentHandler<'d>,
    predicate: F,
    /// Nesting inside the subtree being kept, 0 when outside.
    depth: usize,
    /// Nesting in the source document.
    level: usize,
    envelope: bool,
}

impl<'d, F> PartialLigoLwContentHandler<'d, F>
where
    F: FnMut(&str, &Attributes) -> bool,
{
    pub fn new(document: &'d mut Document, predicate: F) -> Self {
        Self::wrap(LigoLwContentHandler::new(document), predicate)
    }

    /// Filter the events reaching an existing handler.
    pub fn wrap(inner: LigoLwContentHandler<'d>, predicate: F) -> Self {
        Self {
            inner,
            predicate,
            depth: 0,
            level: 0,
            envelope: false,
        }
    }
}

impl<F> PartialLigoLwContentHandler<'_, F> {
    /// A selected subtree is attached to the envelope instead of its source
    /// parent, so it must be a valid child of the envelope.
    fn check_placement(&self, name: QName<'_>) -> Result<(), LigoLwError> {
        if name.namespace.is_some() {
            return Ok(());
        }
        let container = self.inner.document.kind(self.inner.current);
        match (container, ElementKind::from_tag_name(name.local_name)) {
            (Some(parent), Some(child)) if !parent.allows_child(child) => {
                Err(LigoLwError::InvalidChild {
                    parent: parent.tag_name(),
                    child: child.tag_name(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl<F> ContentHandler for PartialLigoLwContentHandler<'_, F>
where
    F: FnMut(&str, &Attributes) -> bool,
{
    type Error = LigoLwError;

    fn start_element(&mut self, name: QName<'_>, attrs: Attributes) -> Result<(), LigoLwError> {
        let level = self.level;
        self.level += 1;
        if self.depth > 0 {
            self.depth += 1;
        } else if (self.predicate)(name.local_name, &attrs) {
            if level > 0 {
                self.check_placement(name)?;
            }
            debug!(element = name.local_name, "including subtree");
            self.depth = 1;
        } else if level == 0 {
            self.envelope = true;
        } else {
            return Ok(());
        }
        self.inner.start_element(name, attrs)
    }

    fn end_element(&mut self, name: QName<'_>) -> Result<(), LigoLwError> {
        self.level = self.level.saturating_sub(1);
        if self.depth > 0 {
            self.depth -= 1;
            if self.depth == 0 {
                debug!(element = name.local_name, "subtree included");
            }
            return self.inner.end_element(name);
        }
        if self.level == 0 && self.envelope {
            self.envelope = false;
            return self.inner.end_element(name);
        }
        Ok(())
    }

    fn characters(&mut self, content: &str) -> Result<(), LigoLwError> {
        if self.depth > 0 {
            self.inner.characters(content)
        } else {
            Ok(())
        }
    }
}

/// Drops every subtree whose start tag matches a predicate.
pub struct FilteringLigoLwContentHandler<'d, F> {
    inner: LigoLwContentHandler<'d>,
    predicate: F,
    /// Nesting inside the subtree being dropped, 0 when outside.
    depth: usize,
}

impl<'d, F> FilteringLigoLwContentHandler<'d, F>
where
    F: FnMut(&str, &Attributes) -> bool,
{
    pub fn new(document: &'d mut Document, predicate: F) -> Self {
        Self::wrap(LigoLwContentHandler::new(document), predicate)
    }

    pub fn wrap(inner: LigoLwContentHandler<'d>, predicate: F) -> Self {
        Self {
            inner,
            predicate,
            depth: 0,
        }
    }
}

impl<F> ContentHandler for FilteringLigoLwContentHandler<'_, F>
where
    F: FnMut(&str, &Attributes) -> bool,
{
    type Error = LigoLwError;

    fn start_element(&mut self, name: QName<'_>, attrs: Attributes) -> Result<(), LigoLwError> {
        if self.depth > 0 {
            self.depth += 1;
            return Ok(());
        }
        if (self.predicate)(name.local_name, &attrs) {
            debug!(element = name.local_name, "skipping subtree");
            self.depth = 1;
            return Ok(());
        }
        self.inner.start_element(name, attrs)
    }

    fn end_element(&mut self, name: QName<'_>) -> Result<(), LigoLwError> {
        if self.depth > 0 {
            self.depth -= 1;
            return Ok(());
        }
        self.inner.end_element(name)
    }

    fn characters(&mut self, content: &str) -> Result<(), LigoLwError> {
        if self.depth > 0 {
            return Ok(());
        }
        self.inner.characters(content)
    }
}
