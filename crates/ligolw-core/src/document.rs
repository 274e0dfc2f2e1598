//! Arena-backed document tree.

use std::io::BufRead;
use std::str::FromStr;

use indextree::{Arena, NodeId};
use ligolw_xml::Attributes;
use tracing::{debug, trace};

use crate::attributes::{AttributeProxy, AttributeType};
use crate::builder::{
    FilteringLigoLwContentHandler, LigoLwContentHandler, PartialLigoLwContentHandler,
};
use crate::element::{Element, ElementKind};
use crate::LigoLwError;

/// A LIGO Light Weight document.
///
/// Every node lives in an arena owned by the document and is addressed by a
/// [`NodeId`]. Handles stay valid after a node is detached; a detached node
/// simply reports no parent.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) arena: Arena<Element>,
    pub(crate) root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document holding only its root node.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(Element::new(ElementKind::Document));
        Self { arena, root }
    }

    /// Handle of the root node (kind [`ElementKind::Document`]).
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached node after checking its attributes.
    pub fn create_element<I, K, V>(
        &mut self,
        kind: ElementKind,
        attrs: I,
    ) -> Result<NodeId, LigoLwError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let element = Element::with_attributes(kind, attrs)?;
        Ok(self.arena.new_node(element))
    }

    /// Store an already constructed element as a detached node.
    pub fn insert_element(&mut self, element: Element) -> NodeId {
        self.arena.new_node(element)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.arena.get(id).map(|node| node.get())
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.arena.get_mut(id).map(|node| node.get_mut())
    }

    fn get(&self, id: NodeId) -> Result<&Element, LigoLwError> {
        self.element(id).ok_or(LigoLwError::UnknownNode)
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Element, LigoLwError> {
        self.element_mut(id).ok_or(LigoLwError::UnknownNode)
    }

    pub fn kind(&self, id: NodeId) -> Option<ElementKind> {
        self.element(id).map(Element::kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id)?.parent()
    }

    /// Direct children in document order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    fn is_child(&self, parent: NodeId, child: NodeId) -> bool {
        self.parent(child) == Some(parent)
    }

    /// Validate `parent` as if its children were `ids`.
    fn verify_edit(&self, parent: NodeId, ids: &[NodeId]) -> Result<(), LigoLwError> {
        let kind = self.get(parent)?.kind();
        let kinds = ids
            .iter()
            .map(|&id| self.get(id).map(Element::kind))
            .collect::<Result<Vec<_>, _>>()?;
        kind.verify_children(&kinds)
    }

    /// Current children of `parent`, leaving out `moving` since attaching it
    /// detaches it first.
    fn children_without(&self, parent: NodeId, moving: NodeId) -> Vec<NodeId> {
        self.children(parent).filter(|&id| id != moving).collect()
    }

    /// Attach `child` as the last child of `parent`, moving it if it is
    /// attached elsewhere.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), LigoLwError> {
        self.get(child)?;
        let mut ids = self.children_without(parent, child);
        ids.push(child);
        self.verify_edit(parent, &ids)?;
        parent.checked_append(child, &mut self.arena)?;
        trace!(?parent, ?child, "append child");
        Ok(())
    }

    /// Attach `new` immediately before `reference`, a child of `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        new: NodeId,
        reference: NodeId,
    ) -> Result<(), LigoLwError> {
        self.get(new)?;
        if !self.is_child(parent, reference) {
            return Err(LigoLwError::NotAChild);
        }
        if new == reference {
            return Ok(());
        }
        let mut ids = self.children_without(parent, new);
        let position = ids
            .iter()
            .position(|&id| id == reference)
            .ok_or(LigoLwError::NotAChild)?;
        ids.insert(position, new);
        self.verify_edit(parent, &ids)?;
        reference.checked_insert_before(new, &mut self.arena)?;
        Ok(())
    }

    /// Detach `child` from `parent` and return it. The detached subtree
    /// keeps its own structure.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, LigoLwError> {
        if !self.is_child(parent, child) {
            return Err(LigoLwError::NotAChild);
        }
        let ids = self.children_without(parent, child);
        self.verify_edit(parent, &ids)?;
        child.detach(&mut self.arena);
        Ok(child)
    }

    /// Put `new` where `old` was and return the detached `old`.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new: NodeId,
        old: NodeId,
    ) -> Result<NodeId, LigoLwError> {
        self.get(new)?;
        if !self.is_child(parent, old) {
            return Err(LigoLwError::NotAChild);
        }
        if new == old {
            return Ok(old);
        }
        let ids: Vec<NodeId> = self
            .children_without(parent, new)
            .into_iter()
            .map(|id| if id == old { new } else { id })
            .collect();
        self.verify_edit(parent, &ids)?;
        old.checked_insert_before(new, &mut self.arena)?;
        old.detach(&mut self.arena);
        Ok(old)
    }

    /// Detach `id` and break every parent/child link inside its subtree.
    pub fn unlink(&mut self, id: NodeId) -> Result<(), LigoLwError> {
        self.get(id)?;
        let nodes: Vec<NodeId> = id.descendants(&self.arena).collect();
        for node in nodes {
            node.detach(&mut self.arena);
        }
        Ok(())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attribute(name)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), LigoLwError> {
        self.get_mut(id)?.set_attribute(name, value)
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<Option<String>, LigoLwError> {
        Ok(self.get_mut(id)?.remove_attribute(name))
    }

    /// Read an attribute through a typed accessor.
    pub fn typed_attribute<T: AttributeType>(
        &self,
        id: NodeId,
        proxy: &AttributeProxy<T>,
    ) -> Result<T, LigoLwError> {
        proxy.get(self.get(id)?)
    }

    pub fn set_typed_attribute<T: AttributeType>(
        &mut self,
        id: NodeId,
        proxy: &AttributeProxy<T>,
        value: T,
    ) -> Result<(), LigoLwError> {
        proxy.set(self.get_mut(id)?, value)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.element(id)?.text()
    }

    pub fn set_text(&mut self, id: NodeId, text: Option<String>) -> Result<(), LigoLwError> {
        self.get_mut(id)?.set_text(text);
        Ok(())
    }

    pub fn append_data(&mut self, id: NodeId, content: &str) -> Result<(), LigoLwError> {
        self.get_mut(id)?.append_data(content);
        Ok(())
    }

    /// Every node in the subtree of `id` (itself included) accepted by
    /// `filter`. A node's descendants are reported before the node itself.
    pub fn get_elements<F>(&self, id: NodeId, mut filter: F) -> Vec<NodeId>
    where
        F: FnMut(&Element) -> bool,
    {
        let mut found = Vec::new();
        self.collect_elements(id, &mut filter, &mut found);
        found
    }

    fn collect_elements<F>(&self, id: NodeId, filter: &mut F, found: &mut Vec<NodeId>)
    where
        F: FnMut(&Element) -> bool,
    {
        for child in self.children(id) {
            self.collect_elements(child, filter, found);
        }
        if self.element(id).is_some_and(|element| filter(element)) {
            found.push(id);
        }
    }

    pub fn get_elements_by_tag_name(&self, id: NodeId, tag_name: &str) -> Vec<NodeId> {
        self.get_elements(id, |element| element.tag_name() == tag_name)
    }

    /// Direct children of `id` holding every listed attribute value.
    pub fn get_children_by_attributes(&self, id: NodeId, attrs: &[(&str, &str)]) -> Vec<NodeId> {
        self.children(id)
            .filter(|&child| {
                attrs
                    .iter()
                    .all(|(name, value)| self.attribute(child, name) == Some(*value))
            })
            .collect()
    }

    /// Pre-order walk over the subtree of `id`, excluding `id`.
    pub fn walk_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.descendants(&self.arena).skip(1)
    }

    /// Build a document from a buffered XML source.
    pub fn load<R: BufRead>(source: R) -> Result<Self, LigoLwError> {
        let mut document = Self::new();
        ligolw_xml::parse_reader(source, &mut LigoLwContentHandler::new(&mut document))?;
        debug!(nodes = document.walk_children(document.root).count(), "document loaded");
        Ok(document)
    }

    /// Build a document holding only the subtrees whose start tag matches
    /// `predicate`, under the source's outermost element.
    pub fn load_partial<R, F>(source: R, predicate: F) -> Result<Self, LigoLwError>
    where
        R: BufRead,
        F: FnMut(&str, &Attributes) -> bool,
    {
        let mut document = Self::new();
        {
            let mut handler = PartialLigoLwContentHandler::new(&mut document, predicate);
            ligolw_xml::parse_reader(source, &mut handler)?;
        }
        debug!(nodes = document.walk_children(document.root).count(), "partial document loaded");
        Ok(document)
    }

    /// Build a document without the subtrees whose start tag matches
    /// `predicate`.
    pub fn load_filtered<R, F>(source: R, predicate: F) -> Result<Self, LigoLwError>
    where
        R: BufRead,
        F: FnMut(&str, &Attributes) -> bool,
    {
        let mut document = Self::new();
        {
            let mut handler = FilteringLigoLwContentHandler::new(&mut document, predicate);
            ligolw_xml::parse_reader(source, &mut handler)?;
        }
        debug!(nodes = document.walk_children(document.root).count(), "filtered document loaded");
        Ok(document)
    }
}

impl FromStr for Document {
    type Err = LigoLwError;

    fn from_str(xml: &str) -> Result<Self, Self::Err> {
        Self::load(xml.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{dim, table};
    use ElementKind::{Array, Column, Comment, Dim, LigoLw, Param, Stream, Table};

    fn node(doc: &mut Document, kind: ElementKind) -> NodeId {
        doc.create_element(kind, Vec::<(&str, &str)>::new())
            .expect("element")
    }

    fn kinds(doc: &Document, id: NodeId) -> Vec<ElementKind> {
        doc.children(id).filter_map(|c| doc.kind(c)).collect()
    }

    fn table_with(doc: &mut Document, children: &[ElementKind]) -> (NodeId, Vec<NodeId>) {
        let table = node(doc, Table);
        let ids = children
            .iter()
            .map(|&kind| {
                let id = node(doc, kind);
                doc.append_child(table, id).expect("valid child");
                id
            })
            .collect();
        (table, ids)
    }

    #[test]
    fn table_children_follow_their_order() {
        let mut doc = Document::new();
        let (table, _) = table_with(&mut doc, &[Comment, Column, Column, Stream]);
        assert_eq!(kinds(&doc, table), vec![Comment, Column, Column, Stream]);

        let late = node(&mut doc, Column);
        let err = doc.append_child(table, late).unwrap_err();
        assert!(matches!(err, LigoLwError::ChildOrder { reason, .. } if reason == "Column(s) must come before Stream"));
        assert_eq!(doc.parent(late), None);
        assert_eq!(kinds(&doc, table), vec![Comment, Column, Column, Stream]);
    }

    #[test]
    fn table_rejects_foreign_children() {
        let mut doc = Document::new();
        let (table, _) = table_with(&mut doc, &[Column]);
        let param = node(&mut doc, Param);
        let err = doc.append_child(table, param).unwrap_err();
        assert!(matches!(
            err,
            LigoLwError::InvalidChild {
                parent: "Table",
                child: "Param"
            }
        ));
    }

    #[test]
    fn second_comment_and_second_stream_are_rejected() {
        let mut doc = Document::new();
        let (table, ids) = table_with(&mut doc, &[Comment, Column, Stream]);
        let comment = node(&mut doc, Comment);
        let err = doc.insert_before(table, comment, ids[0]).unwrap_err();
        assert!(matches!(err, LigoLwError::ChildOrder { reason: "only one Comment allowed", .. }));

        let stream = node(&mut doc, Stream);
        let err = doc.append_child(table, stream).unwrap_err();
        assert!(matches!(err, LigoLwError::ChildOrder { reason: "only one Stream allowed", .. }));
    }

    #[test]
    fn insert_before_places_the_node() {
        let mut doc = Document::new();
        let (table, ids) = table_with(&mut doc, &[Column, Stream]);
        let comment = node(&mut doc, Comment);
        doc.insert_before(table, comment, ids[0]).unwrap();
        assert_eq!(kinds(&doc, table), vec![Comment, Column, Stream]);

        let column = node(&mut doc, Column);
        doc.insert_before(table, column, ids[1]).unwrap();
        assert_eq!(kinds(&doc, table), vec![Comment, Column, Column, Stream]);
    }

    #[test]
    fn insert_before_requires_a_child_reference() {
        let mut doc = Document::new();
        let (table, _) = table_with(&mut doc, &[Column]);
        let stray = node(&mut doc, Column);
        let new = node(&mut doc, Column);
        let err = doc.insert_before(table, new, stray).unwrap_err();
        assert!(matches!(err, LigoLwError::NotAChild));
    }

    #[test]
    fn replace_child_validates_the_resulting_list() {
        let mut doc = Document::new();
        let (table, ids) = table_with(&mut doc, &[Comment, Column, Stream]);

        let column = node(&mut doc, Column);
        let old = doc.replace_child(table, column, ids[0]).unwrap();
        assert_eq!(old, ids[0]);
        assert_eq!(doc.parent(old), None);
        assert_eq!(kinds(&doc, table), vec![Column, Column, Stream]);

        let comment = node(&mut doc, Comment);
        let err = doc.replace_child(table, comment, ids[2]).unwrap_err();
        assert!(matches!(err, LigoLwError::ChildOrder { .. }));
        assert_eq!(kinds(&doc, table), vec![Column, Column, Stream]);
        assert_eq!(doc.parent(comment), None);

        assert_eq!(doc.replace_child(table, ids[1], ids[1]).unwrap(), ids[1]);
        assert_eq!(kinds(&doc, table), vec![Column, Column, Stream]);
    }

    #[test]
    fn remove_child_detaches_and_checks_membership() {
        let mut doc = Document::new();
        let (table, ids) = table_with(&mut doc, &[Comment, Column, Stream]);
        assert_eq!(doc.remove_child(table, ids[1]).unwrap(), ids[1]);
        assert_eq!(kinds(&doc, table), vec![Comment, Stream]);
        assert!(matches!(
            doc.remove_child(table, ids[1]),
            Err(LigoLwError::NotAChild)
        ));
    }

    #[test]
    fn array_orders_dims_before_stream() {
        let mut doc = Document::new();
        let array = node(&mut doc, Array);
        for kind in [Dim, Dim, Stream] {
            let id = node(&mut doc, kind);
            doc.append_child(array, id).unwrap();
        }
        let dim = node(&mut doc, Dim);
        let err = doc.append_child(array, dim).unwrap_err();
        assert!(matches!(err, LigoLwError::ChildOrder { reason: "Dim(s) must come before Stream", .. }));
        let column = node(&mut doc, Column);
        assert!(matches!(
            doc.append_child(array, column),
            Err(LigoLwError::InvalidChild { .. })
        ));
    }

    #[test]
    fn appending_moves_an_attached_node() {
        let mut doc = Document::new();
        let first = node(&mut doc, LigoLw);
        let second = node(&mut doc, LigoLw);
        let comment = node(&mut doc, Comment);
        doc.append_child(first, comment).unwrap();
        doc.append_child(second, comment).unwrap();
        assert_eq!(doc.children(first).count(), 0);
        assert_eq!(doc.parent(comment), Some(second));
    }

    #[test]
    fn appending_an_ancestor_is_rejected() {
        let mut doc = Document::new();
        let outer = node(&mut doc, LigoLw);
        let inner = node(&mut doc, LigoLw);
        doc.append_child(outer, inner).unwrap();
        assert!(matches!(
            doc.append_child(inner, outer),
            Err(LigoLwError::Tree(_))
        ));
        assert_eq!(doc.parent(inner), Some(outer));
    }

    #[test]
    fn inserting_a_child_before_itself_is_a_no_op() {
        let mut doc = Document::new();
        let (table, ids) = table_with(&mut doc, &[Comment, Column, Stream]);
        doc.insert_before(table, ids[1], ids[1]).unwrap();
        assert_eq!(kinds(&doc, table), vec![Comment, Column, Stream]);
        assert_eq!(doc.parent(ids[1]), Some(table));
    }

    #[test]
    fn document_root_holds_a_single_ligo_lw() {
        let mut doc = Document::new();
        let root = doc.root();
        let first = node(&mut doc, LigoLw);
        doc.append_child(root, first).unwrap();

        let second = node(&mut doc, LigoLw);
        let err = doc.append_child(root, second).unwrap_err();
        assert!(matches!(
            err,
            LigoLwError::ChildOrder { parent: "Document", reason: "only one LIGO_LW allowed" }
        ));
        assert!(matches!(
            doc.insert_before(root, second, first),
            Err(LigoLwError::ChildOrder { .. })
        ));
        assert_eq!(doc.children(root).collect::<Vec<_>>(), vec![first]);
        assert_eq!(doc.parent(second), None);

        assert_eq!(doc.replace_child(root, second, first).unwrap(), first);
        assert_eq!(doc.children(root).collect::<Vec<_>>(), vec![second]);
    }

    #[test]
    fn second_top_level_element_is_not_loaded() {
        let err = r#"<LIGO_LW Name="a"/><LIGO_LW Name="b"/>"#
            .parse::<Document>()
            .unwrap_err();
        assert!(matches!(err, LigoLwError::Xml(_)));
    }

    #[test]
    fn unlink_clears_every_link_in_the_subtree() {
        let mut doc = Document::new();
        let ligo_lw = node(&mut doc, LigoLw);
        doc.append_child(doc.root(), ligo_lw).unwrap();
        let (table, ids) = table_with(&mut doc, &[Column, Stream]);
        doc.append_child(ligo_lw, table).unwrap();

        doc.unlink(table).unwrap();
        assert_eq!(doc.children(ligo_lw).count(), 0);
        assert_eq!(doc.parent(table), None);
        assert_eq!(doc.children(table).count(), 0);
        for id in ids {
            assert_eq!(doc.parent(id), None);
            assert!(doc.kind(id).is_some());
        }
    }

    #[test]
    fn subtree_query_reports_descendants_before_self() {
        let xml = r#"<LIGO_LW Name="outer"><LIGO_LW Name="a"><LIGO_LW Name="a1"/></LIGO_LW><LIGO_LW Name="b"/></LIGO_LW>"#;
        let doc: Document = xml.parse().unwrap();
        let found = doc.get_elements_by_tag_name(doc.root(), "LIGO_LW");
        let names: Vec<_> = found
            .iter()
            .map(|&id| doc.attribute(id, "Name").unwrap())
            .collect();
        assert_eq!(names, vec!["a1", "a", "b", "outer"]);

        let walked: Vec<_> = doc
            .walk_children(doc.root())
            .map(|id| doc.attribute(id, "Name").unwrap())
            .collect();
        assert_eq!(walked, vec!["outer", "a", "a1", "b"]);
    }

    #[test]
    fn children_can_be_selected_by_attributes() {
        let xml = r#"<LIGO_LW><Param Name="x" Type="real_8">1</Param><Param Name="y" Type="real_8">2</Param><Param Name="x" Type="lstring">z</Param></LIGO_LW>"#;
        let doc: Document = xml.parse().unwrap();
        let ligo_lw = doc.children(doc.root()).next().unwrap();
        let hits = doc.get_children_by_attributes(ligo_lw, &[("Name", "x"), ("Type", "real_8")]);
        assert_eq!(hits.len(), 1);
        assert_eq!(doc.text(hits[0]), Some("1"));
        assert_eq!(doc.get_children_by_attributes(ligo_lw, &[("Name", "x")]).len(), 2);
        assert_eq!(doc.get_children_by_attributes(ligo_lw, &[]).len(), 3);
    }

    #[test]
    fn typed_and_raw_attributes_through_the_document() {
        let mut doc = Document::new();
        let t = doc.create_element(Table, [("Name", "sngl_inspiral:table")]).unwrap();
        assert_eq!(doc.typed_attribute(t, &table::NAME).unwrap(), "sngl_inspiral:table");
        assert!(doc.set_attribute(t, "Unit", "s").is_err());
        assert_eq!(doc.remove_attribute(t, "Name").unwrap(), Some("sngl_inspiral:table".into()));
        assert!(!doc.has_attribute(t, "Name"));

        let d = node(&mut doc, Dim);
        doc.set_typed_attribute(d, &dim::START, 2.5).unwrap();
        assert_eq!(doc.attribute(d, "Start"), Some("2.5"));
        doc.append_data(d, "4").unwrap();
        doc.append_data(d, "2").unwrap();
        assert_eq!(doc.text(d), Some("42"));
    }
}
