//! Visual surface backends.
//!
//! The materializer only talks to the [`Applier`] trait. [`MemoryApplier`] keeps the
//! surface in an in-process arena, which is what tests and headless hosts use.

use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::element::{EventHandler, PropValue};
use crate::{NodeError, NodeId};

/// Event delivered to listeners by a backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub target: NodeId,
}

pub trait Applier {
    fn create_element(&mut self, tag: &str) -> Result<NodeId, NodeError>;
    fn create_text(&mut self, text: &str) -> Result<NodeId, NodeError>;
    fn set_property(&mut self, node: NodeId, name: &str, value: &PropValue) -> Result<(), NodeError>;
    fn clear_property(&mut self, node: NodeId, name: &str) -> Result<(), NodeError>;
    fn add_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), NodeError>;
    fn remove_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), NodeError>;
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError>;
    fn clear_children(&mut self, node: NodeId) -> Result<(), NodeError>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum MemoryNodeKind {
    Element { tag: String },
    Text { value: String },
}

#[derive(Clone, Debug)]
pub struct MemoryNode {
    pub kind: MemoryNodeKind,
    pub properties: IndexMap<String, PropValue>,
    pub listeners: Vec<(String, EventHandler)>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

impl MemoryNode {
    fn new(kind: MemoryNodeKind) -> Self {
        Self {
            kind,
            properties: IndexMap::new(),
            listeners: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            MemoryNodeKind::Element { tag } => Some(tag),
            MemoryNodeKind::Text { .. } => None,
        }
    }
}

/// In-memory surface. Ids of removed nodes are recycled by later inserts.
#[derive(Default)]
pub struct MemoryApplier {
    nodes: Vec<Option<MemoryNode>>,
    free: Vec<NodeId>,
}

impl MemoryApplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached element to use as a mount target.
    pub fn create_root(&mut self, tag: &str) -> NodeId {
        self.insert(MemoryNode::new(MemoryNodeKind::Element {
            tag: tag.to_owned(),
        }))
    }

    pub fn node(&self, id: NodeId) -> Result<&MemoryNode, NodeError> {
        self.nodes
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(NodeError::Missing { id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, NodeError> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(NodeError::Missing { id })
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, NodeError> {
        let node = self.node_mut(id)?;
        match node.kind {
            MemoryNodeKind::Element { .. } => Ok(node),
            MemoryNodeKind::Text { .. } => Err(NodeError::NotAnElement { id }),
        }
    }

    fn insert(&mut self, node: MemoryNode) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id] = Some(node);
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(Some(node));
        id
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of node slots allocated, live or free.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId], NodeError> {
        Ok(&self.node(id)?.children)
    }

    pub fn listener_count(&self, id: NodeId, event: &str) -> Result<usize, NodeError> {
        Ok(self
            .node(id)?
            .listeners
            .iter()
            .filter(|(name, _)| name == event)
            .count())
    }

    /// Calls every listener bound to `event` on `id` and returns how many ran.
    ///
    /// Listeners are collected before any of them runs, so a handler may freely
    /// trigger state changes.
    pub fn dispatch_event(&self, id: NodeId, event: &str) -> Result<usize, NodeError> {
        let handlers: Vec<EventHandler> = self
            .node(id)?
            .listeners
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, handler)| handler.clone())
            .collect();
        let payload = Event {
            name: event.to_owned(),
            target: id,
        };
        for handler in &handlers {
            handler.call(&payload);
        }
        Ok(handlers.len())
    }

    /// Concatenated text of every text node below `id`, in document order.
    pub fn text_content(&self, id: NodeId) -> Result<String, NodeError> {
        let mut output = String::new();
        self.collect_text(id, &mut output)?;
        Ok(output)
    }

    fn collect_text(&self, id: NodeId, output: &mut String) -> Result<(), NodeError> {
        let node = self.node(id)?;
        match &node.kind {
            MemoryNodeKind::Text { value } => output.push_str(value),
            MemoryNodeKind::Element { .. } => {
                for child in &node.children {
                    self.collect_text(*child, output)?;
                }
            }
        }
        Ok(())
    }

    /// Elements with `tag` below `root` (inclusive), in document order.
    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.collect_tag(root, tag, &mut found);
        found
    }

    fn collect_tag(&self, id: NodeId, tag: &str, found: &mut Vec<NodeId>) {
        let Ok(node) = self.node(id) else {
            return;
        };
        if node.tag() == Some(tag) {
            found.push(id);
        }
        for child in &node.children {
            self.collect_tag(*child, tag, found);
        }
    }

    pub fn dump_tree(&self, root: Option<NodeId>) -> String {
        let mut output = String::new();
        if let Some(root_id) = root {
            self.dump_node(&mut output, root_id, 0);
        } else {
            output.push_str("(no root)\n");
        }
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        match self.nodes.get(id) {
            Some(Some(node)) => {
                match &node.kind {
                    MemoryNodeKind::Element { tag } => {
                        let _ = write!(output, "{indent}[{id}] <{tag}>");
                        for (name, value) in &node.properties {
                            let _ = write!(output, " {name}={value:?}");
                        }
                        for (event, _) in &node.listeners {
                            let _ = write!(output, " @{event}");
                        }
                        output.push('\n');
                    }
                    MemoryNodeKind::Text { value } => {
                        let _ = writeln!(output, "{indent}[{id}] {value:?}");
                    }
                }
                for child in &node.children {
                    self.dump_node(output, *child, depth + 1);
                }
            }
            _ => {
                let _ = writeln!(output, "{indent}[{id}] (missing)");
            }
        }
    }

    fn remove(&mut self, id: NodeId) -> Result<(), NodeError> {
        let children = self.node(id)?.children.clone();
        for child_id in children {
            // Already-removed children are not an error here.
            let _ = self.remove(child_id);
        }
        let slot = self.nodes.get_mut(id).ok_or(NodeError::Missing { id })?;
        if slot.take().is_some() {
            self.free.push(id);
        }
        Ok(())
    }
}

impl Applier for MemoryApplier {
    fn create_element(&mut self, tag: &str) -> Result<NodeId, NodeError> {
        Ok(self.insert(MemoryNode::new(MemoryNodeKind::Element {
            tag: tag.to_owned(),
        })))
    }

    fn create_text(&mut self, text: &str) -> Result<NodeId, NodeError> {
        Ok(self.insert(MemoryNode::new(MemoryNodeKind::Text {
            value: text.to_owned(),
        })))
    }

    fn set_property(&mut self, node: NodeId, name: &str, value: &PropValue) -> Result<(), NodeError> {
        self.node_mut(node)?
            .properties
            .insert(name.to_owned(), value.clone());
        Ok(())
    }

    fn clear_property(&mut self, node: NodeId, name: &str) -> Result<(), NodeError> {
        self.node_mut(node)?
            .properties
            .insert(name.to_owned(), PropValue::Str(String::new()));
        Ok(())
    }

    fn add_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), NodeError> {
        let node = self.element_mut(node)?;
        // Re-adding the same handler for the same event is a no-op, as on the web.
        let bound = node
            .listeners
            .iter()
            .any(|(name, existing)| name == event && existing.ptr_eq(handler));
        if !bound {
            node.listeners.push((event.to_owned(), handler.clone()));
        }
        Ok(())
    }

    fn remove_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), NodeError> {
        self.element_mut(node)?
            .listeners
            .retain(|(name, existing)| !(name == event && existing.ptr_eq(handler)));
        Ok(())
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        self.node(child)?;
        self.element_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn clear_children(&mut self, node: NodeId) -> Result<(), NodeError> {
        let children = std::mem::take(&mut self.element_mut(node)?.children);
        for child in children {
            self.remove(child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_children_frees_whole_subtree() {
        let mut applier = MemoryApplier::new();
        let root = applier.create_root("body");
        let list = applier.create_element("ul").unwrap();
        let item = applier.create_element("li").unwrap();
        let label = applier.create_text("one").unwrap();
        applier.append_child(item, label).unwrap();
        applier.append_child(list, item).unwrap();
        applier.append_child(root, list).unwrap();
        assert_eq!(applier.len(), 4);

        applier.clear_children(root).unwrap();

        assert_eq!(applier.len(), 1);
        assert!(applier.children(root).unwrap().is_empty());
        assert!(matches!(applier.node(label), Err(NodeError::Missing { .. })));
    }

    #[test]
    fn removed_ids_are_reused() {
        let mut applier = MemoryApplier::new();
        let root = applier.create_root("body");
        for round in 0..100 {
            applier.clear_children(root).unwrap();
            let item = applier.create_element("li").unwrap();
            let label = applier.create_text(&round.to_string()).unwrap();
            applier.append_child(item, label).unwrap();
            applier.append_child(root, item).unwrap();
        }

        assert_eq!(applier.capacity(), 3);
        assert_eq!(applier.len(), 3);
        assert_eq!(applier.text_content(root).unwrap(), "99");
    }

    #[test]
    fn text_nodes_reject_children() {
        let mut applier = MemoryApplier::new();
        let text = applier.create_text("leaf").unwrap();
        let span = applier.create_element("span").unwrap();
        assert_eq!(
            applier.append_child(text, span),
            Err(NodeError::NotAnElement { id: text })
        );
    }

    #[test]
    fn dump_tree_lists_properties_and_listeners() {
        let mut applier = MemoryApplier::new();
        let root = applier.create_root("body");
        let button = applier.create_element("button").unwrap();
        applier
            .set_property(button, "id", &PropValue::from("inc"))
            .unwrap();
        applier
            .add_event_listener(button, "click", &EventHandler::new(|_| {}))
            .unwrap();
        applier.append_child(root, button).unwrap();

        let dump = applier.dump_tree(Some(root));
        assert!(dump.contains("<button> id=Str(\"inc\") @click"), "{dump}");
    }
}
