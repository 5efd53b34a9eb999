//! In-crate document model.
//!
//! The engine never talks to a browser directly. The host mirrors the parts
//! of the page the lightbox cares about into a [`Document`] (an arena of
//! element nodes) and feeds events back in; everything the engine does is a
//! mutation of this tree that the host can replay onto the real DOM.
//!
//! Only element nodes exist. Text is a per-element `text` slot, which is all
//! `textContent` assignments in the overlay need. Node ids are never reused:
//! removing a node detaches it, and a detached node can be re-attached.
//!
//! Structural changes under a connected parent are recorded as
//! [`MutationRecord`]s, drained by [`Document::take_mutations`]. This is the
//! analogue of a `MutationObserver` with `{ childList: true, subtree: true }`.

pub mod selector;

pub use selector::{Selector, SelectorError};

/// Handle to an element in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Default)]
struct Node {
    tag: String,
    attributes: Vec<(String, String)>,
    classes: Vec<String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// `style.display = "none"`
    hidden: bool,
    disabled: bool,
}

/// Options accepted by [`Document::focus`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusOptions {
    pub prevent_scroll: bool,
}

/// One batch of child-list changes on `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
    active: Option<NodeId>,
    last_focus: Option<FocusOptions>,
    mutations: Vec<MutationRecord>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty `<html><body></body></html>` document.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            active: None,
            last_focus: None,
            mutations: Vec::new(),
        };
        let root = doc.alloc("html");
        let body = doc.alloc("body");
        doc.nodes[body.0].parent = Some(root);
        doc.nodes[root.0].children.push(body);
        doc.root = root;
        doc.body = body;
        doc
    }

    fn alloc(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            tag: tag.to_ascii_lowercase(),
            ..Node::default()
        });
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(tag)
    }

    pub fn tag(&self, id: NodeId) -> &str {
        &self.node(id).tag
    }

    // =========================================================================
    // Tree structure
    // =========================================================================

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Append `child` as the last child of `parent`, detaching it from its
    /// previous parent first. Appending a node into its own subtree is
    /// ignored.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || self.contains(child, parent) {
            return;
        }
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
        if self.is_connected(parent) {
            self.mutations.push(MutationRecord {
                target: parent,
                added_nodes: vec![child],
                removed_nodes: Vec::new(),
            });
        }
    }

    /// Detach `id` from its parent. Returns `false` if it had none.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root {
            return false;
        }
        self.detach(id)
    }

    fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.node(id).parent else {
            return false;
        };
        let was_connected = self.is_connected(parent);
        self.node_mut(parent).children.retain(|&c| c != id);
        self.node_mut(id).parent = None;
        if self.active.is_some_and(|a| a == id || self.contains(id, a)) {
            self.active = None;
        }
        if was_connected {
            self.mutations.push(MutationRecord {
                target: parent,
                added_nodes: Vec::new(),
                removed_nodes: vec![id],
            });
        }
        true
    }

    /// True if `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// True if `node` is attached to the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(self.root, node)
    }

    /// Nearest inclusive ancestor satisfying `pred`.
    pub fn closest(&self, node: NodeId, pred: impl Fn(NodeId) -> bool) -> Option<NodeId> {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if pred(current) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    /// Descendants of `node` (exclusive) in document order.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    // =========================================================================
    // Attributes, classes, content
    // =========================================================================

    /// Attribute value. `class` is kept in sync with the class list.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All attributes of `id` as `(name, value)`, in insertion order.
    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = (&str, &str)> {
        self.node(id)
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if name == "class" {
            let classes = value.split_whitespace().map(String::from).collect();
            self.node_mut(id).classes = classes;
            self.sync_class_attribute(id);
            return;
        }
        let node = self.node_mut(id);
        match node.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => node.attributes.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if name == "class" {
            self.node_mut(id).classes.clear();
        }
        self.node_mut(id).attributes.retain(|(k, _)| k != name);
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.node(id).classes.iter().any(|c| c == class)
    }

    pub fn classes(&self, id: NodeId) -> &[String] {
        &self.node(id).classes
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if class.is_empty() || self.has_class(id, class) {
            return;
        }
        self.node_mut(id).classes.push(class.to_string());
        self.sync_class_attribute(id);
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) {
            return;
        }
        self.node_mut(id).classes.retain(|c| c != class);
        self.sync_class_attribute(id);
    }

    fn sync_class_attribute(&mut self, id: NodeId) {
        let joined = self.node(id).classes.join(" ");
        let node = self.node_mut(id);
        node.attributes.retain(|(k, _)| k != "class");
        if !joined.is_empty() {
            node.attributes.push(("class".to_string(), joined));
        }
    }

    pub fn text(&self, id: NodeId) -> &str {
        &self.node(id).text
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.node_mut(id).text = text.to_string();
    }

    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.node(id).hidden
    }

    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        self.node_mut(id).hidden = hidden;
    }

    pub fn is_disabled(&self, id: NodeId) -> bool {
        self.node(id).disabled
    }

    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) {
        self.node_mut(id).disabled = disabled;
    }

    // =========================================================================
    // Focus
    // =========================================================================

    pub fn active_element(&self) -> Option<NodeId> {
        self.active
    }

    /// Options passed with the most recent successful `focus` call.
    pub fn last_focus_options(&self) -> Option<FocusOptions> {
        self.last_focus
    }

    /// Focus `id`. Detached and disabled elements cannot take focus.
    pub fn focus(&mut self, id: NodeId, options: FocusOptions) -> bool {
        if !self.is_connected(id) || self.is_disabled(id) {
            return false;
        }
        self.active = Some(id);
        self.last_focus = Some(options);
        true
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All connected elements matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self.select_all(&selector))
    }

    /// First connected element matching `selector`.
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .descendants(self.root)
            .into_iter()
            .find(|&n| selector.matches(self, n)))
    }

    pub fn select_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&n| selector.matches(self, n))
            .collect()
    }

    // =========================================================================
    // Mutation log
    // =========================================================================

    /// Drain child-list records accumulated since the last call.
    pub fn take_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.mutations)
    }
}
