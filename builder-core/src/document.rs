//! Document model: the node map, the root id and tree mutation primitives.
//!
//! Children are discovered through the registry's reference-typed properties
//! (see [`ComponentNode::child_ids`]); the document never stores a separate
//! parent index, so parent lookups are linear scans. That is fine at editor
//! scale (hundreds of nodes).
//!
//! A child id whose node was deleted without detaching the parent reference is
//! tolerated. [`Document::dangling_references`] reports such ids and
//! [`Document::prune_dangling`] removes them.

use std::collections::{HashMap, HashSet};

use crate::error::{BuilderError, BuilderResult};
use crate::history::Snapshot;
use crate::node::{ComponentNode, Kind, NodeId, Style};
use crate::schema::ComponentKind;
use crate::value::{PropValue, Props};

/// Id of the synthesized root node.
pub const DEFAULT_ROOT_ID: &str = "root";

/// A surface document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// All nodes, indexed by id.
    nodes: HashMap<NodeId, ComponentNode>,
    /// Insertion order of ids.
    order: Vec<NodeId>,
    /// Id of the root node.
    root_id: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::with_default_root()
    }
}

impl Document {
    /// Create a document containing only `root`.
    #[must_use]
    pub fn new(root: ComponentNode) -> Self {
        let root_id = root.id.clone();
        let mut doc = Self {
            nodes: HashMap::new(),
            order: Vec::new(),
            root_id,
        };
        doc.insert(root);
        doc
    }

    /// Create a document with a synthesized `column` root.
    #[must_use]
    pub fn with_default_root() -> Self {
        Self::new(ComponentNode::with_defaults(
            DEFAULT_ROOT_ID,
            ComponentKind::Column,
        ))
    }

    /// Build a document from nodes in order.
    ///
    /// If `root_id` does not resolve, a default `column` root with that id is
    /// synthesized and placed first. Later duplicates replace earlier nodes.
    #[must_use]
    pub fn from_nodes(nodes: Vec<ComponentNode>, root_id: NodeId) -> Self {
        let mut doc = Self {
            nodes: HashMap::new(),
            order: Vec::new(),
            root_id: root_id.clone(),
        };
        if !nodes.iter().any(|node| node.id == root_id) {
            doc.insert(ComponentNode::with_defaults(root_id, ComponentKind::Column));
        }
        for node in nodes {
            doc.insert(node);
        }
        doc
    }

    /// Id of the root node.
    #[must_use]
    pub fn root_id(&self) -> &NodeId {
        &self.root_id
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> Option<&ComponentNode> {
        self.nodes.get(&self.root_id)
    }

    /// Get a node by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ComponentNode> {
        self.nodes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut ComponentNode> {
        self.nodes.get_mut(id)
    }

    /// Whether a node with `id` exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &ComponentNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.order.iter()
    }

    /// Insert a node without attaching it to any parent.
    ///
    /// An existing node with the same id is replaced in place and returned.
    pub fn insert(&mut self, node: ComponentNode) -> Option<ComponentNode> {
        let id = node.id.clone();
        let previous = self.nodes.insert(id.clone(), node);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// `id` and every node reachable from it, in pre-order.
    ///
    /// Ids that do not resolve (dangling references) are skipped.
    #[must_use]
    pub fn subtree(&self, id: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        self.collect_subtree(id, &mut visited, &mut out);
        out
    }

    fn collect_subtree<'a>(
        &'a self,
        id: &str,
        visited: &mut HashSet<&'a str>,
        out: &mut Vec<NodeId>,
    ) {
        let Some((key, node)) = self.nodes.get_key_value(id) else {
            return;
        };
        if !visited.insert(key.as_str()) {
            return;
        }
        out.push(key.clone());
        for child in node.child_ids() {
            self.collect_subtree(child, visited, out);
        }
    }

    /// Every node reachable from `id`, excluding `id` itself.
    #[must_use]
    pub fn descendants(&self, id: &str) -> Vec<NodeId> {
        let mut all = self.subtree(id);
        if !all.is_empty() {
            all.remove(0);
        }
        all
    }

    /// Whether `id` is reachable from `ancestor` (strictly below it).
    #[must_use]
    pub fn is_descendant(&self, id: &str, ancestor: &str) -> bool {
        id != ancestor && self.subtree(ancestor).iter().any(|n| n.as_str() == id)
    }

    /// First node (in insertion order) that references `child_id`.
    #[must_use]
    pub fn find_parent_id(&self, child_id: &str) -> Option<NodeId> {
        self.nodes()
            .find(|node| node.references(child_id))
            .map(|node| node.id.clone())
    }

    /// Whether no node can reach itself through child references.
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Active,
            Done,
        }

        fn visit<'a>(doc: &'a Document, id: &'a str, marks: &mut HashMap<&'a str, Mark>) -> bool {
            match marks.get(id) {
                Some(Mark::Active) => return false,
                Some(Mark::Done) => return true,
                None => {}
            }
            let Some(node) = doc.nodes.get(id) else {
                return true;
            };
            marks.insert(id, Mark::Active);
            for child in node.child_ids() {
                if !visit(doc, child, marks) {
                    return false;
                }
            }
            marks.insert(id, Mark::Done);
            true
        }

        let mut marks = HashMap::new();
        self.order
            .iter()
            .all(|id| visit(self, id.as_str(), &mut marks))
    }

    /// `(parent, child)` pairs where the child id does not resolve.
    #[must_use]
    pub fn dangling_references(&self) -> Vec<(NodeId, String)> {
        self.nodes()
            .flat_map(|node| {
                node.child_ids()
                    .into_iter()
                    .filter(|child| !self.contains(child))
                    .map(|child| (node.id.clone(), child.to_string()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Remove every dangling child reference. Returns how many were removed.
    pub fn prune_dangling(&mut self) -> usize {
        let dangling = self.dangling_references();
        for (parent, child) in &dangling {
            if let Some(node) = self.nodes.get_mut(parent.as_str()) {
                node.remove_reference(child);
            }
        }
        dangling.len()
    }

    /// Hierarchy listing from the root, for tree panels.
    ///
    /// Widget instances are listed as leaves.
    #[must_use]
    pub fn outline(&self) -> Vec<OutlineEntry> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        self.collect_outline(self.root_id.as_str(), 0, &mut visited, &mut out);
        out
    }

    fn collect_outline<'a>(
        &'a self,
        id: &str,
        depth: usize,
        visited: &mut HashSet<&'a str>,
        out: &mut Vec<OutlineEntry>,
    ) {
        let Some((key, node)) = self.nodes.get_key_value(id) else {
            return;
        };
        if !visited.insert(key.as_str()) {
            return;
        }
        out.push(OutlineEntry {
            id: key.clone(),
            kind: node.kind.clone(),
            depth,
        });
        for child in node.child_ids() {
            self.collect_outline(child, depth + 1, visited, out);
        }
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Shallow-merge `patch` into the node `id`.
    ///
    /// Returns `Ok(false)` when `id` does not exist. Renaming rewrites every
    /// reference to the old id and moves the root id when the root is renamed.
    ///
    /// # Errors
    ///
    /// - [`BuilderError::DuplicateId`] if renaming onto another existing id.
    /// - [`BuilderError::CycleDetected`] if new references would make the
    ///   node reachable from itself.
    /// - [`BuilderError::InvalidTarget`] if the node would reference the root.
    pub fn update(&mut self, id: &str, patch: NodePatch) -> BuilderResult<bool> {
        let Some(current) = self.nodes.get(id) else {
            tracing::debug!(id, "update on missing node ignored");
            return Ok(false);
        };

        let new_id = patch.id.clone().unwrap_or_else(|| current.id.clone());
        if new_id.as_str() != id && self.contains(new_id.as_str()) {
            return Err(BuilderError::DuplicateId(new_id.to_string()));
        }

        let mut updated = current.clone();
        patch.apply_to(&mut updated);
        updated.id = new_id.clone();

        let before: HashSet<&str> = current.child_ids().into_iter().collect();
        for child in updated.child_ids() {
            if before.contains(child) {
                continue;
            }
            if child == id || child == new_id.as_str() || self.is_descendant(id, child) {
                return Err(BuilderError::CycleDetected {
                    node: child.to_string(),
                    target: new_id.to_string(),
                });
            }
            if child == self.root_id.as_str() {
                return Err(BuilderError::InvalidTarget(format!(
                    "root {child} cannot be a child of {new_id}"
                )));
            }
        }

        if new_id.as_str() == id {
            self.nodes.insert(new_id, updated);
            return Ok(true);
        }

        self.nodes.remove(id);
        self.nodes.insert(new_id.clone(), updated);
        if let Some(slot) = self.order.iter_mut().find(|slot| slot.as_str() == id) {
            *slot = new_id.clone();
        }
        for node in self.nodes.values_mut() {
            node.replace_reference(id, new_id.as_str());
        }
        if self.root_id.as_str() == id {
            self.root_id = new_id;
        }
        Ok(true)
    }

    /// Delete every listed node together with its whole subtree.
    ///
    /// Parent references to deleted ids are left in place. The root is never
    /// deleted. Returns the deleted ids in deletion order.
    pub fn delete<I, S>(&mut self, ids: I) -> Vec<NodeId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut doomed: Vec<NodeId> = Vec::new();
        let mut seen = HashSet::new();
        for id in ids {
            let id = id.as_ref();
            if id == self.root_id.as_str() {
                tracing::warn!(id, "refusing to delete the root node");
                continue;
            }
            if !self.contains(id) {
                tracing::debug!(id, "delete on missing node ignored");
                continue;
            }
            for node in self.subtree(id) {
                if node != self.root_id && seen.insert(node.clone()) {
                    doomed.push(node);
                }
            }
        }

        for id in &doomed {
            self.nodes.remove(id);
        }
        self.order.retain(|id| !seen.contains(id));
        doomed
    }

    /// Attach `child` under `parent` at `index` (append when `None`).
    ///
    /// # Errors
    ///
    /// - [`BuilderError::NodeNotFound`] if `parent` does not exist.
    /// - [`BuilderError::CycleDetected`] if `parent` is `child` or below it.
    /// - [`BuilderError::InvalidTarget`] if `child` is the root, `parent` is a
    ///   leaf, or its slot is occupied.
    pub fn attach(&mut self, child: &str, parent: &str, index: Option<usize>) -> BuilderResult<()> {
        self.check_attach(child, parent)?;
        let node = self
            .nodes
            .get_mut(parent)
            .ok_or_else(|| BuilderError::NodeNotFound(parent.to_string()))?;
        node.insert_child(child, index)
    }

    fn check_attach(&self, child: &str, parent: &str) -> BuilderResult<()> {
        let target = self
            .nodes
            .get(parent)
            .ok_or_else(|| BuilderError::NodeNotFound(parent.to_string()))?;
        if child == self.root_id.as_str() {
            return Err(BuilderError::InvalidTarget(format!(
                "root {child} cannot be attached to a parent"
            )));
        }
        if child == parent || self.is_descendant(parent, child) {
            return Err(BuilderError::CycleDetected {
                node: child.to_string(),
                target: parent.to_string(),
            });
        }
        if !target.supports_children() {
            return Err(BuilderError::InvalidTarget(format!(
                "{parent} ({}) cannot have children",
                target.kind
            )));
        }
        Ok(())
    }

    /// Remove `child` from every node that references it.
    ///
    /// Returns the first parent found and the position the child had there.
    pub fn detach(&mut self, child: &str) -> Option<(NodeId, usize)> {
        let mut first = None;
        for id in &self.order {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            if let Some(pos) = node.remove_reference(child) {
                if first.is_none() {
                    first = Some((id.clone(), pos));
                }
            }
        }
        first
    }

    /// Move `id` from `from_parent` to `to_parent` at `index`.
    ///
    /// `index` is clamped; `None` appends. When both parents are the same the
    /// node is removed first and the index is decremented if the removed
    /// position was before it. The node is detached from any other parent it
    /// still has. Returns `Ok(false)` when `id` does not exist.
    ///
    /// # Errors
    ///
    /// - [`BuilderError::NodeNotFound`] if `to_parent` does not exist.
    /// - [`BuilderError::CycleDetected`] if `to_parent` is `id` or below it.
    /// - [`BuilderError::InvalidTarget`] if `id` is the root, the target is a
    ///   leaf, or the target slot is occupied by another node.
    pub fn move_node(
        &mut self,
        id: &str,
        from_parent: Option<&str>,
        to_parent: &str,
        index: Option<usize>,
    ) -> BuilderResult<bool> {
        if !self.contains(id) {
            tracing::debug!(id, "move of missing node ignored");
            return Ok(false);
        }
        self.check_attach(id, to_parent)?;
        let target = self
            .nodes
            .get(to_parent)
            .ok_or_else(|| BuilderError::NodeNotFound(to_parent.to_string()))?;
        if !target.references(id) && !target.can_accept_child() {
            return Err(BuilderError::InvalidTarget(format!(
                "{to_parent} has no free slot"
            )));
        }

        let mut index = index;
        if let Some(from) = from_parent.filter(|from| *from != to_parent) {
            if let Some(node) = self.nodes.get_mut(from) {
                node.remove_reference(id);
            }
        }
        if let Some(node) = self.nodes.get_mut(to_parent) {
            if let Some(removed) = node.remove_reference(id) {
                if let Some(requested) = index {
                    if removed < requested {
                        index = Some(requested - 1);
                    }
                }
            }
        }
        // Any remaining parent keeps a stale reference otherwise.
        self.detach(id);

        let node = self
            .nodes
            .get_mut(to_parent)
            .ok_or_else(|| BuilderError::NodeNotFound(to_parent.to_string()))?;
        node.insert_child(id, index)?;
        Ok(true)
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Capture the full node array and root id.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            root_id: self.root_id.clone(),
            nodes: self.nodes().cloned().collect(),
        }
    }

    /// Rebuild a document from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self::from_nodes(snapshot.nodes.clone(), snapshot.root_id.clone())
    }

    /// Replace this document's content with `snapshot`.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        *self = Self::from_snapshot(snapshot);
    }
}

/// One row of [`Document::outline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    /// Node id.
    pub id: NodeId,
    /// Node kind.
    pub kind: Kind,
    /// Distance from the root.
    pub depth: usize,
}

/// Partial update for [`Document::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    /// New id.
    pub id: Option<NodeId>,
    /// New kind.
    pub kind: Option<Kind>,
    /// Properties to set (merged per key).
    pub props: Props,
    /// Properties to remove.
    pub removed_props: Vec<String>,
    /// New style; `Some(None)` clears it.
    pub style: Option<Option<Style>>,
    /// New children for the node's list or slot.
    pub children: Option<Vec<String>>,
}

impl NodePatch {
    /// Empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename the node.
    #[must_use]
    pub fn rename(mut self, id: impl Into<NodeId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Change the kind.
    #[must_use]
    pub fn kind(mut self, kind: impl Into<Kind>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set one property.
    #[must_use]
    pub fn prop(mut self, name: impl Into<String>, value: PropValue) -> Self {
        self.props.insert(name.into(), value);
        self
    }

    /// Remove one property.
    #[must_use]
    pub fn remove_prop(mut self, name: impl Into<String>) -> Self {
        self.removed_props.push(name.into());
        self
    }

    /// Replace or clear the style.
    #[must_use]
    pub fn style(mut self, style: Option<Style>) -> Self {
        self.style = Some(style);
        self
    }

    /// Replace the children.
    #[must_use]
    pub fn children<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    fn apply_to(&self, node: &mut ComponentNode) {
        if let Some(kind) = &self.kind {
            node.kind = kind.clone();
        }
        for name in &self.removed_props {
            node.props.remove(name);
        }
        for (name, value) in &self.props {
            node.props.insert(name.clone(), value.clone());
        }
        if let Some(style) = &self.style {
            node.style.clone_from(style);
        }
        if let Some(children) = &self.children {
            node.set_children(children.clone());
        }
    }
}
