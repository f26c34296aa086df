//! Clipboard capture and paste id generation.

use std::collections::{HashMap, HashSet};

use crate::document::Document;
use crate::node::{ComponentNode, NodeId};

/// Captured subtrees awaiting paste.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardEntry {
    /// Captured nodes in pre-order, deduplicated.
    pub nodes: Vec<ComponentNode>,
    /// Ids of the captured subtree roots, in selection order.
    pub roots: Vec<NodeId>,
    /// Whether the originals are removed on paste.
    pub cut: bool,
}

impl ClipboardEntry {
    /// Capture `selected` and everything below it.
    ///
    /// Selected ids that sit below another selected id are folded into that
    /// ancestor. Missing ids are ignored. Returns `None` if nothing remains.
    #[must_use]
    pub fn capture(doc: &Document, selected: &[NodeId], cut: bool) -> Option<Self> {
        let existing: Vec<&NodeId> = selected
            .iter()
            .filter(|id| doc.contains(id.as_str()))
            .collect();

        let mut roots: Vec<NodeId> = Vec::new();
        for id in &existing {
            let nested = existing
                .iter()
                .any(|other| other != id && doc.is_descendant(id.as_str(), other.as_str()));
            if !nested && !roots.contains(*id) {
                roots.push((*id).clone());
            }
        }
        if roots.is_empty() {
            return None;
        }

        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        for root in &roots {
            for id in doc.subtree(root.as_str()) {
                if seen.insert(id.clone()) {
                    if let Some(node) = doc.get(id.as_str()) {
                        nodes.push(node.clone());
                    }
                }
            }
        }

        Some(Self { nodes, roots, cut })
    }

    /// Ids of every captured node.
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|node| &node.id)
    }

    /// Map each captured id to a fresh `"{id}-copy-{stamp}"` id.
    ///
    /// `stamp` is bumped until no generated id satisfies `taken`.
    #[must_use]
    pub fn fresh_ids(&self, stamp: u64, taken: impl Fn(&str) -> bool) -> HashMap<String, String> {
        let mut stamp = stamp;
        loop {
            let map: HashMap<String, String> = self
                .ids()
                .map(|id| (id.to_string(), copy_id(id.as_str(), stamp)))
                .collect();
            if !map.values().any(|new_id| taken(new_id)) {
                return map;
            }
            stamp += 1;
        }
    }
}

/// Id given to a pasted copy of `original`.
#[must_use]
pub fn copy_id(original: &str, stamp: u64) -> String {
    format!("{original}-copy-{stamp}")
}

/// Get the current timestamp in milliseconds.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn current_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}
